//! Time-sampled values with Held/Linear lookup.
//!
//! A [`TimeSamples`] is a sequence of `(time, value)` samples where a value
//! may be the authored absence marker (Blocked). The vector is lazy-sorted:
//! mutations flip a dirty flag and [`TimeSamples::update`] sorts. Lookups
//! are correct in either state; the sorted state uses binary search and a
//! lookup never allocates beyond the returned value.

use crate::util::{lerp_f32, lerp_f64, slerp_dquat, slerp_quat, slerp_quath, Half2, Half3, Half4};
use crate::value::Value;
use half::f16;

/// Probe time that requests the first sample (the conventional "default"
/// probe). Any NaN time is treated as this probe.
pub const DEFAULT_TIME: f64 = f64::NAN;

/// Denominators below this are treated as zero when interpolating.
const BRACKET_EPSILON: f64 = 1.0e-12;

/// Interpolation mode for time-sample lookup.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TimeSampleInterpolation {
    /// Value of the sample with the greatest time at or before `t`.
    #[default]
    Held,
    /// Linear (slerp for quaternions) between the bracketing samples;
    /// degrades to Held for non-numeric types.
    Linear,
}

/// Policy for Held lookup inside a Blocked span.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BlockedPolicy {
    /// Absent for any `t` held by a Blocked sample.
    #[default]
    PropagateAbsent,
    /// Extend the nearest earlier non-blocked value across the span.
    ExtendLast,
}

/// Sorted-on-demand `(time, value | Blocked)` samples.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TimeSamples {
    samples: Vec<(f64, Option<Value>)>,
    dirty: bool,
}

impl TimeSamples {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sample. Flips the dirty flag; sorting is deferred.
    pub fn add_sample(&mut self, t: f64, value: Value) {
        self.samples.push((t, Some(value)));
        self.dirty = true;
    }

    /// Append a Blocked sample at `t`.
    pub fn add_blocked_sample(&mut self, t: f64) {
        self.samples.push((t, None));
        self.dirty = true;
    }

    /// Sort samples by time (stable) and clear the dirty flag.
    pub fn update(&mut self) {
        if self.dirty {
            self.samples.sort_by(|a, b| a.0.total_cmp(&b.0));
            self.dirty = false;
        }
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Raw samples in current (possibly unsorted) order.
    #[inline]
    pub fn samples(&self) -> &[(f64, Option<Value>)] {
        &self.samples
    }

    /// Look up the value at `t` with the default Blocked policy.
    pub fn get_at(&self, t: f64, interp: TimeSampleInterpolation) -> Option<Value> {
        self.get_at_with_policy(t, interp, BlockedPolicy::PropagateAbsent)
    }

    /// Look up the value at `t`.
    ///
    /// Boundary rules: `t` before the first sample yields the first value;
    /// `t` at or past the last yields the last. A Blocked bracketing sample
    /// yields absent (no interpolation across a block); under Held the
    /// `policy` decides whether the span stays absent or extends the last
    /// non-blocked value.
    pub fn get_at_with_policy(
        &self,
        t: f64,
        interp: TimeSampleInterpolation,
        policy: BlockedPolicy,
    ) -> Option<Value> {
        if self.samples.is_empty() {
            return None;
        }
        if t.is_nan() {
            // Default probe: first sample in time order.
            let first = self.first_index();
            return self.resolve_held(first, policy);
        }

        let (lower, upper) = if self.dirty {
            self.bracket_scan(t)
        } else {
            self.bracket_sorted(t)
        };

        match (lower, upper) {
            // t before the first sample: clamp to it.
            (None, Some(u)) => self.resolve_held(u, policy),
            // t at or past the last sample: clamp to it.
            (Some(l), None) => self.resolve_held(l, policy),
            (Some(l), Some(u)) => match interp {
                TimeSampleInterpolation::Held => self.resolve_held(l, policy),
                TimeSampleInterpolation::Linear => {
                    let (t0, v0) = &self.samples[l];
                    let (t1, v1) = &self.samples[u];
                    // No interpolation across a block.
                    let (Some(a), Some(b)) = (v0.as_ref(), v1.as_ref()) else {
                        return None;
                    };
                    let denom = t1 - t0;
                    let dt = if denom.abs() < BRACKET_EPSILON {
                        0.0
                    } else {
                        ((t - t0) / denom).clamp(0.0, 1.0)
                    };
                    match lerp_values(a, b, dt) {
                        Some(v) => Some(v),
                        // Non-interpolatable type: degrade to Held.
                        None => Some(a.clone()),
                    }
                }
            },
            (None, None) => None,
        }
    }

    /// Index of the sample with the smallest time.
    fn first_index(&self) -> usize {
        if self.dirty {
            let mut best = 0;
            for (i, (t, _)) in self.samples.iter().enumerate().skip(1) {
                if *t < self.samples[best].0 {
                    best = i;
                }
            }
            best
        } else {
            0
        }
    }

    /// (greatest time <= t, least time > t) by binary search. Requires the
    /// sorted state.
    fn bracket_sorted(&self, t: f64) -> (Option<usize>, Option<usize>) {
        let n = self.samples.len();
        let i = self.samples.partition_point(|(st, _)| *st <= t);
        let lower = if i == 0 { None } else { Some(i - 1) };
        let upper = if i == n { None } else { Some(i) };
        (lower, upper)
    }

    /// Same brackets by linear scan, valid in the unsorted state. Among
    /// equal times the later insertion wins the lower bracket, matching
    /// what a stable sort would produce.
    fn bracket_scan(&self, t: f64) -> (Option<usize>, Option<usize>) {
        let mut lower: Option<usize> = None;
        let mut upper: Option<usize> = None;
        for (i, (st, _)) in self.samples.iter().enumerate() {
            if *st <= t {
                match lower {
                    Some(l) if self.samples[l].0 > *st => {}
                    _ => lower = Some(i),
                }
            } else {
                match upper {
                    Some(u) if self.samples[u].0 <= *st => {}
                    _ => upper = Some(i),
                }
            }
        }
        (lower, upper)
    }

    fn resolve_held(&self, index: usize, policy: BlockedPolicy) -> Option<Value> {
        match &self.samples[index].1 {
            Some(v) => Some(v.clone()),
            None => match policy {
                BlockedPolicy::PropagateAbsent => None,
                BlockedPolicy::ExtendLast => {
                    let t = self.samples[index].0;
                    // Nearest earlier non-blocked sample.
                    self.samples
                        .iter()
                        .filter(|(st, v)| *st < t && v.is_some())
                        .max_by(|a, b| a.0.total_cmp(&b.0))
                        .and_then(|(_, v)| v.clone())
                }
            },
        }
    }
}

/// Linear interpolation between two values of the same numeric type.
/// `None` for types outside the interpolatable set.
fn lerp_values(a: &Value, b: &Value, dt: f64) -> Option<Value> {
    let tf = dt as f32;
    let v = match (a, b) {
        (Value::Half(x), Value::Half(y)) => {
            Value::Half(f16::from_f32(lerp_f32(x.to_f32(), y.to_f32(), tf)))
        }
        (Value::Float(x), Value::Float(y)) => Value::Float(lerp_f32(*x, *y, tf)),
        (Value::Double(x), Value::Double(y)) => Value::Double(lerp_f64(*x, *y, dt)),
        (Value::Half2(x), Value::Half2(y)) => {
            Value::Half2(Half2::from_vec2(x.to_vec2().lerp(y.to_vec2(), tf)))
        }
        (Value::Half3(x), Value::Half3(y)) => {
            Value::Half3(Half3::from_vec3(x.to_vec3().lerp(y.to_vec3(), tf)))
        }
        (Value::Half4(x), Value::Half4(y)) => {
            Value::Half4(Half4::from_vec4(x.to_vec4().lerp(y.to_vec4(), tf)))
        }
        (Value::Float2(x), Value::Float2(y)) => Value::Float2(x.lerp(*y, tf)),
        (Value::Float3(x), Value::Float3(y)) => Value::Float3(x.lerp(*y, tf)),
        (Value::Float4(x), Value::Float4(y)) => Value::Float4(x.lerp(*y, tf)),
        (Value::Double2(x), Value::Double2(y)) => Value::Double2(x.lerp(*y, dt)),
        (Value::Double3(x), Value::Double3(y)) => Value::Double3(x.lerp(*y, dt)),
        (Value::Double4(x), Value::Double4(y)) => Value::Double4(x.lerp(*y, dt)),
        (Value::Quath(x), Value::Quath(y)) => Value::Quath(slerp_quath(*x, *y, tf)),
        (Value::Quatf(x), Value::Quatf(y)) => Value::Quatf(slerp_quat(*x, *y, tf)),
        (Value::Quatd(x), Value::Quatd(y)) => Value::Quatd(slerp_dquat(*x, *y, dt)),
        (Value::Matrix2d(x), Value::Matrix2d(y)) => Value::Matrix2d(*x * (1.0 - dt) + *y * dt),
        (Value::Matrix3d(x), Value::Matrix3d(y)) => Value::Matrix3d(*x * (1.0 - dt) + *y * dt),
        (Value::Matrix4d(x), Value::Matrix4d(y)) => Value::Matrix4d(*x * (1.0 - dt) + *y * dt),
        (Value::Matrix4f(x), Value::Matrix4f(y)) => Value::Matrix4f(*x * (1.0 - tf) + *y * tf),
        _ => return None,
    };
    Some(v)
}
