//! Math type re-exports and half-precision types.
//!
//! This module re-exports types from `glam` and provides the half-precision
//! vector and quaternion types USD needs that `glam` does not carry.

// Re-export glam types
pub use glam::{
    // Single precision vectors
    Vec2, Vec3, Vec4,
    // Double precision vectors
    DVec2, DVec3, DVec4,
    // Integer vectors
    IVec2, IVec3, IVec4,
    // Matrices
    DMat2, DMat3, DMat4, Mat4,
    // Quaternions
    DQuat, Quat,
};

use bytemuck::{Pod, Zeroable};
use half::f16;
use std::fmt;

/// 2-component half-precision vector.
#[derive(Clone, Copy, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Half2 {
    pub x: f16,
    pub y: f16,
}

/// 3-component half-precision vector.
#[derive(Clone, Copy, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Half3 {
    pub x: f16,
    pub y: f16,
    pub z: f16,
}

/// 4-component half-precision vector.
#[derive(Clone, Copy, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Half4 {
    pub x: f16,
    pub y: f16,
    pub z: f16,
    pub w: f16,
}

/// Half-precision quaternion, stored as (x, y, z, w) like `quath` in USD.
#[derive(Clone, Copy, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Quath {
    pub x: f16,
    pub y: f16,
    pub z: f16,
    pub w: f16,
}

impl Half2 {
    #[inline]
    pub fn new(x: f16, y: f16) -> Self {
        Self { x, y }
    }

    /// Widen to single precision.
    #[inline]
    pub fn to_vec2(self) -> Vec2 {
        Vec2::new(self.x.to_f32(), self.y.to_f32())
    }

    /// Narrow from single precision (round to nearest).
    #[inline]
    pub fn from_vec2(v: Vec2) -> Self {
        Self::new(f16::from_f32(v.x), f16::from_f32(v.y))
    }
}

impl Half3 {
    #[inline]
    pub fn new(x: f16, y: f16, z: f16) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub fn to_vec3(self) -> Vec3 {
        Vec3::new(self.x.to_f32(), self.y.to_f32(), self.z.to_f32())
    }

    #[inline]
    pub fn from_vec3(v: Vec3) -> Self {
        Self::new(f16::from_f32(v.x), f16::from_f32(v.y), f16::from_f32(v.z))
    }
}

impl Half4 {
    #[inline]
    pub fn new(x: f16, y: f16, z: f16, w: f16) -> Self {
        Self { x, y, z, w }
    }

    #[inline]
    pub fn to_vec4(self) -> Vec4 {
        Vec4::new(
            self.x.to_f32(),
            self.y.to_f32(),
            self.z.to_f32(),
            self.w.to_f32(),
        )
    }

    #[inline]
    pub fn from_vec4(v: Vec4) -> Self {
        Self::new(
            f16::from_f32(v.x),
            f16::from_f32(v.y),
            f16::from_f32(v.z),
            f16::from_f32(v.w),
        )
    }
}

impl Quath {
    #[inline]
    pub fn new(x: f16, y: f16, z: f16, w: f16) -> Self {
        Self { x, y, z, w }
    }

    /// Widen to a single-precision quaternion.
    #[inline]
    pub fn to_quat(self) -> Quat {
        Quat::from_xyzw(
            self.x.to_f32(),
            self.y.to_f32(),
            self.z.to_f32(),
            self.w.to_f32(),
        )
    }

    #[inline]
    pub fn from_quat(q: Quat) -> Self {
        Self::new(
            f16::from_f32(q.x),
            f16::from_f32(q.y),
            f16::from_f32(q.z),
            f16::from_f32(q.w),
        )
    }
}

impl fmt::Debug for Half2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl fmt::Debug for Half3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

impl fmt::Debug for Half4 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {}, {})", self.x, self.y, self.z, self.w)
    }
}

impl fmt::Debug for Quath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {}, {})", self.x, self.y, self.z, self.w)
    }
}

/// Linear interpolation between two doubles.
#[inline]
pub fn lerp_f64(a: f64, b: f64, t: f64) -> f64 {
    a * (1.0 - t) + b * t
}

/// Linear interpolation between two floats.
#[inline]
pub fn lerp_f32(a: f32, b: f32, t: f32) -> f32 {
    a * (1.0 - t) + b * t
}

/// Spherical linear interpolation for single-precision quaternions.
///
/// Falls back to normalized lerp when the inputs are nearly parallel.
pub fn slerp_quat(a: Quat, b: Quat, t: f32) -> Quat {
    // glam's slerp already handles the shortest-arc and near-parallel cases.
    a.slerp(b, t)
}

/// Spherical linear interpolation for double-precision quaternions.
pub fn slerp_dquat(a: DQuat, b: DQuat, t: f64) -> DQuat {
    a.slerp(b, t)
}

/// Spherical linear interpolation for half-precision quaternions.
///
/// Carried out in single precision and rounded back to binary16.
pub fn slerp_quath(a: Quath, b: Quath, t: f32) -> Quath {
    Quath::from_quat(slerp_quat(a.to_quat(), b.to_quat(), t))
}
