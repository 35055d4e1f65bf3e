//! Attributes: metadata bag, value container, and the typed wrappers
//! exposed to schema records.

use std::marker::PhantomData;

use smallvec::SmallVec;

use crate::attr::{TimeSampleInterpolation, TimeSamples, DEFAULT_TIME};
use crate::path::Path;
use crate::value::{Dictionary, Interpolation, Value, ValueTyped, Variability};

/// Connection target storage; almost every connection has one target.
type ConnectionList = SmallVec<[Path; 1]>;

/// Attribute-level metadata.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AttrMeta {
    pub interpolation: Option<Interpolation>,
    pub element_size: Option<u32>,
    pub hidden: Option<bool>,
    pub custom_data: Option<Dictionary>,
    pub doc: Option<String>,
    pub comment: Option<String>,
    /// Unrecognized metadata fields, in authored order.
    pub meta: Dictionary,
}

impl AttrMeta {
    /// True when any metadatum is authored.
    pub fn authored(&self) -> bool {
        self.interpolation.is_some()
            || self.element_size.is_some()
            || self.hidden.is_some()
            || self.custom_data.is_some()
            || self.doc.is_some()
            || self.comment.is_some()
            || !self.meta.is_empty()
    }
}

/// The value container of an attribute: nothing, a scalar, or samples.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum PrimVar {
    #[default]
    Empty,
    Scalar(Value),
    TimeSamples(TimeSamples),
}

impl PrimVar {
    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    #[inline]
    pub fn is_scalar(&self) -> bool {
        matches!(self, Self::Scalar(_))
    }

    #[inline]
    pub fn is_timesamples(&self) -> bool {
        matches!(self, Self::TimeSamples(_))
    }

    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            Self::Scalar(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_timesamples(&self) -> Option<&TimeSamples> {
        match self {
            Self::TimeSamples(ts) => Some(ts),
            _ => None,
        }
    }
}

/// An untyped attribute as decoded from a layer.
///
/// Evaluation precedence: blocked yields absent; a connection defers to the
/// caller (the core does not traverse connections); time samples are looked
/// up with interpolation; otherwise the scalar value is returned.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Attribute {
    name: String,
    type_name: String,
    variability: Variability,
    blocked: bool,
    connections: ConnectionList,
    var: PrimVar,
    pub meta: AttrMeta,
}

impl Attribute {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            ..Default::default()
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Declared type name (e.g. `"float"`, `"color3f"`).
    #[inline]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn set_type_name(&mut self, type_name: impl Into<String>) {
        self.type_name = type_name.into();
    }

    #[inline]
    pub fn variability(&self) -> Variability {
        self.variability
    }

    pub fn set_variability(&mut self, variability: Variability) {
        self.variability = variability;
    }

    #[inline]
    pub fn is_blocked(&self) -> bool {
        self.blocked
    }

    pub fn set_blocked(&mut self, blocked: bool) {
        self.blocked = blocked;
    }

    #[inline]
    pub fn var(&self) -> &PrimVar {
        &self.var
    }

    pub fn set_var(&mut self, var: PrimVar) {
        self.var = var;
    }

    /// Set a scalar value.
    pub fn set_value<T: ValueTyped>(&mut self, value: T) {
        self.var = PrimVar::Scalar(value.into_value());
    }

    /// Set an already-tagged scalar value.
    pub fn set_scalar(&mut self, value: Value) {
        self.var = PrimVar::Scalar(value);
    }

    /// Add one time sample, converting the container if needed.
    pub fn set_timesample<T: ValueTyped>(&mut self, t: f64, value: T) {
        self.timesamples_mut().add_sample(t, value.into_value());
    }

    /// Add a Blocked sample at `t`.
    pub fn set_blocked_sample(&mut self, t: f64) {
        self.timesamples_mut().add_blocked_sample(t);
    }

    fn timesamples_mut(&mut self) -> &mut TimeSamples {
        if !self.var.is_timesamples() {
            self.var = PrimVar::TimeSamples(TimeSamples::new());
        }
        match &mut self.var {
            PrimVar::TimeSamples(ts) => ts,
            _ => unreachable!(),
        }
    }

    #[inline]
    pub fn connections(&self) -> &[Path] {
        &self.connections
    }

    pub fn set_connection(&mut self, path: Path) {
        self.connections = SmallVec::from_elem(path, 1);
    }

    pub fn set_connections(&mut self, paths: Vec<Path>) {
        self.connections = SmallVec::from_vec(paths);
    }

    /// True when at least one connection target is recorded.
    #[inline]
    pub fn is_connection(&self) -> bool {
        !self.connections.is_empty()
    }

    /// Authored predicate: a value, a connection, a block, or an explicit
    /// empty container all count as authored.
    pub fn authored(&self) -> bool {
        self.blocked || !self.connections.is_empty() || !self.var.is_empty()
    }

    /// Evaluate at the default probe.
    pub fn get_value<T: ValueTyped + Clone>(&self) -> Option<T> {
        self.get_value_at(DEFAULT_TIME, TimeSampleInterpolation::Held)
    }

    /// Evaluate at time `t`.
    pub fn get_value_at<T: ValueTyped + Clone>(
        &self,
        t: f64,
        interp: TimeSampleInterpolation,
    ) -> Option<T> {
        if self.blocked || self.is_connection() {
            return None;
        }
        match &self.var {
            PrimVar::Empty => None,
            PrimVar::Scalar(v) => v.get::<T>(),
            PrimVar::TimeSamples(ts) => ts.get_at(t, interp).and_then(|v| v.get::<T>()),
        }
    }

    /// Evaluate at time `t` without a typed conversion.
    pub fn get_raw_value_at(&self, t: f64, interp: TimeSampleInterpolation) -> Option<Value> {
        if self.blocked || self.is_connection() {
            return None;
        }
        match &self.var {
            PrimVar::Empty => None,
            PrimVar::Scalar(v) => Some(v.clone()),
            PrimVar::TimeSamples(ts) => ts.get_at(t, interp),
        }
    }
}

/// Typed attribute: optional value, optional connection, no fallback.
#[derive(Clone, Debug, PartialEq)]
pub struct TypedAttribute<T> {
    value: Option<T>,
    connections: Vec<Path>,
    blocked: bool,
    pub meta: AttrMeta,
}

impl<T> Default for TypedAttribute<T> {
    fn default() -> Self {
        Self {
            value: None,
            connections: Vec::new(),
            blocked: false,
            meta: AttrMeta::default(),
        }
    }
}

impl<T> TypedAttribute<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_value(&mut self, value: T) {
        self.value = Some(value);
    }

    pub fn set_blocked(&mut self, blocked: bool) {
        self.blocked = blocked;
    }

    #[inline]
    pub fn is_blocked(&self) -> bool {
        self.blocked
    }

    pub fn set_connection(&mut self, path: Path) {
        self.connections = vec![path];
    }

    pub fn set_connections(&mut self, paths: Vec<Path>) {
        self.connections = paths;
    }

    #[inline]
    pub fn connections(&self) -> &[Path] {
        &self.connections
    }

    pub fn authored(&self) -> bool {
        self.blocked || self.value.is_some() || !self.connections.is_empty()
    }

    pub fn get_value(&self) -> Option<T>
    where
        T: Clone,
    {
        if self.blocked {
            return None;
        }
        self.value.clone()
    }

    pub fn value_ref(&self) -> Option<&T> {
        if self.blocked {
            return None;
        }
        self.value.as_ref()
    }
}

/// Typed attribute that only declares presence, like a shader output.
#[derive(Clone, Debug, PartialEq)]
pub struct TypedTerminalAttribute<T> {
    authored: bool,
    pub meta: AttrMeta,
    _marker: PhantomData<T>,
}

impl<T> Default for TypedTerminalAttribute<T> {
    fn default() -> Self {
        Self {
            authored: false,
            meta: AttrMeta::default(),
            _marker: PhantomData,
        }
    }
}

impl<T> TypedTerminalAttribute<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_authored(&mut self, authored: bool) {
        self.authored = authored;
    }

    #[inline]
    pub fn authored(&self) -> bool {
        self.authored
    }
}

impl<T: ValueTyped> TypedTerminalAttribute<T> {
    /// Declared type name of the terminal.
    pub fn type_name(&self) -> &'static str {
        T::TYPE_NAME
    }
}

/// Typed attribute with a schema fallback returned when unauthored.
#[derive(Clone, Debug, PartialEq)]
pub struct TypedAttributeWithFallback<T> {
    value: Option<T>,
    fallback: T,
    connections: Vec<Path>,
    blocked: bool,
    pub meta: AttrMeta,
}

impl<T: Default> Default for TypedAttributeWithFallback<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> TypedAttributeWithFallback<T> {
    pub fn new(fallback: T) -> Self {
        Self {
            value: None,
            fallback,
            connections: Vec::new(),
            blocked: false,
            meta: AttrMeta::default(),
        }
    }

    pub fn set_value(&mut self, value: T) {
        self.value = Some(value);
    }

    pub fn set_blocked(&mut self, blocked: bool) {
        self.blocked = blocked;
    }

    #[inline]
    pub fn is_blocked(&self) -> bool {
        self.blocked
    }

    pub fn set_connection(&mut self, path: Path) {
        self.connections = vec![path];
    }

    #[inline]
    pub fn connections(&self) -> &[Path] {
        &self.connections
    }

    pub fn authored(&self) -> bool {
        self.blocked || self.value.is_some() || !self.connections.is_empty()
    }

    /// The authored value, or the fallback when unauthored. Blocked still
    /// yields absent.
    pub fn get_value(&self) -> Option<T>
    where
        T: Clone,
    {
        if self.blocked {
            return None;
        }
        Some(self.value.clone().unwrap_or_else(|| self.fallback.clone()))
    }
}

impl<T> From<T> for TypedAttributeWithFallback<T> {
    fn from(fallback: T) -> Self {
        Self::new(fallback)
    }
}
