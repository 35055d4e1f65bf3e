//! Attribute and property machinery.
//!
//! - [`TimeSamples`] - sorted `(time, value | Blocked)` samples with
//!   Held/Linear lookup
//! - [`Attribute`] / [`PrimVar`] - untyped attribute with value container
//! - [`TypedAttribute`] and friends - typed wrappers for schema records
//! - [`Property`] - the discriminated slot a Prim holds under each name

mod attribute;
mod property;
mod timesamples;

pub use attribute::{
    AttrMeta, Attribute, PrimVar, TypedAttribute, TypedAttributeWithFallback,
    TypedTerminalAttribute,
};
pub use property::{Connection, Property, PropertyKind, Relationship};
pub use timesamples::{
    BlockedPolicy, TimeSampleInterpolation, TimeSamples, DEFAULT_TIME,
};
