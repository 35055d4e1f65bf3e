//! The typed value universe.
//!
//! - [`type_id`] - stable 32-bit type ids, role types, name resolution
//! - [`Value`] - the tagged union over all concrete types
//! - [`upcast_numeric`] - narrow-to-wide bridging for Crate payloads
//! - Concrete non-numeric types: [`Token`], [`AssetPath`], [`Dictionary`],
//!   [`Reference`], [`Payload`], and the small closed enums

pub mod type_id;

mod types;
mod upcast;
#[allow(clippy::module_inception)]
mod value;

pub use type_id::{
    try_get_underlying_type_id, value_type_from_name, ValueType, ARRAY_BIT, PRIM_TYPE_ID_BASE,
};
pub use types::*;
pub use upcast::upcast_numeric;
pub use value::{Value, ValueTyped};
