//! # usd
//!
//! Rust reader for Universal Scene Description (USD) documents in the
//! binary Crate (USDC) encoding, exposing their content as an in-memory
//! scene graph suitable for renderers, exporters and asset tooling.
//!
//! The original USD format and C++ library were developed by Pixar
//! Animation Studios. All rights to the original belong to the authors.
//! This is an independent Rust implementation of the reading path; it
//! targets correctness and compactness rather than round-trip
//! editability.
//!
//! ## Modules
//!
//! - [`util`] - Errors, math types (glam re-exports, half vectors)
//! - [`value`] - The typed value universe (tagged union, type ids, upcast)
//! - [`path`] - SdfPath-like immutable paths
//! - [`listop`] - Six-bucket list-edit operations
//! - [`attr`] - Attributes, properties, time samples
//! - [`prim`] / [`stage`] - The scene graph
//! - [`schema`] - Typed Prim records (Xform, Mesh, ...)
//! - [`usdc`] - The Crate binary decoder and Stage reconstruction
//!
//! ## Example
//!
//! ```ignore
//! use usd::prelude::*;
//!
//! let stage = load_usdc_from_file("scene.usdc", &CrateReaderConfig::default())?;
//! for prim in stage.traverse() {
//!     println!("{} <{}>", prim.abs_path(), prim.type_name());
//! }
//! ```

pub mod attr;
pub mod listop;
pub mod path;
pub mod prim;
pub mod schema;
pub mod stage;
pub mod usdc;
pub mod util;
pub mod value;

// Re-export commonly used types
pub use attr::{Attribute, Property, TimeSampleInterpolation, TimeSamples};
pub use path::Path;
pub use prim::Prim;
pub use stage::{Stage, StageMetas};
pub use usdc::{load_usdc_from_file, load_usdc_from_memory, CrateReaderConfig};
pub use util::{Error, Result};
pub use value::Value;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::attr::{
        Attribute, BlockedPolicy, PrimVar, Property, PropertyKind, Relationship,
        TimeSampleInterpolation, TimeSamples,
    };
    pub use crate::listop::{ListEditQual, ListOp};
    pub use crate::path::Path;
    pub use crate::prim::{Prim, PrimMeta, PropertyMap};
    pub use crate::schema::PrimBody;
    pub use crate::stage::{Stage, StageMetas};
    pub use crate::usdc::{
        load_usdc_from_file, load_usdc_from_memory, load_usdc_with_warnings, CrateReader,
        CrateReaderConfig, CrateSource,
    };
    pub use crate::util::{Error, Result};
    pub use crate::value::{upcast_numeric, Token, Value, ValueTyped};
}
