//! Utility types and functions for USD.
//!
//! This module contains fundamental types used throughout the library:
//! - [`Error`] / [`Result`] - Error handling
//! - Math type re-exports from glam plus half-precision vectors

mod error;
mod math;

pub use error::*;
pub use math::*;
