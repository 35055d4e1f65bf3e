//! Crate (USDC) binary format reader.
//!
//! - [`format`] - wire constants, [`ValueRep`](format::ValueRep),
//!   [`SpecType`](format::SpecType)
//! - [`reader`] - byte source, bootstrap, TOC
//! - [`compression`] / [`integer_coding`] - LZ4 frames and packed integers
//! - [`decoder`] - section tables and value decoding
//! - [`reconstruct`] - Spec walk producing a [`Stage`]
//!
//! ## Example
//!
//! ```ignore
//! use usd::usdc::{load_usdc_from_file, CrateReaderConfig};
//!
//! let stage = load_usdc_from_file("scene.usdc", &CrateReaderConfig::default())?;
//! println!("{} root prims", stage.root_prims().len());
//! ```

pub mod compression;
pub mod decoder;
pub mod format;
pub mod integer_coding;
pub mod reader;
pub mod reconstruct;

use std::path::Path as FsPath;

pub use decoder::{CrateReader, Field, FieldValuePairVector, Node, Spec};
pub use format::{SpecType, ValueRep};
pub use reader::{Bootstrap, CrateSource, Section, Toc};
pub use reconstruct::reconstruct_stage;

use crate::stage::Stage;
use crate::util::Result;

/// Upper bound on decode workers.
pub const MAX_THREADS: usize = 1024;

/// Decoder configuration. Every cap is enforced before any allocation
/// sized by file data.
#[derive(Clone, Debug, PartialEq)]
pub struct CrateReaderConfig {
    /// Decode worker count; -1 selects hardware concurrency. Clamped to
    /// `[1, 1024]`.
    pub num_threads: i32,
    /// Cap on `(field, value)` pairs per spec.
    pub max_field_value_pairs_per_spec: u32,
    /// Cap on the `elementSize` attribute metadatum.
    pub max_element_size: u32,
    /// Cap on prim (and path) nesting depth.
    pub max_prim_nest_level: u32,
    /// Cap on elements per decoded array.
    pub max_array_elements: u64,
}

impl Default for CrateReaderConfig {
    fn default() -> Self {
        Self {
            num_threads: -1,
            max_field_value_pairs_per_spec: 65536,
            max_element_size: 65536,
            max_prim_nest_level: 1024,
            max_array_elements: 1 << 32,
        }
    }
}

impl CrateReaderConfig {
    /// Resolve `num_threads` to an effective worker count.
    pub fn resolved_num_threads(&self) -> usize {
        #[cfg(target_arch = "wasm32")]
        {
            return 1;
        }
        #[cfg(not(target_arch = "wasm32"))]
        {
            let n = if self.num_threads < 0 {
                std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(1)
            } else {
                self.num_threads as usize
            };
            n.clamp(1, MAX_THREADS)
        }
    }
}

/// Read a Stage from an in-memory Crate byte stream. `base_dir` is used
/// only to resolve asset paths in the layer metadata.
pub fn load_usdc_from_memory(
    data: Vec<u8>,
    base_dir: &str,
    config: &CrateReaderConfig,
) -> Result<Stage> {
    load_usdc_with_warnings(CrateSource::from_memory(data), base_dir, config).map(|(s, _)| s)
}

/// Read a Stage from a Crate file on disk (memory-mapped). The file's
/// parent directory becomes the base directory for asset resolution.
pub fn load_usdc_from_file(
    path: impl AsRef<FsPath>,
    config: &CrateReaderConfig,
) -> Result<Stage> {
    let path = path.as_ref();
    let base_dir = path
        .parent()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_default();
    let source = CrateSource::open(path)?;
    load_usdc_with_warnings(source, &base_dir, config).map(|(s, _)| s)
}

/// Read a Stage from any byte source, returning accumulated warnings
/// alongside it. A partial file yields no Stage.
pub fn load_usdc_with_warnings(
    source: CrateSource,
    base_dir: &str,
    config: &CrateReaderConfig,
) -> Result<(Stage, Vec<String>)> {
    let mut reader = CrateReader::new(source, config.clone())?;
    reader.read_tables()?;
    let (stage, mut warnings) = reconstruct_stage(&reader, base_dir)?;
    let mut all = reader.warnings().to_vec();
    all.append(&mut warnings);
    Ok((stage, all))
}
