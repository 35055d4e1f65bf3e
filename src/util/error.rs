//! Error types for the USD library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for USD read operations.
///
/// Display strings carry a `[USDC]` prefix for errors raised while decoding
/// the Crate binary and a `[Stage]` prefix for errors raised while
/// reconstructing the scene graph. Warnings do not use this type; they
/// accumulate on the reader's warning channel.
#[derive(Error, Debug)]
pub enum Error {
    /// File does not exist or cannot be accessed
    #[error("[USDC] File not found: {0}")]
    FileNotFound(PathBuf),

    /// Invalid magic bytes at start of file
    #[error("[USDC] Invalid Crate file: expected `PXR-USDC` magic bytes")]
    InvalidMagic,

    /// Unsupported file format version
    #[error("[USDC] Unsupported Crate version: {0}.{1}.{2}")]
    UnsupportedVersion(u8, u8, u8),

    /// File is truncated or an offset points past the end
    #[error("[USDC] Unexpected end of file at offset {0}")]
    UnexpectedEof(u64),

    /// Malformed data inside a section (bad index, bad count, bad layout)
    #[error("[USDC] {section} section: {message} (offset {offset})")]
    Structural {
        section: &'static str,
        offset: u64,
        message: String,
    },

    /// A count or size exceeds a configured cap
    #[error("[USDC] {section} section: {message}")]
    Bounds {
        section: &'static str,
        message: String,
    },

    /// A field carried a value whose type contradicts the declared typeName
    #[error("[USDC] Type mismatch for `{name}`: expected `{expected}`, got `{actual}`")]
    TypeMismatch {
        name: String,
        expected: String,
        actual: String,
    },

    /// Scene-level inconsistency (duplicate path index, missing specifier, ...)
    #[error("[Stage] {0}")]
    Semantic(String),

    /// Feature present in the file but not implemented by this reader.
    /// Most call sites downgrade this to a warning and skip the subtree;
    /// it only surfaces as an error from entry points with nothing to skip.
    #[error("[USDC] Unsupported: {0}")]
    Unsupported(String),

    /// Memory mapping failed
    #[error("[USDC] Memory mapping failed: {0}")]
    MmapFailed(String),

    /// I/O error
    #[error("[USDC] I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// UTF-8 conversion error
    #[error("[USDC] Invalid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl Error {
    /// Create a structural error for a section at a byte offset.
    pub fn structural(section: &'static str, offset: u64, msg: impl Into<String>) -> Self {
        Self::Structural {
            section,
            offset,
            message: msg.into(),
        }
    }

    /// Create a bounds (cap exceeded) error for a section.
    pub fn bounds(section: &'static str, msg: impl Into<String>) -> Self {
        Self::Bounds {
            section,
            message: msg.into(),
        }
    }

    /// Create a semantic (scene-level) error.
    pub fn semantic(msg: impl Into<String>) -> Self {
        Self::Semantic(msg.into())
    }

    /// Create an unsupported-feature error.
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }
}

/// Result type alias for USD operations.
pub type Result<T> = std::result::Result<T, Error>;
