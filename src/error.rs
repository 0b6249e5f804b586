//! Error types for world construction and configuration loading

use thiserror::Error;

/// Errors raised while building a world or loading its configuration.
///
/// Nothing inside a tick can fail: coordinate operations silently ignore
/// out-of-bounds input instead of reporting it here.
#[derive(Debug, Error)]
pub enum SandfallError {
    /// The cell buffer could not be allocated
    #[error("out of memory allocating {cells} cells")]
    OutOfMemory { cells: usize },

    /// Grid too small to hold an interior inside the border ring
    #[error("grid of {width}x{height} cells has no interior (minimum is 3x3)")]
    InvalidDimensions { width: usize, height: usize },

    #[error("chunk size must be non-zero")]
    InvalidChunkSize,

    #[error("invalid configuration: {0}")]
    Config(#[from] ron::error::SpannedError),

    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SandfallError>;
