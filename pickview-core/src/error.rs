//! Error types for pickview

use thiserror::Error;

/// Main error type for pickview operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Cannot fit geometry with degenerate bounds (largest dimension {max_dimension})")]
    DegenerateBounds { max_dimension: f32 },

    #[error("{operation} needs at least {required} points, {picked} picked so far")]
    NotEnoughPoints {
        operation: &'static str,
        required: usize,
        picked: usize,
    },

    #[error("A processing request is already in flight")]
    RequestPending,

    #[error("Remote call failed: {0}")]
    Remote(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for pickview operations
pub type Result<T> = std::result::Result<T, Error>;
