//! Error types for decoding

use thiserror::Error;

/// Errors that can occur while turning a file buffer into geometry
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("{extension} format not yet supported. Use OBJ or PLY.")]
    UnsupportedFormat { extension: String },

    #[error("PLY format '{format}' not supported, only ascii")]
    UnsupportedPlyFormat { format: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<DecodeError> for pickview_core::Error {
    fn from(e: DecodeError) -> Self {
        match e {
            DecodeError::Io(e) => pickview_core::Error::Io(e),
            other => pickview_core::Error::UnsupportedFormat(other.to_string()),
        }
    }
}
