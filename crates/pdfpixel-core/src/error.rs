//! Error types for pdfpixel

use thiserror::Error;

use crate::icc::IccError;

/// Result type for pdfpixel operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while decoding streams, evaluating functions or
/// converting image samples.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("CCITT decode error at row {row}, column {column} (width {width}): {reason}")]
    Ccitt {
        row: usize,
        column: usize,
        width: usize,
        reason: &'static str,
    },

    #[error("LZW decode error: {0}")]
    Lzw(String),

    #[error("JPEG decode error at offset {offset}: {reason}")]
    Jpeg { offset: usize, reason: String },

    #[error("{filter} error: {reason}")]
    Filter {
        filter: &'static str,
        reason: String,
    },

    #[error("Unsupported feature: {0}")]
    Unsupported(String),

    #[error(
        "PostScript stack underflow in '{operator}': needs {required} operand(s), stack has {actual}"
    )]
    StackUnderflow {
        operator: &'static str,
        required: usize,
        actual: usize,
    },

    #[error("PostScript operator not supported: '{0}'")]
    UnsupportedOperator(String),

    #[error("PostScript syntax error: {0}")]
    PostScriptSyntax(String),

    #[error("PostScript type check failed in '{0}'")]
    TypeCheck(&'static str),

    #[error("Invalid function: {0}")]
    InvalidFunction(String),

    #[error("Invalid color space: {0}")]
    InvalidColorSpace(String),

    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Buffer size mismatch: expected {expected}, got {actual}")]
    BufferSize { expected: usize, actual: usize },

    #[error("Image of {width}x{height} exceeds the pixel limit of {limit}")]
    ImageTooLarge {
        width: usize,
        height: usize,
        limit: usize,
    },

    #[error("ICC profile error: {0}")]
    Icc(#[from] IccError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Build a filter error with a formatted reason
    pub(crate) fn filter(filter: &'static str, reason: impl Into<String>) -> Self {
        Self::Filter {
            filter,
            reason: reason.into(),
        }
    }

    /// Build a JPEG error at a byte offset
    pub(crate) fn jpeg(offset: usize, reason: impl Into<String>) -> Self {
        Self::Jpeg {
            offset,
            reason: reason.into(),
        }
    }

    /// True for errors caused by malformed entropy-coded or filtered data
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::Ccitt { .. } | Self::Lzw(_) | Self::Jpeg { .. } | Self::Filter { .. } | Self::Io(_)
        )
    }
}
