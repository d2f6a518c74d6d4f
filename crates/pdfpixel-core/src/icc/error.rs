//! ICC Profile Error Types

use std::fmt;

/// Errors that can occur when parsing ICC profiles
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum IccError {
    /// Profile data is too small
    TooSmall { expected: usize, actual: usize },
    /// Invalid profile signature (should be 'acsp')
    InvalidSignature(u32),
    /// Profile size in header is larger than the data
    SizeMismatch { header_size: u32, actual_size: usize },
    /// Tag offset is out of bounds
    TagOutOfBounds {
        tag: u32,
        offset: u32,
        size: u32,
        profile_size: usize,
    },
    /// Required tag is missing
    MissingTag(u32),
    InvalidColorSpace(u32),
    InvalidProfileClass(u32),
    /// Corrupted or invalid tag data
    CorruptedData(String),
    Unsupported(String),
}

impl IccError {
    pub(crate) fn corrupted(msg: impl Into<String>) -> Self {
        Self::CorruptedData(msg.into())
    }
}

fn fourcc(sig: u32) -> String {
    sig.to_be_bytes()
        .iter()
        .map(|&b| if b.is_ascii_graphic() || b == b' ' { b as char } else { '?' })
        .collect()
}

impl fmt::Display for IccError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooSmall { expected, actual } => {
                write!(f, "Profile too small: expected {expected} bytes, got {actual}")
            }
            Self::InvalidSignature(sig) => {
                write!(f, "Invalid profile signature: 0x{sig:08X} (expected 'acsp')")
            }
            Self::SizeMismatch {
                header_size,
                actual_size,
            } => write!(
                f,
                "Size mismatch: header says {header_size} bytes, data is {actual_size} bytes"
            ),
            Self::TagOutOfBounds {
                tag,
                offset,
                size,
                profile_size,
            } => write!(
                f,
                "Tag '{}' out of bounds: offset {offset} + size {size} > profile size {profile_size}",
                fourcc(*tag)
            ),
            Self::MissingTag(tag) => write!(f, "Required tag missing: '{}'", fourcc(*tag)),
            Self::InvalidColorSpace(cs) => write!(f, "Invalid color space: '{}'", fourcc(*cs)),
            Self::InvalidProfileClass(class) => {
                write!(f, "Invalid profile class: '{}'", fourcc(*class))
            }
            Self::CorruptedData(msg) => write!(f, "Corrupted data: {msg}"),
            Self::Unsupported(msg) => write!(f, "Unsupported feature: {msg}"),
        }
    }
}

impl std::error::Error for IccError {}
