//! ICC Profile Tag Parsing
//!
//! Each tag starts with a 4-byte type signature and 4 reserved bytes,
//! followed by type-specific data. Parsers receive the whole tag.

mod curves;
mod lut;

pub use curves::{CurveData, interpolate_table};
pub use lut::{LutAToB, LutClut, LutMatrix, LutMft};

use super::error::IccError;
use super::types::{TypeSignature, XyzNumber, read_s15f16, read_u32};

/// Parsed tag data
#[derive(Debug, Clone, PartialEq)]
pub enum TagData {
    /// Colorants and white points
    Xyz(Vec<XyzNumber>),
    /// TRC, either `curv` or `para`
    Curve(CurveData),
    /// mft1 / mft2
    Lut(LutMft),
    LutAToB(LutAToB),
    /// `chad` (sf32, row-major)
    ChromaticAdaptation([[f64; 3]; 3]),
    /// A tag type this crate does not interpret
    Unknown { type_sig: u32 },
}

impl TagData {
    pub fn parse(data: &[u8]) -> Result<Self, IccError> {
        let type_sig = read_u32(data, 0)
            .filter(|_| data.len() >= 8)
            .ok_or_else(|| IccError::corrupted("tag data too small for header"))?;

        Ok(match TypeSignature(type_sig) {
            TypeSignature::XYZ => {
                let values: Vec<XyzNumber> = data[8..]
                    .chunks_exact(12)
                    .filter_map(XyzNumber::from_bytes)
                    .collect();
                if values.is_empty() {
                    return Err(IccError::corrupted("XYZ tag too small"));
                }
                Self::Xyz(values)
            }
            TypeSignature::CURVE | TypeSignature::PARA => Self::Curve(CurveData::parse(data)?.0),
            TypeSignature::LUT8 => Self::Lut(LutMft::parse(data, 1)?),
            TypeSignature::LUT16 => Self::Lut(LutMft::parse(data, 2)?),
            TypeSignature::LUTA2B => Self::LutAToB(LutAToB::parse(data)?),
            TypeSignature::SF32 => {
                let mut m = [[0f64; 3]; 3];
                for (i, slot) in m.iter_mut().flatten().enumerate() {
                    *slot = read_s15f16(data, 8 + i * 4)
                        .ok_or_else(|| IccError::corrupted("sf32 matrix truncated"))?
                        as f64;
                }
                Self::ChromaticAdaptation(m)
            }
            _ => Self::Unknown { type_sig },
        })
    }

    pub fn as_xyz(&self) -> Option<[f64; 3]> {
        match self {
            Self::Xyz(values) => values.first().map(XyzNumber::to_array),
            _ => None,
        }
    }

    pub fn as_curve(&self) -> Option<&CurveData> {
        match self {
            Self::Curve(curve) => Some(curve),
            _ => None,
        }
    }

    pub fn is_lut(&self) -> bool {
        matches!(self, Self::Lut(_) | Self::LutAToB(_))
    }
}
