//! ICC Profile Parser

use std::collections::HashMap;

use log::trace;

use super::error::IccError;
use super::header::{IccColorSpace, IccHeader, MIN_PROFILE_SIZE};
use super::tags::{CurveData, TagData};
use super::types::{TagSignature, read_u32};
use crate::config::RenderingIntent;

/// An ICC profile parsed from bytes
#[derive(Debug, Clone, PartialEq)]
pub struct IccProfile {
    pub header: IccHeader,
    /// Tag table: signature -> parsed data
    pub tags: HashMap<u32, TagData>,
}

/// Tag table entry (as stored in profile)
#[derive(Debug, Clone, Copy)]
struct TagTableEntry {
    signature: u32,
    offset: u32,
    size: u32,
}

impl IccProfile {
    /// Parse an ICC profile from bytes
    pub fn parse(data: &[u8]) -> Result<Self, IccError> {
        let header = IccHeader::parse(data)?;
        header.validate(data.len())?;

        let entries = Self::parse_tag_table(data)?;
        let mut tags = HashMap::with_capacity(entries.len());
        for entry in &entries {
            let start = entry.offset as usize;
            let end = start + entry.size as usize;
            let tag_data = data.get(start..end).ok_or(IccError::TagOutOfBounds {
                tag: entry.signature,
                offset: entry.offset,
                size: entry.size,
                profile_size: data.len(),
            })?;

            // a malformed tag only matters if a conversion needs it
            let parsed = TagData::parse(tag_data).unwrap_or_else(|err| {
                trace!("keeping tag 0x{:08X} unparsed: {err}", entry.signature);
                TagData::Unknown {
                    type_sig: read_u32(tag_data, 0).unwrap_or(0),
                }
            });
            tags.insert(entry.signature, parsed);
        }

        Ok(Self { header, tags })
    }

    fn parse_tag_table(data: &[u8]) -> Result<Vec<TagTableEntry>, IccError> {
        let count = read_u32(data, MIN_PROFILE_SIZE).ok_or(IccError::TooSmall {
            expected: MIN_PROFILE_SIZE + 4,
            actual: data.len(),
        })? as usize;

        let table_start = MIN_PROFILE_SIZE + 4;
        let required = count
            .checked_mul(12)
            .and_then(|n| n.checked_add(table_start))
            .unwrap_or(usize::MAX);
        if data.len() < required {
            return Err(IccError::TooSmall {
                expected: required,
                actual: data.len(),
            });
        }

        Ok((0..count)
            .map(|i| {
                let pos = table_start + i * 12;
                TagTableEntry {
                    signature: read_u32(data, pos).unwrap_or(0),
                    offset: read_u32(data, pos + 4).unwrap_or(0),
                    size: read_u32(data, pos + 8).unwrap_or(0),
                }
            })
            .collect())
    }

    pub fn get_tag(&self, sig: TagSignature) -> Option<&TagData> {
        self.tags.get(&sig.0)
    }

    fn xyz(&self, sig: TagSignature) -> Option<[f64; 3]> {
        self.get_tag(sig)?.as_xyz()
    }

    fn curve(&self, sig: TagSignature) -> Option<&CurveData> {
        self.get_tag(sig)?.as_curve()
    }

    /// Red, green and blue colorants in PCS XYZ
    pub fn colorants(&self) -> Option<[[f64; 3]; 3]> {
        Some([
            self.xyz(TagSignature::RED_COLORANT)?,
            self.xyz(TagSignature::GREEN_COLORANT)?,
            self.xyz(TagSignature::BLUE_COLORANT)?,
        ])
    }

    /// Red, green and blue TRCs
    pub fn rgb_trcs(&self) -> Option<[&CurveData; 3]> {
        Some([
            self.curve(TagSignature::RED_TRC)?,
            self.curve(TagSignature::GREEN_TRC)?,
            self.curve(TagSignature::BLUE_TRC)?,
        ])
    }

    pub fn gray_trc(&self) -> Option<&CurveData> {
        self.curve(TagSignature::GRAY_TRC)
    }

    pub fn media_white_point(&self) -> Option<[f64; 3]> {
        self.xyz(TagSignature::MEDIA_WHITE)
    }

    pub fn chromatic_adaptation_matrix(&self) -> Option<[[f64; 3]; 3]> {
        match self.get_tag(TagSignature::CHAD)? {
            TagData::ChromaticAdaptation(m) => Some(*m),
            _ => None,
        }
    }

    /// Check if the profile carries a complete RGB matrix/TRC model
    pub fn is_matrix_shaper(&self) -> bool {
        self.header.color_space == IccColorSpace::Rgb
            && self.colorants().is_some()
            && self.rgb_trcs().is_some()
    }

    /// The A2B LUT for `intent`, falling back to A2B0
    pub fn a2b_for_intent(&self, intent: RenderingIntent) -> Option<&TagData> {
        let sig = match intent {
            RenderingIntent::Perceptual => TagSignature::A2B0,
            RenderingIntent::RelativeColorimetric | RenderingIntent::AbsoluteColorimetric => {
                TagSignature::A2B1
            }
            RenderingIntent::Saturation => TagSignature::A2B2,
        };
        self.get_tag(sig)
            .filter(|tag| tag.is_lut())
            .or_else(|| self.get_tag(TagSignature::A2B0).filter(|tag| tag.is_lut()))
    }

    /// Number of device channels
    pub fn input_channels(&self) -> usize {
        self.header.color_space.channels()
    }

    pub fn pcs_is_lab(&self) -> bool {
        self.header.pcs == IccColorSpace::Lab
    }
}
