//! ICC Profile Header
//!
//! The header is exactly 128 bytes. Only the fields that drive device to
//! PCS conversion are retained.

use super::error::IccError;
use super::types::{XyzNumber, read_u32};
use crate::config::RenderingIntent;

/// Profile file signature - must be 'acsp'
pub const PROFILE_SIGNATURE: u32 = 0x61637370;

/// Minimum valid profile size (header only)
pub const MIN_PROFILE_SIZE: usize = 128;

/// ICC Profile Header
#[derive(Debug, Clone, PartialEq)]
pub struct IccHeader {
    /// Profile size in bytes
    pub size: u32,
    pub version: ProfileVersion,
    pub device_class: ProfileClass,
    /// Color space of the device data
    pub color_space: IccColorSpace,
    /// Profile connection space (XYZ or Lab)
    pub pcs: IccColorSpace,
    pub rendering_intent: RenderingIntent,
    /// PCS illuminant (should be D50)
    pub illuminant: XyzNumber,
}

impl IccHeader {
    /// Parse header from bytes
    pub fn parse(data: &[u8]) -> Result<Self, IccError> {
        if data.len() < MIN_PROFILE_SIZE {
            return Err(IccError::TooSmall {
                expected: MIN_PROFILE_SIZE,
                actual: data.len(),
            });
        }
        let word = |pos: usize| read_u32(data, pos).unwrap_or(0);

        let signature = word(36);
        if signature != PROFILE_SIGNATURE {
            return Err(IccError::InvalidSignature(signature));
        }

        let version = ProfileVersion {
            major: data[8],
            minor: data[9] >> 4,
        };
        let device_class = ProfileClass::from_u32(word(12))?;
        let color_space = IccColorSpace::from_u32(word(16))?;
        let pcs = IccColorSpace::from_u32(word(20))?;
        if !matches!(pcs, IccColorSpace::Xyz | IccColorSpace::Lab)
            && device_class != ProfileClass::DeviceLink
        {
            return Err(IccError::InvalidColorSpace(word(20)));
        }

        let rendering_intent = RenderingIntent::from_icc(word(64));
        let illuminant = XyzNumber::from_bytes(&data[68..80]).unwrap_or_default();

        Ok(Self {
            size: word(0),
            version,
            device_class,
            color_space,
            pcs,
            rendering_intent,
            illuminant,
        })
    }

    /// Check the declared size against the data
    pub fn validate(&self, data_len: usize) -> Result<(), IccError> {
        if self.size as usize > data_len {
            return Err(IccError::SizeMismatch {
                header_size: self.size,
                actual_size: data_len,
            });
        }
        Ok(())
    }
}

/// ICC Profile Version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProfileVersion {
    pub major: u8,
    pub minor: u8,
}

impl ProfileVersion {
    pub fn is_v4(&self) -> bool {
        self.major >= 4
    }
}

/// ICC Profile Class (Device Class)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileClass {
    Input,
    Display,
    Output,
    DeviceLink,
    ColorSpace,
    Abstract,
    NamedColor,
}

impl ProfileClass {
    pub fn from_u32(val: u32) -> Result<Self, IccError> {
        Ok(match &val.to_be_bytes() {
            b"scnr" => Self::Input,
            b"mntr" => Self::Display,
            b"prtr" => Self::Output,
            b"link" => Self::DeviceLink,
            b"spac" => Self::ColorSpace,
            b"abst" => Self::Abstract,
            b"nmcl" => Self::NamedColor,
            _ => return Err(IccError::InvalidProfileClass(val)),
        })
    }
}

/// Data or connection color space of a profile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IccColorSpace {
    Xyz,
    Lab,
    Luv,
    YCbCr,
    Yxy,
    Rgb,
    Gray,
    Hsv,
    Hls,
    Cmyk,
    Cmy,
    /// Generic n-color space (`2CLR` .. `FCLR`)
    Color(u8),
}

impl IccColorSpace {
    pub fn from_u32(val: u32) -> Result<Self, IccError> {
        let bytes = val.to_be_bytes();
        Ok(match &bytes {
            b"XYZ " => Self::Xyz,
            b"Lab " => Self::Lab,
            b"Luv " => Self::Luv,
            b"YCbr" => Self::YCbCr,
            b"Yxy " => Self::Yxy,
            b"RGB " => Self::Rgb,
            b"GRAY" => Self::Gray,
            b"HSV " => Self::Hsv,
            b"HLS " => Self::Hls,
            b"CMYK" => Self::Cmyk,
            b"CMY " => Self::Cmy,
            [n, b'C', b'L', b'R'] => match (*n as char).to_digit(16) {
                Some(count @ 2..=15) => Self::Color(count as u8),
                _ => return Err(IccError::InvalidColorSpace(val)),
            },
            _ => return Err(IccError::InvalidColorSpace(val)),
        })
    }

    /// Number of channels in this color space
    pub fn channels(&self) -> usize {
        match self {
            Self::Gray => 1,
            Self::Cmyk => 4,
            Self::Color(n) => *n as usize,
            _ => 3,
        }
    }
}
