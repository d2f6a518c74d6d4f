//! Stream filters
//!
//! Each filter turns encoded stream bytes into decoded bytes. A stream's
//! `/Filter` array is run front to back by [`decode_filters`]; predictors
//! attached to LZW and Flate run as part of their filter stage.

pub mod ascii;
pub mod ccitt;
pub mod flate;
pub mod jpeg;
pub mod lzw;
pub mod predictor;
pub mod run_length;

use log::debug;

use crate::config::{DEFAULT_MAX_PIXELS, DecodeOptions};
use crate::error::{Error, Result};
use crate::image::ImageDescriptor;

pub use ccitt::CcittParams;
pub use jpeg::JpegParams;
pub use predictor::PredictorParams;

/// One entry of a stream's filter chain with its decode parameters
#[derive(Debug, Clone, PartialEq)]
pub enum FilterSpec {
    AsciiHex,
    Ascii85,
    Lzw {
        early_change: bool,
        predictor: PredictorParams,
    },
    Flate {
        predictor: PredictorParams,
    },
    RunLength,
    CcittFax(CcittParams),
    Dct(JpegParams),
}

impl FilterSpec {
    /// Map a PDF filter name (including the inline-image abbreviations)
    /// to a filter with default parameters
    pub fn from_name(name: &str) -> Result<Self> {
        Ok(match name {
            "ASCIIHexDecode" | "AHx" => Self::AsciiHex,
            "ASCII85Decode" | "A85" => Self::Ascii85,
            "LZWDecode" | "LZW" => Self::Lzw {
                early_change: true,
                predictor: PredictorParams::default(),
            },
            "FlateDecode" | "Fl" => Self::Flate {
                predictor: PredictorParams::default(),
            },
            "RunLengthDecode" | "RL" => Self::RunLength,
            "CCITTFaxDecode" | "CCF" => Self::CcittFax(CcittParams::default()),
            "DCTDecode" | "DCT" => Self::Dct(JpegParams::default()),
            other => return Err(Error::Unsupported(format!("filter {other}"))),
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::AsciiHex => "ASCIIHexDecode",
            Self::Ascii85 => "ASCII85Decode",
            Self::Lzw { .. } => "LZWDecode",
            Self::Flate { .. } => "FlateDecode",
            Self::RunLength => "RunLengthDecode",
            Self::CcittFax(_) => "CCITTFaxDecode",
            Self::Dct(_) => "DCTDecode",
        }
    }

    /// True for filters that produce image samples rather than a byte stream
    pub fn is_image_codec(&self) -> bool {
        matches!(self, Self::CcittFax(_) | Self::Dct(_))
    }

    /// Decode `data` through this filter with the default limits
    pub fn decode(&self, data: &[u8]) -> Result<Vec<u8>> {
        self.decode_with_limits(data, &FilterLimits::default())
    }

    /// Decode `data` through this filter, refusing to allocate past `limits`
    pub fn decode_with_limits(&self, data: &[u8], limits: &FilterLimits) -> Result<Vec<u8>> {
        match self {
            Self::AsciiHex => ascii::decode_hex(data),
            Self::Ascii85 => ascii::decode_85(data),
            Self::Lzw {
                early_change,
                predictor,
            } => predictor::apply_predictor(
                lzw::decode_with_limit(data, *early_change, limits.max_output)?,
                predictor,
            ),
            Self::Flate { predictor } => {
                predictor::apply_predictor(flate::decode_with_limit(data, limits.max_output)?, predictor)
            }
            Self::RunLength => Ok(run_length::decode(data)),
            Self::CcittFax(params) => ccitt::decode_with_limit(data, params, limits.max_pixels),
            Self::Dct(params) => Ok(jpeg::decode_with_limit(data, params, limits.max_pixels)?.data),
        }
    }
}

/// Bounds on the buffers a filter chain may allocate
///
/// Codec filters (CCITT, DCT) size their output from the stream itself, so
/// they check `max_pixels` before allocating. Inflating filters stop once
/// they have produced `max_output` bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterLimits {
    pub max_pixels: usize,
    pub max_output: usize,
}

impl Default for FilterLimits {
    fn default() -> Self {
        Self {
            max_pixels: DEFAULT_MAX_PIXELS,
            max_output: usize::MAX,
        }
    }
}

impl FilterLimits {
    /// Limits for decoding the samples of one image
    ///
    /// Inflated output may exceed the sample bytes by a fixed headroom so
    /// an intermediate stage (e.g. Flate before DCT) can hold codec headers.
    pub fn for_image(descriptor: &ImageDescriptor, options: &DecodeOptions) -> Self {
        let samples = descriptor.row_bytes().saturating_mul(descriptor.height());
        Self {
            max_pixels: options.max_pixels,
            max_output: samples.saturating_add(OUTPUT_HEADROOM),
        }
    }
}

const OUTPUT_HEADROOM: usize = 1 << 20;

/// Run a filter chain in order
pub fn decode_filters(data: &[u8], filters: &[FilterSpec]) -> Result<Vec<u8>> {
    decode_filters_with_limits(data, filters, &FilterLimits::default())
}

/// Run a filter chain in order, each stage bounded by `limits`
pub fn decode_filters_with_limits(data: &[u8], filters: &[FilterSpec], limits: &FilterLimits) -> Result<Vec<u8>> {
    let Some((first, rest)) = filters.split_first() else {
        return Ok(data.to_vec());
    };
    let mut buf = first.decode_with_limits(data, limits)?;
    debug!("{} produced {} bytes", first.name(), buf.len());
    for filter in rest {
        buf = filter.decode_with_limits(&buf, limits)?;
        debug!("{} produced {} bytes", filter.name(), buf.len());
    }
    Ok(buf)
}
