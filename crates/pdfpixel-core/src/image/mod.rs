//! Image Decoding
//!
//! Filtered stream bytes become sample rows through the filter chain, and
//! sample rows become pixels through [`ImageRowProcessor`]. The result is
//! an owned [`DecodedImage`] tagged with its [`PixelFormat`] and stride.

mod cursor;
mod descriptor;
mod lut;
mod mask;
mod processor;

pub use cursor::RowSamples;
pub use descriptor::ImageDescriptor;
pub use lut::{ColorKeyLut, DecodeLut, MATTE_RECIPROCAL, soft_mask_alpha, stencil_alpha};
pub use mask::{apply_matte, apply_soft_mask, matte_color};
pub use processor::{ImageRowProcessor, ProcessingMode};

use log::{debug, warn};

use crate::config::DecodeOptions;
use crate::error::{Error, Result};
use crate::filter::{FilterLimits, FilterSpec, decode_filters_with_limits};

/// Layout of a decoded pixel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    Gray8,
    Rgba8888,
    /// Native-endian `u16` channels
    Rgba16161616,
    Alpha8,
}

impl PixelFormat {
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            Self::Gray8 | Self::Alpha8 => 1,
            Self::Rgba8888 => 4,
            Self::Rgba16161616 => 8,
        }
    }

    pub fn channels(&self) -> usize {
        match self {
            Self::Gray8 | Self::Alpha8 => 1,
            Self::Rgba8888 | Self::Rgba16161616 => 4,
        }
    }
}

/// Owned pixel storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PixelData {
    U8(Vec<u8>),
    U16(Vec<u16>),
}

/// A fully decoded image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    width: usize,
    height: usize,
    /// Bytes per row
    stride: usize,
    format: PixelFormat,
    data: PixelData,
}

impl DecodedImage {
    /// A zero-filled image
    pub fn new(width: usize, height: usize, format: PixelFormat) -> Self {
        let stride = width * format.bytes_per_pixel();
        let data = match format {
            PixelFormat::Rgba16161616 => PixelData::U16(vec![0; width * height * 4]),
            _ => PixelData::U8(vec![0; stride * height]),
        };
        Self {
            width,
            height,
            stride,
            format,
            data,
        }
    }

    /// Wrap existing 8-bit pixels
    pub fn from_bytes(width: usize, height: usize, format: PixelFormat, bytes: Vec<u8>) -> Result<Self> {
        if format == PixelFormat::Rgba16161616 {
            return Err(Error::Unsupported("16-bit pixels from a byte vector".into()));
        }
        let stride = width * format.bytes_per_pixel();
        if bytes.len() != stride * height {
            return Err(Error::BufferSize {
                expected: stride * height,
                actual: bytes.len(),
            });
        }
        Ok(Self {
            width,
            height,
            stride,
            format,
            data: PixelData::U8(bytes),
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn data(&self) -> &PixelData {
        &self.data
    }

    pub(crate) fn data_mut(&mut self) -> &mut PixelData {
        &mut self.data
    }

    /// The pixels as bytes; 16-bit channels are viewed in native byte order
    pub fn as_bytes(&self) -> &[u8] {
        match &self.data {
            PixelData::U8(v) => v,
            PixelData::U16(v) => bytemuck::cast_slice(v),
        }
    }

    pub fn as_u16(&self) -> Option<&[u16]> {
        match &self.data {
            PixelData::U16(v) => Some(v),
            PixelData::U8(_) => None,
        }
    }

    /// Take the pixel bytes
    pub fn into_bytes(self) -> Vec<u8> {
        match self.data {
            PixelData::U8(v) => v,
            PixelData::U16(v) => bytemuck::cast_slice(&v).to_vec(),
        }
    }

    /// One row of pixel bytes
    pub fn row(&self, y: usize) -> &[u8] {
        &self.as_bytes()[y * self.stride..(y + 1) * self.stride]
    }

    /// The pixel at `(x, y)` as RGBA8: gray is replicated, alpha-only pixels
    /// are black, 16-bit channels keep their high byte
    pub fn rgba8_at(&self, x: usize, y: usize) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = y * self.width + x;
        Some(match (&self.data, self.format) {
            (PixelData::U8(v), PixelFormat::Gray8) => [v[i], v[i], v[i], 255],
            (PixelData::U8(v), PixelFormat::Alpha8) => [0, 0, 0, v[i]],
            (PixelData::U8(v), _) => [v[i * 4], v[i * 4 + 1], v[i * 4 + 2], v[i * 4 + 3]],
            (PixelData::U16(v), _) => {
                let p = &v[i * 4..i * 4 + 4];
                [p[0], p[1], p[2], p[3]].map(|c| (c >> 8) as u8)
            }
        })
    }
}

/// Decode one image: run the filter chain, then convert every row
pub fn decode_image(
    descriptor: &ImageDescriptor,
    encoded: &[u8],
    filters: &[FilterSpec],
    options: &DecodeOptions,
) -> Result<DecodedImage> {
    let mut processor = ImageRowProcessor::new(descriptor, options)?;
    let rows = decode_filters_with_limits(encoded, filters, &FilterLimits::for_image(descriptor, options))?;
    debug!(
        "decoding {}x{} image from {} sample bytes ({:?})",
        descriptor.width(),
        descriptor.height(),
        rows.len(),
        processor.mode()
    );
    processor.initialize_buffer();
    processor.write_rows(&rows);
    Ok(processor.finish())
}

/// An image stream: descriptor, encoded bytes and filter chain
#[derive(Debug, Clone, Copy)]
pub struct ImageSource<'a> {
    pub descriptor: &'a ImageDescriptor,
    pub encoded: &'a [u8],
    pub filters: &'a [FilterSpec],
}

impl<'a> ImageSource<'a> {
    pub fn new(descriptor: &'a ImageDescriptor, encoded: &'a [u8], filters: &'a [FilterSpec]) -> Self {
        Self {
            descriptor,
            encoded,
            filters,
        }
    }

    pub fn decode(&self, options: &DecodeOptions) -> Result<DecodedImage> {
        decode_image(self.descriptor, self.encoded, self.filters, options)
    }
}

/// Decode an image together with its `/SMask`, de-matting when the mask
/// carries `/Matte`
pub fn decode_masked_image(
    image: ImageSource<'_>,
    soft_mask: ImageSource<'_>,
    options: &DecodeOptions,
) -> Result<DecodedImage> {
    let mut color = image.decode(options)?;
    let mask = soft_mask.decode(options)?;
    apply_soft_mask(&mut color, &mask)?;

    if let (Some(matte), Some(cs)) = (soft_mask.descriptor.matte(), image.descriptor.color_space()) {
        let intent = image.descriptor.intent().unwrap_or(options.intent);
        apply_matte(&mut color, matte_color(cs, intent, matte)?)?;
    }
    Ok(color)
}

/// [`decode_image`] for callers that draw a placeholder on failure: errors
/// are logged and turned into `None`
pub fn render_image(
    descriptor: &ImageDescriptor,
    encoded: &[u8],
    filters: &[FilterSpec],
    options: &DecodeOptions,
) -> Option<DecodedImage> {
    match decode_image(descriptor, encoded, filters, options) {
        Ok(image) => Some(image),
        Err(err) => {
            warn!(
                "skipping {}x{} image: {err}",
                descriptor.width(),
                descriptor.height()
            );
            None
        }
    }
}
