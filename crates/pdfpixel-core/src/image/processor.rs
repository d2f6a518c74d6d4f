//! Image row processor
//!
//! Turns decoded sample rows into pixels. The output path is chosen once
//! at construction:
//!
//! | mode          | input                                   | output        |
//! |---------------|-----------------------------------------|---------------|
//! | `Stencil`     | 1-bit `/ImageMask`                      | Alpha8        |
//! | `SoftMask`    | `/SMask` gray                           | Alpha8        |
//! | `DirectGray`  | DeviceGray, 8 bit                       | Gray8         |
//! | `DirectRgb`   | DeviceRGB, 8 bit                        | RGBA8888      |
//! | `DirectRgb16` | DeviceRGB, 16 bit                       | RGBA16161616  |
//! | `Lookup`      | any other single-component space        | RGBA8888      |
//! | `Convert`     | everything else                         | RGBA8888      |
//!
//! The direct modes require no `/Decode` (or the default one) and no
//! color-key mask. Four-component spaces always convert.

use std::sync::Arc;

use log::{debug, trace, warn};
use rayon::prelude::*;
use smallvec::SmallVec;

use super::cursor::RowSamples;
use super::lut::{ColorKeyLut, DecodeLut, soft_mask_alpha, stencil_alpha};
use super::{DecodedImage, ImageDescriptor, PixelData, PixelFormat};
use crate::color::{ColorSpace, Sampler};
use crate::config::DecodeOptions;
use crate::error::{Error, Result};
use crate::simd;

/// How rows are turned into pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessingMode {
    Stencil,
    SoftMask,
    DirectGray,
    DirectRgb,
    DirectRgb16,
    Lookup,
    Convert,
}

impl ProcessingMode {
    pub fn output_format(&self) -> PixelFormat {
        match self {
            Self::Stencil | Self::SoftMask => PixelFormat::Alpha8,
            Self::DirectGray => PixelFormat::Gray8,
            Self::DirectRgb16 => PixelFormat::Rgba16161616,
            Self::DirectRgb | Self::Lookup | Self::Convert => PixelFormat::Rgba8888,
        }
    }

    /// True for the pass-through modes that skip color conversion
    pub fn is_fast_path(&self) -> bool {
        matches!(self, Self::DirectGray | Self::DirectRgb | Self::DirectRgb16)
    }
}

/// Per-mode tables, built before any row is processed
enum Kernel {
    Alpha(Vec<u8>),
    DirectGray,
    DirectRgb,
    DirectRgb16,
    Lookup(Vec<[u8; 4]>),
    Convert {
        decode: DecodeLut,
        key: Option<ColorKeyLut>,
        sampler: Arc<Sampler>,
    },
}

#[inline]
fn to_u8(v: f32) -> u8 {
    if v.is_nan() { 0 } else { (v.clamp(0.0, 1.0) * 255.0 + 0.5) as u8 }
}

#[inline]
fn rgba_to_u8(rgba: [f32; 4]) -> [u8; 4] {
    rgba.map(to_u8)
}

/// Codes of a single-component row as bytes, unpacking sub-byte and
/// 16-bit samples into `scratch`
fn row_codes<'a>(row: &'a [u8], bits: u8, width: usize, scratch: &'a mut Vec<u8>) -> &'a [u8] {
    if bits == 8 && row.len() >= width {
        return &row[..width];
    }
    let mut samples = RowSamples::new(row, bits);
    scratch.clear();
    scratch.extend((0..width).map(|_| samples.next_index() as u8));
    scratch
}

impl Kernel {
    fn write_u8(&self, desc: &ImageDescriptor, src: &[u8], dst: &mut [u8]) {
        let width = desc.width();
        let bits = desc.bits_per_component();
        match self {
            Self::Alpha(table) => {
                let mut scratch = Vec::new();
                let codes = row_codes(src, bits, width, &mut scratch);
                simd::map_codes_to_alpha(codes, table, dst);
            }
            Self::DirectGray => {
                let n = src.len().min(width);
                dst[..n].copy_from_slice(&src[..n]);
            }
            Self::DirectRgb => {
                let n = src.len().min(width * 3) / 3 * 3;
                simd::expand_rgb8_to_rgba8(&src[..n], dst);
            }
            Self::Lookup(table) => {
                let mut scratch = Vec::new();
                let codes = row_codes(src, bits, width, &mut scratch);
                simd::map_codes_to_rgba(codes, table, dst);
            }
            Self::Convert { decode, key, sampler } => {
                let n = decode.components();
                let mut samples = RowSamples::new(src, bits);
                let mut codes: SmallVec<[usize; 8]> = SmallVec::from_elem(0, n);
                let mut values: SmallVec<[f32; 8]> = SmallVec::from_elem(0.0, n);
                for px in dst.chunks_exact_mut(4).take(width) {
                    for c in 0..n {
                        let code = samples.next_index();
                        codes[c] = code;
                        values[c] = decode.get(c, code);
                    }
                    let mut rgba = rgba_to_u8(sampler.sample(&values));
                    if key.as_ref().is_some_and(|k| k.matches(&codes)) {
                        rgba[3] = 0;
                    }
                    px.copy_from_slice(&rgba);
                }
            }
            Self::DirectRgb16 => unreachable_format("16-bit kernel on an 8-bit buffer"),
        }
    }

    fn write_u16(&self, desc: &ImageDescriptor, src: &[u8], dst: &mut [u16]) {
        match self {
            Self::DirectRgb16 => {
                let n = src.len().min(desc.width() * 6) / 6 * 6;
                simd::expand_rgb16_to_rgba16(&src[..n], dst);
            }
            _ => unreachable_format("8-bit kernel on a 16-bit buffer"),
        }
    }
}

/// Row `y` of a packed buffer, possibly cut short at the end
fn sample_row(data: &[u8], row_bytes: usize, y: usize) -> Option<&[u8]> {
    let start = y * row_bytes;
    (start < data.len()).then(|| &data[start..(start + row_bytes).min(data.len())])
}

#[cold]
fn unreachable_format(what: &str) -> ! {
    panic!("image row processor: {what}")
}

/// Lifecycle: [`new`](Self::new) → [`initialize_buffer`](Self::initialize_buffer)
/// → any number of [`write_row`](Self::write_row) / [`write_rows`](Self::write_rows)
/// → [`finish`](Self::finish). Calling them out of order panics.
pub struct ImageRowProcessor {
    descriptor: ImageDescriptor,
    mode: ProcessingMode,
    kernel: Kernel,
    parallel: bool,
    image: Option<DecodedImage>,
}

impl std::fmt::Debug for ImageRowProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageRowProcessor")
            .field("width", &self.descriptor.width())
            .field("height", &self.descriptor.height())
            .field("mode", &self.mode)
            .field("initialized", &self.image.is_some())
            .finish()
    }
}

impl ImageRowProcessor {
    pub fn new(descriptor: &ImageDescriptor, options: &DecodeOptions) -> Result<Self> {
        descriptor.validate()?;
        let (width, height) = (descriptor.width(), descriptor.height());
        let pixels = width
            .checked_mul(height)
            .filter(|&p| p <= options.max_pixels)
            .ok_or(Error::ImageTooLarge {
                width,
                height,
                limit: options.max_pixels,
            })?;

        let mode = Self::select_mode(descriptor, options);
        let kernel = Self::build_kernel(descriptor, options, mode)?;
        debug!(
            "{width}x{height} image, {} bpc, {} components: {mode:?}",
            descriptor.bits_per_component(),
            descriptor.components()
        );
        Ok(Self {
            descriptor: descriptor.clone(),
            mode,
            kernel,
            parallel: pixels >= options.parallel_threshold,
            image: None,
        })
    }

    fn select_mode(desc: &ImageDescriptor, options: &DecodeOptions) -> ProcessingMode {
        if desc.is_image_mask() {
            return ProcessingMode::Stencil;
        }
        if desc.is_soft_mask() {
            return ProcessingMode::SoftMask;
        }
        if !options.allow_fast_path {
            return ProcessingMode::Convert;
        }
        let plain = desc.has_default_decode() && desc.color_key().is_none();
        let space = desc.color_space().map(|cs| cs.space());
        match (space, desc.bits_per_component()) {
            (Some(ColorSpace::DeviceGray), 8) if plain => ProcessingMode::DirectGray,
            (Some(ColorSpace::DeviceRgb), 8) if plain => ProcessingMode::DirectRgb,
            (Some(ColorSpace::DeviceRgb), 16) if plain => ProcessingMode::DirectRgb16,
            _ if desc.components() == 1 => ProcessingMode::Lookup,
            _ => ProcessingMode::Convert,
        }
    }

    fn build_kernel(desc: &ImageDescriptor, options: &DecodeOptions, mode: ProcessingMode) -> Result<Kernel> {
        let decode_or_default = || desc.decode().map_or((0.0, 1.0), |d| d[0]);
        Ok(match mode {
            ProcessingMode::Stencil => Kernel::Alpha(stencil_alpha(decode_or_default())),
            ProcessingMode::SoftMask => {
                Kernel::Alpha(soft_mask_alpha(desc.bits_per_component(), decode_or_default()))
            }
            ProcessingMode::DirectGray => Kernel::DirectGray,
            ProcessingMode::DirectRgb => Kernel::DirectRgb,
            ProcessingMode::DirectRgb16 => Kernel::DirectRgb16,
            ProcessingMode::Lookup | ProcessingMode::Convert => {
                let converter = desc
                    .color_space()
                    .ok_or_else(|| Error::InvalidImage("image without a color space".into()))?;
                let intent = desc.intent().unwrap_or(options.intent);
                // built here, outside the parallel region
                let sampler = converter.rgba_sampler(intent);
                let decode = DecodeLut::new(desc);
                let key = desc
                    .color_key()
                    .map(|ranges| ColorKeyLut::new(desc.bits_per_component(), ranges));
                if mode == ProcessingMode::Lookup {
                    let table = (0..decode.size())
                        .map(|code| {
                            let mut rgba = rgba_to_u8(sampler.sample(&[decode.get(0, code)]));
                            if key.as_ref().is_some_and(|k| k.contains(0, code)) {
                                rgba[3] = 0;
                            }
                            rgba
                        })
                        .collect();
                    Kernel::Lookup(table)
                } else {
                    Kernel::Convert { decode, key, sampler }
                }
            }
        })
    }

    pub fn mode(&self) -> ProcessingMode {
        self.mode
    }

    pub fn output_format(&self) -> PixelFormat {
        self.mode.output_format()
    }

    pub fn descriptor(&self) -> &ImageDescriptor {
        &self.descriptor
    }

    /// Allocate the zero-filled output buffer
    pub fn initialize_buffer(&mut self) {
        assert!(self.image.is_none(), "initialize_buffer called twice");
        self.image = Some(DecodedImage::new(
            self.descriptor.width(),
            self.descriptor.height(),
            self.output_format(),
        ));
    }

    /// Convert sample row `index`; a short row is padded with zero samples
    pub fn write_row(&mut self, index: usize, row: &[u8]) {
        let Some(image) = self.image.as_mut() else {
            panic!("write_row before initialize_buffer");
        };
        assert!(
            index < self.descriptor.height(),
            "row {index} out of range for height {}",
            self.descriptor.height()
        );
        let stride = image.stride();
        match image.data_mut() {
            PixelData::U8(buf) => {
                self.kernel
                    .write_u8(&self.descriptor, row, &mut buf[index * stride..(index + 1) * stride]);
            }
            PixelData::U16(buf) => {
                let stride = stride / 2;
                self.kernel
                    .write_u16(&self.descriptor, row, &mut buf[index * stride..(index + 1) * stride]);
            }
        }
    }

    /// Convert every row of a packed sample buffer. Rows missing from the
    /// end of `data` stay transparent black.
    pub fn write_rows(&mut self, data: &[u8]) {
        let Some(image) = self.image.as_mut() else {
            panic!("write_rows before initialize_buffer");
        };
        let row_bytes = self.descriptor.row_bytes();
        let height = self.descriptor.height();
        let available = data.len().div_ceil(row_bytes);
        if available < height {
            warn!("image data covers {available} of {height} rows");
        }

        let (desc, kernel) = (&self.descriptor, &self.kernel);
        let stride = image.stride();
        trace!("writing {height} rows, parallel {}", self.parallel);
        match image.data_mut() {
            PixelData::U8(buf) => {
                let work = |(y, out): (usize, &mut [u8])| {
                    if let Some(src) = sample_row(data, row_bytes, y) {
                        kernel.write_u8(desc, src, out);
                    }
                };
                if self.parallel {
                    buf.par_chunks_mut(stride).enumerate().for_each(work);
                } else {
                    buf.chunks_mut(stride).enumerate().for_each(work);
                }
            }
            PixelData::U16(buf) => {
                let work = |(y, out): (usize, &mut [u16])| {
                    if let Some(src) = sample_row(data, row_bytes, y) {
                        kernel.write_u16(desc, src, out);
                    }
                };
                if self.parallel {
                    buf.par_chunks_mut(stride / 2).enumerate().for_each(work);
                } else {
                    buf.chunks_mut(stride / 2).enumerate().for_each(work);
                }
            }
        }
    }

    /// Hand over the finished image
    pub fn finish(self) -> DecodedImage {
        match self.image {
            Some(image) => image,
            None => panic!("finish before initialize_buffer"),
        }
    }
}
