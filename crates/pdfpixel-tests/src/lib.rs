//! # pdfpixel-tests
//!
//! Integration tests for pdfpixel.
//!
//! This crate provides:
//! - Encoders that produce synthetic CCITT, LZW and baseline JPEG streams
//! - A builder for small ICC profiles
//! - Seeded sample patterns for image rows
//!
//! ## Test Categories
//!
//! 1. **Image pipeline**: descriptor to pixels, fast paths, masks, cache
//! 2. **CCITT**: Group 3 and Group 4 rows against an independent encoder
//! 3. **Functions**: sampled, exponential, stitching and PostScript
//! 4. **Color spaces**: CIE, ICC, Indexed, Separation and DeviceN
//! 5. **Filters**: ASCII, RunLength, LZW, predictors, JPEG
//! 6. **Properties**: decode formulas and interpolation invariants

pub mod ccitt;
pub mod icc;
pub mod jpeg;
pub mod lzw;
pub mod patterns;

use anyhow::Context;
use log::debug;
use pdfpixel_core::{DecodeOptions, DecodedImage, FilterSpec, ImageDescriptor, decode_image};

pub use ccitt::{BitWriter, encode_g3_1d, encode_g3_mixed, encode_g4, pack_rows};
pub use icc::ProfileBuilder;
pub use patterns::{SamplePattern, generate_samples};

/// Route `log` output through env_logger once per test binary
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Every pixel of `image` as RGBA8, row by row
pub fn rgba_pixels(image: &DecodedImage) -> Vec<[u8; 4]> {
    (0..image.height())
        .flat_map(|y| (0..image.width()).map(move |x| (x, y)))
        .filter_map(|(x, y)| image.rgba8_at(x, y))
        .collect()
}

/// Decode an image stream with default options
pub fn decode_pixels(
    descriptor: &ImageDescriptor,
    encoded: &[u8],
    filters: &[FilterSpec],
) -> anyhow::Result<DecodedImage> {
    let names: Vec<&str> = filters.iter().map(FilterSpec::name).collect();
    debug!("decoding {} encoded bytes through {names:?}", encoded.len());
    decode_image(descriptor, encoded, filters, &DecodeOptions::default())
        .with_context(|| format!("decoding {}x{} image through {names:?}", descriptor.width(), descriptor.height()))
}
