//! # pdfpixel - PDF image decoding core
//!
//! Everything between an image XObject's filtered stream bytes and a
//! tagged pixel buffer:
//!
//! - **Filters**: ASCIIHex, ASCII85, LZW, Flate, RunLength, CCITT fax and
//!   DCT (JPEG), with TIFF and PNG predictors
//! - **Color**: device, CIE-based, ICC-based, Indexed, Separation and
//!   DeviceN color spaces, converted to sRGB
//! - **Functions**: PDF function types 0, 2, 3 and 4 for tint transforms
//! - **Images**: Decode arrays, color-key masks, stencil and soft masks,
//!   Matte, parallel row conversion
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use pdfpixel_core::{ColorSpace, Converter, DecodeOptions, FilterSpec, ImageDescriptor};
//!
//! let rgb = Arc::new(Converter::new(ColorSpace::DeviceRgb));
//! let descriptor = ImageDescriptor::new(640, 480, 8).with_color_space(rgb);
//! # let stream: Vec<u8> = Vec::new();
//! let image = pdfpixel_core::decode_image(
//!     &descriptor,
//!     &stream,
//!     &[FilterSpec::from_name("FlateDecode").unwrap()],
//!     &DecodeOptions::default(),
//! )
//! .unwrap();
//! assert_eq!(image.stride(), 640 * 4);
//! ```

pub mod bits;
pub mod cache;
pub mod color;
pub mod config;
pub mod error;
pub mod filter;
pub mod function;
pub mod icc;
pub mod image;
pub mod math;
pub mod simd;
pub mod transform;

pub use cache::{CacheOptions, CachedPicture, PictureCache, PictureHandle};
pub use color::{ColorSpace, Converter, Sampler};
pub use config::{DecodeOptions, RenderingIntent};
pub use error::{Error, Result};
pub use filter::{FilterLimits, FilterSpec, decode_filters, decode_filters_with_limits};
pub use function::PdfFunction;
pub use image::{
    DecodedImage, ImageDescriptor, ImageRowProcessor, ImageSource, PixelFormat, ProcessingMode,
    decode_image, decode_masked_image, render_image,
};
pub use transform::ColorTransform;

/// Version of pdfpixel
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
