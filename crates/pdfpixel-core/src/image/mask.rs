//! Soft mask compositing and de-matting

use log::debug;
use smallvec::SmallVec;

use super::lut::MATTE_RECIPROCAL;
use super::{DecodedImage, PixelData, PixelFormat};
use crate::color::Converter;
use crate::config::RenderingIntent;
use crate::error::{Error, Result};
use crate::simd;

fn promote_gray(image: &mut DecodedImage) {
    let rgba: Vec<u8> = image
        .as_bytes()
        .iter()
        .flat_map(|&g| [g, g, g, 255])
        .collect();
    *image = DecodedImage {
        width: image.width,
        height: image.height,
        stride: image.width * 4,
        format: PixelFormat::Rgba8888,
        data: PixelData::U8(rgba),
    };
}

/// Store `mask` (Alpha8 or Gray8) in the alpha channel of `image`,
/// resampling it to the image size by nearest neighbour. Gray8 images are
/// widened to RGBA8888 first.
pub fn apply_soft_mask(image: &mut DecodedImage, mask: &DecodedImage) -> Result<()> {
    if !matches!(mask.format(), PixelFormat::Alpha8 | PixelFormat::Gray8) {
        return Err(Error::InvalidImage(format!(
            "soft mask must be single-channel, got {:?}",
            mask.format()
        )));
    }
    if mask.width() == 0 || mask.height() == 0 {
        return Err(Error::InvalidImage(format!(
            "empty {}x{} soft mask",
            mask.width(),
            mask.height()
        )));
    }
    match image.format() {
        PixelFormat::Gray8 => promote_gray(image),
        PixelFormat::Alpha8 => {
            return Err(Error::InvalidImage("soft mask applied to an alpha image".into()));
        }
        _ => {}
    }

    let (w, h) = (image.width(), image.height());
    let (mw, mh) = (mask.width(), mask.height());
    if (mw, mh) != (w, h) {
        debug!("resampling {mw}x{mh} soft mask to {w}x{h}");
    }
    let alpha = mask.as_bytes();
    let columns: Vec<usize> = (0..w).map(|x| x * mw / w).collect();
    let mut row_alpha = vec![0u8; w];

    for y in 0..h {
        let src = &alpha[(y * mh / h) * mw..];
        for (a, &mx) in row_alpha.iter_mut().zip(&columns) {
            *a = src[mx];
        }
        match image.data_mut() {
            PixelData::U8(buf) => simd::fill_alpha8(&mut buf[y * w * 4..(y + 1) * w * 4], &row_alpha),
            PixelData::U16(buf) => simd::fill_alpha16(&mut buf[y * w * 4..(y + 1) * w * 4], &row_alpha),
        }
    }
    Ok(())
}

/// Reverse premultiplication against `matte` (RGB, `0..=1`) using the
/// alpha already in the image
pub fn apply_matte(image: &mut DecodedImage, matte: [f32; 3]) -> Result<()> {
    match (image.format(), image.data_mut()) {
        (PixelFormat::Rgba8888, PixelData::U8(buf)) => {
            simd::dematte_rgba8(buf, matte, &MATTE_RECIPROCAL);
            Ok(())
        }
        (PixelFormat::Rgba16161616, PixelData::U16(buf)) => {
            for px in buf.chunks_exact_mut(4) {
                if px[3] == 0 {
                    continue;
                }
                let a = f32::from(px[3]) / 65535.0;
                for c in 0..3 {
                    let m = matte[c] * 65535.0;
                    let v = m + (f32::from(px[c]) - m) / a;
                    px[c] = (v.clamp(0.0, 65535.0) + 0.5) as u16;
                }
            }
            Ok(())
        }
        (format, _) => Err(Error::InvalidImage(format!("cannot de-matte a {format:?} image"))),
    }
}

/// Resolve a `/Matte` array in `converter`'s space to RGB
pub fn matte_color(converter: &Converter, intent: RenderingIntent, matte: &[f32]) -> Result<[f32; 3]> {
    let ranges = converter.default_decode();
    if matte.len() != ranges.len() {
        return Err(Error::InvalidImage(format!(
            "/Matte has {} values for {} components",
            matte.len(),
            ranges.len()
        )));
    }
    let normalized: SmallVec<[f32; 8]> = matte
        .iter()
        .zip(&ranges)
        .map(|(&v, &(lo, hi))| if hi == lo { 0.0 } else { ((v - lo) / (hi - lo)).clamp(0.0, 1.0) })
        .collect();
    let rgba = converter.rgba_sampler(intent).sample(&normalized);
    Ok([rgba[0], rgba[1], rgba[2]].map(|c| c.clamp(0.0, 1.0)))
}
