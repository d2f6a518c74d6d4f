//! Row kernels
//!
//! Destinations may be longer than the source needs; the extra tail is
//! left untouched.

use multiversion::multiversion;

/// RGB8 → RGBA8888 with opaque alpha
#[multiversion(targets("x86_64+avx2", "x86_64+sse4.1", "aarch64+neon",))]
pub fn expand_rgb8_to_rgba8(src: &[u8], dst: &mut [u8]) {
    assert!(src.len() % 3 == 0);
    assert!(dst.len() >= src.len() / 3 * 4);

    for (s, d) in src.chunks_exact(3).zip(dst.chunks_exact_mut(4)) {
        d[0] = s[0];
        d[1] = s[1];
        d[2] = s[2];
        d[3] = 255;
    }
}

/// Big-endian RGB16 → RGBA16161616 with opaque alpha
#[multiversion(targets("x86_64+avx2", "x86_64+sse4.1", "aarch64+neon",))]
pub fn expand_rgb16_to_rgba16(src: &[u8], dst: &mut [u16]) {
    assert!(src.len() % 6 == 0);
    assert!(dst.len() >= src.len() / 6 * 4);

    for (s, d) in src.chunks_exact(6).zip(dst.chunks_exact_mut(4)) {
        d[0] = u16::from_be_bytes([s[0], s[1]]);
        d[1] = u16::from_be_bytes([s[2], s[3]]);
        d[2] = u16::from_be_bytes([s[4], s[5]]);
        d[3] = u16::MAX;
    }
}

/// Look up one RGBA entry per 8-bit code
#[multiversion(targets("x86_64+avx2", "x86_64+sse4.1", "aarch64+neon",))]
pub fn map_codes_to_rgba(codes: &[u8], table: &[[u8; 4]], dst: &mut [u8]) {
    assert!(dst.len() >= codes.len() * 4);

    for (&code, d) in codes.iter().zip(dst.chunks_exact_mut(4)) {
        d.copy_from_slice(&table[code as usize]);
    }
}

/// Look up one alpha value per code
#[multiversion(targets("x86_64+avx2", "x86_64+sse4.1", "aarch64+neon",))]
pub fn map_codes_to_alpha(codes: &[u8], table: &[u8], dst: &mut [u8]) {
    assert!(dst.len() >= codes.len());

    for (&code, d) in codes.iter().zip(dst.iter_mut()) {
        *d = table[code as usize];
    }
}

/// Write `alpha` into every fourth byte of an RGBA8888 row
#[multiversion(targets("x86_64+avx2", "x86_64+sse4.1", "aarch64+neon",))]
pub fn fill_alpha8(rgba: &mut [u8], alpha: &[u8]) {
    for (px, &a) in rgba.chunks_exact_mut(4).zip(alpha) {
        px[3] = a;
    }
}

/// Write 8-bit `alpha` into the alpha channel of an RGBA16161616 row
#[multiversion(targets("x86_64+avx2", "x86_64+sse4.1", "aarch64+neon",))]
pub fn fill_alpha16(rgba: &mut [u16], alpha: &[u8]) {
    for (px, &a) in rgba.chunks_exact_mut(4).zip(alpha) {
        px[3] = u16::from(a) * 257;
    }
}

/// Undo premultiplication against `matte`: `c = m + (c - m) / a`.
///
/// `reciprocal[a]` holds `255 / a`; fully transparent pixels are left alone.
#[multiversion(targets("x86_64+avx2", "x86_64+sse4.1", "aarch64+neon",))]
pub fn dematte_rgba8(rgba: &mut [u8], matte: [f32; 3], reciprocal: &[f32; 256]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3];
        if a == 0 {
            continue;
        }
        let r = reciprocal[a as usize];
        for c in 0..3 {
            let m = matte[c] * 255.0;
            let v = m + (f32::from(px[c]) - m) * r;
            px[c] = (v.clamp(0.0, 255.0) + 0.5) as u8;
        }
    }
}
