//! Per-code lookup tables
//!
//! Every table is indexed by raw sample code. For 1, 2, 4 and 8 bits per
//! component the domain is `2^bpc` codes; 16-bit samples index by their
//! high byte, so their tables have 256 entries.

use std::sync::LazyLock;

use super::ImageDescriptor;
use crate::function::Interval;

#[inline]
fn clamp01(v: f32) -> f32 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}

/// Raw code → normalized sampler input, per component
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeLut {
    size: usize,
    table: Vec<f32>,
}

impl DecodeLut {
    /// Map `code` onto `decode`, then normalize over `normalize`:
    /// `((d0 + code / max * (d1 - d0)) - n0) / (n1 - n0)`, clamped to `0..=1`
    pub fn from_ranges(bits_per_component: u8, decode: &[Interval], normalize: &[Interval]) -> Self {
        let size = 1usize << bits_per_component.min(8);
        let max = (size - 1) as f32;
        let mut table = Vec::with_capacity(size * decode.len());
        for (&(d0, d1), &(n0, n1)) in decode.iter().zip(normalize) {
            let span = n1 - n0;
            table.extend((0..size).map(|code| {
                let raw = d0 + code as f32 / max * (d1 - d0);
                if span == 0.0 { 0.0 } else { clamp01((raw - n0) / span) }
            }));
        }
        Self { size, table }
    }

    /// The decode table for an image, normalized over its color space
    pub fn new(descriptor: &ImageDescriptor) -> Self {
        let default = descriptor.default_decode();
        let decode = descriptor.decode().unwrap_or(&default);
        let normalize = match descriptor.color_space() {
            Some(cs) if !descriptor.is_mask() => cs.default_decode(),
            _ => vec![(0.0, 1.0)],
        };
        Self::from_ranges(descriptor.bits_per_component(), decode, &normalize)
    }

    /// Entries per component
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn components(&self) -> usize {
        self.table.len() / self.size
    }

    pub fn component(&self, index: usize) -> &[f32] {
        &self.table[index * self.size..(index + 1) * self.size]
    }

    #[inline]
    pub fn get(&self, component: usize, code: usize) -> f32 {
        self.table[component * self.size + code]
    }
}

/// Color-key mask: whether each raw code lies inside its component's range
#[derive(Debug, Clone, PartialEq)]
pub struct ColorKeyLut {
    size: usize,
    table: Vec<bool>,
}

impl ColorKeyLut {
    /// Ranges are in raw codes; for 16-bit samples both ends are reduced to
    /// their high byte
    pub fn new(bits_per_component: u8, ranges: &[(u32, u32)]) -> Self {
        let size = 1usize << bits_per_component.min(8);
        let shift = bits_per_component.saturating_sub(8);
        let mut table = Vec::with_capacity(size * ranges.len());
        for &(lo, hi) in ranges {
            let (lo, hi) = ((lo >> shift) as usize, (hi >> shift) as usize);
            table.extend((0..size).map(|code| lo <= code && code <= hi));
        }
        Self { size, table }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn contains(&self, component: usize, code: usize) -> bool {
        self.table[component * self.size + code]
    }

    /// True when every component of the pixel is inside its range
    #[inline]
    pub fn matches(&self, codes: &[usize]) -> bool {
        codes.iter().enumerate().all(|(i, &code)| self.contains(i, code))
    }
}

/// Alpha per code for a stencil mask: a decoded value of 0 paints
pub fn stencil_alpha(decode: Interval) -> Vec<u8> {
    (0..2)
        .map(|code| {
            let v = decode.0 + code as f32 * (decode.1 - decode.0);
            if v < 0.5 { 255 } else { 0 }
        })
        .collect()
}

/// Alpha per code for a soft mask: the decoded gray level
pub fn soft_mask_alpha(bits_per_component: u8, decode: Interval) -> Vec<u8> {
    DecodeLut::from_ranges(bits_per_component, &[decode], &[(0.0, 1.0)])
        .component(0)
        .iter()
        .map(|&v| (v * 255.0 + 0.5) as u8)
        .collect()
}

/// `255 / a` for each alpha value, 0 for `a == 0`
pub static MATTE_RECIPROCAL: LazyLock<[f32; 256]> = LazyLock::new(|| {
    let mut table = [0f32; 256];
    for (a, slot) in table.iter_mut().enumerate().skip(1) {
        *slot = 255.0 / a as f32;
    }
    table
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_identity_8bit() {
        let lut = DecodeLut::from_ranges(8, &[(0.0, 1.0)], &[(0.0, 1.0)]);
        assert_eq!(lut.size(), 256);
        assert_eq!(lut.get(0, 0), 0.0);
        assert_eq!(lut.get(0, 255), 1.0);
        assert!((lut.get(0, 51) - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_decode_inverted_1bit() {
        let lut = DecodeLut::from_ranges(1, &[(1.0, 0.0)], &[(0.0, 1.0)]);
        assert_eq!(lut.component(0), &[1.0, 0.0]);
    }

    #[test]
    fn test_decode_normalizes_lab_ranges() {
        // a* decoded over [-128, 127] then normalized over [-100, 100]
        let lut = DecodeLut::from_ranges(8, &[(-128.0, 127.0)], &[(-100.0, 100.0)]);
        assert_eq!(lut.get(0, 0), 0.0);
        assert_eq!(lut.get(0, 255), 1.0);
        assert!((lut.get(0, 128) - 0.5).abs() < 0.01);
    }

    #[test]
    fn test_color_key_16bit_uses_high_byte() {
        let key = ColorKeyLut::new(16, &[(0x1200, 0x12FF)]);
        assert_eq!(key.size(), 256);
        assert!(key.contains(0, 0x12));
        assert!(!key.contains(0, 0x13));
    }

    #[test]
    fn test_color_key_all_components() {
        let key = ColorKeyLut::new(8, &[(0, 10), (5, 5)]);
        assert!(key.matches(&[3, 5]));
        assert!(!key.matches(&[3, 6]));
    }

    #[test]
    fn test_stencil_alpha() {
        assert_eq!(stencil_alpha((0.0, 1.0)), vec![255, 0]);
        assert_eq!(stencil_alpha((1.0, 0.0)), vec![0, 255]);
    }

    #[test]
    fn test_soft_mask_alpha() {
        let alpha = soft_mask_alpha(2, (0.0, 1.0));
        assert_eq!(alpha, vec![0, 85, 170, 255]);
    }

    #[test]
    fn test_matte_reciprocal() {
        assert_eq!(MATTE_RECIPROCAL[0], 0.0);
        assert_eq!(MATTE_RECIPROCAL[255], 1.0);
        assert_eq!(MATTE_RECIPROCAL[51], 5.0);
    }
}
