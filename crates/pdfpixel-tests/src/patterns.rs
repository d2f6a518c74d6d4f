//! Sample patterns for image rows
//!
//! Patterns produce packed sample bytes at any bit depth, so the same
//! pattern can drive 1-bit masks and 16-bit RGB.

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

#[derive(Debug, Clone, Copy)]
pub enum SamplePattern {
    /// Codes rising left to right across the full code range
    Ramp,
    /// Every sample at the maximum code
    Full,
    /// Every sample zero
    Zero,
    /// Random codes with seed
    Random(u64),
}

/// Pack codes MSB-first at `bpc` bits each, rows padded to a byte
pub fn pack_codes(codes: &[u32], per_row: usize, bpc: u8) -> Vec<u8> {
    assert!(per_row > 0 && codes.len() % per_row == 0, "whole rows");
    let bpc = usize::from(bpc);
    let row_bytes = (per_row * bpc).div_ceil(8);
    let rows = codes.len() / per_row;
    let mut out = vec![0u8; rows * row_bytes];
    for (r, row) in codes.chunks(per_row).enumerate() {
        let base = r * row_bytes * 8;
        for (i, &code) in row.iter().enumerate() {
            for b in 0..bpc {
                if (code >> (bpc - 1 - b)) & 1 == 1 {
                    let bit = base + i * bpc + b;
                    out[bit / 8] |= 0x80 >> (bit % 8);
                }
            }
        }
    }
    out
}

/// Generate `width * height * components` codes and their packed bytes
pub fn generate_samples(
    pattern: SamplePattern,
    width: usize,
    height: usize,
    components: usize,
    bpc: u8,
) -> (Vec<u32>, Vec<u8>) {
    let max = (1u64 << bpc) as u32 - 1;
    let per_row = width * components;
    let codes: Vec<u32> = match pattern {
        SamplePattern::Ramp => (0..height)
            .flat_map(|_| {
                (0..per_row).map(move |i| {
                    let x = i / components;
                    if width > 1 {
                        (x as u64 * u64::from(max) / (width as u64 - 1)) as u32
                    } else {
                        0
                    }
                })
            })
            .collect(),
        SamplePattern::Full => vec![max; per_row * height],
        SamplePattern::Zero => vec![0; per_row * height],
        SamplePattern::Random(seed) => {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            (0..per_row * height).map(|_| rng.gen_range(0..=max)).collect()
        }
    };
    let packed = pack_codes(&codes, per_row, bpc);
    (codes, packed)
}

/// Random bitonal rows, `density` the chance of a black pixel
pub fn random_bitonal(seed: u64, width: usize, height: usize, density: f64) -> Vec<Vec<bool>> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..height)
        .map(|_| (0..width).map(|_| rng.gen_bool(density)).collect())
        .collect()
}

/// Bitonal rows made of long runs, with runs carried over between rows
pub fn blocky_bitonal(seed: u64, width: usize, height: usize) -> Vec<Vec<bool>> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut rows: Vec<Vec<bool>> = Vec::with_capacity(height);
    for y in 0..height {
        let mut row = match rows.last() {
            Some(prev) if y % 3 != 0 => prev.clone(),
            _ => vec![false; width],
        };
        let start = rng.gen_range(0..width);
        let len = rng.gen_range(1..=width - start);
        let color = rng.gen_bool(0.5);
        row[start..start + len].fill(color);
        rows.push(row);
    }
    rows
}
