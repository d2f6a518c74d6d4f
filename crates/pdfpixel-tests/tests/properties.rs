//! Property-based tests over randomly generated inputs

use std::sync::Arc;

use pdfpixel_core::filter::ccitt::{self, CcittParams};
use pdfpixel_core::filter::{ascii, run_length};
use pdfpixel_core::image::DecodeLut;
use pdfpixel_core::transform::Clut;
use pdfpixel_core::{ColorSpace, Converter, DecodeOptions, ImageDescriptor, decode_image};
use pdfpixel_tests::patterns::random_bitonal;
use pdfpixel_tests::{encode_g4, pack_rows};
use proptest::prelude::*;

fn clamp01(v: f32) -> f32 {
    v.clamp(0.0, 1.0)
}

/// Literal-only RunLength encoding
fn run_length_literals(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    for chunk in data.chunks(128) {
        out.push((chunk.len() - 1) as u8);
        out.extend_from_slice(chunk);
    }
    out.push(128);
    out
}

// ============================================================================
// Lookup tables
// ============================================================================

/// Property: every table entry follows the Decode formula, clamped
proptest! {
    #[test]
    fn prop_decode_lut_formula(
        bpc in prop::sample::select(vec![1u8, 2, 4, 8, 16]),
        d0 in -2.0f32..2.0,
        d1 in -2.0f32..2.0,
    ) {
        let lut = DecodeLut::from_ranges(bpc, &[(d0, d1)], &[(0.0, 1.0)]);
        let size = if bpc == 16 { 256 } else { 1usize << bpc };
        prop_assert_eq!(lut.size(), size);
        prop_assert_eq!(lut.components(), 1);

        let max = (size - 1) as f32;
        for code in 0..size {
            let expected = clamp01(d0 + code as f32 / max * (d1 - d0));
            let actual = lut.get(0, code);
            prop_assert!((actual - expected).abs() < 1e-5, "code {} gave {} not {}", code, actual, expected);
        }
    }
}

/// Property: the table is monotonic in the direction of the Decode pair
proptest! {
    #[test]
    fn prop_decode_lut_monotonic(bpc in prop::sample::select(vec![1u8, 2, 4, 8]), d0 in 0.0f32..1.0, d1 in 0.0f32..1.0) {
        let lut = DecodeLut::from_ranges(bpc, &[(d0, d1)], &[(0.0, 1.0)]);
        let values = lut.component(0);
        for pair in values.windows(2) {
            if d1 >= d0 {
                prop_assert!(pair[1] >= pair[0] - 1e-6);
            } else {
                prop_assert!(pair[1] <= pair[0] + 1e-6);
            }
        }
        prop_assert!((values[0] - d0).abs() < 1e-5);
        prop_assert!((values[values.len() - 1] - d1).abs() < 1e-5);
    }
}

// ============================================================================
// CLUT interpolation
// ============================================================================

/// Property: sampling exactly on a grid vertex returns the stored value
proptest! {
    #[test]
    fn prop_clut_exact_at_vertices(
        inputs in 1usize..=4,
        grid in 2usize..=5,
        seed in any::<u64>(),
        pick in any::<u64>(),
    ) {
        let points = grid.pow(inputs as u32);
        let data: Vec<f32> = (0..points * 3)
            .map(|i| ((seed.wrapping_add(i as u64).wrapping_mul(2_654_435_761)) % 1000) as f32 / 1000.0)
            .collect();
        let clut = Clut::uniform(inputs, grid, 3, data).unwrap();

        let mut rest = pick;
        let coords: Vec<usize> = (0..inputs)
            .map(|_| {
                let c = (rest % grid as u64) as usize;
                rest /= grid as u64;
                c
            })
            .collect();
        let input: Vec<f32> = coords.iter().map(|&c| c as f32 / (grid - 1) as f32).collect();
        let mut out = [0f32; 3];
        clut.sample(&input, &mut out);
        for (a, e) in out.iter().zip(clut.vertex(&coords)) {
            prop_assert!((a - e).abs() < 1e-4, "{:?} vs {:?}", out, clut.vertex(&coords));
        }
    }
}

/// Property: interpolated values stay within the range of the table
proptest! {
    #[test]
    fn prop_clut_bounded(x in 0.0f32..=1.0, y in 0.0f32..=1.0, z in 0.0f32..=1.0) {
        let data: Vec<f32> = (0..27).map(|i| (i % 7) as f32 / 6.0).collect();
        let clut = Clut::uniform(3, 3, 1, data).unwrap();
        let mut out = [0f32; 1];
        clut.sample(&[x, y, z], &mut out);
        prop_assert!((-1e-5..=1.0 + 1e-5).contains(&out[0]));
    }
}

// ============================================================================
// Filters
// ============================================================================

/// Property: Group 4 streams from the reference encoder decode to the rows
proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]
    #[test]
    fn prop_group4_round_trip(
        seed in any::<u64>(),
        width in 1usize..400,
        height in 1usize..12,
        density in 0.0f64..1.0,
    ) {
        let rows = random_bitonal(seed, width, height, density);
        let data = encode_g4(&rows, width, false);
        let out = ccitt::decode(&data, &CcittParams::group4(width, height)).unwrap();
        prop_assert_eq!(out, pack_rows(&rows, width, false));
    }
}

/// Property: hex encoding decodes back to the original bytes
proptest! {
    #[test]
    fn prop_ascii_hex_round_trip(data in prop::collection::vec(any::<u8>(), 0..256)) {
        let hex: String = data.iter().map(|b| format!("{b:02X} ")).collect();
        prop_assert_eq!(ascii::decode_hex(hex.as_bytes()).unwrap(), data);
    }
}

/// Property: literal runs of any length decode unchanged
proptest! {
    #[test]
    fn prop_run_length_literals(data in prop::collection::vec(any::<u8>(), 0..600)) {
        prop_assert_eq!(run_length::decode(&run_length_literals(&data)), data);
    }
}

// ============================================================================
// Image pipeline
// ============================================================================

/// Property: the direct fast path matches the general conversion
proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]
    #[test]
    fn prop_fast_path_matches_conversion(
        width in 1usize..24,
        height in 1usize..6,
        rgb in any::<bool>(),
        seed in any::<u8>(),
    ) {
        let (space, n) = if rgb { (ColorSpace::DeviceRgb, 3) } else { (ColorSpace::DeviceGray, 1) };
        let desc = ImageDescriptor::new(width, height, 8).with_color_space(Arc::new(Converter::new(space)));
        let data: Vec<u8> = (0..width * height * n)
            .map(|i| (i as u8).wrapping_mul(37).wrapping_add(seed))
            .collect();

        let fast = decode_image(&desc, &data, &[], &DecodeOptions::default()).unwrap();
        let slow = decode_image(&desc, &data, &[], &DecodeOptions::default().without_fast_path()).unwrap();
        for y in 0..height {
            for x in 0..width {
                prop_assert_eq!(fast.rgba8_at(x, y), slow.rgba8_at(x, y));
            }
        }
    }
}
