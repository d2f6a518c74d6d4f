//! End-to-end image decoding: descriptor, filters and row conversion

use std::sync::Arc;

use pdfpixel_core::color::{ColorSpace, Converter, Indexed};
use pdfpixel_core::filter::{CcittParams, FilterSpec, JpegParams};
use pdfpixel_core::{
    CacheOptions, DecodeOptions, Error, ImageDescriptor, ImageRowProcessor,
    ImageSource, PictureCache, PixelFormat, ProcessingMode, decode_image, decode_masked_image,
};
use pdfpixel_tests::jpeg::FlatJpeg;
use pdfpixel_tests::patterns::{SamplePattern, generate_samples, pack_codes, random_bitonal};
use pdfpixel_tests::{decode_pixels, encode_g4, init_logging, lzw, rgba_pixels};

fn space(cs: ColorSpace) -> Arc<Converter> {
    Arc::new(Converter::new(cs))
}

#[test]
fn test_rgb_fast_path_is_identity() {
    init_logging();
    let (codes, packed) = generate_samples(SamplePattern::Random(1), 17, 9, 3, 8);
    let desc = ImageDescriptor::new(17, 9, 8).with_color_space(space(ColorSpace::DeviceRgb));

    let processor = ImageRowProcessor::new(&desc, &DecodeOptions::default()).unwrap();
    assert_eq!(processor.mode(), ProcessingMode::DirectRgb);

    let img = decode_image(&desc, &packed, &[], &DecodeOptions::default()).unwrap();
    assert_eq!(img.format(), PixelFormat::Rgba8888);
    for (px, rgb) in rgba_pixels(&img).iter().zip(codes.chunks(3)) {
        assert_eq!(&px[..3], &[rgb[0] as u8, rgb[1] as u8, rgb[2] as u8]);
        assert_eq!(px[3], 255);
    }
}

#[test]
fn test_conversion_path_matches_fast_path() {
    init_logging();
    for cs in [ColorSpace::DeviceRgb, ColorSpace::DeviceGray] {
        let n = cs.components();
        let (_, packed) = generate_samples(SamplePattern::Random(2), 33, 5, n, 8);
        let desc = ImageDescriptor::new(33, 5, 8).with_color_space(space(cs));
        let fast = decode_image(&desc, &packed, &[], &DecodeOptions::default()).unwrap();
        let slow = decode_image(&desc, &packed, &[], &DecodeOptions::default().without_fast_path()).unwrap();
        assert_eq!(slow.format(), PixelFormat::Rgba8888);
        assert_eq!(rgba_pixels(&fast), rgba_pixels(&slow));
    }
}

#[test]
fn test_parallel_rows_match_sequential() {
    let (_, packed) = generate_samples(SamplePattern::Random(3), 64, 64, 4, 8);
    let desc = ImageDescriptor::new(64, 64, 8).with_color_space(space(ColorSpace::DeviceCmyk));
    let seq = decode_image(&desc, &packed, &[], &DecodeOptions::default().sequential()).unwrap();
    let par = decode_image(&desc, &packed, &[], &DecodeOptions::default().with_parallel_threshold(1)).unwrap();
    assert_eq!(seq.as_bytes(), par.as_bytes());
}

#[test]
fn test_rgb16_keeps_full_precision() {
    let (codes, packed) = generate_samples(SamplePattern::Random(4), 5, 3, 3, 16);
    let desc = ImageDescriptor::new(5, 3, 16).with_color_space(space(ColorSpace::DeviceRgb));
    let img = decode_image(&desc, &packed, &[], &DecodeOptions::default()).unwrap();
    assert_eq!(img.format(), PixelFormat::Rgba16161616);
    let data = img.as_u16().unwrap();
    for (px, rgb) in data.chunks_exact(4).zip(codes.chunks(3)) {
        assert_eq!(&px[..3], &[rgb[0] as u16, rgb[1] as u16, rgb[2] as u16]);
        assert_eq!(px[3], u16::MAX);
    }
}

#[test]
fn test_color_key_covering_domain_masks_everything() {
    let (_, packed) = generate_samples(SamplePattern::Random(5), 8, 4, 3, 8);
    let desc = ImageDescriptor::new(8, 4, 8)
        .with_color_space(space(ColorSpace::DeviceRgb))
        .with_color_key(vec![(0, 255); 3]);
    let img = decode_image(&desc, &packed, &[], &DecodeOptions::default()).unwrap();
    assert!(rgba_pixels(&img).iter().all(|px| px[3] == 0));
}

#[test]
fn test_color_key_outside_domain_masks_nothing() {
    let (_, packed) = generate_samples(SamplePattern::Random(6), 8, 4, 1, 4);
    let desc = ImageDescriptor::new(8, 4, 4)
        .with_color_space(space(ColorSpace::DeviceGray))
        .with_color_key(vec![(16, 40)]);
    let img = decode_image(&desc, &packed, &[], &DecodeOptions::default()).unwrap();
    assert!(rgba_pixels(&img).iter().all(|px| px[3] == 255));
}

#[test]
fn test_color_key_masks_matching_codes_only() {
    // gray codes 0..=3 at 2 bits, key masks 1..=2
    let packed = pack_codes(&[0, 1, 2, 3], 4, 2);
    let desc = ImageDescriptor::new(4, 1, 2)
        .with_color_space(space(ColorSpace::DeviceGray))
        .with_color_key(vec![(1, 2)]);
    let img = decode_image(&desc, &packed, &[], &DecodeOptions::default()).unwrap();
    let alphas: Vec<u8> = rgba_pixels(&img).iter().map(|px| px[3]).collect();
    assert_eq!(alphas, vec![255, 0, 0, 255]);
}

#[test]
fn test_inverted_decode() {
    let desc = ImageDescriptor::new(3, 1, 8)
        .with_color_space(space(ColorSpace::DeviceGray))
        .with_decode(vec![(1.0, 0.0)]);
    let img = decode_image(&desc, &[0, 51, 255], &[], &DecodeOptions::default()).unwrap();
    let grays: Vec<u8> = rgba_pixels(&img).iter().map(|px| px[0]).collect();
    assert_eq!(grays, vec![255, 204, 0]);
}

#[test]
fn test_cmyk_extremes() {
    let desc = ImageDescriptor::new(3, 1, 8).with_color_space(space(ColorSpace::DeviceCmyk));
    let samples = [0, 0, 0, 0, 0, 0, 0, 255, 255, 0, 0, 0];
    let img = decode_image(&desc, &samples, &[], &DecodeOptions::default()).unwrap();
    assert_eq!(
        rgba_pixels(&img),
        vec![[255, 255, 255, 255], [0, 0, 0, 255], [0, 255, 255, 255]]
    );
}

#[test]
fn test_indexed_palette_lookup() {
    let palette = vec![255, 0, 0, 0, 255, 0, 0, 0, 255];
    let indexed = Indexed::new(Converter::new(ColorSpace::DeviceRgb), 2, palette).unwrap();
    let desc = ImageDescriptor::new(4, 1, 4).with_color_space(space(ColorSpace::Indexed(indexed)));
    // index 3 is past hival and clamps to the last entry
    let packed = pack_codes(&[0, 1, 2, 3], 4, 4);
    let img = decode_image(&desc, &packed, &[], &DecodeOptions::default()).unwrap();
    assert_eq!(
        rgba_pixels(&img),
        vec![[255, 0, 0, 255], [0, 255, 0, 255], [0, 0, 255, 255], [0, 0, 255, 255]]
    );
}

#[test]
fn test_stencil_mask_paints_zero_bits() {
    let desc = ImageDescriptor::new(8, 1, 1).image_mask();
    let img = decode_image(&desc, &[0b1010_0000], &[], &DecodeOptions::default()).unwrap();
    assert_eq!(img.format(), PixelFormat::Alpha8);
    assert_eq!(img.as_bytes(), &[0, 255, 0, 255, 255, 255, 255, 255]);

    let inverted = desc.clone().with_decode(vec![(1.0, 0.0)]);
    let img = decode_image(&inverted, &[0b1010_0000], &[], &DecodeOptions::default()).unwrap();
    assert_eq!(img.as_bytes(), &[255, 0, 255, 0, 0, 0, 0, 0]);
}

#[test]
fn test_ccitt_stencil_through_filter_chain() {
    let rows = random_bitonal(11, 40, 12, 0.3);
    let encoded = encode_g4(&rows, 40, true);
    let params = CcittParams {
        black_is_1: true,
        ..CcittParams::group4(40, 12)
    };
    let desc = ImageDescriptor::new(40, 12, 1).image_mask();
    let img = decode_image(&desc, &encoded, &[FilterSpec::CcittFax(params)], &DecodeOptions::default()).unwrap();
    for (y, row) in rows.iter().enumerate() {
        for (x, &black) in row.iter().enumerate() {
            // black samples decode to 1, which does not paint
            let expected = if black { 0 } else { 255 };
            assert_eq!(img.row(y)[x], expected, "pixel ({x}, {y})");
        }
    }
}

#[test]
fn test_lzw_encoded_gray() -> anyhow::Result<()> {
    let (codes, packed) = generate_samples(SamplePattern::Ramp, 50, 4, 1, 8);
    let encoded = lzw::encode(&packed, true);
    let filter = FilterSpec::from_name("LZWDecode")?;
    let desc = ImageDescriptor::new(50, 4, 8).with_color_space(space(ColorSpace::DeviceGray));
    let img = decode_pixels(&desc, &encoded, &[filter])?;
    assert_eq!(img.format(), PixelFormat::Gray8);
    let expected: Vec<u8> = codes.iter().map(|&c| c as u8).collect();
    assert_eq!(img.as_bytes(), expected.as_slice());
    Ok(())
}

#[test]
fn test_dct_rgb_image() -> anyhow::Result<()> {
    let levels = vec![200, 100, 50, 10, 20, 30];
    let encoded = FlatJpeg::rgb(16, 8, levels).encode();
    let desc = ImageDescriptor::new(16, 8, 8).with_color_space(space(ColorSpace::DeviceRgb));
    let filters = [FilterSpec::Dct(JpegParams::default())];
    let img = decode_pixels(&desc, &encoded, &filters)?;
    assert_eq!(img.rgba8_at(0, 0), Some([200, 100, 50, 255]));
    assert_eq!(img.rgba8_at(15, 7), Some([10, 20, 30, 255]));
    Ok(())
}

#[test]
fn test_short_data_leaves_rows_transparent() {
    let desc = ImageDescriptor::new(2, 3, 8).with_color_space(space(ColorSpace::DeviceRgb));
    let img = decode_image(&desc, &[9; 6], &[], &DecodeOptions::default()).unwrap();
    assert_eq!(img.rgba8_at(1, 0), Some([9, 9, 9, 255]));
    assert_eq!(img.rgba8_at(0, 2), Some([0, 0, 0, 0]));
}

#[test]
fn test_pixel_limit() {
    let desc = ImageDescriptor::new(100, 100, 8).with_color_space(space(ColorSpace::DeviceGray));
    let options = DecodeOptions::default().with_max_pixels(9_999);
    assert!(matches!(
        ImageRowProcessor::new(&desc, &options),
        Err(Error::ImageTooLarge { .. })
    ));
}

#[test]
fn test_stream_dimensions_checked_against_pixel_limit() {
    // SOI, SOF0 declaring 65535x65535 with three components, EOI
    let mut jpeg = vec![0xFF, 0xD8, 0xFF, 0xC0, 0x00, 0x11, 8, 0xFF, 0xFF, 0xFF, 0xFF, 3];
    jpeg.extend_from_slice(&[1, 0x11, 0, 2, 0x11, 0, 3, 0x11, 0]);
    jpeg.extend_from_slice(&[0xFF, 0xD9]);
    let desc = ImageDescriptor::new(1, 1, 8).with_color_space(space(ColorSpace::DeviceRgb));
    let options = DecodeOptions::default().with_max_pixels(100);
    let result = decode_image(&desc, &jpeg, &[FilterSpec::Dct(JpegParams::default())], &options);
    assert!(matches!(result, Err(Error::ImageTooLarge { width: 65535, height: 65535, limit: 100 })));

    let fax = FilterSpec::CcittFax(CcittParams::group4(1 << 24, 0));
    let mask = ImageDescriptor::new(1, 1, 1).image_mask();
    let result = decode_image(&mask, &[0x80], &[fax], &options);
    assert!(matches!(result, Err(Error::ImageTooLarge { .. })));
}

#[test]
fn test_flate_bomb_is_cut_at_image_size() -> anyhow::Result<()> {
    use flate2::Compression;
    use flate2::write::ZlibEncoder;
    use std::io::Write;

    let mut enc = ZlibEncoder::new(Vec::new(), Compression::best());
    enc.write_all(&vec![0x80u8; 8 << 20])?;
    let compressed = enc.finish()?;
    let desc = ImageDescriptor::new(4, 2, 8).with_color_space(space(ColorSpace::DeviceGray));
    let filter = FilterSpec::from_name("FlateDecode")?;
    let limits = pdfpixel_core::FilterLimits::for_image(&desc, &DecodeOptions::default());
    let bytes = pdfpixel_core::decode_filters_with_limits(&compressed, &[filter.clone()], &limits)?;
    assert!(bytes.len() < 2 << 20);

    let img = decode_image(&desc, &compressed, &[filter], &DecodeOptions::default())?;
    assert_eq!(img.rgba8_at(3, 1), Some([0x80, 0x80, 0x80, 255]));
    Ok(())
}

#[test]
fn test_soft_mask_and_matte() {
    init_logging();
    let image_desc = ImageDescriptor::new(2, 1, 8).with_color_space(space(ColorSpace::DeviceGray));
    let mask_desc = ImageDescriptor::new(2, 1, 8).soft_mask().with_matte(vec![1.0]);
    // black pre-blended against a white matte at alpha 128 stores 127
    let image = ImageSource::new(&image_desc, &[127, 255], &[]);
    let mask = ImageSource::new(&mask_desc, &[128, 0], &[]);
    let img = decode_masked_image(image, mask, &DecodeOptions::default()).unwrap();
    assert_eq!(img.format(), PixelFormat::Rgba8888);
    assert_eq!(img.rgba8_at(0, 0), Some([0, 0, 0, 128]));
    // zero alpha is left alone
    assert_eq!(img.rgba8_at(1, 0), Some([255, 255, 255, 0]));
}

#[test]
fn test_soft_mask_resampled_to_image() {
    let image_desc = ImageDescriptor::new(4, 2, 8).with_color_space(space(ColorSpace::DeviceRgb));
    let mask_desc = ImageDescriptor::new(2, 1, 4).soft_mask();
    let samples = vec![50u8; 4 * 2 * 3];
    let image = ImageSource::new(&image_desc, &samples, &[]);
    let mask = ImageSource::new(&mask_desc, &[0xF0], &[]);
    let img = decode_masked_image(image, mask, &DecodeOptions::default()).unwrap();
    let alphas: Vec<u8> = rgba_pixels(&img).iter().map(|px| px[3]).collect();
    assert_eq!(alphas, vec![255, 255, 0, 0, 255, 255, 0, 0]);
}

#[test]
fn test_cache_handles_go_stale() {
    let cache = PictureCache::new(CacheOptions::new().with_thumbnail_size(4));
    let desc = ImageDescriptor::new(8, 8, 8).with_color_space(space(ColorSpace::DeviceGray));
    let picture = decode_image(&desc, &[128; 64], &[], &DecodeOptions::default()).unwrap();

    let first = cache.insert(picture.clone(), 0, 1.0);
    let second = cache.insert(picture.clone(), 5, 2.0);
    assert_eq!(cache.len(), 2);
    let entry = cache.get(first).unwrap();
    let thumb = entry.thumbnail.as_ref().unwrap();
    assert_eq!((thumb.width(), thumb.height()), (4, 4));

    assert_eq!(cache.invalidate_scale(2.0, 0.01), 1);
    assert!(cache.get(first).is_none());
    assert!(cache.get(second).is_some());

    // the freed slot is reused under a new generation
    let third = cache.insert(picture, 1, 2.0);
    assert_ne!(first, third);
    assert!(cache.get(first).is_none());
    assert_eq!(cache.get(third).map(|p| p.page), Some(1));

    assert_eq!(cache.retain_window(0..2), 1);
    assert!(cache.get(second).is_none());
    cache.clear();
    assert!(cache.is_empty());
}
