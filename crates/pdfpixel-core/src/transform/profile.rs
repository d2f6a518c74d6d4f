//! Building transforms from parsed ICC profiles

use std::sync::Arc;

use log::debug;

use super::{Clut, ColorTransform, PcsEncoding};
use crate::config::RenderingIntent;
use crate::error::{Error, Result};
use crate::icc::{CurveData, IccColorSpace, IccError, IccProfile, LutAToB, LutMft, TagData, TagSignature};
use crate::math::D50;

/// Transform from normalized device values of `profile` to sRGB.
///
/// Prefers the A2B LUT for `intent` (falling back to A2B0), then the
/// matrix/TRC model for RGB and the gray TRC for gray profiles.
pub fn profile_to_srgb(profile: &IccProfile, intent: RenderingIntent) -> Result<ColorTransform> {
    let to_pcs = match profile.a2b_for_intent(intent) {
        Some(TagData::LutAToB(lut)) => {
            debug!("ICC profile uses an mAB pipeline for {intent:?}");
            a2b_pipeline(lut, pcs_encoding(profile, PcsEncoding::Lab))?
        }
        Some(TagData::Lut(lut)) => {
            debug!("ICC profile uses an mft{} LUT for {intent:?}", lut.precision);
            mft_pipeline(lut, pcs_encoding(profile, PcsEncoding::LabV2))?
        }
        _ => match profile.header.color_space {
            IccColorSpace::Rgb => matrix_shaper(profile)?,
            IccColorSpace::Gray => gray_trc(profile)?,
            other => {
                return Err(Error::Icc(IccError::Unsupported(format!(
                    "{other:?} profile without an A2B LUT"
                ))));
            }
        },
    };
    Ok(ColorTransform::chain([to_pcs, ColorTransform::XyzToSrgb]))
}

fn pcs_encoding(profile: &IccProfile, lab: PcsEncoding) -> Option<PcsEncoding> {
    profile.pcs_is_lab().then_some(lab)
}

/// PCS decode plus Lab to XYZ when needed
fn pcs_to_xyz(lab: Option<PcsEncoding>) -> ColorTransform {
    match lab {
        Some(encoding) => ColorTransform::chain([
            ColorTransform::PcsDecode(encoding),
            ColorTransform::LabToXyz {
                white: D50.map(|c| c as f32),
            },
        ]),
        None => ColorTransform::PcsDecode(PcsEncoding::Xyz),
    }
}

fn curves(set: &Option<Vec<CurveData>>) -> ColorTransform {
    set.as_ref()
        .map_or(ColorTransform::Identity, |c| ColorTransform::Curves(c.clone()))
}

fn table_curves(tables: &[Vec<f32>]) -> ColorTransform {
    ColorTransform::Curves(tables.iter().cloned().map(CurveData::Table).collect())
}

fn a2b_pipeline(lut: &LutAToB, lab: Option<PcsEncoding>) -> Result<ColorTransform> {
    let clut = match &lut.clut {
        Some(clut) => {
            let grid = clut.grid_points.iter().map(|&g| g as usize).collect();
            let table = Clut::new(grid, clut.output_channels as usize, clut.data.clone())?;
            ColorTransform::Clut(Arc::new(table))
        }
        None => ColorTransform::Identity,
    };
    let matrix = lut
        .matrix
        .map_or(ColorTransform::Identity, |m| ColorTransform::Matrix {
            matrix: m.matrix,
            offset: m.offset,
        });
    Ok(ColorTransform::chain([
        curves(&lut.a_curves),
        clut,
        curves(&lut.m_curves),
        matrix,
        curves(&lut.b_curves),
        pcs_to_xyz(lab),
    ]))
}

fn mft_pipeline(lut: &LutMft, lab: Option<PcsEncoding>) -> Result<ColorTransform> {
    let lab = match (lab, lut.precision) {
        (Some(_), 1) => Some(PcsEncoding::Lab),
        (lab, _) => lab,
    };
    let clut = Clut::uniform(
        lut.input_channels as usize,
        lut.grid_points as usize,
        lut.output_channels as usize,
        lut.clut.clone(),
    )?;
    Ok(ColorTransform::chain([
        table_curves(&lut.input_curves),
        ColorTransform::Clut(Arc::new(clut)),
        table_curves(&lut.output_curves),
        pcs_to_xyz(lab),
    ]))
}

fn matrix_shaper(profile: &IccProfile) -> Result<ColorTransform> {
    let colorants = profile
        .colorants()
        .ok_or(IccError::MissingTag(TagSignature::RED_COLORANT.0))?;
    let trcs = profile
        .rgb_trcs()
        .ok_or(IccError::MissingTag(TagSignature::RED_TRC.0))?;

    let mut matrix = [[0f32; 3]; 3];
    for (col, xyz) in colorants.iter().enumerate() {
        for (row, &v) in xyz.iter().enumerate() {
            matrix[row][col] = v as f32;
        }
    }
    Ok(ColorTransform::chain([
        ColorTransform::Curves(trcs.iter().map(|&c| c.clone()).collect()),
        ColorTransform::matrix(matrix),
    ]))
}

fn gray_trc(profile: &IccProfile) -> Result<ColorTransform> {
    let trc = profile
        .gray_trc()
        .ok_or(IccError::MissingTag(TagSignature::GRAY_TRC.0))?;
    let d50 = D50.map(|c| c as f32);
    Ok(ColorTransform::chain([
        ColorTransform::Curves(vec![trc.clone()]),
        ColorTransform::matrix([[d50[0], 0.0, 0.0], [d50[1], 0.0, 0.0], [d50[2], 0.0, 0.0]]),
    ]))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::icc::{IccHeader, ProfileClass, ProfileVersion, XyzNumber};
    use crate::math::{ParametricCurve, ParametricCurveType};

    fn header(space: IccColorSpace) -> IccHeader {
        IccHeader {
            size: 0,
            version: ProfileVersion { major: 4, minor: 3 },
            device_class: ProfileClass::Display,
            color_space: space,
            pcs: IccColorSpace::Xyz,
            rendering_intent: RenderingIntent::Perceptual,
            illuminant: XyzNumber::default(),
        }
    }

    fn xyz_tag(v: [f64; 3]) -> TagData {
        TagData::Xyz(vec![XyzNumber {
            x: crate::icc::S15Fixed16::from_f64(v[0]),
            y: crate::icc::S15Fixed16::from_f64(v[1]),
            z: crate::icc::S15Fixed16::from_f64(v[2]),
        }])
    }

    fn srgb_profile() -> IccProfile {
        let trc = ParametricCurve::from_params(
            ParametricCurveType::Iec61966_2_1,
            &[2.4, 1.0 / 1.055, 0.055 / 1.055, 1.0 / 12.92, 0.04045],
        )
        .unwrap();
        let mut tags = HashMap::new();
        tags.insert(TagSignature::RED_COLORANT.0, xyz_tag([0.4361, 0.2225, 0.0139]));
        tags.insert(TagSignature::GREEN_COLORANT.0, xyz_tag([0.3851, 0.7169, 0.0971]));
        tags.insert(TagSignature::BLUE_COLORANT.0, xyz_tag([0.1431, 0.0606, 0.7141]));
        for sig in [TagSignature::RED_TRC, TagSignature::GREEN_TRC, TagSignature::BLUE_TRC] {
            tags.insert(sig.0, TagData::Curve(CurveData::Parametric(trc)));
        }
        IccProfile {
            header: header(IccColorSpace::Rgb),
            tags,
        }
    }

    #[test]
    fn test_matrix_shaper_round_trip() {
        let transform = profile_to_srgb(&srgb_profile(), RenderingIntent::Perceptual).unwrap();
        for rgb in [[0.0, 0.0, 0.0], [1.0, 1.0, 1.0], [0.5, 0.5, 0.5], [0.8, 0.2, 0.4]] {
            let out = transform.apply(&rgb);
            for (a, b) in out.iter().zip(rgb) {
                assert!((a - b).abs() < 0.02, "{rgb:?} -> {out:?}");
            }
        }
    }

    #[test]
    fn test_gray_trc_profile() {
        let mut tags = HashMap::new();
        tags.insert(TagSignature::GRAY_TRC.0, TagData::Curve(CurveData::Identity));
        let profile = IccProfile {
            header: header(IccColorSpace::Gray),
            tags,
        };
        let transform = profile_to_srgb(&profile, RenderingIntent::RelativeColorimetric).unwrap();
        let white = transform.apply(&[1.0]);
        assert!(white.iter().all(|c| (c - 1.0).abs() < 0.01));
        let black = transform.apply(&[0.0]);
        assert!(black.iter().all(|c| c.abs() < 1e-4));
    }

    #[test]
    fn test_cmyk_without_lut_is_error() {
        let profile = IccProfile {
            header: header(IccColorSpace::Cmyk),
            tags: HashMap::new(),
        };
        assert!(profile_to_srgb(&profile, RenderingIntent::Perceptual).is_err());
    }

    #[test]
    fn test_mft_lut_with_xyz_pcs() {
        // 1 input, 3 outputs: 0 -> black, 1 -> D50 white in u1Fixed15
        let w = D50.map(|c| (c * 32768.0 / 65535.0) as f32);
        let lut = LutMft {
            input_channels: 1,
            output_channels: 3,
            grid_points: 2,
            precision: 2,
            matrix: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
            input_curves: vec![vec![0.0, 1.0]],
            clut: vec![0.0, 0.0, 0.0, w[0], w[1], w[2]],
            output_curves: vec![vec![0.0, 1.0]; 3],
        };
        let mut tags = HashMap::new();
        tags.insert(TagSignature::A2B0.0, TagData::Lut(lut));
        let profile = IccProfile {
            header: header(IccColorSpace::Gray),
            tags,
        };
        // A2B1 is missing, falls back to A2B0
        let transform = profile_to_srgb(&profile, RenderingIntent::RelativeColorimetric).unwrap();
        let white = transform.apply(&[1.0]);
        assert!(white.iter().all(|c| (c - 1.0).abs() < 0.01), "{white:?}");
    }
}
