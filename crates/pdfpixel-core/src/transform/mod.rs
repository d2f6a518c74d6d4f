//! Color transforms
//!
//! A [`ColorTransform`] maps a vector of channel values to another. ICC
//! profiles, CIE-based spaces and post transforms are all expressed as
//! chains of these steps and evaluated in order.

mod clut;
mod profile;

pub use clut::{Clut, MAX_CLUT_INPUTS};
pub use profile::profile_to_srgb;

use std::sync::{Arc, LazyLock};

use smallvec::SmallVec;

use crate::icc::CurveData;
use crate::math::cie::D50_TO_D65_BRADFORD;
use crate::math::matrix::XYZ_TO_SRGB;
use crate::math::{lab_to_xyz, srgb_gamma_encode, xyz_to_lab};

/// Channel buffer used while a transform runs
pub type Channels = SmallVec<[f32; 8]>;

/// Encoding of normalized PCS values produced by ICC LUTs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PcsEncoding {
    /// v4 and 8-bit Lab: L = v * 100, a/b = v * 255 - 128
    Lab,
    /// Legacy 16-bit Lab where 0xFF00 maps to L = 100
    LabV2,
    /// u1Fixed15 XYZ: 1.0 is encoded as 0x8000
    Xyz,
}

impl PcsEncoding {
    fn decode(self, v: [f32; 3]) -> [f32; 3] {
        match self {
            Self::Lab => [v[0] * 100.0, v[1] * 255.0 - 128.0, v[2] * 255.0 - 128.0],
            Self::LabV2 => {
                let s = 65535.0 / 65280.0;
                [v[0] * 100.0 * s, v[1] * 255.0 * s - 128.0, v[2] * 255.0 * s - 128.0]
            }
            Self::Xyz => v.map(|c| c * (65535.0 / 32768.0)),
        }
    }
}

static XYZ_D50_TO_LINEAR_SRGB: LazyLock<[[f32; 3]; 3]> =
    LazyLock::new(|| XYZ_TO_SRGB.multiply(&D50_TO_D65_BRADFORD).to_f32());

/// One step of a color conversion
#[derive(Debug, Clone, PartialEq)]
pub enum ColorTransform {
    Identity,
    /// Per-channel curves; channels without a curve pass through
    Curves(Vec<CurveData>),
    /// `out = matrix * in + offset` on the first three channels
    Matrix { matrix: [[f32; 3]; 3], offset: [f32; 3] },
    Clut(Arc<Clut>),
    /// CIE L*a*b* (real units) to XYZ relative to `white`
    LabToXyz { white: [f32; 3] },
    XyzToLab { white: [f32; 3] },
    PcsDecode(PcsEncoding),
    /// D50 XYZ to gamma-encoded sRGB, clamped to `0.0..=1.0`
    XyzToSrgb,
    Chain(Vec<ColorTransform>),
}

impl ColorTransform {
    /// Compose transforms, flattening nested chains and dropping identities
    pub fn chain(steps: impl IntoIterator<Item = ColorTransform>) -> Self {
        let mut flat = Vec::new();
        for step in steps {
            step.flatten_into(&mut flat);
        }
        match flat.len() {
            0 => Self::Identity,
            1 => flat.pop().unwrap_or(Self::Identity),
            _ => Self::Chain(flat),
        }
    }

    fn flatten_into(self, out: &mut Vec<Self>) {
        match self {
            Self::Chain(inner) => {
                for step in inner {
                    step.flatten_into(out);
                }
            }
            step if step.is_identity() => {}
            step => out.push(step),
        }
    }

    pub fn matrix(matrix: [[f32; 3]; 3]) -> Self {
        Self::Matrix {
            matrix,
            offset: [0.0; 3],
        }
    }

    pub fn is_identity(&self) -> bool {
        match self {
            Self::Identity => true,
            Self::Curves(curves) => curves.iter().all(CurveData::is_identity),
            Self::Chain(steps) => steps.iter().all(Self::is_identity),
            _ => false,
        }
    }

    /// Run the transform on `input`
    pub fn apply(&self, input: &[f32]) -> Channels {
        let mut buf: Channels = SmallVec::from_slice(input);
        self.apply_in_place(&mut buf);
        buf
    }

    fn apply_in_place(&self, buf: &mut Channels) {
        match self {
            Self::Identity => {}
            Self::Curves(curves) => {
                for (v, curve) in buf.iter_mut().zip(curves) {
                    *v = curve.eval(*v);
                }
            }
            Self::Matrix { matrix, offset } => {
                let v = take3(buf);
                let mut out = [0f32; 3];
                for (r, row) in matrix.iter().enumerate() {
                    out[r] = row[0] * v[0] + row[1] * v[1] + row[2] * v[2] + offset[r];
                }
                set3(buf, out);
            }
            Self::Clut(clut) => {
                let mut out: Channels = SmallVec::from_elem(0.0, clut.output_channels());
                clut.sample(buf, &mut out);
                *buf = out;
            }
            Self::LabToXyz { white } => set3(buf, lab_to_xyz(take3(buf), *white)),
            Self::XyzToLab { white } => set3(buf, xyz_to_lab(take3(buf), *white)),
            Self::PcsDecode(encoding) => set3(buf, encoding.decode(take3(buf))),
            Self::XyzToSrgb => {
                let v = take3(buf);
                let m = &*XYZ_D50_TO_LINEAR_SRGB;
                let mut out = [0f32; 3];
                for (r, row) in m.iter().enumerate() {
                    let linear = row[0] * v[0] + row[1] * v[1] + row[2] * v[2];
                    out[r] = srgb_gamma_encode(linear.clamp(0.0, 1.0));
                }
                set3(buf, out);
            }
            Self::Chain(steps) => {
                for step in steps {
                    step.apply_in_place(buf);
                }
            }
        }
    }
}

fn take3(buf: &Channels) -> [f32; 3] {
    let get = |i: usize| buf.get(i).copied().unwrap_or(0.0);
    [get(0), get(1), get(2)]
}

fn set3(buf: &mut Channels, v: [f32; 3]) {
    buf.clear();
    buf.extend_from_slice(&v);
}
