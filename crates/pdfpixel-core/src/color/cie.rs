//! CIE-based color spaces: CalGray, CalRGB and Lab
//!
//! Each builds a transform to D50 XYZ (adapting from its own white point
//! with Bradford), which the shared `XyzToSrgb` step takes to sRGB. The
//! BlackPoint entries are kept but do not affect conversion.

use crate::error::{Error, Result};
use crate::function::Interval;
use crate::icc::CurveData;
use crate::math::{D50, Matrix3x3, bradford_matrix};
use crate::transform::ColorTransform;

fn check_white(white: [f32; 3]) -> Result<()> {
    if white[0] <= 0.0 || white[2] <= 0.0 || (white[1] - 1.0).abs() > 1e-3 {
        return Err(Error::InvalidColorSpace(format!(
            "WhitePoint {white:?} must have positive X and Z and Y = 1"
        )));
    }
    Ok(())
}

fn to_d50(white: [f32; 3]) -> Matrix3x3 {
    bradford_matrix(white.map(f64::from), D50)
}

/// `/CalGray` dictionary
#[derive(Debug, Clone, PartialEq)]
pub struct CalGray {
    pub white: [f32; 3],
    pub black: [f32; 3],
    pub gamma: f32,
}

impl CalGray {
    pub fn new(white: [f32; 3]) -> Result<Self> {
        check_white(white)?;
        Ok(Self {
            white,
            black: [0.0; 3],
            gamma: 1.0,
        })
    }

    pub fn with_gamma(mut self, gamma: f32) -> Self {
        self.gamma = gamma;
        self
    }

    pub fn with_black(mut self, black: [f32; 3]) -> Self {
        self.black = black;
        self
    }

    pub(crate) fn transform(&self) -> ColorTransform {
        let w = self.white.map(f64::from);
        let spread = Matrix3x3::new([[w[0], 0.0, 0.0], [w[1], 0.0, 0.0], [w[2], 0.0, 0.0]]);
        ColorTransform::chain([
            ColorTransform::Curves(vec![CurveData::Gamma(self.gamma)]),
            ColorTransform::matrix(to_d50(self.white).multiply(&spread).to_f32()),
            ColorTransform::XyzToSrgb,
        ])
    }
}

/// `/CalRGB` dictionary
#[derive(Debug, Clone, PartialEq)]
pub struct CalRgb {
    pub white: [f32; 3],
    pub black: [f32; 3],
    pub gamma: [f32; 3],
    /// `[XA YA ZA XB YB ZB XC YC ZC]`
    pub matrix: [f32; 9],
}

impl CalRgb {
    pub fn new(white: [f32; 3]) -> Result<Self> {
        check_white(white)?;
        Ok(Self {
            white,
            black: [0.0; 3],
            gamma: [1.0; 3],
            matrix: [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0],
        })
    }

    pub fn with_gamma(mut self, gamma: [f32; 3]) -> Self {
        self.gamma = gamma;
        self
    }

    pub fn with_matrix(mut self, matrix: [f32; 9]) -> Self {
        self.matrix = matrix;
        self
    }

    pub fn with_black(mut self, black: [f32; 3]) -> Self {
        self.black = black;
        self
    }

    pub(crate) fn transform(&self) -> ColorTransform {
        let m = self.matrix.map(f64::from);
        // each group of three is one column
        let abc = Matrix3x3::from_columns([m[0], m[1], m[2]], [m[3], m[4], m[5]], [m[6], m[7], m[8]]);
        ColorTransform::chain([
            ColorTransform::Curves(self.gamma.iter().map(|&g| CurveData::Gamma(g)).collect()),
            ColorTransform::matrix(to_d50(self.white).multiply(&abc).to_f32()),
            ColorTransform::XyzToSrgb,
        ])
    }
}

/// `/Lab` dictionary
#[derive(Debug, Clone, PartialEq)]
pub struct LabSpace {
    pub white: [f32; 3],
    pub black: [f32; 3],
    /// `[amin amax bmin bmax]`
    pub range: [f32; 4],
}

impl LabSpace {
    pub fn new(white: [f32; 3]) -> Result<Self> {
        check_white(white)?;
        Ok(Self {
            white,
            black: [0.0; 3],
            range: [-100.0, 100.0, -100.0, 100.0],
        })
    }

    pub fn with_range(mut self, range: [f32; 4]) -> Self {
        self.range = range;
        self
    }

    pub fn with_black(mut self, black: [f32; 3]) -> Self {
        self.black = black;
        self
    }

    pub fn default_decode(&self) -> Vec<Interval> {
        vec![
            (0.0, 100.0),
            (self.range[0], self.range[1]),
            (self.range[2], self.range[3]),
        ]
    }

    pub(crate) fn transform(&self) -> ColorTransform {
        ColorTransform::chain([
            ColorTransform::LabToXyz { white: self.white },
            ColorTransform::matrix(to_d50(self.white).to_f32()),
            ColorTransform::XyzToSrgb,
        ])
    }
}
