//! Transfer functions
//!
//! This module provides:
//! - sRGB gamma encode/decode
//! - ICC parametric curve types 0-4

/// sRGB gamma decode (encoded → linear)
#[inline]
pub fn srgb_gamma_decode(encoded: f32) -> f32 {
    if encoded <= 0.04045 {
        encoded / 12.92
    } else {
        ((encoded + 0.055) / 1.055).powf(2.4)
    }
}

/// sRGB gamma encode (linear → encoded)
#[inline]
pub fn srgb_gamma_encode(linear: f32) -> f32 {
    if linear <= 0.003_130_8 {
        linear * 12.92
    } else {
        1.055 * linear.powf(1.0 / 2.4) - 0.055
    }
}

/// ICC Parametric Curve Type (ICC.1:2022 Section 10.18)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParametricCurveType {
    /// Type 0: Y = X^g
    Gamma,
    /// Type 1: Y = (aX + b)^g  if X >= -b/a, else 0
    Cie122,
    /// Type 2: Y = (aX + b)^g + c  if X >= -b/a, else c
    Iec61966_3,
    /// Type 3: Y = (aX + b)^g  if X >= d, else cX
    Iec61966_2_1,
    /// Type 4: Y = (aX + b)^g + e  if X >= d, else cX + f
    Full,
}

impl ParametricCurveType {
    pub fn from_icc(function_type: u16) -> Option<Self> {
        match function_type {
            0 => Some(Self::Gamma),
            1 => Some(Self::Cie122),
            2 => Some(Self::Iec61966_3),
            3 => Some(Self::Iec61966_2_1),
            4 => Some(Self::Full),
            _ => None,
        }
    }

    /// Number of s15Fixed16 parameters stored for this type
    pub fn param_count(&self) -> usize {
        match self {
            Self::Gamma => 1,
            Self::Cie122 => 3,
            Self::Iec61966_3 => 4,
            Self::Iec61966_2_1 => 5,
            Self::Full => 7,
        }
    }
}

/// ICC parametric curve
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParametricCurve {
    pub curve_type: ParametricCurveType,
    pub g: f32,
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl ParametricCurve {
    /// Simple gamma curve (type 0)
    pub fn gamma(g: f32) -> Self {
        Self {
            curve_type: ParametricCurveType::Gamma,
            g,
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 0.0,
            e: 0.0,
            f: 0.0,
        }
    }

    /// Build from the parameter list of a `para` element
    pub fn from_params(curve_type: ParametricCurveType, params: &[f32]) -> Option<Self> {
        if params.len() < curve_type.param_count() {
            return None;
        }
        let mut curve = Self::gamma(params[0]);
        curve.curve_type = curve_type;
        let rest = &params[1..curve_type.param_count()];
        for (slot, &v) in [&mut curve.a, &mut curve.b, &mut curve.c, &mut curve.d, &mut curve.e, &mut curve.f]
            .into_iter()
            .zip(rest)
        {
            *slot = v;
        }
        Some(curve)
    }

    /// Evaluate in the decode direction (encoded → linear), input clamped
    /// to [0, 1]
    #[inline]
    pub fn eval(&self, x: f32) -> f32 {
        let x = x.clamp(0.0, 1.0);
        let threshold = if self.a.abs() > 1e-10 { -self.b / self.a } else { 0.0 };
        match self.curve_type {
            ParametricCurveType::Gamma => x.powf(self.g),
            ParametricCurveType::Cie122 => {
                if x >= threshold {
                    (self.a * x + self.b).max(0.0).powf(self.g)
                } else {
                    0.0
                }
            }
            ParametricCurveType::Iec61966_3 => {
                if x >= threshold {
                    (self.a * x + self.b).max(0.0).powf(self.g) + self.c
                } else {
                    self.c
                }
            }
            ParametricCurveType::Iec61966_2_1 => {
                if x >= self.d {
                    (self.a * x + self.b).max(0.0).powf(self.g)
                } else {
                    self.c * x
                }
            }
            ParametricCurveType::Full => {
                if x >= self.d {
                    (self.a * x + self.b).max(0.0).powf(self.g) + self.e
                } else {
                    self.c * x + self.f
                }
            }
        }
    }
}
