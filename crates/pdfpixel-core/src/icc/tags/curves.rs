//! Curve Tag Types
//!
//! - curv: identity, simple gamma or a sampled table
//! - para: one of the five ICC parametric functions
//!
//! Tables are normalized to `0.0..=1.0` at parse time.

use crate::icc::error::IccError;
use crate::icc::types::{TypeSignature, read_s15f16, read_u16, read_u32};
use crate::math::gamma::{ParametricCurve, ParametricCurveType};

/// A one-dimensional tone curve
#[derive(Debug, Clone, PartialEq)]
pub enum CurveData {
    /// Identity curve (count = 0)
    Identity,
    /// Simple gamma (count = 1, value is u8Fixed8)
    Gamma(f32),
    /// Sampled curve, evenly spaced over the input range
    Table(Vec<f32>),
    Parametric(ParametricCurve),
}

impl CurveData {
    /// Parse a `curv` or `para` element starting at its type signature.
    ///
    /// Returns the curve and the number of bytes it occupies, unpadded.
    pub fn parse(data: &[u8]) -> Result<(Self, usize), IccError> {
        let type_sig = read_u32(data, 0)
            .ok_or_else(|| IccError::corrupted("curve element truncated"))?;
        match TypeSignature(type_sig) {
            TypeSignature::CURVE => Self::parse_curv(data),
            TypeSignature::PARA => Self::parse_para(data),
            other => Err(IccError::corrupted(format!(
                "expected curve element, found type 0x{:08X}",
                other.0
            ))),
        }
    }

    fn parse_curv(data: &[u8]) -> Result<(Self, usize), IccError> {
        let count = read_u32(data, 8)
            .ok_or_else(|| IccError::corrupted("curve tag too small"))? as usize;
        let end = 12 + count * 2;
        match count {
            0 => Ok((Self::Identity, 12)),
            1 => {
                let raw = read_u16(data, 12)
                    .ok_or_else(|| IccError::corrupted("curve gamma value missing"))?;
                Ok((Self::Gamma(raw as f32 / 256.0), end))
            }
            _ => {
                let bytes = data.get(12..end).ok_or_else(|| {
                    IccError::corrupted(format!(
                        "curve table too small: need {end} bytes, have {}",
                        data.len()
                    ))
                })?;
                let table = bytes
                    .chunks_exact(2)
                    .map(|c| u16::from_be_bytes([c[0], c[1]]) as f32 / 65535.0)
                    .collect();
                Ok((Self::Table(table), end))
            }
        }
    }

    fn parse_para(data: &[u8]) -> Result<(Self, usize), IccError> {
        let function = read_u16(data, 8)
            .ok_or_else(|| IccError::corrupted("parametric curve too small"))?;
        let curve_type = ParametricCurveType::from_icc(function).ok_or_else(|| {
            IccError::corrupted(format!("unknown parametric curve type {function}"))
        })?;
        let count = curve_type.param_count();
        let params = (0..count)
            .map(|i| read_s15f16(data, 12 + i * 4))
            .collect::<Option<Vec<f32>>>()
            .ok_or_else(|| IccError::corrupted("parametric curve parameters truncated"))?;
        let curve = ParametricCurve::from_params(curve_type, &params)
            .ok_or_else(|| IccError::corrupted("parametric curve parameters invalid"))?;
        Ok((Self::Parametric(curve), 12 + count * 4))
    }

    /// Evaluate the curve at `x` in `0.0..=1.0`
    pub fn eval(&self, x: f32) -> f32 {
        let x = x.clamp(0.0, 1.0);
        match self {
            Self::Identity => x,
            Self::Gamma(g) => x.powf(*g),
            Self::Table(table) => interpolate_table(table, x),
            Self::Parametric(curve) => curve.eval(x),
        }
    }

    pub fn is_identity(&self) -> bool {
        match self {
            Self::Identity => true,
            Self::Gamma(g) => (*g - 1.0).abs() < 1e-4,
            _ => false,
        }
    }
}

/// Linear interpolation in an evenly spaced table
pub fn interpolate_table(table: &[f32], x: f32) -> f32 {
    match table.len() {
        0 => x,
        1 => table[0],
        n => {
            let pos = x.clamp(0.0, 1.0) * (n - 1) as f32;
            let idx = (pos as usize).min(n - 2);
            let frac = pos - idx as f32;
            table[idx] + frac * (table[idx + 1] - table[idx])
        }
    }
}
