//! LUT Tag Types
//!
//! - mft1 / mft2: legacy 8- and 16-bit LUTs (matrix, input tables, CLUT,
//!   output tables)
//! - mAB: v4 A-to-B pipelines (A curves, CLUT, M curves, matrix, B curves)
//!
//! All offsets inside an mAB tag are relative to the start of the tag, so
//! every parser here receives the whole tag including its type signature.
//! Samples are normalized to `0.0..=1.0` as `f32`.

use crate::icc::error::IccError;
use crate::icc::types::{read_s15f16, read_u16, read_u32};

use super::curves::CurveData;

/// Upper bound on CLUT samples accepted from a profile
const MAX_CLUT_SAMPLES: usize = 1 << 24;

fn truncated(what: &str) -> IccError {
    IccError::corrupted(format!("{what} truncated"))
}

/// Read `count` samples of `width` bytes starting at `pos`, normalized
fn read_samples(data: &[u8], pos: usize, count: usize, width: usize, what: &str) -> Result<Vec<f32>, IccError> {
    let bytes = data
        .get(pos..pos + count * width)
        .ok_or_else(|| truncated(what))?;
    Ok(match width {
        1 => bytes.iter().map(|&b| b as f32 / 255.0).collect(),
        _ => bytes
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]) as f32 / 65535.0)
            .collect(),
    })
}

fn clut_len(grid: &[u8], outputs: usize) -> Result<usize, IccError> {
    grid.iter()
        .try_fold(outputs, |acc, &g| acc.checked_mul(g as usize))
        .filter(|&n| n <= MAX_CLUT_SAMPLES)
        .ok_or_else(|| IccError::Unsupported(format!("CLUT grid {grid:?} too large")))
}

/// Legacy LUT (mft1 / mft2)
#[derive(Debug, Clone, PartialEq)]
pub struct LutMft {
    pub input_channels: u8,
    pub output_channels: u8,
    pub grid_points: u8,
    /// Bytes per table entry: 1 for mft1, 2 for mft2
    pub precision: u8,
    /// 3x3 matrix (row-major), only applied to XYZ input
    pub matrix: [[f32; 3]; 3],
    /// One table per input channel
    pub input_curves: Vec<Vec<f32>>,
    /// Grid samples, first input outermost, outputs innermost
    pub clut: Vec<f32>,
    /// One table per output channel
    pub output_curves: Vec<Vec<f32>>,
}

impl LutMft {
    /// Parse an mft1 (`precision` 1) or mft2 (`precision` 2) tag
    pub fn parse(data: &[u8], precision: usize) -> Result<Self, IccError> {
        if data.len() < 48 {
            return Err(truncated("LUT header"));
        }
        let input_channels = data[8];
        let output_channels = data[9];
        let grid_points = data[10];
        if input_channels == 0 || output_channels == 0 || grid_points < 2 {
            return Err(IccError::corrupted(format!(
                "LUT with {input_channels} inputs, {output_channels} outputs, {grid_points} grid points"
            )));
        }

        let mut matrix = [[0f32; 3]; 3];
        for (i, slot) in matrix.iter_mut().flatten().enumerate() {
            *slot = read_s15f16(data, 12 + i * 4).ok_or_else(|| truncated("LUT matrix"))?;
        }

        let (input_entries, output_entries, mut pos) = if precision == 1 {
            (256, 256, 48)
        } else {
            let input = read_u16(data, 48).ok_or_else(|| truncated("LUT entry counts"))? as usize;
            let output = read_u16(data, 50).ok_or_else(|| truncated("LUT entry counts"))? as usize;
            (input, output, 52)
        };

        let mut input_curves = Vec::with_capacity(input_channels as usize);
        for _ in 0..input_channels {
            input_curves.push(read_samples(data, pos, input_entries, precision, "LUT input tables")?);
            pos += input_entries * precision;
        }

        let samples = clut_len(&vec![grid_points; input_channels as usize], output_channels as usize)?;
        let clut = read_samples(data, pos, samples, precision, "LUT CLUT")?;
        pos += samples * precision;

        let mut output_curves = Vec::with_capacity(output_channels as usize);
        for _ in 0..output_channels {
            output_curves.push(read_samples(data, pos, output_entries, precision, "LUT output tables")?);
            pos += output_entries * precision;
        }

        Ok(Self {
            input_channels,
            output_channels,
            grid_points,
            precision: precision as u8,
            matrix,
            input_curves,
            clut,
            output_curves,
        })
    }

    pub fn matrix_is_identity(&self) -> bool {
        self.matrix.iter().enumerate().all(|(r, row)| {
            row.iter()
                .enumerate()
                .all(|(c, &v)| (v - if r == c { 1.0 } else { 0.0 }).abs() < 1e-4)
        })
    }
}

/// Matrix element of an mAB pipeline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LutMatrix {
    pub matrix: [[f32; 3]; 3],
    pub offset: [f32; 3],
}

impl LutMatrix {
    fn parse(data: &[u8], pos: usize) -> Result<Self, IccError> {
        let mut values = [0f32; 12];
        for (i, v) in values.iter_mut().enumerate() {
            *v = read_s15f16(data, pos + i * 4).ok_or_else(|| truncated("LUT matrix"))?;
        }
        Ok(Self {
            matrix: [
                [values[0], values[1], values[2]],
                [values[3], values[4], values[5]],
                [values[6], values[7], values[8]],
            ],
            offset: [values[9], values[10], values[11]],
        })
    }
}

/// CLUT element of an mAB pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct LutClut {
    /// Grid points per input dimension
    pub grid_points: Vec<u8>,
    pub output_channels: u8,
    /// Normalized samples, first input outermost
    pub data: Vec<f32>,
}

impl LutClut {
    fn parse(data: &[u8], pos: usize, inputs: usize, outputs: usize) -> Result<Self, IccError> {
        let header = data.get(pos..pos + 20).ok_or_else(|| truncated("LUT CLUT header"))?;
        let grid_points = header[..inputs].to_vec();
        if grid_points.contains(&0) {
            return Err(IccError::corrupted("CLUT grid dimension of zero"));
        }
        let precision = header[16] as usize;
        if !matches!(precision, 1 | 2) {
            return Err(IccError::corrupted(format!("CLUT precision {precision}")));
        }
        let samples = clut_len(&grid_points, outputs)?;
        Ok(Self {
            data: read_samples(data, pos + 20, samples, precision, "LUT CLUT")?,
            grid_points,
            output_channels: outputs as u8,
        })
    }
}

/// v4 A-to-B pipeline (mAB)
#[derive(Debug, Clone, PartialEq)]
pub struct LutAToB {
    pub input_channels: u8,
    pub output_channels: u8,
    pub a_curves: Option<Vec<CurveData>>,
    pub clut: Option<LutClut>,
    pub m_curves: Option<Vec<CurveData>>,
    pub matrix: Option<LutMatrix>,
    pub b_curves: Option<Vec<CurveData>>,
}

impl LutAToB {
    pub fn parse(data: &[u8]) -> Result<Self, IccError> {
        if data.len() < 32 {
            return Err(truncated("lutAToB header"));
        }
        let inputs = data[8] as usize;
        let outputs = data[9] as usize;
        if inputs == 0 || inputs > 15 || outputs == 0 {
            return Err(IccError::corrupted(format!(
                "lutAToB with {inputs} inputs and {outputs} outputs"
            )));
        }
        let offset = |i: usize| read_u32(data, 12 + i * 4).unwrap_or(0) as usize;
        let (b_off, matrix_off, m_off, clut_off, a_off) =
            (offset(0), offset(1), offset(2), offset(3), offset(4));

        let curves = |off: usize, count: usize| -> Result<Option<Vec<CurveData>>, IccError> {
            (off != 0).then(|| parse_curve_set(data, off, count)).transpose()
        };

        let lut = Self {
            input_channels: inputs as u8,
            output_channels: outputs as u8,
            a_curves: curves(a_off, inputs)?,
            clut: (clut_off != 0)
                .then(|| LutClut::parse(data, clut_off, inputs, outputs))
                .transpose()?,
            m_curves: curves(m_off, outputs)?,
            matrix: (matrix_off != 0)
                .then(|| LutMatrix::parse(data, matrix_off))
                .transpose()?,
            b_curves: curves(b_off, outputs)?,
        };
        if lut.clut.is_none() && inputs != outputs {
            return Err(IccError::corrupted("lutAToB changes channel count without a CLUT"));
        }
        Ok(lut)
    }
}

/// Parse `count` curve elements, each padded to a 4-byte boundary
fn parse_curve_set(data: &[u8], offset: usize, count: usize) -> Result<Vec<CurveData>, IccError> {
    let mut curves = Vec::with_capacity(count);
    let mut pos = offset;
    for _ in 0..count {
        let rest = data.get(pos..).ok_or_else(|| truncated("curve set"))?;
        let (curve, len) = CurveData::parse(rest)?;
        curves.push(curve);
        pos += (len + 3) & !3;
    }
    Ok(curves)
}
