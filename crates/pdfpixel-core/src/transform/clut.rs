//! N-dimensional color lookup tables
//!
//! Samples are stored as a flat `f32` array of output vectors. The first
//! input dimension is outermost and the last varies fastest, matching the
//! ICC layout. Lookups use simplex (barycentric) interpolation: N+1
//! corner reads instead of the 2^N of multilinear interpolation.

use smallvec::SmallVec;

use crate::error::{Error, Result};

/// Inputs supported by a single table (ICC limit)
pub const MAX_CLUT_INPUTS: usize = 15;

/// A read-only N-D lookup table
#[derive(Debug, Clone, PartialEq)]
pub struct Clut {
    grid_points: Vec<usize>,
    /// Offset in `data` of one step along each dimension
    strides: Vec<usize>,
    output_channels: usize,
    data: Vec<f32>,
}

impl Clut {
    /// Build a table, checking `data.len() == product(grid_points) * output_channels`
    pub fn new(grid_points: Vec<usize>, output_channels: usize, data: Vec<f32>) -> Result<Self> {
        if grid_points.is_empty() || grid_points.len() > MAX_CLUT_INPUTS {
            return Err(Error::InvalidColorSpace(format!(
                "CLUT with {} input dimensions",
                grid_points.len()
            )));
        }
        if output_channels == 0 || grid_points.contains(&0) {
            return Err(Error::InvalidColorSpace(format!(
                "CLUT grid {grid_points:?} with {output_channels} outputs"
            )));
        }

        let mut strides = vec![0; grid_points.len()];
        let mut step = output_channels;
        for (stride, &g) in strides.iter_mut().zip(&grid_points).rev() {
            *stride = step;
            step = step.saturating_mul(g);
        }
        if step != data.len() {
            return Err(Error::BufferSize {
                expected: step,
                actual: data.len(),
            });
        }

        Ok(Self {
            grid_points,
            strides,
            output_channels,
            data,
        })
    }

    /// Build a table with the same grid size along every dimension
    pub fn uniform(inputs: usize, grid: usize, output_channels: usize, data: Vec<f32>) -> Result<Self> {
        Self::new(vec![grid; inputs], output_channels, data)
    }

    pub fn input_channels(&self) -> usize {
        self.grid_points.len()
    }

    pub fn output_channels(&self) -> usize {
        self.output_channels
    }

    pub fn grid_points(&self) -> &[usize] {
        &self.grid_points
    }

    /// The stored output vector at integer grid coordinates
    pub fn vertex(&self, coords: &[usize]) -> &[f32] {
        let base: usize = coords.iter().zip(&self.strides).map(|(c, s)| c * s).sum();
        &self.data[base..base + self.output_channels]
    }

    /// Interpolate at `input` (each in `0.0..=1.0`) into `output`.
    ///
    /// Missing inputs read as 0. Only the first `output_channels` slots of
    /// `output` are written.
    pub fn sample(&self, input: &[f32], output: &mut [f32]) {
        let mut base = 0usize;
        // (fraction, stride) for every dimension that can move
        let mut axes: SmallVec<[(f32, usize); 8]> = SmallVec::new();

        for (d, (&g, &stride)) in self.grid_points.iter().zip(&self.strides).enumerate() {
            if g == 1 {
                continue;
            }
            let max = (g - 1) as f32;
            let x = input.get(d).copied().unwrap_or(0.0);
            let pos = if x.is_nan() { 0.0 } else { (x * max).clamp(0.0, max) };
            let mut idx = pos as usize;
            let mut frac = pos - idx as f32;
            if idx >= g - 1 {
                idx = g - 2;
                frac = 1.0;
            }
            base += idx * stride;
            axes.push((frac, stride));
        }

        // stable: equal fractions keep ascending axis order
        axes.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        let n = self.output_channels;
        let out = &mut output[..n];
        let first = axes.first().map_or(0.0, |a| a.0);
        let w0 = 1.0 - first;
        for (o, &v) in out.iter_mut().zip(&self.data[base..base + n]) {
            *o = w0 * v;
        }

        let mut corner = base;
        for (k, &(frac, stride)) in axes.iter().enumerate() {
            corner += stride;
            let next = axes.get(k + 1).map_or(0.0, |a| a.0);
            let w = frac - next;
            if w == 0.0 {
                continue;
            }
            for (o, &v) in out.iter_mut().zip(&self.data[corner..corner + n]) {
                *o += w * v;
            }
        }
    }
}
