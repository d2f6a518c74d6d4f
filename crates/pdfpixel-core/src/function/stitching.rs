//! Type 3 stitching functions

use log::trace;

use super::{FunctionOutput, Interval, PdfFunction, clamp_to, interpolate};
use crate::error::{Error, Result};

/// Combines k one-input functions over subdomains split at `bounds`
#[derive(Debug, Clone, PartialEq)]
pub struct StitchingFunction {
    pub domain: Interval,
    pub functions: Vec<PdfFunction>,
    /// k - 1 increasing values inside the domain
    pub bounds: Vec<f32>,
    /// One interval per sub-function
    pub encode: Vec<Interval>,
}

impl StitchingFunction {
    pub fn new(
        domain: Interval,
        functions: Vec<PdfFunction>,
        bounds: Vec<f32>,
        encode: Vec<Interval>,
    ) -> Result<Self> {
        if bounds.windows(2).any(|w| w[0] > w[1]) {
            return Err(Error::InvalidFunction(format!("stitching bounds {bounds:?} not increasing")));
        }
        if encode.len() < bounds.len() + 1 {
            return Err(Error::InvalidFunction(format!(
                "stitching function with {} bounds needs {} encode pairs, got {}",
                bounds.len(),
                bounds.len() + 1,
                encode.len()
            )));
        }
        Ok(Self {
            domain,
            functions,
            bounds,
            encode,
        })
    }

    /// Index of the subdomain containing `x`
    pub fn segment(&self, x: f32) -> usize {
        self.bounds
            .iter()
            .position(|&b| x < b)
            .unwrap_or(self.bounds.len())
    }

    pub fn output_count(&self) -> Option<usize> {
        self.functions.first().and_then(PdfFunction::output_count)
    }

    pub fn evaluate(&self, inputs: &[f32]) -> Result<FunctionOutput> {
        let x = clamp_to(inputs.first().copied().unwrap_or(self.domain.0), self.domain);
        let k = self.segment(x);
        let lo = if k == 0 { self.domain.0 } else { self.bounds[k - 1] };
        let hi = self.bounds.get(k).copied().unwrap_or(self.domain.1);

        let Some(function) = self.functions.get(k) else {
            trace!("stitching segment {k} has no function");
            return Ok(FunctionOutput::new());
        };
        let encoded = interpolate(x, (lo, hi), self.encode[k]);
        function.evaluate(&[encoded])
    }
}
