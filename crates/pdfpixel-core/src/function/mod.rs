//! PDF functions
//!
//! The four function types of PDF 7.10 behind one closed enum. Color
//! space tint transforms hold an `Arc<PdfFunction>` and call
//! [`PdfFunction::evaluate`] per sample.

mod exponential;
mod postscript;
mod sampled;
mod stitching;

pub use exponential::ExponentialFunction;
pub use postscript::{MAX_STACK_DEPTH, Node, Operator, PostScriptProgram, Value};
pub use sampled::SampledFunction;
pub use stitching::StitchingFunction;

use smallvec::SmallVec;

use crate::error::{Error, Result};

/// Function outputs; tint transforms rarely produce more than 8 values
pub type FunctionOutput = SmallVec<[f32; 8]>;

/// An input or output interval
pub type Interval = (f32, f32);

#[derive(Debug, Clone, PartialEq)]
pub enum PdfFunction {
    /// Type 0
    Sampled(SampledFunction),
    /// Type 2
    Exponential(ExponentialFunction),
    /// Type 3
    Stitching(StitchingFunction),
    /// Type 4
    PostScript(PostScriptFunction),
}

impl PdfFunction {
    pub fn evaluate(&self, inputs: &[f32]) -> Result<FunctionOutput> {
        match self {
            Self::Sampled(f) => f.evaluate(inputs),
            Self::Exponential(f) => Ok(f.evaluate(inputs)),
            Self::Stitching(f) => f.evaluate(inputs),
            Self::PostScript(f) => f.evaluate(inputs),
        }
    }

    /// Number of outputs, when the function declares it
    pub fn output_count(&self) -> Option<usize> {
        match self {
            Self::Sampled(f) => Some(f.output_count()),
            Self::Exponential(f) => Some(f.output_count()),
            Self::Stitching(f) => f.output_count(),
            Self::PostScript(f) => Some(f.range.len()),
        }
    }
}

/// Clamp `x` into `interval`
#[inline]
pub(crate) fn clamp_to(x: f32, interval: Interval) -> f32 {
    let (lo, hi) = if interval.0 <= interval.1 {
        interval
    } else {
        (interval.1, interval.0)
    };
    if x.is_nan() { lo } else { x.clamp(lo, hi) }
}

/// Map `x` from `from` onto `to`
#[inline]
pub(crate) fn interpolate(x: f32, from: Interval, to: Interval) -> f32 {
    let span = from.1 - from.0;
    if span == 0.0 {
        return to.0;
    }
    to.0 + (x - from.0) * (to.1 - to.0) / span
}

/// Split a flat `[min0 max0 min1 max1 ...]` array into intervals
pub fn intervals(flat: &[f32]) -> Result<Vec<Interval>> {
    if flat.len() % 2 != 0 {
        return Err(Error::InvalidFunction(format!(
            "interval array of odd length {}",
            flat.len()
        )));
    }
    Ok(flat.chunks_exact(2).map(|c| (c[0], c[1])).collect())
}

/// Type 4 function: a calculator program with Domain and Range
#[derive(Debug, Clone, PartialEq)]
pub struct PostScriptFunction {
    pub domain: Vec<Interval>,
    pub range: Vec<Interval>,
    program: PostScriptProgram,
}

impl PostScriptFunction {
    pub fn new(domain: Vec<Interval>, range: Vec<Interval>, source: &str) -> Result<Self> {
        if domain.is_empty() || range.is_empty() {
            return Err(Error::InvalidFunction("type 4 function needs Domain and Range".into()));
        }
        Ok(Self {
            domain,
            range,
            program: PostScriptProgram::parse(source)?,
        })
    }

    pub fn evaluate(&self, inputs: &[f32]) -> Result<FunctionOutput> {
        let clamped: SmallVec<[f64; 8]> = self
            .domain
            .iter()
            .enumerate()
            .map(|(i, &d)| clamp_to(inputs.get(i).copied().unwrap_or(d.0), d) as f64)
            .collect();
        let mut stack = self.program.evaluate(&clamped)?;

        let n = self.range.len();
        if stack.len() < n {
            return Err(Error::InvalidFunction(format!(
                "type 4 function left {} value(s), expected {n}",
                stack.len()
            )));
        }
        let mut out: FunctionOutput = SmallVec::from_elem(0.0, n);
        // outputs come off the stack last to first
        for i in (0..n).rev() {
            let v = stack
                .pop()
                .and_then(|v| v.as_number())
                .ok_or(Error::TypeCheck("function output"))?;
            out[i] = clamp_to(v as f32, self.range[i]);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_postscript_function_clamps() {
        let f = PostScriptFunction::new(
            vec![(0.0, 1.0)],
            vec![(0.0, 1.0), (0.0, 10.0)],
            "{ dup 2 mul exch 20 mul }",
        )
        .unwrap();
        let out = f.evaluate(&[0.25]).unwrap();
        assert_eq!(out.as_slice(), &[0.5, 5.0]);
        // input clamped to the domain, second output clamped to the range
        let out = f.evaluate(&[3.0]).unwrap();
        assert_eq!(out.as_slice(), &[1.0, 10.0]);
    }

    #[test]
    fn test_postscript_function_too_few_outputs() {
        let f = PostScriptFunction::new(vec![(0.0, 1.0)], vec![(0.0, 1.0); 2], "{ }").unwrap();
        assert!(f.evaluate(&[0.5]).is_err());
    }

    #[test]
    fn test_intervals() {
        assert_eq!(intervals(&[0.0, 1.0, -1.0, 1.0]).unwrap(), vec![(0.0, 1.0), (-1.0, 1.0)]);
        assert!(intervals(&[0.0]).is_err());
    }

    #[test]
    fn test_interpolate() {
        assert_eq!(interpolate(0.5, (0.0, 1.0), (10.0, 20.0)), 15.0);
        assert_eq!(interpolate(0.5, (1.0, 1.0), (10.0, 20.0)), 10.0);
    }
}
