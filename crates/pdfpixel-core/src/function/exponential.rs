//! Type 2 exponential interpolation functions

use super::{FunctionOutput, Interval, clamp_to};

/// `C0 + x^N * (C1 - C0)` per output
#[derive(Debug, Clone, PartialEq)]
pub struct ExponentialFunction {
    pub domain: Interval,
    pub c0: Vec<f32>,
    pub c1: Vec<f32>,
    pub n: f32,
    pub range: Option<Vec<Interval>>,
}

impl ExponentialFunction {
    /// Build with the default C0 `[0]` and C1 `[1]` when not given
    pub fn new(domain: Interval, c0: Option<Vec<f32>>, c1: Option<Vec<f32>>, n: f32) -> Self {
        Self {
            domain,
            c0: c0.unwrap_or_else(|| vec![0.0]),
            c1: c1.unwrap_or_else(|| vec![1.0]),
            n,
            range: None,
        }
    }

    pub fn with_range(mut self, range: Vec<Interval>) -> Self {
        self.range = Some(range);
        self
    }

    pub fn output_count(&self) -> usize {
        self.c0.len().min(self.c1.len())
    }

    pub fn evaluate(&self, inputs: &[f32]) -> FunctionOutput {
        let x = clamp_to(inputs.first().copied().unwrap_or(self.domain.0), self.domain);
        // non-positive exponents degrade to linear
        let t = if self.n <= 0.0 || self.n == 1.0 {
            x
        } else if x < 0.0 && self.n.fract() != 0.0 {
            0.0
        } else {
            x.powf(self.n)
        };
        self.c0
            .iter()
            .zip(&self.c1)
            .enumerate()
            .map(|(i, (&c0, &c1))| {
                let v = c0 + t * (c1 - c0);
                match self.range.as_ref().and_then(|r| r.get(i)) {
                    Some(&range) => clamp_to(v, range),
                    None => v,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_defaults() {
        let f = ExponentialFunction::new((0.0, 1.0), None, None, 1.0);
        assert_eq!(f.evaluate(&[0.3]).as_slice(), &[0.3]);
    }

    #[test]
    fn test_exponent_and_vectors() {
        let f = ExponentialFunction::new((0.0, 1.0), Some(vec![0.0, 1.0]), Some(vec![1.0, 0.0]), 2.0);
        assert_eq!(f.evaluate(&[0.5]).as_slice(), &[0.25, 0.75]);
    }

    #[test]
    fn test_non_positive_exponent_is_linear() {
        let f = ExponentialFunction::new((0.0, 1.0), None, None, 0.0);
        assert_eq!(f.evaluate(&[0.0]).as_slice(), &[0.0]);
        assert_eq!(f.evaluate(&[0.4]).as_slice(), &[0.4]);
    }

    #[test]
    fn test_domain_and_range_clamp() {
        let f = ExponentialFunction::new((0.0, 1.0), Some(vec![0.0]), Some(vec![2.0]), 1.0)
            .with_range(vec![(0.0, 1.5)]);
        assert_eq!(f.evaluate(&[2.0]).as_slice(), &[1.5]);
        assert_eq!(f.evaluate(&[-1.0]).as_slice(), &[0.0]);
    }
}
