//! Type 0 sampled functions

use smallvec::SmallVec;

use super::{FunctionOutput, Interval, clamp_to, interpolate};
use crate::bits::BitReader;
use crate::error::{Error, Result};

/// Inputs supported by multilinear interpolation (2^m corners)
const MAX_INPUTS: usize = 8;

/// A function defined by a table of samples with multilinear interpolation
#[derive(Debug, Clone, PartialEq)]
pub struct SampledFunction {
    domain: Vec<Interval>,
    range: Vec<Interval>,
    size: Vec<usize>,
    bits_per_sample: u32,
    encode: Vec<Interval>,
    decode: Vec<Interval>,
    /// Raw sample values, first input dimension varying fastest
    samples: Vec<u32>,
}

impl SampledFunction {
    /// Unpack `data` (MSB-first, `bits_per_sample` per value) into a table
    /// of `product(size) * range.len()` samples
    pub fn new(
        domain: Vec<Interval>,
        range: Vec<Interval>,
        size: Vec<usize>,
        bits_per_sample: u32,
        data: &[u8],
    ) -> Result<Self> {
        if !matches!(bits_per_sample, 1 | 2 | 4 | 8 | 12 | 16 | 24 | 32) {
            return Err(Error::InvalidFunction(format!("BitsPerSample {bits_per_sample}")));
        }
        if domain.is_empty() || domain.len() > MAX_INPUTS || size.len() != domain.len() {
            return Err(Error::InvalidFunction(format!(
                "sampled function with {} inputs and Size {size:?}",
                domain.len()
            )));
        }
        if range.is_empty() || size.contains(&0) {
            return Err(Error::InvalidFunction("sampled function with empty Range or Size".into()));
        }
        let count = size
            .iter()
            .try_fold(range.len(), |acc, &s| acc.checked_mul(s))
            .ok_or_else(|| Error::InvalidFunction(format!("sample table {size:?} too large")))?;
        let needed = (count as u64 * bits_per_sample as u64).div_ceil(8);
        if (data.len() as u64) < needed {
            return Err(Error::BufferSize {
                expected: needed as usize,
                actual: data.len(),
            });
        }

        let mut reader = BitReader::new(data);
        let samples = (0..count).map(|_| reader.read_bits(bits_per_sample)).collect();
        let encode = size.iter().map(|&s| (0.0, (s - 1) as f32)).collect();
        let decode = range.clone();
        Ok(Self {
            domain,
            range,
            size,
            bits_per_sample,
            encode,
            decode,
            samples,
        })
    }

    pub fn with_encode(mut self, encode: Vec<Interval>) -> Self {
        if encode.len() == self.size.len() {
            self.encode = encode;
        }
        self
    }

    pub fn with_decode(mut self, decode: Vec<Interval>) -> Self {
        if decode.len() == self.range.len() {
            self.decode = decode;
        }
        self
    }

    pub fn output_count(&self) -> usize {
        self.range.len()
    }

    pub fn evaluate(&self, inputs: &[f32]) -> Result<FunctionOutput> {
        let m = self.size.len();
        let n = self.range.len();

        // per dimension: lower index, fraction, stride in samples
        let mut axes: SmallVec<[(usize, f32, usize); MAX_INPUTS]> = SmallVec::new();
        let mut stride = n;
        for i in 0..m {
            let x = clamp_to(inputs.get(i).copied().unwrap_or(self.domain[i].0), self.domain[i]);
            let max = (self.size[i] - 1) as f32;
            let e = interpolate(x, self.domain[i], self.encode[i]).clamp(0.0, max);
            let mut idx = e as usize;
            let mut frac = e - idx as f32;
            if idx + 1 >= self.size[i] {
                idx = self.size[i] - 1;
                frac = 0.0;
            }
            axes.push((idx, frac, stride));
            stride *= self.size[i];
        }

        let base: usize = axes.iter().map(|&(idx, _, s)| idx * s).sum();
        let mut acc: SmallVec<[f32; 8]> = SmallVec::from_elem(0.0, n);
        for corner in 0..(1usize << m) {
            let mut weight = 1.0f32;
            let mut offset = base;
            for (bit, &(_, frac, s)) in axes.iter().enumerate() {
                if corner & (1 << bit) != 0 {
                    if frac == 0.0 {
                        weight = 0.0;
                        break;
                    }
                    weight *= frac;
                    offset += s;
                } else {
                    weight *= 1.0 - frac;
                }
            }
            if weight == 0.0 {
                continue;
            }
            for (j, slot) in acc.iter_mut().enumerate() {
                let raw = *self
                    .samples
                    .get(offset + j)
                    .ok_or_else(|| Error::InvalidFunction("sample index out of table".into()))?;
                *slot += weight * raw as f32;
            }
        }

        let max_code = if self.bits_per_sample == 32 {
            u32::MAX as f32
        } else {
            ((1u64 << self.bits_per_sample) - 1) as f32
        };
        Ok(acc
            .iter()
            .enumerate()
            .map(|(j, &v)| {
                let decoded = interpolate(v, (0.0, max_code), self.decode[j]);
                clamp_to(decoded, self.range[j])
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_input_linear() {
        // 3 samples 0, 128, 255 over [0, 1]
        let f = SampledFunction::new(vec![(0.0, 1.0)], vec![(0.0, 1.0)], vec![3], 8, &[0, 128, 255])
            .unwrap();
        assert_eq!(f.evaluate(&[0.0]).unwrap()[0], 0.0);
        assert_eq!(f.evaluate(&[1.0]).unwrap()[0], 1.0);
        let mid = f.evaluate(&[0.25]).unwrap()[0];
        assert!((mid - 64.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn test_two_inputs_bilinear() {
        // 2x2 grid, first input fastest: f(0,0)=0 f(1,0)=255 f(0,1)=0 f(1,1)=255
        let f = SampledFunction::new(
            vec![(0.0, 1.0), (0.0, 1.0)],
            vec![(0.0, 1.0)],
            vec![2, 2],
            8,
            &[0, 255, 0, 255],
        )
        .unwrap();
        let v = f.evaluate(&[0.5, 0.3]).unwrap()[0];
        assert!((v - 0.5).abs() < 1e-3);
    }

    #[test]
    fn test_four_bit_samples_and_decode() {
        // 2 outputs per sample point, 4 bits each: [0 15] [15 0]
        let f = SampledFunction::new(vec![(0.0, 1.0)], vec![(0.0, 10.0); 2], vec![2], 4, &[0x0F, 0xF0])
            .unwrap()
            .with_decode(vec![(0.0, 10.0), (10.0, 0.0)]);
        let out = f.evaluate(&[0.0]).unwrap();
        assert_eq!(out.as_slice(), &[0.0, 0.0]);
        let out = f.evaluate(&[1.0]).unwrap();
        assert_eq!(out.as_slice(), &[10.0, 10.0]);
    }

    #[test]
    fn test_short_data_rejected() {
        assert!(SampledFunction::new(vec![(0.0, 1.0)], vec![(0.0, 1.0)], vec![4], 8, &[0, 1]).is_err());
        assert!(SampledFunction::new(vec![(0.0, 1.0)], vec![(0.0, 1.0)], vec![2], 7, &[0, 1]).is_err());
    }
}
