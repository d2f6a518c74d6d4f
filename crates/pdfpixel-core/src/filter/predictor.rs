//! PNG and TIFF predictor undo for Flate and LZW streams

use log::warn;

use crate::error::{Error, Result};

/// `/DecodeParms` entries that drive the predictor stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PredictorParams {
    /// 1 = none, 2 = TIFF, 10..=15 = PNG
    pub predictor: u8,
    pub colors: usize,
    pub bits_per_component: u8,
    pub columns: usize,
}

impl Default for PredictorParams {
    fn default() -> Self {
        Self {
            predictor: 1,
            colors: 1,
            bits_per_component: 8,
            columns: 1,
        }
    }
}

impl PredictorParams {
    pub fn new(predictor: u8, colors: usize, bits_per_component: u8, columns: usize) -> Self {
        Self {
            predictor,
            colors,
            bits_per_component,
            columns,
        }
    }

    fn bits_per_pixel(&self) -> usize {
        self.colors * self.bits_per_component as usize
    }

    /// Bytes per complete pixel, at least one (the PNG filter distance)
    fn bytes_per_pixel(&self) -> usize {
        self.bits_per_pixel().div_ceil(8)
    }

    /// Bytes in one row of predicted data, without the PNG tag byte
    pub fn row_length(&self) -> usize {
        (self.columns * self.bits_per_pixel()).div_ceil(8)
    }
}

/// Undo the predictor described by `params`
pub fn apply_predictor(data: Vec<u8>, params: &PredictorParams) -> Result<Vec<u8>> {
    if !matches!(params.bits_per_component, 1 | 2 | 4 | 8 | 16) {
        return Err(Error::filter(
            "Predictor",
            format!("invalid bits per component {}", params.bits_per_component),
        ));
    }
    if params.colors == 0 || params.columns == 0 {
        return Err(Error::filter("Predictor", "Colors and Columns must be positive"));
    }

    match params.predictor {
        0 | 1 => Ok(data),
        2 => Ok(undo_tiff(data, params)),
        10..=15 => Ok(undo_png(&data, params)),
        other => Err(Error::Unsupported(format!("predictor {other}"))),
    }
}

fn undo_png(data: &[u8], params: &PredictorParams) -> Vec<u8> {
    let row_len = params.row_length();
    let bpp = params.bytes_per_pixel();
    let rows = data.len().div_ceil(row_len + 1);
    let mut out = Vec::with_capacity(rows * row_len);
    let mut prev = vec![0u8; row_len];

    for chunk in data.chunks(row_len + 1) {
        let tag = chunk[0];
        let input = &chunk[1..];
        if input.len() < row_len {
            warn!(
                "truncated PNG predictor row: {} of {} bytes",
                input.len(),
                row_len
            );
        }

        let mut row = vec![0u8; row_len];
        row[..input.len()].copy_from_slice(input);

        match tag {
            0 => {}
            1 => {
                for i in bpp..row_len {
                    row[i] = row[i].wrapping_add(row[i - bpp]);
                }
            }
            2 => {
                for i in 0..row_len {
                    row[i] = row[i].wrapping_add(prev[i]);
                }
            }
            3 => {
                for i in 0..row_len {
                    let left = if i >= bpp { row[i - bpp] } else { 0 };
                    let avg = ((left as u16 + prev[i] as u16) / 2) as u8;
                    row[i] = row[i].wrapping_add(avg);
                }
            }
            4 => {
                for i in 0..row_len {
                    let (left, upper_left) = if i >= bpp {
                        (row[i - bpp], prev[i - bpp])
                    } else {
                        (0, 0)
                    };
                    row[i] = row[i].wrapping_add(paeth(left, prev[i], upper_left));
                }
            }
            other => {
                warn!("unknown PNG row filter {other}, copying row unchanged");
            }
        }

        out.extend_from_slice(&row[..input.len()]);
        prev = row;
    }

    out
}

#[inline]
fn paeth(a: u8, b: u8, c: u8) -> u8 {
    let p = a as i16 + b as i16 - c as i16;
    let pa = (p - a as i16).abs();
    let pb = (p - b as i16).abs();
    let pc = (p - c as i16).abs();
    if pa <= pb && pa <= pc {
        a
    } else if pb <= pc {
        b
    } else {
        c
    }
}

fn undo_tiff(mut data: Vec<u8>, params: &PredictorParams) -> Vec<u8> {
    let row_len = params.row_length();
    let colors = params.colors;

    for row in data.chunks_mut(row_len) {
        match params.bits_per_component {
            8 => {
                for i in colors..row.len() {
                    row[i] = row[i].wrapping_add(row[i - colors]);
                }
            }
            16 => {
                let stride = colors * 2;
                let mut i = stride;
                while i + 1 < row.len() {
                    let left = u16::from_be_bytes([row[i - stride], row[i - stride + 1]]);
                    let cur = u16::from_be_bytes([row[i], row[i + 1]]);
                    let v = cur.wrapping_add(left).to_be_bytes();
                    row[i] = v[0];
                    row[i + 1] = v[1];
                    i += 2;
                }
            }
            bits => undo_tiff_packed(row, colors, bits as usize, params.columns),
        }
    }

    data
}

/// TIFF predictor for 1, 2 and 4 bit samples
fn undo_tiff_packed(row: &mut [u8], colors: usize, bits: usize, columns: usize) {
    let mask = (1u16 << bits) - 1;
    let samples = (columns * colors).min(row.len() * 8 / bits);
    let get = |row: &[u8], i: usize| -> u16 {
        let bit = i * bits;
        ((row[bit / 8] >> (8 - bits - bit % 8)) as u16) & mask
    };

    for i in colors..samples {
        let v = (get(row, i) + get(row, i - colors)) & mask;
        let bit = i * bits;
        let shift = 8 - bits - bit % 8;
        let byte = &mut row[bit / 8];
        *byte = (*byte & !((mask as u8) << shift)) | ((v as u8) << shift);
    }
}
