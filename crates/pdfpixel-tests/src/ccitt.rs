//! CCITT fax encoders
//!
//! Rows are slices of pixels, `true` for black. The encoders follow the
//! same changing-element conventions as the decoder: an imaginary white
//! pixel precedes each row and an all-white row is the first reference.

use pdfpixel_core::filter::ccitt::tables::{BLACK_CODES, WHITE_CODES};

/// MSB-first bit sink
#[derive(Debug, Default)]
pub struct BitWriter {
    bytes: Vec<u8>,
    acc: u32,
    nbits: u32,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the low `len` bits of `code`
    pub fn write(&mut self, code: u32, len: u32) {
        for i in (0..len).rev() {
            self.acc = (self.acc << 1) | ((code >> i) & 1);
            self.nbits += 1;
            if self.nbits == 8 {
                self.bytes.push(self.acc as u8);
                self.acc = 0;
                self.nbits = 0;
            }
        }
    }

    /// Write a string of `0` and `1` characters
    pub fn write_str(&mut self, bits: &str) {
        for c in bits.chars() {
            self.write(u32::from(c == '1'), 1);
        }
    }

    pub fn bit_len(&self) -> usize {
        self.bytes.len() * 8 + self.nbits as usize
    }

    /// Zero-pad to a byte boundary
    pub fn align(&mut self) {
        if self.nbits > 0 {
            self.write(0, 8 - self.nbits);
        }
    }

    pub fn finish(mut self) -> Vec<u8> {
        self.align();
        self.bytes
    }
}

const EOL: (u32, u32) = (1, 12);

fn code_for(run: usize, black: bool) -> (u32, u32) {
    let table = if black { &BLACK_CODES } else { &WHITE_CODES };
    table
        .iter()
        .find(|&&(_, _, r)| r as usize == run)
        .map(|&(code, len, _)| (u32::from(code), u32::from(len)))
        .unwrap_or_else(|| panic!("no code for run {run}"))
}

/// Emit one run: 2560 makeups as needed, one makeup, then a terminator
pub fn write_run(w: &mut BitWriter, mut run: usize, black: bool) {
    while run >= 2560 {
        let (code, len) = code_for(2560, black);
        w.write(code, len);
        run -= 2560;
    }
    if run >= 64 {
        let (code, len) = code_for(run / 64 * 64, black);
        w.write(code, len);
        run %= 64;
    }
    let (code, len) = code_for(run, black);
    w.write(code, len);
}

/// Changing elements of a row
pub fn changes(row: &[bool]) -> Vec<usize> {
    let mut out = Vec::new();
    let mut color = false;
    for (x, &px) in row.iter().enumerate() {
        if px != color {
            out.push(x);
            color = px;
        }
    }
    out
}

fn next_after(changes: &[usize], pos: isize, width: usize) -> usize {
    changes
        .iter()
        .copied()
        .find(|&c| c as isize > pos)
        .unwrap_or(width)
}

/// b1 and b2 for a0 of the given color
fn reference_pair(reference: &[usize], a0: isize, black: bool, width: usize) -> (usize, usize) {
    let mut i = reference.iter().position(|&c| c as isize > a0).unwrap_or(reference.len());
    if (i % 2 == 1) != black {
        i += 1;
    }
    let b1 = reference.get(i).copied().unwrap_or(width);
    let b2 = reference.get(i + 1).copied().unwrap_or(width);
    (b1, b2)
}

fn encode_row_2d(w: &mut BitWriter, current: &[usize], reference: &[usize], width: usize) {
    let mut a0: isize = -1;
    let mut black = false;
    while a0 < width as isize {
        let a1 = next_after(current, a0, width);
        let (b1, b2) = reference_pair(reference, a0, black, width);
        if b2 < a1 {
            w.write_str("0001");
            a0 = b2 as isize;
            continue;
        }
        let delta = a1 as isize - b1 as isize;
        if delta.abs() <= 3 {
            let bits = match delta {
                0 => "1",
                1 => "011",
                2 => "000011",
                3 => "0000011",
                -1 => "010",
                -2 => "000010",
                _ => "0000010",
            };
            w.write_str(bits);
            black = !black;
            a0 = a1 as isize;
        } else {
            let a2 = next_after(current, a1 as isize, width);
            w.write_str("001");
            write_run(w, a1 - a0.max(0) as usize, black);
            write_run(w, a2 - a1, !black);
            a0 = a2 as isize;
        }
    }
}

/// Group 4 (T.6) encoding, optionally terminated by EOFB
pub fn encode_g4(rows: &[Vec<bool>], width: usize, eofb: bool) -> Vec<u8> {
    let mut w = BitWriter::new();
    let mut reference = Vec::new();
    for row in rows {
        assert_eq!(row.len(), width, "row width");
        let current = changes(row);
        encode_row_2d(&mut w, &current, &reference, width);
        reference = current;
    }
    if eofb {
        w.write(EOL.0, EOL.1);
        w.write(EOL.0, EOL.1);
    }
    w.finish()
}

/// Group 3 one-dimensional (Modified Huffman) encoding
pub fn encode_g3_1d(rows: &[Vec<bool>], width: usize, eol: bool) -> Vec<u8> {
    let mut w = BitWriter::new();
    for row in rows {
        assert_eq!(row.len(), width, "row width");
        if eol {
            w.write(EOL.0, EOL.1);
        }
        write_row_1d(&mut w, &changes(row), width);
    }
    w.finish()
}

fn write_row_1d(w: &mut BitWriter, current: &[usize], width: usize) {
    let mut prev = 0;
    let mut black = false;
    for &c in current.iter().chain(std::iter::once(&width)) {
        write_run(w, c - prev, black);
        prev = c;
        black = !black;
    }
}

/// Group 3 mixed encoding (K > 0): an EOL and a one-bit tag before each
/// row, every `k`-th row one-dimensional
pub fn encode_g3_mixed(rows: &[Vec<bool>], width: usize, k: usize) -> Vec<u8> {
    assert!(k > 0, "K must be positive");
    let mut w = BitWriter::new();
    let mut reference = Vec::new();
    for (y, row) in rows.iter().enumerate() {
        assert_eq!(row.len(), width, "row width");
        w.write(EOL.0, EOL.1);
        let current = changes(row);
        if y % k == 0 {
            w.write(1, 1);
            write_row_1d(&mut w, &current, width);
        } else {
            w.write(0, 1);
            encode_row_2d(&mut w, &current, &reference, width);
        }
        reference = current;
    }
    w.finish()
}

/// Pack rows the way the decoder emits them
pub fn pack_rows(rows: &[Vec<bool>], width: usize, black_is_1: bool) -> Vec<u8> {
    let row_bytes = width.div_ceil(8);
    let mut out = vec![0u8; rows.len() * row_bytes];
    for (y, row) in rows.iter().enumerate() {
        for (x, &px) in row.iter().enumerate() {
            if px == black_is_1 {
                out[y * row_bytes + x / 8] |= 0x80 >> (x % 8);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_writer_packs_msb_first() {
        let mut w = BitWriter::new();
        w.write_str("101");
        w.write(0b11111, 5);
        assert_eq!(w.bit_len(), 8);
        assert_eq!(w.finish(), vec![0b1011_1111]);
    }

    #[test]
    fn test_changes() {
        assert_eq!(changes(&[false, true, true, false]), vec![1, 3]);
        assert_eq!(changes(&[true, false]), vec![0, 1]);
        assert!(changes(&[false; 5]).is_empty());
    }

    #[test]
    fn test_blank_row_is_single_v0() {
        let data = encode_g4(&[vec![false; 16]], 16, false);
        assert_eq!(data, vec![0b1000_0000]);
    }
}
