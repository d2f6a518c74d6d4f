//! Canonical Huffman tables (DHT)

use super::bits::JpegBitReader;
use crate::error::{Error, Result};

const FAST_BITS: u32 = 9;

/// Decoding table for one DC or AC Huffman code
#[derive(Debug, Clone)]
pub struct HuffmanTable {
    /// `(code length, symbol)` for codes of at most `FAST_BITS` bits
    fast: Vec<(u8, u8)>,
    min_code: [i32; 17],
    max_code: [i32; 17],
    val_ptr: [i32; 17],
    symbols: Vec<u8>,
}

impl HuffmanTable {
    /// Build from the 16 per-length counts and the symbol list of a DHT
    /// segment
    pub fn new(counts: &[u8; 16], symbols: &[u8]) -> Result<Self> {
        let total: usize = counts.iter().map(|&c| c as usize).sum();
        if total != symbols.len() || total > 256 {
            return Err(Error::jpeg(0, "Huffman symbol count mismatch"));
        }

        let mut fast = vec![(0u8, 0u8); 1 << FAST_BITS];
        let mut min_code = [0i32; 17];
        let mut max_code = [-1i32; 17];
        let mut val_ptr = [0i32; 17];

        let mut code = 0i32;
        let mut k = 0usize;
        for len in 1..=16usize {
            let n = counts[len - 1] as usize;
            val_ptr[len] = k as i32;
            min_code[len] = code;
            for _ in 0..n {
                if code >= (1 << len) {
                    return Err(Error::jpeg(0, "Huffman table is over-subscribed"));
                }
                if len as u32 <= FAST_BITS {
                    let shift = FAST_BITS - len as u32;
                    let base = (code as usize) << shift;
                    for slot in &mut fast[base..base + (1 << shift)] {
                        *slot = (len as u8, symbols[k]);
                    }
                }
                code += 1;
                k += 1;
            }
            if n > 0 {
                max_code[len] = code - 1;
            }
            code <<= 1;
        }

        Ok(Self {
            fast,
            min_code,
            max_code,
            val_ptr,
            symbols: symbols.to_vec(),
        })
    }

    /// Decode one symbol
    #[inline]
    pub fn decode(&self, reader: &mut JpegBitReader<'_>) -> Result<u8> {
        let peek = reader.peek_bits16() as u32;
        let (len, symbol) = self.fast[(peek >> (16 - FAST_BITS)) as usize];
        if len != 0 {
            reader.drop_bits(len as u32);
            return Ok(symbol);
        }

        for len in (FAST_BITS as usize + 1)..=16 {
            let code = (peek >> (16 - len)) as i32;
            if code <= self.max_code[len] {
                let idx = self.val_ptr[len] + code - self.min_code[len];
                reader.drop_bits(len as u32);
                return self
                    .symbols
                    .get(idx as usize)
                    .copied()
                    .ok_or_else(|| Error::jpeg(reader.position(), "Huffman index out of range"));
            }
        }
        Err(Error::jpeg(reader.position(), "invalid Huffman code"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(lengths: &[(usize, u8)]) -> [u8; 16] {
        let mut c = [0u8; 16];
        for &(len, n) in lengths {
            c[len - 1] = n;
        }
        c
    }

    #[test]
    fn test_canonical_codes() {
        // lengths 2,2,3: codes 00, 01, 100
        let table = HuffmanTable::new(&counts(&[(2, 2), (3, 1)]), &[7, 8, 9]).unwrap();
        let data = [0b0001_1000];
        let mut r = JpegBitReader::new(&data, 0);
        assert_eq!(table.decode(&mut r).unwrap(), 7);
        assert_eq!(table.decode(&mut r).unwrap(), 8);
        assert_eq!(table.decode(&mut r).unwrap(), 9);
    }

    #[test]
    fn test_long_code_slow_path() {
        // one code of each length 1..=11: the 11-bit code is 11111111110
        let mut c = [0u8; 16];
        for slot in c.iter_mut().take(11) {
            *slot = 1;
        }
        let symbols: Vec<u8> = (1..=11).collect();
        let table = HuffmanTable::new(&c, &symbols).unwrap();
        // 0xFF is followed by a stuffed zero byte in entropy-coded data
        let data = [0xFF, 0x00, 0b1100_0000];
        let mut r = JpegBitReader::new(&data, 0);
        assert_eq!(table.decode(&mut r).unwrap(), 11);
    }

    #[test]
    fn test_oversubscribed() {
        assert!(HuffmanTable::new(&counts(&[(1, 3)]), &[1, 2, 3]).is_err());
    }

    #[test]
    fn test_count_mismatch() {
        assert!(HuffmanTable::new(&counts(&[(2, 2)]), &[1]).is_err());
    }
}
