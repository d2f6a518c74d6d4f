//! Row sample cursor

use crate::bits::BitReader;

/// Reads packed samples out of one row. Missing trailing bytes read as 0.
#[derive(Debug, Clone)]
pub struct RowSamples<'a> {
    reader: BitReader<'a>,
    bits: u32,
}

impl<'a> RowSamples<'a> {
    pub fn new(row: &'a [u8], bits_per_component: u8) -> Self {
        Self {
            reader: BitReader::new(row),
            bits: u32::from(bits_per_component),
        }
    }

    /// The next raw code; 16-bit samples are big-endian
    #[inline]
    pub fn next_code(&mut self) -> u32 {
        self.reader.read_bits(self.bits)
    }

    /// The next code as a lookup table index (the high byte of 16-bit samples)
    #[inline]
    pub fn next_index(&mut self) -> usize {
        let code = self.next_code();
        if self.bits > 8 { (code >> (self.bits - 8)) as usize } else { code as usize }
    }
}
