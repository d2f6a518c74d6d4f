//! Bit and byte readers
//!
//! [`BitReader`] reads MSB-first fields from CCITT and LZW streams. Reading
//! past the end yields zero bits forever, so table-driven decoders see a
//! clean "no code" condition instead of a panic. [`ByteCursor`] reads
//! big-endian integers out of marker segments.

/// MSB-first bit reader over an immutable byte slice
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    data: &'a [u8],
    /// Next byte to load (may run past `data.len()` into zero padding)
    pos: usize,
    /// Right-aligned bit accumulator
    buf: u64,
    /// Number of valid bits in `buf`
    count: u32,
}

impl<'a> BitReader<'a> {
    /// Create a reader positioned at the first bit of `data`
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            buf: 0,
            count: 0,
        }
    }

    #[inline]
    fn refill(&mut self) {
        while self.count <= 56 {
            let byte = self.data.get(self.pos).copied().unwrap_or(0);
            self.pos += 1;
            self.buf = (self.buf << 8) | byte as u64;
            self.count += 8;
        }
    }

    /// Look at the next `n` bits (n <= 32) without consuming them
    #[inline]
    pub fn peek_bits(&mut self, n: u32) -> u32 {
        debug_assert!(n <= 32);
        if n == 0 {
            return 0;
        }
        if self.count < n {
            self.refill();
        }
        ((self.buf >> (self.count - n)) & ((1u64 << n) - 1)) as u32
    }

    /// Look at the next 16 bits
    #[inline]
    pub fn peek_bits16(&mut self) -> u16 {
        self.peek_bits(16) as u16
    }

    /// Consume `n` bits
    #[inline]
    pub fn drop_bits(&mut self, n: u32) {
        if self.count < n {
            self.refill();
        }
        self.count -= n;
    }

    /// Read `n` bits (n <= 32) as an unsigned value
    #[inline]
    pub fn read_bits(&mut self, n: u32) -> u32 {
        let v = self.peek_bits(n);
        self.drop_bits(n);
        v
    }

    /// Read a single bit
    #[inline]
    pub fn read_bit(&mut self) -> bool {
        self.read_bits(1) == 1
    }

    /// Read `n` bits as a two's complement signed value
    pub fn read_signed(&mut self, n: u32) -> i32 {
        if n == 0 {
            return 0;
        }
        let v = self.read_bits(n);
        if n < 32 && v & (1 << (n - 1)) != 0 {
            (v as i32) - (1i32 << n)
        } else {
            v as i32
        }
    }

    /// Skip to the next byte boundary
    pub fn byte_align(&mut self) {
        let partial = self.count % 8;
        self.count -= partial;
    }

    /// Number of bits consumed so far
    #[inline]
    pub fn bits_consumed(&self) -> usize {
        self.pos * 8 - self.count as usize
    }

    /// True once every real bit has been consumed
    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.bits_consumed() >= self.data.len() * 8
    }

    /// Number of real bits left before the zero padding
    pub fn bits_remaining(&self) -> usize {
        (self.data.len() * 8).saturating_sub(self.bits_consumed())
    }

    /// True when every remaining real bit is zero
    pub fn rest_is_zero(&self) -> bool {
        let consumed = self.bits_consumed();
        let byte = consumed / 8;
        if byte >= self.data.len() {
            return true;
        }
        let head_mask = 0xFFu8 >> (consumed % 8);
        self.data[byte] & head_mask == 0 && self.data[byte + 1..].iter().all(|&b| b == 0)
    }
}

/// Big-endian byte cursor used by segment parsers
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Start reading at `pos`
    pub fn at(data: &'a [u8], pos: usize) -> Self {
        Self { data, pos }
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn set_position(&mut self, pos: usize) {
        self.pos = pos;
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn peek_u8(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    pub fn read_u8(&mut self) -> Option<u8> {
        let v = self.peek_u8()?;
        self.pos += 1;
        Some(v)
    }

    pub fn read_u16(&mut self) -> Option<u16> {
        let b = self.take(2)?;
        Some(u16::from_be_bytes([b[0], b[1]]))
    }

    pub fn read_u32(&mut self) -> Option<u32> {
        let b = self.take(4)?;
        Some(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_i32(&mut self) -> Option<i32> {
        self.read_u32().map(|v| v as i32)
    }

    /// Borrow the next `n` bytes and advance past them
    pub fn take(&mut self, n: usize) -> Option<&'a [u8]> {
        let end = self.pos.checked_add(n)?;
        let slice = self.data.get(self.pos..end)?;
        self.pos = end;
        Some(slice)
    }

    pub fn skip(&mut self, n: usize) -> Option<()> {
        self.take(n).map(|_| ())
    }
}
