//! Entropy-coded segment bit reader
//!
//! Handles byte stuffing (`FF 00` is a literal `FF`), skips `FF` fill
//! bytes, and stops at markers. Once a marker is seen the reader keeps
//! returning zero bits until the caller consumes it with
//! [`JpegBitReader::try_read_marker`].

/// Snapshot of a reader position, including bits already buffered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitState {
    pos: usize,
    buf: u64,
    count: u32,
    pad: u32,
    marker: Option<u8>,
}

#[derive(Debug, Clone)]
pub struct JpegBitReader<'a> {
    data: &'a [u8],
    pos: usize,
    buf: u64,
    count: u32,
    /// Synthesized zero bits at the bottom of `buf`
    pad: u32,
    marker: Option<u8>,
}

impl<'a> JpegBitReader<'a> {
    /// Start reading entropy-coded data at `pos`
    pub fn new(data: &'a [u8], pos: usize) -> Self {
        Self {
            data,
            pos,
            buf: 0,
            count: 0,
            pad: 0,
            marker: None,
        }
    }

    /// Resume from a previously captured state
    pub fn resume(data: &'a [u8], state: BitState) -> Self {
        Self {
            data,
            pos: state.pos,
            buf: state.buf,
            count: state.count,
            pad: state.pad,
            marker: state.marker,
        }
    }

    pub fn capture_state(&self) -> BitState {
        BitState {
            pos: self.pos,
            buf: self.buf,
            count: self.count,
            pad: self.pad,
            marker: self.marker,
        }
    }

    fn push_byte(&mut self, byte: u8, synthetic: bool) {
        self.buf = (self.buf << 8) | byte as u64;
        self.count += 8;
        if synthetic {
            self.pad += 8;
        }
    }

    fn refill(&mut self) {
        while self.count <= 56 {
            if self.marker.is_some() || self.pos >= self.data.len() {
                self.push_byte(0, true);
                continue;
            }
            let byte = self.data[self.pos];
            if byte != 0xFF {
                self.pos += 1;
                self.push_byte(byte, false);
                continue;
            }
            let mut next = self.pos + 1;
            while self.data.get(next) == Some(&0xFF) {
                next += 1;
            }
            match self.data.get(next) {
                Some(0x00) => {
                    self.pos = next + 1;
                    self.push_byte(0xFF, false);
                }
                Some(&marker) => {
                    self.pos = next + 1;
                    self.marker = Some(marker);
                }
                None => self.pos = self.data.len(),
            }
        }
    }

    /// Look at the next `n` bits (n <= 32)
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

    #[inline]
    pub fn peek_bits16(&mut self) -> u16 {
        self.peek_bits(16) as u16
    }

    #[inline]
    pub fn drop_bits(&mut self, n: u32) {
        if self.count < n {
            self.refill();
        }
        self.count -= n;
        self.pad = self.pad.min(self.count);
    }

    #[inline]
    pub fn read_bits(&mut self, n: u32) -> u32 {
        let v = self.peek_bits(n);
        self.drop_bits(n);
        v
    }

    #[inline]
    pub fn read_bit(&mut self) -> bool {
        self.read_bits(1) == 1
    }

    /// Read an `n`-bit magnitude category and sign-extend it
    #[inline]
    pub fn receive_extend(&mut self, n: u32) -> i32 {
        if n == 0 {
            return 0;
        }
        let v = self.read_bits(n) as i32;
        if v < (1 << (n - 1)) {
            v - (1 << n) + 1
        } else {
            v
        }
    }

    pub fn byte_align(&mut self) {
        let partial = self.count % 8;
        self.count -= partial;
        self.pad = self.pad.min(self.count);
    }

    /// Marker seen by the reader but not yet consumed
    pub fn pending_marker(&self) -> Option<u8> {
        self.marker
    }

    /// Consume a marker at the current (byte-aligned) position
    ///
    /// Returns `None` when real entropy-coded bytes are still buffered
    /// ahead of the marker, or when the next bytes are not a marker.
    pub fn try_read_marker(&mut self) -> Option<u8> {
        if self.count - self.pad >= 8 {
            return None;
        }
        if let Some(marker) = self.marker.take() {
            self.buf = 0;
            self.count = 0;
            self.pad = 0;
            return Some(marker);
        }
        self.buf = 0;
        self.count = 0;
        self.pad = 0;
        if self.data.get(self.pos) != Some(&0xFF) {
            return None;
        }
        let mut next = self.pos + 1;
        while self.data.get(next) == Some(&0xFF) {
            next += 1;
        }
        match self.data.get(next) {
            Some(&marker) if marker != 0 => {
                self.pos = next + 1;
                Some(marker)
            }
            _ => None,
        }
    }

    /// Byte offset of the next unread input byte
    pub fn position(&self) -> usize {
        self.pos
    }
}
