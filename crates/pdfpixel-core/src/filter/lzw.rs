//! LZWDecode
//!
//! Variable-width codes from 9 to 12 bits, MSB-first. With `EarlyChange`
//! (the PDF default) the code width grows one code earlier than in TIFF.

use log::{debug, warn};

use crate::bits::BitReader;
use crate::error::{Error, Result};

const CLEAR_TABLE: usize = 256;
const EOD: usize = 257;
const INITIAL_SIZE: usize = 258;
const MAX_ENTRIES: usize = 4096;

/// One dictionary entry, stored as a back-link to its prefix
#[derive(Debug, Clone, Copy)]
struct Entry {
    prefix: u16,
    last: u8,
    first: u8,
    len: u16,
}

struct Table {
    entries: Vec<Entry>,
    early_change: bool,
}

impl Table {
    fn new(early_change: bool) -> Self {
        let mut entries = Vec::with_capacity(MAX_ENTRIES);
        for b in 0..=255u8 {
            entries.push(Entry {
                prefix: 0,
                last: b,
                first: b,
                len: 1,
            });
        }
        // CLEAR_TABLE and EOD carry no data
        entries.push(Entry {
            prefix: 0,
            last: 0,
            first: 0,
            len: 0,
        });
        entries.push(Entry {
            prefix: 0,
            last: 0,
            first: 0,
            len: 0,
        });
        Self {
            entries,
            early_change,
        }
    }

    fn clear(&mut self) {
        self.entries.truncate(INITIAL_SIZE);
    }

    fn size(&self) -> usize {
        self.entries.len()
    }

    fn code_length(&self) -> u32 {
        let adjusted = self.entries.len() + usize::from(self.early_change);
        if adjusted >= 2048 {
            12
        } else if adjusted >= 1024 {
            11
        } else if adjusted >= 512 {
            10
        } else {
            9
        }
    }

    fn register(&mut self, prev: usize, byte: u8) {
        if self.entries.len() >= MAX_ENTRIES {
            return;
        }
        let p = self.entries[prev];
        self.entries.push(Entry {
            prefix: prev as u16,
            last: byte,
            first: p.first,
            len: p.len + 1,
        });
    }

    /// Append the bytes of `code` to `out`
    fn emit(&self, code: usize, out: &mut Vec<u8>) {
        let len = self.entries[code].len as usize;
        let start = out.len();
        out.resize(start + len, 0);
        let mut c = code;
        for i in (0..len).rev() {
            let e = self.entries[c];
            out[start + i] = e.last;
            c = e.prefix as usize;
        }
    }
}

/// Decode an LZW stream
pub fn decode(data: &[u8], early_change: bool) -> Result<Vec<u8>> {
    decode_with_limit(data, early_change, usize::MAX)
}

/// Decode an LZW stream, stopping once `limit` bytes are produced
pub fn decode_with_limit(data: &[u8], early_change: bool, limit: usize) -> Result<Vec<u8>> {
    let mut table = Table::new(early_change);
    let mut reader = BitReader::new(data);
    let mut out = Vec::with_capacity(data.len().saturating_mul(3).min(limit));
    let mut prev: Option<usize> = None;

    loop {
        if out.len() >= limit {
            debug!("LZW output reached the {limit} byte limit");
            out.truncate(limit);
            return Ok(out);
        }
        let width = table.code_length();
        if reader.bits_remaining() < width as usize {
            warn!("premature end of LZW stream, EOD code missing");
            return Ok(out);
        }
        let code = reader.read_bits(width) as usize;

        match code {
            CLEAR_TABLE => {
                table.clear();
                prev = None;
            }
            EOD => return Ok(out),
            code => {
                let size = table.size();
                match prev {
                    None => {
                        if code >= 256 {
                            return Err(Error::Lzw(format!(
                                "first code after clear must be a literal, got {code}"
                            )));
                        }
                        out.push(code as u8);
                    }
                    Some(p) if code < size => {
                        table.emit(code, &mut out);
                        let first = table.entries[code].first;
                        table.register(p, first);
                    }
                    Some(p) if code == size => {
                        let first = table.entries[p].first;
                        table.register(p, first);
                        table.emit(code, &mut out);
                    }
                    Some(_) => {
                        return Err(Error::Lzw(format!(
                            "invalid code {code} (table size {size}) at bit {}",
                            reader.bits_consumed()
                        )));
                    }
                }
                prev = Some(code);
            }
        }
    }
}
