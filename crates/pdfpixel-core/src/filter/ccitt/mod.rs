//! CCITTFaxDecode
//!
//! Group 4 (T.6) two-dimensional coding, plus Group 3 (T.4) one-dimensional
//! and mixed one/two-dimensional coding. Rows are tracked as lists of
//! changing elements: the columns where the pixel color flips, starting
//! from an implicit white run.
//!
//! Output rows are 1 bit per pixel, MSB-first, padded to a byte. A `0` bit
//! is black unless `BlackIs1` is set.

pub mod tables;

use log::{debug, warn};

use crate::bits::BitReader;
use crate::config::DEFAULT_MAX_PIXELS;
use crate::error::{Error, Result};

use tables::{BLACK, MAX_CODE_BITS, WHITE};

const EOL: u32 = 0b0000_0000_0001;

/// `/DecodeParms` for CCITTFaxDecode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CcittParams {
    /// < 0: Group 4, 0: Group 3 1-D, > 0: Group 3 mixed
    pub k: i32,
    pub columns: usize,
    /// Expected row count, 0 when unknown
    pub rows: usize,
    pub black_is_1: bool,
    pub encoded_byte_align: bool,
    pub end_of_block: bool,
    pub end_of_line: bool,
}

impl Default for CcittParams {
    fn default() -> Self {
        Self {
            k: 0,
            columns: 1728,
            rows: 0,
            black_is_1: false,
            encoded_byte_align: false,
            end_of_block: true,
            end_of_line: false,
        }
    }
}

impl CcittParams {
    /// Group 4 parameters for an image of the given size
    pub fn group4(columns: usize, rows: usize) -> Self {
        Self {
            k: -1,
            columns,
            rows,
            ..Self::default()
        }
    }
}

/// One decoded row as a list of changing elements
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodingLine {
    /// Columns where the color changes, strictly increasing, all `< width`
    pub changes: Vec<usize>,
    pub width: usize,
}

impl CodingLine {
    /// An all-white row
    pub fn blank(width: usize) -> Self {
        Self {
            changes: Vec::new(),
            width,
        }
    }

    /// Alternating run lengths, starting with white
    pub fn runs(&self) -> Vec<usize> {
        let mut runs = Vec::with_capacity(self.changes.len() + 1);
        let mut prev = 0;
        for &c in &self.changes {
            runs.push(c - prev);
            prev = c;
        }
        runs.push(self.width - prev);
        runs
    }

    /// Pack the row as 1-bit pixels into `out`
    pub fn pack_into(&self, out: &mut [u8], black_is_1: bool) {
        let (white, black) = if black_is_1 { (0u8, 1u8) } else { (1u8, 0u8) };
        out.fill(if white == 1 { 0xFF } else { 0x00 });
        if self.width % 8 != 0 {
            if let Some(last) = out.last_mut() {
                // padding bits stay zero
                *last &= 0xFFu8 << (8 - self.width % 8);
            }
        }

        let mut start = 0;
        let mut is_black = false;
        let ends = self.changes.iter().copied().chain(std::iter::once(self.width));
        for end in ends {
            if is_black {
                for x in start..end {
                    let bit = 7 - (x % 8);
                    out[x / 8] = (out[x / 8] & !(1 << bit)) | (black << bit);
                }
            }
            start = end;
            is_black = !is_black;
        }
    }
}

fn ccitt_error(row: usize, column: usize, width: usize, reason: &'static str) -> Error {
    Error::Ccitt {
        row,
        column,
        width,
        reason,
    }
}

/// Read one run length of the given color (makeup codes plus terminator)
fn read_run(reader: &mut BitReader<'_>, black: bool, row: usize, column: usize, width: usize) -> Result<usize> {
    let table = if black { &*BLACK } else { &*WHITE };
    let mut total = 0usize;
    loop {
        let (len, run) = table.get(reader.peek_bits(MAX_CODE_BITS));
        if len == 0 {
            return Err(ccitt_error(row, column, width, "invalid run-length code"));
        }
        reader.drop_bits(len as u32);
        total += run as usize;
        if run < 64 {
            return Ok(total);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Pass,
    Horizontal,
    Vertical(i8),
}

fn read_mode(reader: &mut BitReader<'_>) -> Option<Mode> {
    let bits = reader.peek_bits(7);
    let (len, mode) = if bits & 0b100_0000 != 0 {
        (1, Mode::Vertical(0))
    } else if bits >> 4 == 0b011 {
        (3, Mode::Vertical(1))
    } else if bits >> 4 == 0b010 {
        (3, Mode::Vertical(-1))
    } else if bits >> 4 == 0b001 {
        (3, Mode::Horizontal)
    } else if bits >> 3 == 0b0001 {
        (4, Mode::Pass)
    } else if bits >> 1 == 0b00_0011 {
        (6, Mode::Vertical(2))
    } else if bits >> 1 == 0b00_0010 {
        (6, Mode::Vertical(-2))
    } else if bits == 0b000_0011 {
        (7, Mode::Vertical(3))
    } else if bits == 0b000_0010 {
        (7, Mode::Vertical(-3))
    } else {
        return None;
    };
    reader.drop_bits(len);
    Some(mode)
}

/// Drop zero-length runs so the list stays strictly increasing
fn normalize(changes: &mut Vec<usize>) {
    let mut out: Vec<usize> = Vec::with_capacity(changes.len());
    for &c in changes.iter() {
        if out.last() == Some(&c) {
            out.pop();
        } else {
            out.push(c);
        }
    }
    *changes = out;
}

/// Decode one two-dimensionally coded row against `reference`
///
/// `reference` holds the changing elements of the previous row (empty for
/// an all-white row). `row` is only used for diagnostics.
pub fn decode_row_2d(
    reader: &mut BitReader<'_>,
    reference: &[usize],
    width: usize,
    row: usize,
) -> Result<CodingLine> {
    let mut changes = Vec::with_capacity(reference.len() + 4);
    // a0 sits before the first pixel until the first code is decoded
    let mut a0: isize = -1;
    let mut black = false;
    // first reference index whose element lies right of a0
    let mut hint = 0usize;

    while a0 < width as isize {
        while hint < reference.len() && reference[hint] as isize <= a0 {
            hint += 1;
        }
        // b1 has the opposite color of a0: even indices start black runs
        let mut i = hint;
        if (i % 2 == 1) != black {
            i += 1;
        }
        let b1 = reference.get(i).copied().unwrap_or(width).min(width);
        let b2 = reference.get(i + 1).copied().unwrap_or(width).min(width);
        let column = a0.max(0) as usize;

        let mode = read_mode(reader).ok_or_else(|| {
            if reader.peek_bits(7) == 0b000_0001 {
                ccitt_error(row, column, width, "uncompressed mode extension not supported")
            } else {
                ccitt_error(row, column, width, "invalid mode code")
            }
        })?;

        match mode {
            Mode::Pass => {
                if (b2 as isize) < a0 {
                    return Err(ccitt_error(row, column, width, "pass mode moves backwards"));
                }
                a0 = b2 as isize;
            }
            Mode::Horizontal => {
                let start = column;
                let run1 = read_run(reader, black, row, start, width)?;
                let a1 = start + run1;
                let run2 = read_run(reader, !black, row, a1, width)?;
                let a2 = a1 + run2;
                if a1 > width || a2 > width {
                    return Err(ccitt_error(row, start, width, "horizontal run past end of row"));
                }
                if a1 < width {
                    changes.push(a1);
                }
                if a2 < width {
                    changes.push(a2);
                }
                a0 = a2 as isize;
            }
            Mode::Vertical(delta) => {
                let a1 = b1 as isize + delta as isize;
                if a1 < 0 || a1 > width as isize {
                    return Err(ccitt_error(row, column, width, "vertical mode outside the row"));
                }
                if a1 < a0 {
                    return Err(ccitt_error(row, column, width, "a1 lies before a0"));
                }
                if a1 < width as isize {
                    changes.push(a1 as usize);
                }
                black = !black;
                a0 = a1;
            }
        }
    }

    normalize(&mut changes);
    Ok(CodingLine { changes, width })
}

/// Decode one one-dimensionally (Modified Huffman) coded row
pub fn decode_row_1d(reader: &mut BitReader<'_>, width: usize, row: usize) -> Result<CodingLine> {
    let mut changes = Vec::new();
    let mut pos = 0usize;
    let mut black = false;

    while pos < width {
        let run = read_run(reader, black, row, pos, width)?;
        pos += run;
        if pos > width {
            return Err(ccitt_error(row, pos - run, width, "run past end of row"));
        }
        if pos < width {
            changes.push(pos);
        }
        black = !black;
    }

    normalize(&mut changes);
    Ok(CodingLine { changes, width })
}

/// Consume an EOL (with any fill bits before it). Returns false when the
/// next bits are not an EOL.
fn skip_eol(reader: &mut BitReader<'_>) -> bool {
    if reader.peek_bits(11) != 0 {
        return false;
    }
    while reader.peek_bits(1) == 0 {
        if reader.is_exhausted() {
            return false;
        }
        reader.drop_bits(1);
    }
    reader.drop_bits(1);
    true
}

/// Decode a complete CCITT fax stream into packed 1-bit rows
pub fn decode(data: &[u8], params: &CcittParams) -> Result<Vec<u8>> {
    decode_with_limit(data, params, DEFAULT_MAX_PIXELS)
}

/// Decode a CCITT fax stream of at most `max_pixels` pixels
///
/// `Columns` times `Rows` is checked up front; when `Rows` is absent,
/// decoding stops with an error once the decoded rows pass the limit.
pub fn decode_with_limit(data: &[u8], params: &CcittParams, max_pixels: usize) -> Result<Vec<u8>> {
    let width = params.columns;
    if width == 0 {
        return Err(Error::filter("CCITTFaxDecode", "Columns must be positive"));
    }
    let too_large = |height: usize| Error::ImageTooLarge {
        width,
        height,
        limit: max_pixels,
    };
    let max_rows = max_pixels / width;
    if max_rows == 0 || params.rows > max_rows {
        return Err(too_large(params.rows.max(1)));
    }
    let row_bytes = width.div_ceil(8);
    let mut out = Vec::with_capacity(row_bytes * params.rows.max(1));
    let mut reader = BitReader::new(data);
    let mut reference = CodingLine::blank(width);
    let mut row = 0usize;

    loop {
        if params.rows > 0 && row >= params.rows {
            break;
        }
        if params.encoded_byte_align && params.k <= 0 {
            reader.byte_align();
        }
        if reader.is_exhausted() || reader.rest_is_zero() {
            break;
        }

        // EOL / EOFB / RTC detection
        let mut eols = 0;
        while reader.peek_bits(12) == EOL || (params.k >= 0 && reader.peek_bits(11) == 0 && !reader.rest_is_zero()) {
            if !skip_eol(&mut reader) {
                break;
            }
            eols += 1;
            if params.encoded_byte_align && params.k > 0 {
                reader.byte_align();
            }
        }
        if eols >= 2 && params.end_of_block {
            debug!("CCITT end of block after {row} rows");
            break;
        }
        if reader.is_exhausted() || reader.rest_is_zero() {
            break;
        }

        if row >= max_rows {
            return Err(too_large(row + 1));
        }

        let line = if params.k < 0 {
            decode_row_2d(&mut reader, &reference.changes, width, row)?
        } else if params.k == 0 {
            decode_row_1d(&mut reader, width, row)?
        } else if reader.read_bit() {
            decode_row_1d(&mut reader, width, row)?
        } else {
            decode_row_2d(&mut reader, &reference.changes, width, row)?
        };

        let start = out.len();
        out.resize(start + row_bytes, 0);
        line.pack_into(&mut out[start..], params.black_is_1);
        reference = line;
        row += 1;
    }

    if params.rows > 0 && row < params.rows {
        warn!("CCITT stream ended after {row} of {} rows", params.rows);
    }
    Ok(out)
}
