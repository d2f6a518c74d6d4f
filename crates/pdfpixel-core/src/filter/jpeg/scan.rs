//! Huffman scan decoding for baseline and progressive frames

use log::warn;

use super::bits::JpegBitReader;
use super::header::{Frame, RST0, RST7, ScanHeader, ZIGZAG};
use super::huffman::HuffmanTable;
use crate::error::{Error, Result};

/// Huffman tables available to a scan
pub struct ScanTables<'t> {
    pub dc: &'t [Option<HuffmanTable>; 4],
    pub ac: &'t [Option<HuffmanTable>; 4],
}

struct ScanState {
    preds: [i32; 4],
    eobrun: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pass {
    Baseline,
    DcFirst,
    DcRefine,
    AcFirst,
    AcRefine,
}

fn table<'t>(tables: &'t [Option<HuffmanTable>; 4], id: usize, what: &str, offset: usize) -> Result<&'t HuffmanTable> {
    tables[id]
        .as_ref()
        .ok_or_else(|| Error::jpeg(offset, format!("missing {what} Huffman table {id}")))
}

/// Decode one scan starting at `start`, updating the frame coefficients
pub fn decode_scan(
    data: &[u8],
    start: usize,
    frame: &mut Frame,
    scan: &ScanHeader,
    tables: &ScanTables<'_>,
    restart_interval: usize,
) -> Result<()> {
    let pass = if !frame.progressive {
        Pass::Baseline
    } else if scan.ss == 0 {
        if scan.se != 0 {
            return Err(Error::jpeg(start, "progressive DC scan with AC coefficients"));
        }
        if scan.ah == 0 { Pass::DcFirst } else { Pass::DcRefine }
    } else {
        if scan.components.len() != 1 {
            return Err(Error::jpeg(start, "interleaved progressive AC scan"));
        }
        if scan.ah == 0 { Pass::AcFirst } else { Pass::AcRefine }
    };

    // resolve tables up front so the block loop cannot fail on them
    let mut dc: [Option<&HuffmanTable>; 4] = [None; 4];
    let mut ac: [Option<&HuffmanTable>; 4] = [None; 4];
    for (i, sc) in scan.components.iter().enumerate() {
        if matches!(pass, Pass::Baseline | Pass::DcFirst) {
            dc[i] = Some(table(tables.dc, sc.dc_table, "DC", start)?);
        }
        if matches!(pass, Pass::Baseline | Pass::AcFirst | Pass::AcRefine) {
            ac[i] = Some(table(tables.ac, sc.ac_table, "AC", start)?);
        }
    }

    let mut reader = JpegBitReader::new(data, start);
    let mut state = ScanState {
        preds: [0; 4],
        eobrun: 0,
    };

    let single = scan.components.len() == 1;
    let (units_x, units_y) = if single {
        let comp = &frame.components[scan.components[0].index];
        (comp.blocks_per_line, comp.blocks_per_column)
    } else {
        (frame.mcus_x, frame.mcus_y)
    };
    let total = units_x * units_y;

    for unit in 0..total {
        if restart_interval > 0 && unit > 0 && unit % restart_interval == 0 {
            reader.byte_align();
            match reader.try_read_marker() {
                Some(m) if (RST0..=RST7).contains(&m) => {}
                other => {
                    warn!(
                        "expected restart marker before unit {unit}, found {:?}",
                        other.map(|m| format!("0x{m:02X}"))
                    );
                }
            }
            state.preds = [0; 4];
            state.eobrun = 0;
        }

        let (ux, uy) = (unit % units_x, unit / units_x);
        for (i, sc) in scan.components.iter().enumerate() {
            let comp = &mut frame.components[sc.index];
            let (bw, h, v) = (comp.blocks_w, comp.h, comp.v);
            let blocks: Vec<(usize, usize)> = if single {
                vec![(ux, uy)]
            } else {
                (0..v)
                    .flat_map(|by| (0..h).map(move |bx| (ux * h + bx, uy * v + by)))
                    .collect()
            };
            for (bx, by) in blocks {
                let base = (by * bw + bx) * 64;
                let block = &mut comp.coeffs[base..base + 64];
                match pass {
                    Pass::Baseline => {
                        decode_baseline(&mut reader, block, &mut state.preds[i], dc[i], ac[i])?
                    }
                    Pass::DcFirst => decode_dc_first(&mut reader, block, &mut state.preds[i], dc[i], scan.al)?,
                    Pass::DcRefine => {
                        if reader.read_bit() {
                            block[0] |= 1 << scan.al;
                        }
                    }
                    Pass::AcFirst => decode_ac_first(&mut reader, block, &mut state.eobrun, ac[i], scan)?,
                    Pass::AcRefine => decode_ac_refine(&mut reader, block, &mut state.eobrun, ac[i], scan)?,
                }
            }
        }
    }
    Ok(())
}

fn require<'t>(table: Option<&'t HuffmanTable>, reader: &JpegBitReader<'_>) -> Result<&'t HuffmanTable> {
    table.ok_or_else(|| Error::jpeg(reader.position(), "Huffman table not resolved"))
}

fn decode_baseline(
    reader: &mut JpegBitReader<'_>,
    block: &mut [i32],
    pred: &mut i32,
    dc: Option<&HuffmanTable>,
    ac: Option<&HuffmanTable>,
) -> Result<()> {
    let (dc, ac) = (require(dc, reader)?, require(ac, reader)?);
    let t = dc.decode(reader)? as u32;
    if t > 11 {
        return Err(Error::jpeg(reader.position(), "DC magnitude category out of range"));
    }
    *pred = pred.wrapping_add(reader.receive_extend(t));
    block[0] = *pred;

    let mut k = 1;
    while k < 64 {
        let rs = ac.decode(reader)?;
        let (r, s) = ((rs >> 4) as usize, (rs & 15) as u32);
        if s == 0 {
            if r == 15 {
                k += 16;
                continue;
            }
            break;
        }
        k += r;
        if k > 63 {
            return Err(Error::jpeg(reader.position(), "AC coefficient index past 63"));
        }
        block[ZIGZAG[k]] = reader.receive_extend(s);
        k += 1;
    }
    Ok(())
}

fn decode_dc_first(
    reader: &mut JpegBitReader<'_>,
    block: &mut [i32],
    pred: &mut i32,
    dc: Option<&HuffmanTable>,
    al: u32,
) -> Result<()> {
    let dc = require(dc, reader)?;
    let t = dc.decode(reader)? as u32;
    if t > 11 {
        return Err(Error::jpeg(reader.position(), "DC magnitude category out of range"));
    }
    *pred = pred.wrapping_add(reader.receive_extend(t));
    block[0] = pred.wrapping_shl(al);
    Ok(())
}

fn decode_ac_first(
    reader: &mut JpegBitReader<'_>,
    block: &mut [i32],
    eobrun: &mut u32,
    ac: Option<&HuffmanTable>,
    scan: &ScanHeader,
) -> Result<()> {
    if *eobrun > 0 {
        *eobrun -= 1;
        return Ok(());
    }
    let ac = require(ac, reader)?;
    let mut k = scan.ss;
    while k <= scan.se {
        let rs = ac.decode(reader)?;
        let (r, s) = ((rs >> 4) as u32, (rs & 15) as u32);
        if s == 0 {
            if r < 15 {
                *eobrun = (1 << r) - 1;
                if r > 0 {
                    *eobrun += reader.read_bits(r);
                }
                break;
            }
            k += 16;
            continue;
        }
        k += r as usize;
        if k > 63 {
            return Err(Error::jpeg(reader.position(), "AC coefficient index past 63"));
        }
        block[ZIGZAG[k]] = reader.receive_extend(s) * (1 << scan.al);
        k += 1;
    }
    Ok(())
}

#[inline]
fn refine_nonzero(reader: &mut JpegBitReader<'_>, coef: &mut i32, p1: i32, m1: i32) {
    if reader.read_bit() && (*coef & p1) == 0 {
        *coef += if *coef >= 0 { p1 } else { m1 };
    }
}

fn decode_ac_refine(
    reader: &mut JpegBitReader<'_>,
    block: &mut [i32],
    eobrun: &mut u32,
    ac: Option<&HuffmanTable>,
    scan: &ScanHeader,
) -> Result<()> {
    let p1 = 1i32 << scan.al;
    let m1 = -1i32 << scan.al;
    let mut k = scan.ss;

    if *eobrun == 0 {
        let ac = require(ac, reader)?;
        while k <= scan.se {
            let rs = ac.decode(reader)?;
            let (mut r, s) = ((rs >> 4) as i32, rs & 15);
            let mut value = 0;
            if s != 0 {
                if s != 1 {
                    warn!("progressive refinement with magnitude {s}");
                }
                value = if reader.read_bit() { p1 } else { m1 };
            } else if r != 15 {
                *eobrun = 1 << r;
                if r > 0 {
                    *eobrun += reader.read_bits(r as u32);
                }
                break;
            }

            // skip r zero-history coefficients, refining non-zero ones on the way
            while k <= scan.se {
                let coef = &mut block[ZIGZAG[k]];
                if *coef != 0 {
                    refine_nonzero(reader, coef, p1, m1);
                } else {
                    r -= 1;
                    if r < 0 {
                        break;
                    }
                }
                k += 1;
            }
            if value != 0 && k <= scan.se {
                block[ZIGZAG[k]] = value;
            }
            k += 1;
        }
    }

    if *eobrun > 0 {
        while k <= scan.se {
            let coef = &mut block[ZIGZAG[k]];
            if *coef != 0 {
                refine_nonzero(reader, coef, p1, m1);
            }
            k += 1;
        }
        *eobrun -= 1;
    }
    Ok(())
}

/// Offset of the first marker after entropy-coded data beginning at `start`,
/// ignoring stuffed bytes, fill bytes and restart markers
pub fn find_scan_end(data: &[u8], start: usize) -> usize {
    let mut pos = start;
    while pos + 1 < data.len() {
        if data[pos] == 0xFF {
            let next = data[pos + 1];
            if next != 0x00 && next != 0xFF && !(RST0..=RST7).contains(&next) {
                return pos;
            }
            pos += if next == 0xFF { 1 } else { 2 };
        } else {
            pos += 1;
        }
    }
    data.len()
}
