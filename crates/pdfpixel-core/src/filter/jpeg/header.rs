//! Marker segment parsing: SOF, DQT, DHT, DRI, SOS and APP14

use log::debug;

use super::huffman::HuffmanTable;
use crate::bits::ByteCursor;
use crate::error::{Error, Result};

pub const SOF0: u8 = 0xC0;
pub const SOF1: u8 = 0xC1;
pub const SOF2: u8 = 0xC2;
pub const DHT: u8 = 0xC4;
pub const DAC: u8 = 0xCC;
pub const RST0: u8 = 0xD0;
pub const RST7: u8 = 0xD7;
pub const SOI: u8 = 0xD8;
pub const EOI: u8 = 0xD9;
pub const SOS: u8 = 0xDA;
pub const DQT: u8 = 0xDB;
pub const DRI: u8 = 0xDD;
pub const APP14: u8 = 0xEE;

/// Natural (row-major) index of each zigzag position
pub const ZIGZAG: [usize; 64] = [
    0, 1, 8, 16, 9, 2, 3, 10, 17, 24, 32, 25, 18, 11, 4, 5, 12, 19, 26, 33, 40, 48, 41, 34, 27,
    20, 13, 6, 7, 14, 21, 28, 35, 42, 49, 56, 57, 50, 43, 36, 29, 22, 15, 23, 30, 37, 44, 51, 58,
    59, 52, 45, 38, 31, 39, 46, 53, 60, 61, 54, 47, 55, 62, 63,
];

/// True for SOF markers this decoder cannot handle
pub fn is_unsupported_sof(marker: u8) -> bool {
    matches!(marker, 0xC3 | 0xC5..=0xC7 | 0xC9..=0xCB | 0xCD..=0xCF)
}

#[derive(Debug, Clone)]
pub struct FrameComponent {
    pub id: u8,
    pub h: usize,
    pub v: usize,
    pub quant_table: usize,
    /// Blocks covering the component's own sample area
    pub blocks_per_line: usize,
    pub blocks_per_column: usize,
    /// Allocated blocks, padded to whole MCUs
    pub blocks_w: usize,
    pub blocks_h: usize,
    /// Coefficients in natural order, 64 per block
    pub coeffs: Vec<i32>,
}

#[derive(Debug, Clone)]
pub struct Frame {
    pub precision: u8,
    pub width: usize,
    pub height: usize,
    pub progressive: bool,
    pub h_max: usize,
    pub v_max: usize,
    pub mcus_x: usize,
    pub mcus_y: usize,
    pub components: Vec<FrameComponent>,
}

impl Frame {
    pub fn parse(segment: &[u8], marker: u8, offset: usize) -> Result<Self> {
        let mut c = ByteCursor::new(segment);
        let truncated = || Error::jpeg(offset, "truncated SOF segment");
        let precision = c.read_u8().ok_or_else(truncated)?;
        let height = c.read_u16().ok_or_else(truncated)? as usize;
        let width = c.read_u16().ok_or_else(truncated)? as usize;
        let count = c.read_u8().ok_or_else(truncated)? as usize;

        if precision != 8 {
            return Err(Error::Unsupported(format!("{precision}-bit JPEG precision")));
        }
        if width == 0 || height == 0 {
            // DNL-defined heights are not supported
            return Err(Error::jpeg(offset, "zero image dimension"));
        }
        if !matches!(count, 1 | 3 | 4) {
            return Err(Error::jpeg(offset, format!("{count} components")));
        }

        let mut components = Vec::with_capacity(count);
        for _ in 0..count {
            let id = c.read_u8().ok_or_else(truncated)?;
            let sampling = c.read_u8().ok_or_else(truncated)?;
            let quant_table = c.read_u8().ok_or_else(truncated)? as usize;
            let (h, v) = ((sampling >> 4) as usize, (sampling & 15) as usize);
            if !(1..=4).contains(&h) || !(1..=4).contains(&v) || quant_table > 3 {
                return Err(Error::jpeg(offset, "invalid component parameters"));
            }
            components.push(FrameComponent {
                id,
                h,
                v,
                quant_table,
                blocks_per_line: 0,
                blocks_per_column: 0,
                blocks_w: 0,
                blocks_h: 0,
                coeffs: Vec::new(),
            });
        }

        let h_max = components.iter().map(|c| c.h).max().unwrap_or(1);
        let v_max = components.iter().map(|c| c.v).max().unwrap_or(1);
        let mcus_x = width.div_ceil(8 * h_max);
        let mcus_y = height.div_ceil(8 * v_max);
        for comp in &mut components {
            comp.blocks_per_line = (width * comp.h).div_ceil(h_max).div_ceil(8);
            comp.blocks_per_column = (height * comp.v).div_ceil(v_max).div_ceil(8);
            comp.blocks_w = mcus_x * comp.h;
            comp.blocks_h = mcus_y * comp.v;
        }

        Ok(Self {
            precision,
            width,
            height,
            progressive: marker == SOF2,
            h_max,
            v_max,
            mcus_x,
            mcus_y,
            components,
        })
    }

    /// Allocate coefficient storage, refusing frames over `max_pixels`
    pub fn allocate(&mut self, max_pixels: usize, offset: usize) -> Result<()> {
        if self.width.saturating_mul(self.height) > max_pixels {
            debug!("JPEG frame at {offset} is {}x{}", self.width, self.height);
            return Err(Error::ImageTooLarge {
                width: self.width,
                height: self.height,
                limit: max_pixels,
            });
        }
        for comp in &mut self.components {
            comp.coeffs = vec![0; comp.blocks_w * comp.blocks_h * 64];
        }
        Ok(())
    }
}

/// Parse a DQT segment into the four table slots (natural order)
pub fn parse_dqt(segment: &[u8], tables: &mut [Option<[u16; 64]>; 4], offset: usize) -> Result<()> {
    let mut c = ByteCursor::new(segment);
    while !c.is_empty() {
        let pq_tq = c.read_u8().ok_or_else(|| Error::jpeg(offset, "truncated DQT"))?;
        let (precision, id) = (pq_tq >> 4, (pq_tq & 15) as usize);
        if id > 3 {
            return Err(Error::jpeg(offset, format!("quantization table id {id}")));
        }
        let mut table = [0u16; 64];
        for &pos in &ZIGZAG {
            table[pos] = match precision {
                0 => c.read_u8().map(u16::from),
                _ => c.read_u16(),
            }
            .ok_or_else(|| Error::jpeg(offset, "truncated DQT"))?;
        }
        tables[id] = Some(table);
    }
    Ok(())
}

/// Parse a DHT segment into the DC and AC table slots
pub fn parse_dht(
    segment: &[u8],
    dc: &mut [Option<HuffmanTable>; 4],
    ac: &mut [Option<HuffmanTable>; 4],
    offset: usize,
) -> Result<()> {
    let mut c = ByteCursor::new(segment);
    while !c.is_empty() {
        let tc_th = c.read_u8().ok_or_else(|| Error::jpeg(offset, "truncated DHT"))?;
        let (class, id) = (tc_th >> 4, (tc_th & 15) as usize);
        if id > 3 || class > 1 {
            return Err(Error::jpeg(offset, format!("Huffman table class {class} id {id}")));
        }
        let mut counts = [0u8; 16];
        for slot in &mut counts {
            *slot = c.read_u8().ok_or_else(|| Error::jpeg(offset, "truncated DHT"))?;
        }
        let total: usize = counts.iter().map(|&n| n as usize).sum();
        let symbols = c
            .take(total)
            .ok_or_else(|| Error::jpeg(offset, "truncated DHT"))?;
        let table = HuffmanTable::new(&counts, symbols)
            .map_err(|_| Error::jpeg(offset, "malformed Huffman table"))?;
        if class == 0 {
            dc[id] = Some(table);
        } else {
            ac[id] = Some(table);
        }
    }
    Ok(())
}

/// One component selector of a scan
#[derive(Debug, Clone, Copy)]
pub struct ScanComponent {
    /// Index into `Frame::components`
    pub index: usize,
    pub dc_table: usize,
    pub ac_table: usize,
}

#[derive(Debug, Clone)]
pub struct ScanHeader {
    pub components: Vec<ScanComponent>,
    pub ss: usize,
    pub se: usize,
    pub ah: u32,
    pub al: u32,
}

impl ScanHeader {
    pub fn parse(segment: &[u8], frame: &Frame, offset: usize) -> Result<Self> {
        let mut c = ByteCursor::new(segment);
        let truncated = || Error::jpeg(offset, "truncated SOS segment");
        let count = c.read_u8().ok_or_else(truncated)? as usize;
        if count == 0 || count > 4 {
            return Err(Error::jpeg(offset, format!("scan with {count} components")));
        }
        let mut components = Vec::with_capacity(count);
        for _ in 0..count {
            let id = c.read_u8().ok_or_else(truncated)?;
            let tables = c.read_u8().ok_or_else(truncated)?;
            let index = frame
                .components
                .iter()
                .position(|comp| comp.id == id)
                .ok_or_else(|| Error::jpeg(offset, format!("scan references unknown component {id}")))?;
            components.push(ScanComponent {
                index,
                dc_table: ((tables >> 4) & 3) as usize,
                ac_table: (tables & 3) as usize,
            });
        }
        let ss = c.read_u8().ok_or_else(truncated)? as usize;
        let se = c.read_u8().ok_or_else(truncated)? as usize;
        let a = c.read_u8().ok_or_else(truncated)?;

        let (ss, se) = if frame.progressive { (ss, se) } else { (0, 63) };
        if ss > se || se > 63 {
            return Err(Error::jpeg(offset, format!("spectral selection {ss}..{se}")));
        }
        Ok(Self {
            components,
            ss,
            se,
            ah: (a >> 4) as u32,
            al: (a & 15) as u32,
        })
    }
}

/// Adobe APP14 color transform flag, when the segment is present
pub fn parse_adobe(segment: &[u8]) -> Option<u8> {
    if segment.len() >= 12 && segment.starts_with(b"Adobe") {
        let transform = segment[11];
        debug!("Adobe APP14 segment, transform {transform}");
        Some(transform)
    } else {
        None
    }
}

/// Dimensions and layout of a JPEG stream, read without decoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JpegHeader {
    pub width: usize,
    pub height: usize,
    pub components: usize,
    pub bits_per_component: u8,
    pub progressive: bool,
    pub adobe_transform: Option<u8>,
}

impl JpegHeader {
    /// Scan markers up to the first frame header
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut cursor = ByteCursor::new(data);
        if cursor.read_u16() != Some(0xFF00 | SOI as u16) {
            return Err(Error::jpeg(0, "missing SOI marker"));
        }
        let mut adobe_transform = None;
        loop {
            let (marker, segment, offset) = next_segment(&mut cursor)?;
            match marker {
                SOF0 | SOF1 | SOF2 => {
                    let frame = Frame::parse(segment, marker, offset)?;
                    return Ok(Self {
                        width: frame.width,
                        height: frame.height,
                        components: frame.components.len(),
                        bits_per_component: frame.precision,
                        progressive: frame.progressive,
                        adobe_transform,
                    });
                }
                APP14 => adobe_transform = parse_adobe(segment).or(adobe_transform),
                m if is_unsupported_sof(m) => {
                    return Err(Error::Unsupported(format!("JPEG frame type 0x{m:02X}")));
                }
                EOI | SOS => return Err(Error::jpeg(offset, "no frame header")),
                _ => {}
            }
        }
    }
}

/// Find the next marker at or after the cursor and return it with its
/// segment payload (empty for standalone markers). The cursor ends after
/// the segment.
pub fn next_segment<'a>(cursor: &mut ByteCursor<'a>) -> Result<(u8, &'a [u8], usize)> {
    loop {
        let offset = cursor.position();
        let byte = cursor
            .read_u8()
            .ok_or_else(|| Error::jpeg(offset, "unexpected end of data"))?;
        if byte != 0xFF {
            continue;
        }
        let mut marker = 0xFF;
        while marker == 0xFF {
            marker = cursor
                .read_u8()
                .ok_or_else(|| Error::jpeg(offset, "unexpected end of data"))?;
        }
        match marker {
            0x00 => continue,
            SOI | EOI | RST0..=RST7 | 0x01 => return Ok((marker, &[], offset)),
            _ => {
                let len = cursor
                    .read_u16()
                    .ok_or_else(|| Error::jpeg(offset, "truncated marker length"))?
                    as usize;
                let segment = cursor
                    .take(len.saturating_sub(2))
                    .ok_or_else(|| Error::jpeg(offset, format!("segment 0x{marker:02X} runs past the end")))?;
                return Ok((marker, segment, offset));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sof(width: u16, height: u16, comps: &[(u8, u8)]) -> Vec<u8> {
        let mut s = vec![8];
        s.extend_from_slice(&height.to_be_bytes());
        s.extend_from_slice(&width.to_be_bytes());
        s.push(comps.len() as u8);
        for (i, &(id, sampling)) in comps.iter().enumerate() {
            s.extend_from_slice(&[id, sampling, (i > 0) as u8]);
        }
        s
    }

    #[test]
    fn test_frame_geometry_420() {
        let seg = sof(17, 9, &[(1, 0x22), (2, 0x11), (3, 0x11)]);
        let mut frame = Frame::parse(&seg, SOF0, 0).unwrap();
        frame.allocate(17 * 9, 0).unwrap();
        assert_eq!((frame.h_max, frame.v_max), (2, 2));
        assert_eq!((frame.mcus_x, frame.mcus_y), (2, 1));
        let y = &frame.components[0];
        assert_eq!((y.blocks_per_line, y.blocks_per_column), (3, 2));
        assert_eq!((y.blocks_w, y.blocks_h), (4, 2));
        let cb = &frame.components[1];
        assert_eq!((cb.blocks_per_line, cb.blocks_per_column), (2, 1));
        assert_eq!(cb.coeffs.len(), 2 * 64);
    }

    #[test]
    fn test_oversized_frame_not_allocated() {
        let seg = sof(65535, 65535, &[(1, 0x11), (2, 0x11), (3, 0x11)]);
        let mut frame = Frame::parse(&seg, SOF0, 0).unwrap();
        assert!(frame.components.iter().all(|c| c.coeffs.is_empty()));
        assert!(matches!(
            frame.allocate(100, 0),
            Err(Error::ImageTooLarge { width: 65535, height: 65535, limit: 100 })
        ));
        assert!(frame.components.iter().all(|c| c.coeffs.is_empty()));
    }

    #[test]
    fn test_twelve_bit_unsupported() {
        let mut seg = sof(8, 8, &[(1, 0x11)]);
        seg[0] = 12;
        assert!(matches!(Frame::parse(&seg, SOF1, 0), Err(Error::Unsupported(_))));
    }

    #[test]
    fn test_dqt_dezigzag() {
        let mut seg = vec![0x00];
        seg.extend((0..64).map(|i| i as u8));
        let mut tables = [None; 4];
        parse_dqt(&seg, &mut tables, 0).unwrap();
        let t = tables[0].unwrap();
        // zigzag position 2 is natural index 8
        assert_eq!(t[8], 2);
        assert_eq!(t[63], 63);
    }

    #[test]
    fn test_header_parse() {
        let mut data = vec![0xFF, SOI];
        let seg = sof(640, 480, &[(1, 0x11), (2, 0x11), (3, 0x11)]);
        data.extend_from_slice(&[0xFF, SOF2]);
        data.extend_from_slice(&((seg.len() + 2) as u16).to_be_bytes());
        data.extend_from_slice(&seg);
        let header = JpegHeader::parse(&data).unwrap();
        assert_eq!((header.width, header.height, header.components), (640, 480, 3));
        assert!(header.progressive);
        assert_eq!(header.adobe_transform, None);
    }

    #[test]
    fn test_lossless_unsupported() {
        let mut data = vec![0xFF, SOI, 0xFF, 0xC3, 0x00, 0x02];
        data.extend_from_slice(&[0xFF, EOI]);
        assert!(matches!(JpegHeader::parse(&data), Err(Error::Unsupported(_))));
    }
}
