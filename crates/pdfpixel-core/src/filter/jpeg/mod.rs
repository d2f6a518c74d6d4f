//! DCTDecode
//!
//! Baseline and progressive Huffman JPEG, 8-bit precision, with restart
//! intervals. Output is interleaved 8-bit samples: gray, RGB or CMYK.

mod bits;
mod color;
mod header;
mod huffman;
mod idct;
mod scan;

pub use bits::{BitState, JpegBitReader};
pub use header::JpegHeader;

use log::{debug, warn};

use crate::bits::ByteCursor;
use crate::config::DEFAULT_MAX_PIXELS;
use crate::error::{Error, Result};
use header::{
    APP14, DAC, DHT, DQT, DRI, EOI, Frame, RST0, RST7, SOF0, SOF1, SOF2, SOI, SOS, ScanHeader,
};
use huffman::HuffmanTable;

/// `/DecodeParms` for DCTDecode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JpegParams {
    /// `/ColorTransform`: overrides the Adobe marker when present
    pub color_transform: Option<u8>,
}

/// Decoded JPEG samples
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JpegImage {
    pub width: usize,
    pub height: usize,
    pub components: usize,
    /// Interleaved samples, `width * components` bytes per row
    pub data: Vec<u8>,
}

/// Decode a complete JPEG stream
pub fn decode(data: &[u8], params: &JpegParams) -> Result<JpegImage> {
    decode_with_limit(data, params, DEFAULT_MAX_PIXELS)
}

/// Decode a JPEG stream whose frame has at most `max_pixels` pixels
pub fn decode_with_limit(data: &[u8], params: &JpegParams, max_pixels: usize) -> Result<JpegImage> {
    let mut cursor = ByteCursor::new(data);
    if cursor.read_u16() != Some(0xFF00 | SOI as u16) {
        return Err(Error::jpeg(0, "missing SOI marker"));
    }

    let mut quant: [Option<[u16; 64]>; 4] = [None; 4];
    let mut dc: [Option<HuffmanTable>; 4] = Default::default();
    let mut ac: [Option<HuffmanTable>; 4] = Default::default();
    let mut frame: Option<Frame> = None;
    let mut restart_interval = 0usize;
    let mut adobe: Option<u8> = None;
    let mut scans = 0usize;

    loop {
        let (marker, segment, offset) = match header::next_segment(&mut cursor) {
            Ok(seg) => seg,
            Err(err) if scans > 0 => {
                warn!("JPEG stream ends without EOI: {err}");
                break;
            }
            Err(err) => return Err(err),
        };

        match marker {
            SOF0 | SOF1 | SOF2 => {
                if frame.is_some() {
                    return Err(Error::jpeg(offset, "multiple frames"));
                }
                let mut f = Frame::parse(segment, marker, offset)?;
                f.allocate(max_pixels, offset)?;
                debug!(
                    "JPEG frame {}x{}, {} components, progressive {}",
                    f.width,
                    f.height,
                    f.components.len(),
                    f.progressive
                );
                frame = Some(f);
            }
            m if header::is_unsupported_sof(m) => {
                return Err(Error::Unsupported(format!("JPEG frame type 0x{m:02X}")));
            }
            DAC => return Err(Error::Unsupported("arithmetic-coded JPEG".into())),
            DHT => header::parse_dht(segment, &mut dc, &mut ac, offset)?,
            DQT => header::parse_dqt(segment, &mut quant, offset)?,
            DRI => {
                restart_interval = ByteCursor::new(segment)
                    .read_u16()
                    .ok_or_else(|| Error::jpeg(offset, "truncated DRI"))?
                    as usize;
            }
            APP14 => adobe = header::parse_adobe(segment).or(adobe),
            SOS => {
                let f = frame
                    .as_mut()
                    .ok_or_else(|| Error::jpeg(offset, "scan before frame header"))?;
                let scan = ScanHeader::parse(segment, f, offset)?;
                let start = cursor.position();
                let tables = scan::ScanTables { dc: &dc, ac: &ac };
                scan::decode_scan(data, start, f, &scan, &tables, restart_interval)?;
                scans += 1;
                cursor.set_position(scan::find_scan_end(data, start));
            }
            EOI => break,
            RST0..=RST7 => debug!("stray restart marker at {offset}"),
            _ => {}
        }
    }

    let frame = frame.ok_or_else(|| Error::jpeg(0, "no frame header"))?;
    if scans == 0 {
        return Err(Error::jpeg(0, "no scan data"));
    }
    finish(frame, &quant, adobe, params)
}

fn finish(
    frame: Frame,
    quant: &[Option<[u16; 64]>; 4],
    adobe: Option<u8>,
    params: &JpegParams,
) -> Result<JpegImage> {
    let mut planes_data = Vec::with_capacity(frame.components.len());
    for comp in &frame.components {
        let q = quant[comp.quant_table].as_ref().ok_or_else(|| {
            Error::jpeg(0, format!("missing quantization table {}", comp.quant_table))
        })?;
        let stride = comp.blocks_w * 8;
        let mut plane = vec![0u8; stride * comp.blocks_h * 8];
        for by in 0..comp.blocks_h {
            for bx in 0..comp.blocks_w {
                let base = (by * comp.blocks_w + bx) * 64;
                let out = &mut plane[by * 8 * stride + bx * 8..];
                idct::idct_block(&comp.coeffs[base..base + 64], q, out, stride);
            }
        }
        planes_data.push((plane, stride, comp.h, comp.v));
    }

    let n = frame.components.len();
    let transform = match params.color_transform {
        Some(t) => t != 0 && n >= 3,
        None => match (n, adobe) {
            (3, Some(t)) => t != 0,
            (3, None) => {
                let ids: Vec<u8> = frame.components.iter().map(|c| c.id).collect();
                ids != b"RGB"
            }
            (4, Some(t)) => t == 2,
            _ => false,
        },
    };
    debug!("JPEG color transform {transform} (adobe {adobe:?}, override {:?})", params.color_transform);

    let planes: Vec<color::Plane<'_>> = planes_data
        .iter()
        .map(|(data, stride, h, v)| color::Plane {
            data,
            stride: *stride,
            h: *h,
            v: *v,
        })
        .collect();
    let data = color::interleave(&planes, frame.width, frame.height, frame.h_max, frame.v_max, transform);

    Ok(JpegImage {
        width: frame.width,
        height: frame.height,
        components: n,
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(out: &mut Vec<u8>, marker: u8, payload: &[u8]) {
        out.extend_from_slice(&[0xFF, marker]);
        out.extend_from_slice(&((payload.len() + 2) as u16).to_be_bytes());
        out.extend_from_slice(payload);
    }

    /// Gray baseline stream: quant 16, DC table {cat 4 -> "0"}, AC {EOB -> "0"}
    fn gray_jpeg(width: u16, restart: Option<u16>, scan: &[u8]) -> Vec<u8> {
        let mut out = vec![0xFF, SOI];
        let mut dqt = vec![0x00];
        dqt.extend_from_slice(&[16u8; 64]);
        segment(&mut out, DQT, &dqt);
        let mut sof = vec![8, 0, 8];
        sof.extend_from_slice(&width.to_be_bytes());
        sof.extend_from_slice(&[1, 1, 0x11, 0]);
        segment(&mut out, SOF0, &sof);
        let mut dht = vec![0x00, 1];
        dht.extend_from_slice(&[0; 15]);
        dht.push(4);
        dht.push(0x10);
        dht.push(1);
        dht.extend_from_slice(&[0; 15]);
        dht.push(0x00);
        segment(&mut out, DHT, &dht);
        if let Some(ri) = restart {
            segment(&mut out, DRI, &ri.to_be_bytes());
        }
        segment(&mut out, SOS, &[1, 1, 0x00, 0, 63, 0]);
        out.extend_from_slice(scan);
        out.extend_from_slice(&[0xFF, EOI]);
        out
    }

    #[test]
    fn test_decode_flat_gray_block() {
        // DC "0" + 1000 (diff 8), EOB "0", padded with ones
        let data = gray_jpeg(8, None, &[0b0100_0011]);
        let img = decode(&data, &JpegParams::default()).unwrap();
        assert_eq!((img.width, img.height, img.components), (8, 8, 1));
        assert!(img.data.iter().all(|&p| p == 144));
    }

    #[test]
    fn test_restart_resets_prediction() {
        // two blocks, each with diff 8, separated by RST0
        let data = gray_jpeg(16, Some(1), &[0b0100_0011, 0xFF, 0xD0, 0b0100_0011]);
        let img = decode(&data, &JpegParams::default()).unwrap();
        assert_eq!(img.data.len(), 16 * 8);
        assert!(img.data.iter().all(|&p| p == 144));
    }

    #[test]
    fn test_without_restart_prediction_accumulates() {
        // second block diff 8 on top of the first: DC 16 -> 160
        let data = gray_jpeg(16, None, &[0b0100_0001, 0b0000_1111]);
        let img = decode(&data, &JpegParams::default()).unwrap();
        assert_eq!(img.data[0], 144);
        assert_eq!(img.data[8], 160);
    }

    #[test]
    fn test_frame_over_limit_is_rejected() {
        let data = gray_jpeg(16, None, &[0b0100_0001, 0b0000_1111]);
        assert!(matches!(
            decode_with_limit(&data, &JpegParams::default(), 100),
            Err(Error::ImageTooLarge { width: 16, height: 8, .. })
        ));
        assert!(decode_with_limit(&data, &JpegParams::default(), 128).is_ok());
    }

    #[test]
    fn test_missing_soi() {
        assert!(decode(&[0x00, 0x01], &JpegParams::default()).is_err());
    }

    #[test]
    fn test_arithmetic_unsupported() {
        let mut data = vec![0xFF, SOI];
        segment(&mut data, DAC, &[0, 0]);
        assert!(matches!(
            decode(&data, &JpegParams::default()),
            Err(Error::Unsupported(_))
        ));
    }
}
