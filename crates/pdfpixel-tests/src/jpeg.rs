//! Baseline JPEG streams made of flat 8x8 blocks
//!
//! Every block carries only a DC coefficient, so each decodes to a single
//! level. Quantization is 8 throughout, which makes the sample value
//! `128 + dc`.

use crate::ccitt::BitWriter;

const SOI: u8 = 0xD8;
const EOI: u8 = 0xD9;
const SOF0: u8 = 0xC0;
const DHT: u8 = 0xC4;
const DQT: u8 = 0xDB;
const DRI: u8 = 0xDD;
const SOS: u8 = 0xDA;

fn segment(out: &mut Vec<u8>, marker: u8, payload: &[u8]) {
    out.extend_from_slice(&[0xFF, marker]);
    out.extend_from_slice(&((payload.len() + 2) as u16).to_be_bytes());
    out.extend_from_slice(payload);
}

/// Magnitude category and appended bits of a DC difference
fn category(diff: i32) -> (u32, u32) {
    if diff == 0 {
        return (0, 0);
    }
    let s = 32 - diff.unsigned_abs().leading_zeros();
    let bits = if diff < 0 { diff + (1 << s) - 1 } else { diff };
    (s, bits as u32)
}

/// Entropy-coded bytes with 0xFF stuffing
struct ScanWriter {
    bits: BitWriter,
}

impl ScanWriter {
    fn block(&mut self, diff: i32) {
        let (s, extra) = category(diff);
        // DC codes: every category is a 4-bit code equal to the category
        self.bits.write(s, 4);
        if s > 0 {
            self.bits.write(extra, s);
        }
        // AC: end of block
        self.bits.write(0, 1);
    }

    fn pad_to_byte(&mut self) {
        while self.bits.bit_len() % 8 != 0 {
            self.bits.write(1, 1);
        }
    }

    fn into_stuffed(mut self) -> Vec<u8> {
        self.pad_to_byte();
        let mut out = Vec::new();
        for b in self.bits.finish() {
            out.push(b);
            if b == 0xFF {
                out.push(0x00);
            }
        }
        out
    }
}

/// A flat-block JPEG description
#[derive(Debug, Clone)]
pub struct FlatJpeg {
    pub width: u16,
    pub height: u16,
    /// 1 for gray, 3 for an RGB-tagged stream (component ids `R`, `G`, `B`)
    pub components: usize,
    /// Block levels in raster order, `components` per block
    pub levels: Vec<u8>,
    pub restart_interval: Option<u16>,
}

impl FlatJpeg {
    pub fn gray(width: u16, height: u16, levels: Vec<u8>) -> Self {
        Self {
            width,
            height,
            components: 1,
            levels,
            restart_interval: None,
        }
    }

    pub fn rgb(width: u16, height: u16, levels: Vec<u8>) -> Self {
        Self {
            components: 3,
            ..Self::gray(width, height, levels)
        }
    }

    pub fn with_restart_interval(mut self, interval: u16) -> Self {
        self.restart_interval = Some(interval);
        self
    }

    pub fn blocks(&self) -> usize {
        usize::from(self.width).div_ceil(8) * usize::from(self.height).div_ceil(8)
    }

    pub fn encode(&self) -> Vec<u8> {
        assert!(matches!(self.components, 1 | 3), "1 or 3 components");
        assert_eq!(self.levels.len(), self.blocks() * self.components, "one level per block");

        let mut out = vec![0xFF, SOI];
        let mut dqt = vec![0x00];
        dqt.extend_from_slice(&[8u8; 64]);
        segment(&mut out, DQT, &dqt);

        let mut sof = vec![8];
        sof.extend_from_slice(&self.height.to_be_bytes());
        sof.extend_from_slice(&self.width.to_be_bytes());
        sof.push(self.components as u8);
        let ids: &[u8] = if self.components == 1 { &[1] } else { b"RGB" };
        for &id in ids {
            sof.extend_from_slice(&[id, 0x11, 0]);
        }
        segment(&mut out, SOF0, &sof);

        let mut dht = vec![0x00];
        let mut counts = [0u8; 16];
        counts[3] = 12;
        dht.extend_from_slice(&counts);
        dht.extend(0..12u8);
        dht.push(0x10);
        let mut counts = [0u8; 16];
        counts[0] = 1;
        dht.extend_from_slice(&counts);
        dht.push(0x00);
        segment(&mut out, DHT, &dht);

        if let Some(ri) = self.restart_interval {
            segment(&mut out, DRI, &ri.to_be_bytes());
        }

        let mut sos = vec![self.components as u8];
        for &id in ids {
            sos.extend_from_slice(&[id, 0x00]);
        }
        sos.extend_from_slice(&[0, 63, 0]);
        segment(&mut out, SOS, &sos);

        let mut scan = ScanWriter { bits: BitWriter::new() };
        let mut preds = [0i32; 3];
        let mut restarts = 0u8;
        for (unit, levels) in self.levels.chunks(self.components).enumerate() {
            if let Some(ri) = self.restart_interval.filter(|&ri| ri > 0) {
                if unit > 0 && unit % usize::from(ri) == 0 {
                    let bytes = std::mem::replace(&mut scan, ScanWriter { bits: BitWriter::new() })
                        .into_stuffed();
                    out.extend_from_slice(&bytes);
                    out.extend_from_slice(&[0xFF, 0xD0 + restarts % 8]);
                    restarts += 1;
                    preds = [0; 3];
                }
            }
            for (c, &level) in levels.iter().enumerate() {
                let dc = i32::from(level) - 128;
                scan.block(dc - preds[c]);
                preds[c] = dc;
            }
        }
        out.extend_from_slice(&scan.into_stuffed());
        out.extend_from_slice(&[0xFF, EOI]);
        out
    }
}
