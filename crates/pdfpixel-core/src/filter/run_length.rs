//! RunLengthDecode

use log::warn;

const EOD: u8 = 128;

/// Decode a RunLength stream. Truncated runs keep whatever was decoded.
pub fn decode(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() * 2);
    let mut pos = 0;

    while pos < data.len() {
        let length = data[pos];
        pos += 1;

        match length {
            EOD => return out,
            0..=127 => {
                let count = length as usize + 1;
                let end = (pos + count).min(data.len());
                if end - pos < count {
                    warn!("RunLengthDecode literal run truncated: {} of {count} bytes", end - pos);
                }
                out.extend_from_slice(&data[pos..end]);
                pos = end;
            }
            _ => {
                let Some(&byte) = data.get(pos) else {
                    warn!("RunLengthDecode repeat run missing its byte");
                    return out;
                };
                pos += 1;
                let count = 257 - length as usize;
                out.resize(out.len() + count, byte);
            }
        }
    }

    warn!("RunLengthDecode stream ended without EOD marker");
    out
}
