//! LZW encoder matching LZWDecode code widths

use std::collections::HashMap;

use crate::ccitt::BitWriter;

const CLEAR_TABLE: u32 = 256;
const EOD: u32 = 257;
/// Reset the dictionary well before it fills
const RESET_AT: u32 = 4000;

fn code_width(decoder_size: u32, early_change: bool) -> u32 {
    let adjusted = decoder_size + u32::from(early_change);
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

struct Encoder {
    writer: BitWriter,
    early_change: bool,
    /// codes written since the last clear
    emitted: u32,
}

impl Encoder {
    /// Table size the decoder will have when it reads the next code
    fn decoder_size(&self) -> u32 {
        258 + self.emitted.saturating_sub(1)
    }

    fn emit(&mut self, code: u32) {
        let width = code_width(self.decoder_size(), self.early_change);
        self.writer.write(code, width);
        self.emitted += 1;
    }

    fn clear(&mut self) {
        let width = code_width(self.decoder_size(), self.early_change);
        self.writer.write(CLEAR_TABLE, width);
        self.emitted = 0;
    }
}

/// Encode `data` as an LZW stream starting with a clear code and ending
/// with EOD
pub fn encode(data: &[u8], early_change: bool) -> Vec<u8> {
    let mut enc = Encoder {
        writer: BitWriter::new(),
        early_change,
        emitted: 0,
    };
    let mut dict: HashMap<(u32, u8), u32> = HashMap::new();
    let mut next = 258u32;

    enc.clear();
    let Some((&first, rest)) = data.split_first() else {
        enc.emit(EOD);
        return enc.writer.finish();
    };
    let mut w = u32::from(first);
    for &b in rest {
        if let Some(&code) = dict.get(&(w, b)) {
            w = code;
            continue;
        }
        enc.emit(w);
        dict.insert((w, b), next);
        next += 1;
        w = u32::from(b);
        if next >= RESET_AT {
            enc.clear();
            dict.clear();
            next = 258;
        }
    }
    enc.emit(w);
    enc.emit(EOD);
    enc.writer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_example() {
        let encoded = encode(&[45, 45, 45, 45, 45, 65, 45, 45, 45, 66], true);
        assert_eq!(encoded, vec![0x80, 0x0B, 0x60, 0x50, 0x22, 0x0C, 0x0C, 0x85, 0x01]);
    }
}
