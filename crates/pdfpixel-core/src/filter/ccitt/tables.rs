//! T.4 / T.6 code tables
//!
//! Each entry is `(code, length, run)`, the code right-aligned in `length`
//! bits. The extended makeup codes (1792..=2560) are shared by both colors.

use std::sync::LazyLock;

/// Longest run code in bits
pub(super) const MAX_CODE_BITS: u32 = 13;

pub const WHITE_CODES: [(u16, u8, u16); 104] = [
    (0x0035, 8, 0), (0x0007, 6, 1), (0x0007, 4, 2), (0x0008, 4, 3),
    (0x000b, 4, 4), (0x000c, 4, 5), (0x000e, 4, 6), (0x000f, 4, 7),
    (0x0013, 5, 8), (0x0014, 5, 9), (0x0007, 5, 10), (0x0008, 5, 11),
    (0x0008, 6, 12), (0x0003, 6, 13), (0x0034, 6, 14), (0x0035, 6, 15),
    (0x002a, 6, 16), (0x002b, 6, 17), (0x0027, 7, 18), (0x000c, 7, 19),
    (0x0008, 7, 20), (0x0017, 7, 21), (0x0003, 7, 22), (0x0004, 7, 23),
    (0x0028, 7, 24), (0x002b, 7, 25), (0x0013, 7, 26), (0x0024, 7, 27),
    (0x0018, 7, 28), (0x0002, 8, 29), (0x0003, 8, 30), (0x001a, 8, 31),
    (0x001b, 8, 32), (0x0012, 8, 33), (0x0013, 8, 34), (0x0014, 8, 35),
    (0x0015, 8, 36), (0x0016, 8, 37), (0x0017, 8, 38), (0x0028, 8, 39),
    (0x0029, 8, 40), (0x002a, 8, 41), (0x002b, 8, 42), (0x002c, 8, 43),
    (0x002d, 8, 44), (0x0004, 8, 45), (0x0005, 8, 46), (0x000a, 8, 47),
    (0x000b, 8, 48), (0x0052, 8, 49), (0x0053, 8, 50), (0x0054, 8, 51),
    (0x0055, 8, 52), (0x0024, 8, 53), (0x0025, 8, 54), (0x0058, 8, 55),
    (0x0059, 8, 56), (0x005a, 8, 57), (0x005b, 8, 58), (0x004a, 8, 59),
    (0x004b, 8, 60), (0x0032, 8, 61), (0x0033, 8, 62), (0x0034, 8, 63),
    (0x001b, 5, 64), (0x0012, 5, 128), (0x0017, 6, 192), (0x0037, 7, 256),
    (0x0036, 8, 320), (0x0037, 8, 384), (0x0064, 8, 448), (0x0065, 8, 512),
    (0x0068, 8, 576), (0x0067, 8, 640), (0x00cc, 9, 704), (0x00cd, 9, 768),
    (0x00d2, 9, 832), (0x00d3, 9, 896), (0x00d4, 9, 960), (0x00d5, 9, 1024),
    (0x00d6, 9, 1088), (0x00d7, 9, 1152), (0x00d8, 9, 1216), (0x00d9, 9, 1280),
    (0x00da, 9, 1344), (0x00db, 9, 1408), (0x0098, 9, 1472), (0x0099, 9, 1536),
    (0x009a, 9, 1600), (0x0018, 6, 1664), (0x009b, 9, 1728), (0x0008, 11, 1792),
    (0x000c, 11, 1856), (0x000d, 11, 1920), (0x0012, 12, 1984), (0x0013, 12, 2048),
    (0x0014, 12, 2112), (0x0015, 12, 2176), (0x0016, 12, 2240), (0x0017, 12, 2304),
    (0x001c, 12, 2368), (0x001d, 12, 2432), (0x001e, 12, 2496), (0x001f, 12, 2560),
];

pub const BLACK_CODES: [(u16, u8, u16); 104] = [
    (0x0037, 10, 0), (0x0002, 3, 1), (0x0003, 2, 2), (0x0002, 2, 3),
    (0x0003, 3, 4), (0x0003, 4, 5), (0x0002, 4, 6), (0x0003, 5, 7),
    (0x0005, 6, 8), (0x0004, 6, 9), (0x0004, 7, 10), (0x0005, 7, 11),
    (0x0007, 7, 12), (0x0004, 8, 13), (0x0007, 8, 14), (0x0018, 9, 15),
    (0x0017, 10, 16), (0x0018, 10, 17), (0x0008, 10, 18), (0x0067, 11, 19),
    (0x0068, 11, 20), (0x006c, 11, 21), (0x0037, 11, 22), (0x0028, 11, 23),
    (0x0017, 11, 24), (0x0018, 11, 25), (0x00ca, 12, 26), (0x00cb, 12, 27),
    (0x00cc, 12, 28), (0x00cd, 12, 29), (0x0068, 12, 30), (0x0069, 12, 31),
    (0x006a, 12, 32), (0x006b, 12, 33), (0x00d2, 12, 34), (0x00d3, 12, 35),
    (0x00d4, 12, 36), (0x00d5, 12, 37), (0x00d6, 12, 38), (0x00d7, 12, 39),
    (0x006c, 12, 40), (0x006d, 12, 41), (0x00da, 12, 42), (0x00db, 12, 43),
    (0x0054, 12, 44), (0x0055, 12, 45), (0x0056, 12, 46), (0x0057, 12, 47),
    (0x0064, 12, 48), (0x0065, 12, 49), (0x0052, 12, 50), (0x0053, 12, 51),
    (0x0024, 12, 52), (0x0037, 12, 53), (0x0038, 12, 54), (0x0027, 12, 55),
    (0x0028, 12, 56), (0x0058, 12, 57), (0x0059, 12, 58), (0x002b, 12, 59),
    (0x002c, 12, 60), (0x005a, 12, 61), (0x0066, 12, 62), (0x0067, 12, 63),
    (0x000f, 10, 64), (0x00c8, 12, 128), (0x00c9, 12, 192), (0x005b, 12, 256),
    (0x0033, 12, 320), (0x0034, 12, 384), (0x0035, 12, 448), (0x006c, 13, 512),
    (0x006d, 13, 576), (0x004a, 13, 640), (0x004b, 13, 704), (0x004c, 13, 768),
    (0x004d, 13, 832), (0x0072, 13, 896), (0x0073, 13, 960), (0x0074, 13, 1024),
    (0x0075, 13, 1088), (0x0076, 13, 1152), (0x0077, 13, 1216), (0x0052, 13, 1280),
    (0x0053, 13, 1344), (0x0054, 13, 1408), (0x0055, 13, 1472), (0x005a, 13, 1536),
    (0x005b, 13, 1600), (0x0064, 13, 1664), (0x0065, 13, 1728), (0x0008, 11, 1792),
    (0x000c, 11, 1856), (0x000d, 11, 1920), (0x0012, 12, 1984), (0x0013, 12, 2048),
    (0x0014, 12, 2112), (0x0015, 12, 2176), (0x0016, 12, 2240), (0x0017, 12, 2304),
    (0x001c, 12, 2368), (0x001d, 12, 2432), (0x001e, 12, 2496), (0x001f, 12, 2560),
];

/// Direct lookup over a 13-bit window: `(length, run)`, length 0 = no code
pub(super) struct RunLookup {
    entries: Vec<(u8, u16)>,
}

impl RunLookup {
    fn build(codes: &[(u16, u8, u16)]) -> Self {
        let mut entries = vec![(0u8, 0u16); 1 << MAX_CODE_BITS];
        for &(code, len, run) in codes {
            let shift = MAX_CODE_BITS - len as u32;
            let start = (code as usize) << shift;
            for slot in &mut entries[start..start + (1 << shift)] {
                *slot = (len, run);
            }
        }
        Self { entries }
    }

    /// Look up the code at the top of a 13-bit window
    #[inline]
    pub(super) fn get(&self, window: u32) -> (u8, u16) {
        self.entries[window as usize]
    }
}

pub(super) static WHITE: LazyLock<RunLookup> = LazyLock::new(|| RunLookup::build(&WHITE_CODES));
pub(super) static BLACK: LazyLock<RunLookup> = LazyLock::new(|| RunLookup::build(&BLACK_CODES));
