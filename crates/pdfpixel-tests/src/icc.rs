//! Builder for small ICC profiles
//!
//! Produces display-class profiles with an XYZ connection space: gray TRC
//! profiles and RGB matrix/TRC profiles.

/// D50-adapted sRGB primaries
pub const SRGB_COLORANTS: [[f64; 3]; 3] = [
    [0.4361, 0.2225, 0.0139],
    [0.3851, 0.7169, 0.0971],
    [0.1431, 0.0606, 0.7141],
];

/// sRGB transfer function as ICC parametric curve type 3 parameters
pub const SRGB_PARAMS: [f64; 5] = [2.4, 1.0 / 1.055, 0.055 / 1.055, 1.0 / 12.92, 0.04045];

fn s15f16(v: f64) -> [u8; 4] {
    ((v * 65536.0).round() as i32).to_be_bytes()
}

pub fn xyz_tag(xyz: [f64; 3]) -> Vec<u8> {
    let mut tag = b"XYZ \0\0\0\0".to_vec();
    for v in xyz {
        tag.extend_from_slice(&s15f16(v));
    }
    tag
}

/// `curv` with a single u8Fixed8 gamma
pub fn gamma_tag(gamma: f64) -> Vec<u8> {
    let mut tag = b"curv\0\0\0\0".to_vec();
    tag.extend_from_slice(&1u32.to_be_bytes());
    tag.extend_from_slice(&((gamma * 256.0).round() as u16).to_be_bytes());
    tag.extend_from_slice(&[0, 0]);
    tag
}

/// `para` of function type 3
pub fn srgb_curve_tag() -> Vec<u8> {
    let mut tag = b"para\0\0\0\0".to_vec();
    tag.extend_from_slice(&3u16.to_be_bytes());
    tag.extend_from_slice(&[0, 0]);
    for p in SRGB_PARAMS {
        tag.extend_from_slice(&s15f16(p));
    }
    tag
}

#[derive(Debug, Clone)]
pub struct ProfileBuilder {
    space: [u8; 4],
    tags: Vec<([u8; 4], Vec<u8>)>,
}

impl ProfileBuilder {
    pub fn new(space: &[u8; 4]) -> Self {
        Self {
            space: *space,
            tags: Vec::new(),
        }
    }

    pub fn tag(mut self, sig: &[u8; 4], data: Vec<u8>) -> Self {
        self.tags.push((*sig, data));
        self
    }

    /// RGB matrix/TRC profile with sRGB primaries and transfer curves
    pub fn srgb() -> Self {
        let [r, g, b] = SRGB_COLORANTS;
        Self::new(b"RGB ")
            .tag(b"rXYZ", xyz_tag(r))
            .tag(b"gXYZ", xyz_tag(g))
            .tag(b"bXYZ", xyz_tag(b))
            .tag(b"rTRC", srgb_curve_tag())
            .tag(b"gTRC", srgb_curve_tag())
            .tag(b"bTRC", srgb_curve_tag())
    }

    /// Gray profile with a simple gamma TRC
    pub fn gray(gamma: f64) -> Self {
        Self::new(b"GRAY").tag(b"kTRC", gamma_tag(gamma))
    }

    pub fn build(&self) -> Vec<u8> {
        let mut data = vec![0u8; 128];
        data[8] = 4;
        data[9] = 0x30;
        data[12..16].copy_from_slice(b"mntr");
        data[16..20].copy_from_slice(&self.space);
        data[20..24].copy_from_slice(b"XYZ ");
        data[36..40].copy_from_slice(b"acsp");
        // D50 illuminant
        data[68..72].copy_from_slice(&s15f16(0.9642));
        data[72..76].copy_from_slice(&s15f16(1.0));
        data[76..80].copy_from_slice(&s15f16(0.8249));

        data.extend_from_slice(&(self.tags.len() as u32).to_be_bytes());
        let mut offset = 132 + self.tags.len() * 12;
        let mut body = Vec::new();
        for (sig, tag) in &self.tags {
            data.extend_from_slice(sig);
            data.extend_from_slice(&(offset as u32).to_be_bytes());
            data.extend_from_slice(&(tag.len() as u32).to_be_bytes());
            body.extend_from_slice(tag);
            // tags start on 4-byte boundaries
            while body.len() % 4 != 0 {
                body.push(0);
            }
            offset = 132 + self.tags.len() * 12 + body.len();
        }
        data.extend_from_slice(&body);
        let len = data.len() as u32;
        data[0..4].copy_from_slice(&len.to_be_bytes());
        data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_size_matches() {
        let data = ProfileBuilder::srgb().build();
        let declared = u32::from_be_bytes([data[0], data[1], data[2], data[3]]) as usize;
        assert_eq!(declared, data.len());
        assert_eq!(&data[36..40], b"acsp");
    }
}
