//! Component upsampling and YCbCr / YCCK conversion

/// A decoded component plane at its own (possibly subsampled) resolution
pub struct Plane<'a> {
    pub data: &'a [u8],
    pub stride: usize,
    pub h: usize,
    pub v: usize,
}

#[inline]
fn clamp_u8(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

#[inline]
pub fn ycbcr_to_rgb(y: u8, cb: u8, cr: u8) -> [u8; 3] {
    let (y, cb, cr) = (y as f32, cb as f32 - 128.0, cr as f32 - 128.0);
    [
        clamp_u8(y + 1.402 * cr),
        clamp_u8(y - 0.344_136 * cb - 0.714_136 * cr),
        clamp_u8(y + 1.772 * cb),
    ]
}

/// Interleave the planes into `width * height * planes.len()` bytes,
/// upsampling by nearest neighbour and applying the color transform
pub fn interleave(
    planes: &[Plane<'_>],
    width: usize,
    height: usize,
    h_max: usize,
    v_max: usize,
    transform: bool,
) -> Vec<u8> {
    let n = planes.len();
    let mut out = vec![0u8; width * height * n];
    let mut px = [0u8; 4];

    for y in 0..height {
        let row = &mut out[y * width * n..(y + 1) * width * n];
        for x in 0..width {
            for (c, plane) in planes.iter().enumerate() {
                let sx = x * plane.h / h_max;
                let sy = y * plane.v / v_max;
                px[c] = plane.data[sy * plane.stride + sx];
            }
            let dst = &mut row[x * n..x * n + n];
            match (n, transform) {
                (3, true) => dst.copy_from_slice(&ycbcr_to_rgb(px[0], px[1], px[2])),
                (4, true) => {
                    // YCCK: convert to RGB, then CMY = 255 - RGB, K as stored
                    let [r, g, b] = ycbcr_to_rgb(px[0], px[1], px[2]);
                    dst.copy_from_slice(&[255 - r, 255 - g, 255 - b, px[3]]);
                }
                _ => dst.copy_from_slice(&px[..n]),
            }
        }
    }
    out
}
