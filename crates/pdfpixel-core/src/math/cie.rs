//! CIE XYZ and L*a*b* helpers, white points and Bradford adaptation

use super::matrix::Matrix3x3;

/// ICC profile connection space white
pub const D50: [f64; 3] = [0.9642, 1.0, 0.8251];
/// sRGB white
pub const D65: [f64; 3] = [0.9505, 1.0, 1.0890];

/// Bradford matrix: XYZ → LMS (cone response)
const BRADFORD_XYZ_TO_LMS: Matrix3x3 = Matrix3x3::new([
    [0.8951000, 0.2664000, -0.1614000],
    [-0.7502000, 1.7135000, 0.0367000],
    [0.0389000, -0.0685000, 1.0296000],
]);

/// Bradford matrix: LMS → XYZ
const BRADFORD_LMS_TO_XYZ: Matrix3x3 = Matrix3x3::new([
    [0.9869929, -0.1470543, 0.1599627],
    [0.4323053, 0.5183603, 0.0492912],
    [-0.0085287, 0.0400428, 0.9684867],
]);

/// Pre-computed D50 → D65 Bradford matrix
pub const D50_TO_D65_BRADFORD: Matrix3x3 = Matrix3x3::new([
    [0.9555766, -0.0230393, 0.0631636],
    [-0.0282895, 1.0099416, 0.0210077],
    [0.0122982, -0.0204830, 1.3299098],
]);

/// Bradford adaptation matrix, `XYZ_dst = M × XYZ_src`
pub fn bradford_matrix(src_white: [f64; 3], dst_white: [f64; 3]) -> Matrix3x3 {
    let src = BRADFORD_XYZ_TO_LMS.multiply_vec(src_white);
    let dst = BRADFORD_XYZ_TO_LMS.multiply_vec(dst_white);
    let ratio = |i: usize| if src[i].abs() > 1e-10 { dst[i] / src[i] } else { 1.0 };
    let scale = Matrix3x3::diagonal(ratio(0), ratio(1), ratio(2));
    BRADFORD_LMS_TO_XYZ.multiply(&scale.multiply(&BRADFORD_XYZ_TO_LMS))
}

const DELTA: f32 = 6.0 / 29.0;

#[inline]
fn lab_f(t: f32) -> f32 {
    if t > DELTA * DELTA * DELTA {
        t.cbrt()
    } else {
        t / (3.0 * DELTA * DELTA) + 4.0 / 29.0
    }
}

#[inline]
fn lab_f_inv(t: f32) -> f32 {
    if t > DELTA {
        t * t * t
    } else {
        3.0 * DELTA * DELTA * (t - 4.0 / 29.0)
    }
}

/// L*a*b* (L in 0..100) to XYZ relative to `white`
#[inline]
pub fn lab_to_xyz(lab: [f32; 3], white: [f32; 3]) -> [f32; 3] {
    let fy = (lab[0] + 16.0) / 116.0;
    let fx = fy + lab[1] / 500.0;
    let fz = fy - lab[2] / 200.0;
    [
        lab_f_inv(fx) * white[0],
        lab_f_inv(fy) * white[1],
        lab_f_inv(fz) * white[2],
    ]
}

/// XYZ to L*a*b* relative to `white`
#[inline]
pub fn xyz_to_lab(xyz: [f32; 3], white: [f32; 3]) -> [f32; 3] {
    let fx = lab_f(xyz[0] / white[0]);
    let fy = lab_f(xyz[1] / white[1]);
    let fz = lab_f(xyz[2] / white[2]);
    [116.0 * fy - 16.0, 500.0 * (fx - fy), 200.0 * (fy - fz)]
}

/// f32 copy of a white point
pub fn white_f32(white: [f64; 3]) -> [f32; 3] {
    white.map(|v| v as f32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bradford_matches_precomputed() {
        let m = bradford_matrix(D50, D65);
        for i in 0..3 {
            for j in 0..3 {
                assert!((m.m[i][j] - D50_TO_D65_BRADFORD.m[i][j]).abs() < 1e-3);
            }
        }
    }

    #[test]
    fn test_bradford_maps_white() {
        let m = bradford_matrix(D50, D65);
        let w = m.multiply_vec(D50);
        for i in 0..3 {
            assert!((w[i] - D65[i]).abs() < 1e-5);
        }
    }

    #[test]
    fn test_lab_white_and_black() {
        let w = white_f32(D50);
        let xyz = lab_to_xyz([100.0, 0.0, 0.0], w);
        for i in 0..3 {
            assert!((xyz[i] - w[i]).abs() < 1e-5);
        }
        assert!(lab_to_xyz([0.0, 0.0, 0.0], w).iter().all(|v| v.abs() < 1e-6));
    }

    #[test]
    fn test_lab_roundtrip() {
        let w = white_f32(D65);
        let lab = [53.2, 80.1, 67.2];
        let back = xyz_to_lab(lab_to_xyz(lab, w), w);
        for i in 0..3 {
            assert!((back[i] - lab[i]).abs() < 1e-2);
        }
    }
}
