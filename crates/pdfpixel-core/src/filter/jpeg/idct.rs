//! Dequantization and separable float IDCT

use std::sync::LazyLock;

/// `C(u) * cos((2x + 1) u pi / 16) / 2`, indexed `[x][u]`
static COSINES: LazyLock<[[f32; 8]; 8]> = LazyLock::new(|| {
    let mut table = [[0f32; 8]; 8];
    for (x, row) in table.iter_mut().enumerate() {
        for (u, slot) in row.iter_mut().enumerate() {
            let c = if u == 0 { std::f32::consts::FRAC_1_SQRT_2 } else { 1.0 };
            *slot = c * (((2 * x + 1) as f32 * u as f32 * std::f32::consts::PI) / 16.0).cos() / 2.0;
        }
    }
    table
});

/// Inverse-transform one block of natural-order coefficients into 8x8
/// samples at `out[row * stride + col]`
pub fn idct_block(coeffs: &[i32], quant: &[u16; 64], out: &mut [u8], stride: usize) {
    let cos = &*COSINES;
    let mut deq = [0f32; 64];
    for i in 0..64 {
        deq[i] = coeffs[i] as f32 * quant[i] as f32;
    }

    // rows: tmp[v][x] = sum_u F[v][u] * cos[x][u]
    let mut tmp = [0f32; 64];
    for v in 0..8 {
        let row = &deq[v * 8..v * 8 + 8];
        if row[1..].iter().all(|&c| c == 0.0) {
            let dc = row[0] * cos[0][0];
            tmp[v * 8..v * 8 + 8].fill(dc);
            continue;
        }
        for x in 0..8 {
            tmp[v * 8 + x] = (0..8).map(|u| row[u] * cos[x][u]).sum();
        }
    }

    // columns
    for y in 0..8 {
        for x in 0..8 {
            let s: f32 = (0..8).map(|v| tmp[v * 8 + x] * cos[y][v]).sum();
            out[y * stride + x] = (s + 128.0).round().clamp(0.0, 255.0) as u8;
        }
    }
}
