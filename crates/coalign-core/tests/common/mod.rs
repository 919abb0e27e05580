#![allow(dead_code)]

use std::sync::Arc;

use ndarray::Array2;

use coalign_core::frame::Frame;

/// Deterministic white-noise value for integer pixel `(x, y)`, in [0, 1].
pub fn noise(x: i64, y: i64) -> f32 {
    let mut h = (x as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ (y as u64).wrapping_mul(0xC2B2_AE3D_27D4_EB4F);
    h ^= h >> 33;
    h = h.wrapping_mul(0xFF51_AFD7_ED55_8CCD);
    h ^= h >> 33;
    (h >> 40) as f32 / (1u64 << 24) as f32
}

/// Noise texture whose content is moved by `(sx, sy)` pixels: the value at
/// `(x, y)` in the unshifted texture appears at `(x + sx, y + sy)`.
pub fn shifted_noise(h: usize, w: usize, sx: i64, sy: i64) -> Frame {
    let data = Array2::from_shape_fn((h, w), |(row, col)| {
        noise(col as i64 - sx, row as i64 - sy)
    });
    Frame::new(data, 16)
}

/// Smooth texture of Gaussian blobs moved by a fractional `(sx, sy)`. The
/// blobs are evaluated analytically, so the shift is exact.
pub fn blob_texture(h: usize, w: usize, sx: f64, sy: f64) -> Frame {
    const MARGIN: f64 = 16.0;
    const SIGMA: f64 = 1.2;
    let span_x = w as f64 + 2.0 * MARGIN;
    let span_y = h as f64 + 2.0 * MARGIN;
    let blobs: Vec<(f64, f64, f64)> = (0..(h * w / 6) as i64)
        .map(|i| {
            (
                noise(i, 3) as f64 * span_x - MARGIN,
                noise(i, 5) as f64 * span_y - MARGIN,
                noise(i, 7) as f64,
            )
        })
        .collect();
    let data = Array2::from_shape_fn((h, w), |(row, col)| {
        let (x, y) = (col as f64 - sx, row as f64 - sy);
        blobs
            .iter()
            .map(|&(bx, by, a)| {
                let d2 = (x - bx).powi(2) + (y - by).powi(2);
                a * (-d2 / (2.0 * SIGMA * SIGMA)).exp()
            })
            .sum::<f64>() as f32
    });
    Frame::new(data, 16)
}

pub fn shared(frames: Vec<Frame>) -> Vec<Arc<Frame>> {
    frames.into_iter().map(Arc::new).collect()
}

/// Bright disc on a dark background with a one-pixel anti-aliased edge.
pub fn disc_frame(h: usize, w: usize, cx: f64, cy: f64, radius: f64) -> Frame {
    let data = Array2::from_shape_fn((h, w), |(row, col)| {
        let d = (col as f64 - cx).hypot(row as f64 - cy);
        (0.1 + 0.7 * (radius - d + 0.5).clamp(0.0, 1.0)) as f32
    });
    Frame::new(data, 16)
}

/// Disc centres jittered around `(cx, cy)` by a fixed pseudo-random pattern
/// of at most `amplitude` pixels per axis.
pub fn jittered_centres(count: usize, cx: f64, cy: f64, amplitude: f64) -> Vec<(f64, f64)> {
    (0..count)
        .map(|i| {
            let jx = (noise(i as i64, 11) as f64 * 2.0 - 1.0) * amplitude;
            let jy = (noise(i as i64, 29) as f64 * 2.0 - 1.0) * amplitude;
            (cx + jx, cy + jy)
        })
        .collect()
}
