use std::borrow::Cow;

use ndarray::Array2;
use num_complex::Complex;
use rustfft::FftPlanner;
use tracing::debug;

use crate::cancel::CancelToken;
use crate::error::{AlignError, Result};
use crate::frame::Translation;
use crate::pipeline::config::PhaseCorrelationConfig;

use super::subpixel::refine_peak;

/// Estimate the translation of `current` relative to `previous` using FFT
/// phase correlation.
///
/// If `current` shows the content of `previous` moved by `(dx, dy)`, the
/// result is `(dx, dy)`. Frames of different size are zero-padded on the
/// bottom/right to a common size, which keeps their top-left origins aligned.
pub fn estimate_translation(
    previous: &Array2<f32>,
    current: &Array2<f32>,
    subpixel: bool,
    config: &PhaseCorrelationConfig,
    cancel: &CancelToken,
) -> Result<Translation> {
    let (ph, pw) = previous.dim();
    let (ch, cw) = current.dim();
    if ph == 0 || pw == 0 || ch == 0 || cw == 0 {
        return Err(AlignError::Input(format!(
            "Cannot correlate empty frames ({pw}x{ph} vs {cw}x{ch})"
        )));
    }

    let h = ph.max(ch);
    let w = pw.max(cw);
    let previous = pad_to(previous, h, w);
    let current = pad_to(current, h, w);

    let (prev_input, curr_input) = if config.hann_window {
        (
            Cow::Owned(apply_hann(&previous)),
            Cow::Owned(apply_hann(&current)),
        )
    } else {
        (previous, current)
    };

    let mut planner = FftPlanner::new();
    let prev_fft = fft2d(&prev_input, &mut planner, cancel)?;
    let curr_fft = fft2d(&curr_input, &mut planner, cancel)?;

    let cross_power = normalized_cross_power(&prev_fft, &curr_fft);
    let correlation = ifft2d(&cross_power, &mut planner, cancel)?;

    let (peak_row, peak_col, peak_val) = find_peak(&correlation);
    let mean = correlation.iter().sum::<f64>() / correlation.len() as f64;
    debug!(
        peak_row,
        peak_col,
        peak = peak_val,
        peak_to_mean = peak_val / mean.abs().max(f64::EPSILON),
        "Correlation peak"
    );

    // Peaks past the midpoint are negative shifts that wrapped around.
    let mut dy = if peak_row > h / 2 {
        peak_row as f64 - h as f64
    } else {
        peak_row as f64
    };
    let mut dx = if peak_col > w / 2 {
        peak_col as f64 - w as f64
    } else {
        peak_col as f64
    };

    if subpixel {
        let (sub_dy, sub_dx) = refine_peak(&correlation, peak_row, peak_col, config.subpixel_method);
        dy += sub_dy;
        dx += sub_dx;
    }

    Ok(Translation::new(dx, dy))
}

/// Re-express translations relative to their mean instead of frame 0.
pub fn mean_centered(translations: &[Translation]) -> Vec<Translation> {
    if translations.is_empty() {
        return Vec::new();
    }
    let n = translations.len() as f64;
    let mean = translations
        .iter()
        .fold(Translation::default(), |acc, t| acc + *t);
    let mean = Translation::new(mean.dx / n, mean.dy / n);
    translations.iter().map(|t| *t - mean).collect()
}

fn pad_to(data: &Array2<f32>, h: usize, w: usize) -> Cow<'_, Array2<f32>> {
    if data.dim() == (h, w) {
        return Cow::Borrowed(data);
    }
    let mut padded = Array2::<f32>::zeros((h, w));
    let (dh, dw) = data.dim();
    padded
        .slice_mut(ndarray::s![..dh, ..dw])
        .assign(data);
    Cow::Owned(padded)
}

/// Remove the mean, then taper to zero at the borders.
fn apply_hann(data: &Array2<f32>) -> Array2<f32> {
    let (h, w) = data.dim();
    let mean = data.mean().unwrap_or(0.0);
    let mut result = Array2::<f32>::zeros((h, w));

    for row in 0..h {
        let wy = 0.5 * (1.0 - (std::f64::consts::TAU * row as f64 / h as f64).cos());
        for col in 0..w {
            let wx = 0.5 * (1.0 - (std::f64::consts::TAU * col as f64 / w as f64).cos());
            result[[row, col]] = (data[[row, col]] - mean) * (wy * wx) as f32;
        }
    }

    result
}

/// 2D FFT: row-wise FFT, then column-wise FFT.
fn fft2d(
    data: &Array2<f32>,
    planner: &mut FftPlanner<f64>,
    cancel: &CancelToken,
) -> Result<Array2<Complex<f64>>> {
    let (h, w) = data.dim();
    let fft_row = planner.plan_fft_forward(w);
    let fft_col = planner.plan_fft_forward(h);

    let mut result = data.mapv(|v| Complex::new(v as f64, 0.0));

    let mut row_buf = vec![Complex::new(0.0, 0.0); w];
    for row in 0..h {
        cancel.checkpoint_row(row)?;
        for (dst, src) in row_buf.iter_mut().zip(result.row(row)) {
            *dst = *src;
        }
        fft_row.process(&mut row_buf);
        result.row_mut(row).assign(&ndarray::ArrayView1::from(row_buf.as_slice()));
    }

    let mut col_buf = vec![Complex::new(0.0, 0.0); h];
    for col in 0..w {
        cancel.checkpoint_row(col)?;
        for (dst, src) in col_buf.iter_mut().zip(result.column(col)) {
            *dst = *src;
        }
        fft_col.process(&mut col_buf);
        result.column_mut(col).assign(&ndarray::ArrayView1::from(col_buf.as_slice()));
    }

    Ok(result)
}

/// Inverse 2D FFT, returning the normalized real part.
fn ifft2d(
    data: &Array2<Complex<f64>>,
    planner: &mut FftPlanner<f64>,
    cancel: &CancelToken,
) -> Result<Array2<f64>> {
    let (h, w) = data.dim();
    let ifft_row = planner.plan_fft_inverse(w);
    let ifft_col = planner.plan_fft_inverse(h);

    let mut work = data.clone();

    let mut col_buf = vec![Complex::new(0.0, 0.0); h];
    for col in 0..w {
        cancel.checkpoint_row(col)?;
        for (dst, src) in col_buf.iter_mut().zip(work.column(col)) {
            *dst = *src;
        }
        ifft_col.process(&mut col_buf);
        work.column_mut(col).assign(&ndarray::ArrayView1::from(col_buf.as_slice()));
    }

    let mut row_buf = vec![Complex::new(0.0, 0.0); w];
    for row in 0..h {
        cancel.checkpoint_row(row)?;
        for (dst, src) in row_buf.iter_mut().zip(work.row(row)) {
            *dst = *src;
        }
        ifft_row.process(&mut row_buf);
        work.row_mut(row).assign(&ndarray::ArrayView1::from(row_buf.as_slice()));
    }

    let scale = 1.0 / (h * w) as f64;
    Ok(work.mapv(|c| c.re * scale))
}

fn normalized_cross_power(
    prev_fft: &Array2<Complex<f64>>,
    curr_fft: &Array2<Complex<f64>>,
) -> Array2<Complex<f64>> {
    let mut result = Array2::<Complex<f64>>::zeros(prev_fft.dim());

    ndarray::Zip::from(&mut result)
        .and(prev_fft)
        .and(curr_fft)
        .for_each(|out, p, c| {
            let cross = p.conj() * c;
            let mag = cross.norm();
            *out = if mag > 1e-12 {
                cross / mag
            } else {
                Complex::new(0.0, 0.0)
            };
        });

    result
}

fn find_peak(data: &Array2<f64>) -> (usize, usize, f64) {
    let mut best = (0, 0, f64::NEG_INFINITY);
    for ((row, col), &val) in data.indexed_iter() {
        if val > best.2 {
            best = (row, col, val);
        }
    }
    best
}
