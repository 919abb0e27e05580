use ndarray::{Array2, Axis};
use rayon::prelude::*;

use crate::cancel::CancelToken;
use crate::consts::PARALLEL_PIXEL_THRESHOLD;
use crate::error::Result;

/// Apply Gaussian blur to a raw array using separable 1D convolution.
///
/// Edges are handled by clamping. A non-positive `sigma` returns a copy.
pub fn gaussian_blur_array(data: &Array2<f32>, sigma: f32, cancel: &CancelToken) -> Result<Array2<f32>> {
    if sigma <= 0.0 {
        return Ok(data.clone());
    }
    let kernel = make_gaussian_kernel(sigma);
    let horizontal = convolve_rows(data, &kernel, cancel)?;
    // Columns of the input are rows of its transpose.
    let vertical = convolve_rows(&horizontal.t().to_owned(), &kernel, cancel)?;
    Ok(vertical.t().to_owned())
}

fn make_gaussian_kernel(sigma: f32) -> Vec<f32> {
    let radius = (sigma * 3.0).ceil() as usize;
    let s2 = 2.0 * sigma * sigma;
    let mut kernel: Vec<f32> = (0..=2 * radius)
        .map(|i| {
            let x = i as f32 - radius as f32;
            (-x * x / s2).exp()
        })
        .collect();

    let sum: f32 = kernel.iter().sum();
    kernel.iter_mut().for_each(|k| *k /= sum);
    kernel
}

fn convolve_rows(data: &Array2<f32>, kernel: &[f32], cancel: &CancelToken) -> Result<Array2<f32>> {
    let (h, w) = data.dim();
    let radius = kernel.len() / 2;
    let mut result = Array2::<f32>::zeros((h, w));

    type RowPair<'a> = (ndarray::ArrayView1<'a, f32>, ndarray::ArrayViewMut1<'a, f32>);
    let convolve_row = |(row, (src, mut dst)): (usize, RowPair<'_>)| -> Result<()> {
        cancel.checkpoint_row(row)?;
        for col in 0..w {
            let mut sum = 0.0f32;
            for (ki, &kv) in kernel.iter().enumerate() {
                let src_col =
                    (col as isize + ki as isize - radius as isize).clamp(0, w as isize - 1);
                sum += src[src_col as usize] * kv;
            }
            dst[col] = sum;
        }
        Ok(())
    };

    if h * w >= PARALLEL_PIXEL_THRESHOLD {
        data.axis_iter(Axis(0))
            .into_par_iter()
            .zip(result.axis_iter_mut(Axis(0)).into_par_iter())
            .enumerate()
            .try_for_each(convolve_row)?;
    } else {
        data.axis_iter(Axis(0))
            .zip(result.axis_iter_mut(Axis(0)))
            .enumerate()
            .try_for_each(convolve_row)?;
    }

    Ok(result)
}
