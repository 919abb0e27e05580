use ndarray::Array2;

use crate::consts::{BORDER_STRIP_WIDTH, OTSU_HISTOGRAM_BINS};

/// Otsu's threshold over the data's own value range.
///
/// Values need not lie in [0, 1]; the histogram spans `[min, max]`.
/// A constant image returns its single value.
pub fn otsu_threshold(data: &Array2<f32>) -> f32 {
    let (min, max) = value_range(data);
    if max - min <= f32::EPSILON {
        return min;
    }

    let bins = OTSU_HISTOGRAM_BINS;
    let scale = (bins - 1) as f32 / (max - min);
    let mut histogram = vec![0u64; bins];
    for &v in data.iter() {
        let bin = (((v - min) * scale) as usize).min(bins - 1);
        histogram[bin] += 1;
    }

    let total = data.len() as f64;
    let sum_all: f64 = histogram
        .iter()
        .enumerate()
        .map(|(i, &count)| i as f64 * count as f64)
        .sum();

    let mut weight_bg = 0.0f64;
    let mut sum_bg = 0.0f64;
    let mut best_variance = 0.0f64;
    let mut best_bin = 0usize;

    for (i, &count) in histogram.iter().enumerate() {
        weight_bg += count as f64;
        if weight_bg == 0.0 {
            continue;
        }
        let weight_fg = total - weight_bg;
        if weight_fg == 0.0 {
            break;
        }
        sum_bg += i as f64 * count as f64;
        let mean_bg = sum_bg / weight_bg;
        let mean_fg = (sum_all - sum_bg) / weight_fg;
        let between = weight_bg * weight_fg * (mean_bg - mean_fg).powi(2);
        if between > best_variance {
            best_variance = between;
            best_bin = i;
        }
    }

    min + (best_bin as f32 + 0.5) / scale
}

/// Background level: median of the pixels in a thin strip along the border.
pub fn border_median(data: &Array2<f32>) -> f32 {
    let (h, w) = data.dim();
    let strip = BORDER_STRIP_WIDTH.min(h / 2).min(w / 2);
    if strip == 0 {
        return 0.0;
    }

    let mut border: Vec<f32> = data
        .indexed_iter()
        .filter(|((row, col), _)| {
            *row < strip || *row >= h - strip || *col < strip || *col >= w - strip
        })
        .map(|(_, &v)| v)
        .collect();

    if border.is_empty() {
        return 0.0;
    }
    let mid = border.len() / 2;
    let (_, median, _) = border.select_nth_unstable_by(mid, f32::total_cmp);
    *median
}

fn value_range(data: &Array2<f32>) -> (f32, f32) {
    data.iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn otsu_separates_bimodal_data() {
        let mut data = Array2::from_elem((20, 20), 0.1f32);
        for r in 5..15 {
            for c in 5..15 {
                data[[r, c]] = 0.9;
            }
        }
        let t = otsu_threshold(&data);
        assert!(t > 0.1 && t < 0.9, "threshold {t} should split the modes");
    }

    #[test]
    fn otsu_handles_unnormalized_range() {
        let mut data = Array2::from_elem((10, 10), 1000.0f32);
        data[[5, 5]] = 40000.0;
        data[[5, 6]] = 40000.0;
        let t = otsu_threshold(&data);
        assert!(t > 1000.0 && t < 40000.0);
    }

    #[test]
    fn border_median_ignores_centre() {
        let mut data = Array2::from_elem((32, 32), 0.05f32);
        for r in 8..24 {
            for c in 8..24 {
                data[[r, c]] = 1.0;
            }
        }
        assert!((border_median(&data) - 0.05).abs() < 1e-6);
    }
}
