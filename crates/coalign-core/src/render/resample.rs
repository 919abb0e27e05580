use ndarray::Array2;

/// Bilinear sample at fractional `(y, x)`; samples outside the array are 0.
pub fn bilinear_sample(data: &Array2<f32>, y: f64, x: f64) -> f32 {
    let (h, w) = data.dim();

    let x0 = x.floor() as i64;
    let y0 = y.floor() as i64;
    let x1 = x0 + 1;
    let y1 = y0 + 1;

    let fx = (x - x0 as f64) as f32;
    let fy = (y - y0 as f64) as f32;

    let sample = |r: i64, c: i64| -> f32 {
        if r >= 0 && r < h as i64 && c >= 0 && c < w as i64 {
            data[[r as usize, c as usize]]
        } else {
            0.0
        }
    };

    let v00 = sample(y0, x0);
    let v10 = sample(y0, x1);
    let v01 = sample(y1, x0);
    let v11 = sample(y1, x1);

    v00 * (1.0 - fx) * (1.0 - fy)
        + v10 * fx * (1.0 - fy)
        + v01 * (1.0 - fx) * fy
        + v11 * fx * fy
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_and_halfway_samples() {
        let mut data = Array2::<f32>::zeros((4, 4));
        data[[1, 1]] = 1.0;

        assert!((bilinear_sample(&data, 1.0, 1.0) - 1.0).abs() < 1e-6);
        assert!((bilinear_sample(&data, 1.0, 1.5) - 0.5).abs() < 1e-6);
        assert!((bilinear_sample(&data, 0.5, 0.5) - 0.25).abs() < 1e-6);
    }

    #[test]
    fn outside_is_zero() {
        let data = Array2::from_elem((3, 3), 1.0f32);
        assert_eq!(bilinear_sample(&data, -5.0, 1.0), 0.0);
        assert!((bilinear_sample(&data, 2.5, 1.0) - 0.5).abs() < 1e-6);
    }
}
