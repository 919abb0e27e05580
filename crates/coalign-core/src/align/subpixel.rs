use ndarray::Array2;

use crate::consts::EPSILON;
use crate::pipeline::config::SubpixelMethod;

/// Refine an integer correlation peak to sub-pixel precision.
///
/// Neighbours wrap around the surface edges, since the correlation surface is
/// periodic. Returns `(delta_row, delta_col)` in [-0.5, 0.5] for the parabolic
/// method and in (-1, 1) for the Foroosh estimator.
pub fn refine_peak(
    correlation: &Array2<f64>,
    peak_row: usize,
    peak_col: usize,
    method: SubpixelMethod,
) -> (f64, f64) {
    let (h, w) = correlation.dim();
    if h < 3 || w < 3 {
        return (0.0, 0.0);
    }

    let peak = correlation[[peak_row, peak_col]];
    let row_prev = correlation[[(peak_row + h - 1) % h, peak_col]];
    let row_next = correlation[[(peak_row + 1) % h, peak_col]];
    let col_prev = correlation[[peak_row, (peak_col + w - 1) % w]];
    let col_next = correlation[[peak_row, (peak_col + 1) % w]];

    let refine = match method {
        SubpixelMethod::Parabolic => parabolic_offset,
        SubpixelMethod::Foroosh => foroosh_offset,
    };

    (
        refine(row_prev, peak, row_next),
        refine(col_prev, peak, col_next),
    )
}

/// Vertex of the parabola through three equally spaced samples.
fn parabolic_offset(prev: f64, curr: f64, next: f64) -> f64 {
    let denom = prev - 2.0 * curr + next;
    if denom.abs() > EPSILON {
        ((prev - next) / (2.0 * denom)).clamp(-0.5, 0.5)
    } else {
        0.0
    }
}

/// Sub-pixel displacement from the ratio of the larger side lobe to the peak
/// of a phase-correlation (Dirichlet kernel) surface.
fn foroosh_offset(prev: f64, peak: f64, next: f64) -> f64 {
    let (side, sign) = if next > prev { (next, 1.0) } else { (prev, -1.0) };

    let d1 = side / (side + peak);
    let d2 = side / (side - peak);

    if d1 > 0.0 && d1 < 1.0 {
        sign * d1
    } else if d2 > 0.0 && d2 < 1.0 {
        sign * d2
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parabola_vertex_is_recovered() {
        // y = -(x - 0.3)^2 sampled at -1, 0, 1
        let f = |x: f64| -(x - 0.3) * (x - 0.3);
        let offset = parabolic_offset(f(-1.0), f(0.0), f(1.0));
        assert!((offset - 0.3).abs() < 1e-9);
    }

    #[test]
    fn symmetric_peak_has_no_offset() {
        assert_eq!(parabolic_offset(0.2, 1.0, 0.2), 0.0);
        assert_eq!(foroosh_offset(0.0, 1.0, 0.0), 0.0);
    }

    #[test]
    fn neighbours_wrap_at_surface_edges() {
        let mut corr = Array2::<f64>::zeros((8, 8));
        corr[[0, 0]] = 1.0;
        corr[[7, 0]] = 0.5;
        corr[[1, 0]] = 0.1;
        let (dr, dc) = refine_peak(&corr, 0, 0, SubpixelMethod::Parabolic);
        assert!(dr < 0.0, "peak should lean toward the wrapped neighbour, got {dr}");
        assert_eq!(dc, 0.0);
    }
}
