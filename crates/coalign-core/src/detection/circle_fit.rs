//! Least-squares circle fitting.
//!
//! Uses the algebraic (Kåsa) formulation: minimise
//! `Σ (x² + y² + D·x + E·y + F)²`, which is linear in `D, E, F`. Points are
//! centred on their mean first to keep the normal equations well conditioned.

use crate::consts::EPSILON;

/// A point on a detected disc boundary, in pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LimbPoint {
    pub x: f64,
    pub y: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CircleFit {
    pub center_x: f64,
    pub center_y: f64,
    pub radius: f64,
    /// RMS of the radial distances of the fitted points from the circle.
    pub rms_residual: f64,
}

impl CircleFit {
    /// Signed radial distance of `p` from the circle.
    pub fn residual(&self, p: &LimbPoint) -> f64 {
        (p.x - self.center_x).hypot(p.y - self.center_y) - self.radius
    }
}

/// Fit a circle to at least three non-collinear points.
pub fn fit_circle(points: &[LimbPoint]) -> Option<CircleFit> {
    if points.len() < 3 {
        return None;
    }

    let n = points.len() as f64;
    let mean_x = points.iter().map(|p| p.x).sum::<f64>() / n;
    let mean_y = points.iter().map(|p| p.y).sum::<f64>() / n;

    // Normal equations A^T A [D E F]^T = A^T b, with rows [u, v, 1]
    // and b = -(u² + v²) in mean-centred coordinates.
    let mut ata = [[0.0f64; 3]; 3];
    let mut atb = [0.0f64; 3];
    for p in points {
        let u = p.x - mean_x;
        let v = p.y - mean_y;
        let row = [u, v, 1.0];
        let b = -(u * u + v * v);
        for i in 0..3 {
            for j in 0..3 {
                ata[i][j] += row[i] * row[j];
            }
            atb[i] += row[i] * b;
        }
    }

    let [d, e, f] = solve3(ata, atb)?;
    let cu = -d / 2.0;
    let cv = -e / 2.0;
    let r2 = cu * cu + cv * cv - f;
    if r2 <= 0.0 {
        return None;
    }

    let mut fit = CircleFit {
        center_x: cu + mean_x,
        center_y: cv + mean_y,
        radius: r2.sqrt(),
        rms_residual: 0.0,
    };
    fit.rms_residual = rms(points.iter().map(|p| fit.residual(p)));
    Some(fit)
}

/// Fit, drop points farther than `outlier_sigma` RMS residuals, refit.
///
/// Returns the final fit together with the points it was computed from.
pub fn fit_circle_robust(
    points: &[LimbPoint],
    outlier_sigma: f64,
) -> Option<(CircleFit, Vec<LimbPoint>)> {
    let first = fit_circle(points)?;
    if first.rms_residual <= EPSILON || outlier_sigma <= 0.0 {
        return Some((first, points.to_vec()));
    }

    let cutoff = outlier_sigma * first.rms_residual;
    let inliers: Vec<LimbPoint> = points
        .iter()
        .copied()
        .filter(|p| first.residual(p).abs() <= cutoff)
        .collect();

    if inliers.len() == points.len() {
        return Some((first, inliers));
    }
    let refit = fit_circle(&inliers)?;
    Some((refit, inliers))
}

fn rms(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v * v, c + 1));
    if count == 0 {
        0.0
    } else {
        (sum / count as f64).sqrt()
    }
}

/// Solve a 3x3 linear system by Gaussian elimination with partial pivoting.
fn solve3(mut a: [[f64; 3]; 3], mut b: [f64; 3]) -> Option<[f64; 3]> {
    for col in 0..3 {
        let pivot = (col..3).max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))?;
        if a[pivot][col].abs() < EPSILON {
            return None;
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in col + 1..3 {
            let factor = a[row][col] / a[col][col];
            for k in col..3 {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = [0.0f64; 3];
    for row in (0..3).rev() {
        let tail: f64 = (row + 1..3).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }
    Some(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn circle_points(cx: f64, cy: f64, r: f64, n: usize) -> Vec<LimbPoint> {
        (0..n)
            .map(|i| {
                let t = std::f64::consts::TAU * i as f64 / n as f64;
                LimbPoint {
                    x: cx + r * t.cos(),
                    y: cy + r * t.sin(),
                }
            })
            .collect()
    }

    #[test]
    fn exact_circle_is_recovered() {
        let fit = fit_circle(&circle_points(120.5, 80.25, 42.0, 36)).unwrap();
        assert!((fit.center_x - 120.5).abs() < 1e-9);
        assert!((fit.center_y - 80.25).abs() < 1e-9);
        assert!((fit.radius - 42.0).abs() < 1e-9);
        assert!(fit.rms_residual < 1e-9);
    }

    #[test]
    fn collinear_points_have_no_circle() {
        let pts: Vec<LimbPoint> = (0..10)
            .map(|i| LimbPoint {
                x: i as f64,
                y: 2.0 * i as f64,
            })
            .collect();
        assert!(fit_circle(&pts).is_none());
    }

    #[test]
    fn outlier_is_rejected() {
        let mut pts = circle_points(50.0, 50.0, 20.0, 40);
        pts.push(LimbPoint { x: 50.0, y: 95.0 });
        let (fit, inliers) = fit_circle_robust(&pts, 2.0).unwrap();
        assert_eq!(inliers.len(), 40);
        assert!((fit.radius - 20.0).abs() < 1e-6);
    }
}
