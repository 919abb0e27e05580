//! Sequence-wide disc stabilization.
//!
//! Every frame's limb points are treated as noisy observations of one disc
//! with a common radius. The solver alternates a Gauss-Newton step on each
//! frame's centre (radius held fixed) with the closed-form least-squares
//! radius for the current centres, until neither moves by more than the
//! tolerance.

use tracing::{debug, info};

use crate::cancel::CancelToken;
use crate::consts::EPSILON;
use crate::detection::{LimbDetection, LimbPoint};
use crate::error::{AlignError, Result};
use crate::frame::Translation;
use crate::pipeline::config::StabilizationConfig;

/// Jointly consistent disc model for a whole sequence.
#[derive(Clone, Debug)]
pub struct Stabilization {
    /// Disc centre per frame, `(x, y)`.
    pub centers: Vec<(f64, f64)>,
    /// Common radius.
    pub radius: f64,
    /// Translation of each frame relative to frame 0.
    pub translations: Vec<Translation>,
    pub iterations: usize,
}

/// Median of the per-frame fitted radii, used as the starting consensus.
pub fn initial_radius(detections: &[LimbDetection]) -> Option<f64> {
    let mut radii: Vec<f64> = detections.iter().map(|d| d.disc.radius).collect();
    if radii.is_empty() {
        return None;
    }
    radii.sort_unstable_by(f64::total_cmp);
    let mid = radii.len() / 2;
    Some(if radii.len() % 2 == 0 {
        0.5 * (radii[mid - 1] + radii[mid])
    } else {
        radii[mid]
    })
}

/// Refine all frames' disc centres against one shared radius.
///
/// `on_progress` receives `iteration / max_iterations` after every iteration
/// that neither converged nor hit the cap, and 1.0 once converged.
pub fn stabilize<F>(
    detections: &[LimbDetection],
    config: &StabilizationConfig,
    cancel: &CancelToken,
    mut on_progress: F,
) -> Result<Stabilization>
where
    F: FnMut(f64),
{
    let mut radius = initial_radius(detections)
        .ok_or_else(|| AlignError::Input("No disc detections to stabilize".into()))?;
    let mut centers: Vec<(f64, f64)> = detections
        .iter()
        .map(|d| (d.disc.center_x, d.disc.center_y))
        .collect();

    let max_iterations = config.max_iterations.max(1);
    let mut last_delta = f64::INFINITY;

    for iteration in 1..=max_iterations {
        cancel.checkpoint()?;

        let mut delta = 0.0f64;
        for (index, (center, detection)) in centers.iter_mut().zip(detections).enumerate() {
            let step = gauss_newton_step(&detection.points, *center, radius).ok_or_else(|| {
                AlignError::Detection {
                    index,
                    message: "limb points do not constrain the disc centre".into(),
                }
            })?;
            center.0 += step.0;
            center.1 += step.1;
            delta = delta.max(step.0.hypot(step.1));
        }

        let new_radius = consensus_radius(detections, &centers);
        delta = delta.max((new_radius - radius).abs());
        radius = new_radius;
        last_delta = delta;

        debug!(iteration, delta, radius, "Stabilization iteration");

        if delta < config.tolerance {
            on_progress(1.0);
            let origin = centers[0];
            let translations = centers
                .iter()
                .map(|c| Translation::new(c.0 - origin.0, c.1 - origin.1))
                .collect();
            info!(iterations = iteration, radius, "Stabilization converged");
            return Ok(Stabilization {
                centers,
                radius,
                translations,
                iterations: iteration,
            });
        }

        // 1.0 is reserved for convergence.
        if iteration < max_iterations {
            on_progress(iteration as f64 / max_iterations as f64);
        }
    }

    Err(AlignError::Convergence {
        iterations: max_iterations,
        last_delta,
    })
}

/// One Gauss-Newton update of a circle centre with fixed radius, minimising
/// `Σ (|p - c| - r)²`.
fn gauss_newton_step(points: &[LimbPoint], center: (f64, f64), radius: f64) -> Option<(f64, f64)> {
    // J^T J and J^T r, with residual r_j = |p_j - c| - R and
    // Jacobian row -(p_j - c) / |p_j - c|.
    let (mut a11, mut a12, mut a22) = (0.0f64, 0.0f64, 0.0f64);
    let (mut b1, mut b2) = (0.0f64, 0.0f64);

    for p in points {
        let dx = p.x - center.0;
        let dy = p.y - center.1;
        let dist = dx.hypot(dy);
        if dist < EPSILON {
            continue;
        }
        let (jx, jy) = (-dx / dist, -dy / dist);
        let residual = dist - radius;
        a11 += jx * jx;
        a12 += jx * jy;
        a22 += jy * jy;
        b1 += jx * residual;
        b2 += jy * residual;
    }

    let det = a11 * a22 - a12 * a12;
    if det.abs() < EPSILON {
        return None;
    }

    // Solve (J^T J) step = -J^T r.
    let sx = -(a22 * b1 - a12 * b2) / det;
    let sy = -(a11 * b2 - a12 * b1) / det;
    Some((sx, sy))
}

/// Least-squares radius for fixed centres: the mean point distance.
fn consensus_radius(detections: &[LimbDetection], centers: &[(f64, f64)]) -> f64 {
    let (sum, count) = detections
        .iter()
        .zip(centers)
        .flat_map(|(d, c)| d.points.iter().map(move |p| (p.x - c.0).hypot(p.y - c.1)))
        .fold((0.0f64, 0usize), |(s, n), dist| (s + dist, n + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}
