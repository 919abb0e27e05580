use ndarray::Array2;
use rayon::prelude::*;
use tracing::debug;

use crate::cancel::CancelToken;
use crate::consts::LIMB_RAY_STEP;
use crate::error::{AlignError, Result};
use crate::filters::gaussian_blur::gaussian_blur_array;
use crate::frame::ImageSize;
use crate::pipeline::config::LimbConfig;
use crate::render::bilinear_sample;

use super::circle_fit::{fit_circle_robust, LimbPoint};
use super::region::{largest_region, open_3x3};
use super::threshold::{border_median, otsu_threshold};

/// Fitted disc of one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DiscEstimate {
    pub center_x: f64,
    pub center_y: f64,
    pub radius: f64,
    pub image_size: ImageSize,
    /// RMS distance of the limb points from the fitted circle.
    pub fit_residual: f64,
}

/// A disc estimate together with the limb points it was fitted to.
#[derive(Clone, Debug)]
pub struct LimbDetection {
    pub disc: DiscEstimate,
    pub points: Vec<LimbPoint>,
}

/// Detect the limb of the dominant bright disc in a frame.
///
/// Pipeline: Gaussian blur -> Otsu threshold -> 3x3 opening -> largest
/// region (coarse centre and radius) -> radial edge search along
/// `ray_count` rays -> robust least-squares circle fit.
pub fn detect_limb(
    data: &Array2<f32>,
    frame_index: usize,
    config: &LimbConfig,
    cancel: &CancelToken,
) -> Result<LimbDetection> {
    let fail = |message: String| AlignError::Detection {
        index: frame_index,
        message,
    };

    let (h, w) = data.dim();
    if h < 3 || w < 3 {
        return Err(fail(format!("frame too small ({w}x{h})")));
    }

    let blurred = gaussian_blur_array(data, config.blur_sigma, cancel)?;

    let threshold = otsu_threshold(&blurred);
    cancel.checkpoint()?;
    let mask = open_3x3(&blurred.mapv(|v| v > threshold), cancel)?;
    let region = largest_region(&mask, cancel)?
        .filter(|r| r.area >= config.min_area)
        .ok_or_else(|| fail("no bright disc found".into()))?;

    let background = border_median(&blurred);
    let disc_level = mean_inside(&blurred, &mask);
    let contrast = disc_level - background;
    if contrast <= 0.0 {
        return Err(fail("disc is not brighter than the background".into()));
    }

    let r0 = region.equivalent_radius();
    debug!(
        frame_index,
        coarse_x = region.center_x,
        coarse_y = region.center_y,
        coarse_radius = r0,
        contrast,
        "Coarse disc"
    );

    let min_drop = config.edge_threshold * contrast;
    let points: Vec<LimbPoint> = (0..config.ray_count)
        .into_par_iter()
        .filter_map(|k| {
            let angle = std::f64::consts::TAU * k as f64 / config.ray_count as f64;
            find_edge_on_ray(
                &blurred,
                (region.center_x, region.center_y),
                angle,
                (config.inner_fraction * r0, config.outer_fraction * r0),
                min_drop,
            )
        })
        .collect();
    cancel.checkpoint()?;

    if points.len() < config.min_points {
        return Err(fail(format!(
            "only {} limb points found (need {})",
            points.len(),
            config.min_points
        )));
    }

    let (fit, inliers) = fit_circle_robust(&points, config.outlier_sigma)
        .ok_or_else(|| fail("limb points do not determine a circle".into()))?;

    if inliers.len() < config.min_points {
        return Err(fail(format!(
            "only {} limb points left after outlier rejection (need {})",
            inliers.len(),
            config.min_points
        )));
    }
    if fit.rms_residual > config.max_fit_residual {
        return Err(fail(format!(
            "circle fit residual {:.2} px exceeds {:.2} px",
            fit.rms_residual, config.max_fit_residual
        )));
    }
    let inside = fit.center_x >= 0.0
        && fit.center_y >= 0.0
        && fit.center_x < w as f64
        && fit.center_y < h as f64;
    if fit.radius <= 0.0 || !inside {
        return Err(fail(format!(
            "implausible disc (centre ({:.1}, {:.1}), radius {:.1})",
            fit.center_x, fit.center_y, fit.radius
        )));
    }

    debug!(
        frame_index,
        center_x = fit.center_x,
        center_y = fit.center_y,
        radius = fit.radius,
        residual = fit.rms_residual,
        points = inliers.len(),
        "Limb fitted"
    );

    Ok(LimbDetection {
        disc: DiscEstimate {
            center_x: fit.center_x,
            center_y: fit.center_y,
            radius: fit.radius,
            image_size: ImageSize {
                width: w,
                height: h,
            },
            fit_residual: fit.rms_residual,
        },
        points: inliers,
    })
}

/// Position of the steepest bright-to-dark transition along one ray, or
/// `None` when the drop is too weak or not bracketed by the sampled span.
fn find_edge_on_ray(
    data: &Array2<f32>,
    center: (f64, f64),
    angle: f64,
    (r_start, r_end): (f64, f64),
    min_drop: f32,
) -> Option<LimbPoint> {
    let (h, w) = data.dim();
    let (cos, sin) = (angle.cos(), angle.sin());
    let inside = |x: f64, y: f64| x >= 0.0 && y >= 0.0 && x <= (w - 1) as f64 && y <= (h - 1) as f64;

    let mut profile = Vec::new();
    let mut r = r_start.max(0.0);
    while r <= r_end {
        let (x, y) = (center.0 + r * cos, center.1 + r * sin);
        if !inside(x, y) {
            break;
        }
        profile.push(bilinear_sample(data, y, x));
        r += LIMB_RAY_STEP;
    }
    if profile.len() < 5 {
        return None;
    }

    // Central-difference slope in intensity per pixel.
    let slopes: Vec<f32> = profile
        .windows(3)
        .map(|s| (s[2] - s[0]) / (2.0 * LIMB_RAY_STEP as f32))
        .collect();
    let (idx, &steepest) = slopes
        .iter()
        .enumerate()
        .min_by(|a, b| a.1.total_cmp(b.1))?;
    if -steepest < min_drop {
        return None;
    }

    // Bilinear sampling makes the profile piecewise linear, so the steepest
    // slope is a plateau rather than a peak. Locate the edge as the centroid
    // of the descent, weighted by how far each slope exceeds half the steepest.
    let cutoff = 0.5 * steepest;
    let mut lo = idx;
    while lo > 0 && slopes[lo - 1] <= cutoff {
        lo -= 1;
    }
    let mut hi = idx;
    while hi + 1 < slopes.len() && slopes[hi + 1] <= cutoff {
        hi += 1;
    }
    // The descent must be strictly inside, so the edge is bracketed.
    if lo == 0 || hi + 1 == slopes.len() {
        return None;
    }

    let (weighted, total) = slopes[lo..=hi]
        .iter()
        .zip(lo..)
        .fold((0.0f64, 0.0f64), |(m, t), (&s, i)| {
            let weight = (cutoff - s) as f64;
            (m + weight * i as f64, t + weight)
        });

    // slopes[i] is centred on profile sample i + 1.
    let radius = r_start.max(0.0) + (weighted / total + 1.0) * LIMB_RAY_STEP;
    Some(LimbPoint {
        x: center.0 + radius * cos,
        y: center.1 + radius * sin,
    })
}

fn mean_inside(data: &Array2<f32>, mask: &Array2<bool>) -> f32 {
    let (sum, count) = data
        .iter()
        .zip(mask.iter())
        .filter(|(_, m)| **m)
        .fold((0.0f64, 0usize), |(s, c), (&v, _)| (s + v as f64, c + 1));
    if count == 0 {
        0.0
    } else {
        (sum / count as f64) as f32
    }
}
