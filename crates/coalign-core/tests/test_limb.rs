mod common;

use approx::assert_abs_diff_eq;
use ndarray::Array2;

use coalign_core::cancel::CancelToken;
use coalign_core::detection::{detect_limb, fit_circle, LimbPoint};
use coalign_core::error::AlignError;
use coalign_core::pipeline::config::{LimbConfig, StabilizationConfig};
use coalign_core::stabilize::stabilize;

use common::{disc_frame, jittered_centres};

const RADIUS: f64 = 30.0;

#[test]
fn test_detects_centred_disc() {
    let frame = disc_frame(128, 128, 64.0, 60.0, RADIUS);
    let detection =
        detect_limb(&frame.data, 0, &LimbConfig::default(), &CancelToken::new()).unwrap();

    assert_abs_diff_eq!(detection.disc.center_x, 64.0, epsilon = 0.3);
    assert_abs_diff_eq!(detection.disc.center_y, 60.0, epsilon = 0.3);
    assert_abs_diff_eq!(detection.disc.radius, RADIUS, epsilon = 0.5);
    assert!(detection.disc.fit_residual < 0.5);
    assert!(detection.points.len() >= LimbConfig::default().min_points);
    assert_eq!(detection.disc.image_size.width, 128);
}

#[test]
fn test_radius_has_no_inward_bias() {
    for radius in [20.0, 30.0, 60.0] {
        let size = (2.0 * radius) as usize + 48;
        let centre = size as f64 / 2.0 + 0.3;
        let frame = disc_frame(size, size, centre, centre - 0.6, radius);
        let detection =
            detect_limb(&frame.data, 0, &LimbConfig::default(), &CancelToken::new()).unwrap();
        assert_abs_diff_eq!(detection.disc.radius, radius, epsilon = 0.15);
        assert_abs_diff_eq!(detection.disc.center_x, centre, epsilon = 0.1);
        assert_abs_diff_eq!(detection.disc.center_y, centre - 0.6, epsilon = 0.1);
    }
}

#[test]
fn test_partially_visible_disc() {
    // Disc clipped by the right edge; rays leaving the frame are dropped.
    let frame = disc_frame(128, 128, 110.0, 64.0, RADIUS);
    let detection =
        detect_limb(&frame.data, 0, &LimbConfig::default(), &CancelToken::new()).unwrap();
    assert_abs_diff_eq!(detection.disc.center_x, 110.0, epsilon = 0.5);
    assert_abs_diff_eq!(detection.disc.radius, RADIUS, epsilon = 0.7);
}

#[test]
fn test_dark_frame_reports_failing_index() {
    let data = Array2::<f32>::zeros((64, 64));
    let err = detect_limb(&data, 4, &LimbConfig::default(), &CancelToken::new()).unwrap_err();
    match err {
        AlignError::Detection { index, .. } => assert_eq!(index, 4),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_strict_point_count_rejects() {
    let frame = disc_frame(96, 96, 48.0, 48.0, 20.0);
    let config = LimbConfig {
        ray_count: 8,
        min_points: 16,
        ..Default::default()
    };
    let err = detect_limb(&frame.data, 2, &config, &CancelToken::new()).unwrap_err();
    assert!(matches!(err, AlignError::Detection { index: 2, .. }));
}

#[test]
fn test_cancelled_detection() {
    let frame = disc_frame(64, 64, 32.0, 32.0, 15.0);
    let cancel = CancelToken::new();
    cancel.cancel();
    let err = detect_limb(&frame.data, 0, &LimbConfig::default(), &cancel).unwrap_err();
    assert!(matches!(err, AlignError::Cancelled));
}

#[test]
fn test_circle_fit_exact_points() {
    let points: Vec<LimbPoint> = (0..12)
        .map(|i| {
            let a = std::f64::consts::TAU * i as f64 / 12.0;
            LimbPoint {
                x: 5.0 + 7.0 * a.cos(),
                y: -3.0 + 7.0 * a.sin(),
            }
        })
        .collect();
    let fit = fit_circle(&points).unwrap();
    assert_abs_diff_eq!(fit.center_x, 5.0, epsilon = 1e-9);
    assert_abs_diff_eq!(fit.center_y, -3.0, epsilon = 1e-9);
    assert_abs_diff_eq!(fit.radius, 7.0, epsilon = 1e-9);
    assert!(fit_circle(&points[..2]).is_none());
}

#[test]
fn test_jittered_sequence_stabilizes() {
    let centres = jittered_centres(6, 64.0, 64.0, 1.5);
    let detections: Vec<_> = centres
        .iter()
        .enumerate()
        .map(|(i, &(cx, cy))| {
            let frame = disc_frame(128, 128, cx, cy, RADIUS);
            detect_limb(&frame.data, i, &LimbConfig::default(), &CancelToken::new()).unwrap()
        })
        .collect();

    for d in &detections {
        assert_abs_diff_eq!(d.disc.radius, RADIUS, epsilon = 0.5);
    }

    let mut fractions = Vec::new();
    let result = stabilize(
        &detections,
        &StabilizationConfig::default(),
        &CancelToken::new(),
        |f| fractions.push(f),
    )
    .unwrap();

    assert_abs_diff_eq!(result.radius, RADIUS, epsilon = 0.5);
    assert_eq!(result.translations.len(), centres.len());
    assert_eq!(result.translations[0].dx, 0.0);
    assert_eq!(result.translations[0].dy, 0.0);
    for (t, &(cx, cy)) in result.translations.iter().zip(&centres) {
        // Recovered translation matches the injected jitter, which is
        // bounded by 2 * 1.5 px relative to frame 0.
        assert_abs_diff_eq!(t.dx, cx - centres[0].0, epsilon = 0.3);
        assert_abs_diff_eq!(t.dy, cy - centres[0].1, epsilon = 0.3);
        assert!(t.length() <= 3.0 * std::f64::consts::SQRT_2 + 0.3);
    }
    assert_eq!(fractions.last(), Some(&1.0));
    assert!(fractions.iter().all(|f| (0.0..=1.0).contains(f)));
}

#[test]
fn test_stabilization_iteration_cap() {
    let frame = disc_frame(96, 96, 48.0, 48.0, 20.0);
    let detection =
        detect_limb(&frame.data, 0, &LimbConfig::default(), &CancelToken::new()).unwrap();
    let config = StabilizationConfig {
        max_iterations: 2,
        tolerance: 0.0,
    };
    let err = stabilize(&[detection], &config, &CancelToken::new(), |_| {}).unwrap_err();
    assert!(matches!(err, AlignError::Convergence { iterations: 2, .. }));
}
