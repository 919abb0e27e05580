use std::path::PathBuf;

use coalign_core::error::{AbortReason, AlignError};
use coalign_core::pipeline::config::{
    AlignmentConfig, AlignmentMethod, CropMode, LimbConfig, OutputFormat, SubpixelMethod,
};
use coalign_core::pipeline::AlignmentState;

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

#[test]
fn test_alignment_method_display() {
    assert_eq!(format!("{}", AlignmentMethod::PhaseCorrelation), "Phase Correlation");
    assert_eq!(format!("{}", AlignmentMethod::Limb), "Limb");
}

#[test]
fn test_crop_mode_display() {
    assert_eq!(
        format!("{}", CropMode::CropToIntersection),
        "Crop to intersection"
    );
    assert_eq!(format!("{}", CropMode::PadToBoundingBox), "Pad to bounding box");
}

#[test]
fn test_output_format_display_and_extension() {
    assert_eq!(format!("{}", OutputFormat::Tiff16), "TIFF 16-bit");
    assert_eq!(OutputFormat::Tiff16.extension(), "tif");
    assert_eq!(OutputFormat::Png8.extension(), "png");
}

#[test]
fn test_alignment_state_display() {
    assert_eq!(format!("{}", AlignmentState::Stabilizing), "Stabilizing");
    assert_eq!(format!("{}", AlignmentState::Rendering), "Rendering output");
}

#[test]
fn test_abort_reason_mapping() {
    assert_eq!(AlignError::Cancelled.abort_reason(), AbortReason::UserRequested);
    assert_eq!(
        AlignError::Geometry("empty".into()).abort_reason(),
        AbortReason::ProcessingError
    );
    assert_eq!(
        AlignError::Detection {
            index: 3,
            message: "no disc".into()
        }
        .to_string(),
        "Limb detection failed for image 3: no disc"
    );
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

#[test]
fn test_default_config() {
    let config = AlignmentConfig::default();
    assert_eq!(config.method, AlignmentMethod::PhaseCorrelation);
    assert!(config.subpixel);
    assert_eq!(config.crop_mode, CropMode::CropToIntersection);
    assert_eq!(config.output_suffix.as_deref(), Some("_aligned"));
    assert!(!config.normalize_on_load);
    assert_eq!(config.phase.subpixel_method, SubpixelMethod::Parabolic);
    assert!(config.phase.hann_window);
    assert!(config.limb.inner_fraction < 1.0 && config.limb.outer_fraction > 1.0);
    assert!(config.stabilization.max_iterations > 0);
}

// ---------------------------------------------------------------------------
// TOML
// ---------------------------------------------------------------------------

#[test]
fn test_partial_toml_fills_defaults() {
    let text = r#"
method = "Limb"
crop_mode = "PadToBoundingBox"
output_dir = "/tmp/aligned"

[limb]
ray_count = 90

[stabilization]
tolerance = 0.01
"#;
    let config: AlignmentConfig = toml::from_str(text).unwrap();
    assert_eq!(config.method, AlignmentMethod::Limb);
    assert_eq!(config.crop_mode, CropMode::PadToBoundingBox);
    assert_eq!(config.output_dir, PathBuf::from("/tmp/aligned"));
    assert_eq!(config.limb.ray_count, 90);
    assert_eq!(config.limb.min_points, LimbConfig::default().min_points);
    assert_eq!(config.stabilization.tolerance, 0.01);
    assert!(config.subpixel);
}

#[test]
fn test_toml_roundtrip_preserves_config() {
    let config = AlignmentConfig {
        method: AlignmentMethod::Limb,
        output_format: OutputFormat::Png8,
        normalize_on_load: true,
        ..Default::default()
    };
    let text = toml::to_string_pretty(&config).unwrap();
    let parsed: AlignmentConfig = toml::from_str(&text).unwrap();
    assert_eq!(parsed, config);
}

#[test]
fn test_unknown_method_is_rejected() {
    let result: Result<AlignmentConfig, _> = toml::from_str(r#"method = "Centroid""#);
    assert!(result.is_err());
}
