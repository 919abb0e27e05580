use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::consts::{
    DEFAULT_LIMB_BLUR_SIGMA, DEFAULT_LIMB_EDGE_THRESHOLD, DEFAULT_LIMB_INNER_FRACTION,
    DEFAULT_LIMB_MAX_FIT_RESIDUAL, DEFAULT_LIMB_MIN_AREA, DEFAULT_LIMB_MIN_POINTS,
    DEFAULT_LIMB_OUTER_FRACTION, DEFAULT_LIMB_OUTLIER_SIGMA, DEFAULT_LIMB_RAY_COUNT,
    DEFAULT_STABILIZATION_MAX_ITERATIONS, DEFAULT_STABILIZATION_TOLERANCE,
};

/// How translations between frames are determined.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlignmentMethod {
    /// Pairwise FFT phase correlation, accumulated along the sequence.
    #[default]
    PhaseCorrelation,
    /// Per-frame disc limb fit followed by sequence stabilization.
    Limb,
}

impl std::fmt::Display for AlignmentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PhaseCorrelation => write!(f, "Phase Correlation"),
            Self::Limb => write!(f, "Limb"),
        }
    }
}

/// How the common output canvas is sized.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CropMode {
    /// Keep only the area covered by every frame.
    #[default]
    CropToIntersection,
    /// Keep everything, padding uncovered areas with zeros.
    PadToBoundingBox,
}

impl std::fmt::Display for CropMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CropToIntersection => write!(f, "Crop to intersection"),
            Self::PadToBoundingBox => write!(f, "Pad to bounding box"),
        }
    }
}

/// File format of rendered outputs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    /// 16-bit grayscale TIFF.
    #[default]
    Tiff16,
    /// 8-bit grayscale PNG.
    Png8,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Tiff16 => "tif",
            Self::Png8 => "png",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Tiff16 => write!(f, "TIFF 16-bit"),
            Self::Png8 => write!(f, "PNG 8-bit"),
        }
    }
}

/// Peak refinement used for sub-pixel phase correlation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubpixelMethod {
    /// Independent 3-point parabola fits along rows and columns.
    #[default]
    Parabolic,
    /// Foroosh, Zerubia & Berthod sinc-peak estimator.
    Foroosh,
}

impl std::fmt::Display for SubpixelMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parabolic => write!(f, "Parabolic"),
            Self::Foroosh => write!(f, "Foroosh"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseCorrelationConfig {
    pub subpixel_method: SubpixelMethod,
    /// Remove the mean and apply a Hann window before the FFT to suppress
    /// edge leakage. Disable only for circularly shifted content (e.g.
    /// synthetic wrap-around test data); on real frames the image borders
    /// dominate the correlation and the estimate collapses towards zero.
    pub hann_window: bool,
}

impl Default for PhaseCorrelationConfig {
    fn default() -> Self {
        Self {
            subpixel_method: SubpixelMethod::default(),
            hann_window: true,
        }
    }
}

/// Tuning for disc limb detection in a single frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimbConfig {
    /// Gaussian blur sigma for noise suppression before edge search.
    pub blur_sigma: f32,
    /// Number of rays cast from the coarse centre.
    pub ray_count: usize,
    /// Ray start, as a fraction of the coarse radius.
    pub inner_fraction: f64,
    /// Ray end, as a fraction of the coarse radius.
    pub outer_fraction: f64,
    /// Minimum brightness drop across the edge, relative to disc contrast.
    pub edge_threshold: f32,
    /// Minimum number of limb points for an acceptable fit.
    pub min_points: usize,
    /// Maximum RMS fit residual in pixels.
    pub max_fit_residual: f64,
    /// Outlier cutoff in multiples of the first-pass RMS residual.
    pub outlier_sigma: f64,
    /// Minimum connected component area (pixels) to be a disc candidate.
    pub min_area: usize,
}

impl Default for LimbConfig {
    fn default() -> Self {
        Self {
            blur_sigma: DEFAULT_LIMB_BLUR_SIGMA,
            ray_count: DEFAULT_LIMB_RAY_COUNT,
            inner_fraction: DEFAULT_LIMB_INNER_FRACTION,
            outer_fraction: DEFAULT_LIMB_OUTER_FRACTION,
            edge_threshold: DEFAULT_LIMB_EDGE_THRESHOLD,
            min_points: DEFAULT_LIMB_MIN_POINTS,
            max_fit_residual: DEFAULT_LIMB_MAX_FIT_RESIDUAL,
            outlier_sigma: DEFAULT_LIMB_OUTLIER_SIGMA,
            min_area: DEFAULT_LIMB_MIN_AREA,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StabilizationConfig {
    pub max_iterations: usize,
    /// Largest per-iteration change (pixels) considered converged.
    pub tolerance: f64,
}

impl Default for StabilizationConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_STABILIZATION_MAX_ITERATIONS,
            tolerance: DEFAULT_STABILIZATION_TOLERANCE,
        }
    }
}

/// Settings of one alignment run, independent of its inputs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignmentConfig {
    pub method: AlignmentMethod,
    pub subpixel: bool,
    pub crop_mode: CropMode,
    pub output_dir: PathBuf,
    pub output_suffix: Option<String>,
    /// Stretch each loaded frame's value range to [0, 1].
    pub normalize_on_load: bool,
    pub output_format: OutputFormat,
    pub phase: PhaseCorrelationConfig,
    pub limb: LimbConfig,
    pub stabilization: StabilizationConfig,
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            method: AlignmentMethod::default(),
            subpixel: true,
            crop_mode: CropMode::default(),
            output_dir: PathBuf::from("."),
            output_suffix: Some("_aligned".into()),
            normalize_on_load: false,
            output_format: OutputFormat::default(),
            phase: PhaseCorrelationConfig::default(),
            limb: LimbConfig::default(),
            stabilization: StabilizationConfig::default(),
        }
    }
}
