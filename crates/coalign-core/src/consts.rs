/// Minimum pixel count (h*w) to use row-level Rayon parallelism.
pub const PARALLEL_PIXEL_THRESHOLD: usize = 65_536;

/// Rows processed between two cancellation checks in pixel loops.
pub const CANCEL_CHECK_ROWS: usize = 256;

/// Small epsilon to avoid division by zero in floating-point comparisons.
pub const EPSILON: f64 = 1e-12;

/// Number of histogram bins for Otsu's thresholding.
pub const OTSU_HISTOGRAM_BINS: usize = 256;

/// Number of channels in a color frame (R, G, B).
pub const COLOR_CHANNEL_COUNT: usize = 3;

/// Default Gaussian blur sigma applied before limb detection.
pub const DEFAULT_LIMB_BLUR_SIGMA: f32 = 1.5;

/// Default number of rays cast from the coarse disc centre.
pub const DEFAULT_LIMB_RAY_COUNT: usize = 180;

/// Rays start at this fraction of the coarse radius.
pub const DEFAULT_LIMB_INNER_FRACTION: f64 = 0.6;

/// Rays end at this fraction of the coarse radius.
pub const DEFAULT_LIMB_OUTER_FRACTION: f64 = 1.4;

/// Minimum brightness drop across the limb, as a fraction of the
/// disc-to-background contrast.
pub const DEFAULT_LIMB_EDGE_THRESHOLD: f32 = 0.1;

/// Minimum number of limb points required for a circle fit.
pub const DEFAULT_LIMB_MIN_POINTS: usize = 16;

/// Maximum RMS distance (pixels) of limb points from the fitted circle.
pub const DEFAULT_LIMB_MAX_FIT_RESIDUAL: f64 = 2.0;

/// Points farther than this many RMS residuals from the first fit are dropped.
pub const DEFAULT_LIMB_OUTLIER_SIGMA: f64 = 3.0;

/// Minimum connected component area (pixels) to be a disc candidate.
pub const DEFAULT_LIMB_MIN_AREA: usize = 50;

/// Sampling step (pixels) along each limb ray.
pub const LIMB_RAY_STEP: f64 = 0.25;

/// Width (pixels) of the border strip used for background estimation.
pub const BORDER_STRIP_WIDTH: usize = 4;

/// Default iteration cap for sequence stabilization.
pub const DEFAULT_STABILIZATION_MAX_ITERATIONS: usize = 50;

/// Default convergence tolerance (pixels) for sequence stabilization.
pub const DEFAULT_STABILIZATION_TOLERANCE: f64 = 1e-3;
