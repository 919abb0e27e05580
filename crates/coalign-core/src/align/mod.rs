pub mod phase_correlation;
pub mod subpixel;

pub use phase_correlation::{estimate_translation, mean_centered};
