pub mod circle_fit;
pub mod limb;
pub mod region;
pub mod threshold;

pub use circle_fit::{fit_circle, CircleFit, LimbPoint};
pub use limb::{detect_limb, DiscEstimate, LimbDetection};
