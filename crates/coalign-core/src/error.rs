use thiserror::Error;

/// Why a run ended without completing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AbortReason {
    /// The caller requested cancellation.
    UserRequested,
    /// A stage failed.
    ProcessingError,
}

impl std::fmt::Display for AbortReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UserRequested => write!(f, "Cancelled by user"),
            Self::ProcessingError => write!(f, "Processing error"),
        }
    }
}

#[derive(Error, Debug)]
pub enum AlignError {
    #[error("Input error: {0}")]
    Input(String),

    #[error("Limb detection failed for image {index}: {message}")]
    Detection { index: usize, message: String },

    #[error("Stabilization did not converge after {iterations} iterations (last change {last_delta:.4} px)")]
    Convergence { iterations: usize, last_delta: f64 },

    #[error("Geometry error: {0}")]
    Geometry(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image format error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Alignment cancelled")]
    Cancelled,
}

impl AlignError {
    pub fn abort_reason(&self) -> AbortReason {
        match self {
            Self::Cancelled => AbortReason::UserRequested,
            _ => AbortReason::ProcessingError,
        }
    }
}

pub type Result<T> = std::result::Result<T, AlignError>;
