use std::path::PathBuf;
use std::sync::Arc;

use crate::consts::COLOR_CHANNEL_COUNT;
use crate::error::{AbortReason, AlignError, Result};
use crate::frame::{ColorFrame, Frame, Translation};
use crate::io::{FrameSource, MemorySource, PathSource};

use super::config::{AlignmentConfig, AlignmentMethod};

/// Where a run takes its frames from.
#[derive(Clone, Debug)]
pub enum AlignmentInput {
    Paths(Vec<PathBuf>),
    Images(Vec<Arc<Frame>>),
}

impl AlignmentInput {
    pub fn len(&self) -> usize {
        match self {
            Self::Paths(p) => p.len(),
            Self::Images(i) => i.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// In-memory inputs always produce in-memory outputs.
    pub fn is_in_memory(&self) -> bool {
        matches!(self, Self::Images(_))
    }

    pub(super) fn into_source(self, normalize: bool) -> Box<dyn FrameSource> {
        match self {
            Self::Paths(paths) => Box::new(PathSource::new(paths, normalize)),
            Self::Images(frames) => Box::new(MemorySource::new(frames, normalize)),
        }
    }
}

/// Everything one run needs. Moved into the coordinator at start.
#[derive(Clone, Debug)]
pub struct AlignmentParameters {
    pub inputs: AlignmentInput,
    pub config: AlignmentConfig,
    /// Treat three in-memory frames as R, G, B channels and return them
    /// recombined.
    pub recombine_rgb: bool,
}

impl AlignmentParameters {
    pub fn new(inputs: AlignmentInput, config: AlignmentConfig) -> Self {
        Self {
            inputs,
            config,
            recombine_rgb: false,
        }
    }

    /// Channel alignment of an RGB image split into three frames.
    pub fn rgb(channels: [Arc<Frame>; 3], config: AlignmentConfig) -> Self {
        Self {
            inputs: AlignmentInput::Images(channels.into()),
            config: AlignmentConfig {
                method: AlignmentMethod::PhaseCorrelation,
                ..config
            },
            recombine_rgb: true,
        }
    }

    pub(super) fn validate(&self) -> Result<()> {
        if self.inputs.is_empty() {
            return Err(AlignError::Input("No input images".into()));
        }
        if self.recombine_rgb {
            if !matches!(self.inputs, AlignmentInput::Images(ref f) if f.len() == COLOR_CHANNEL_COUNT) {
                return Err(AlignError::Input(
                    "RGB alignment needs exactly three in-memory channel frames".into(),
                ));
            }
            if self.config.method != AlignmentMethod::PhaseCorrelation {
                return Err(AlignError::Input(
                    "RGB alignment only supports phase correlation".into(),
                ));
            }
        }
        if !self.inputs.is_in_memory() && !self.config.output_dir.is_dir() {
            return Err(AlignError::Input(format!(
                "Output directory does not exist: {}",
                self.config.output_dir.display()
            )));
        }
        Ok(())
    }
}

/// Results delivered in memory rather than written to disk.
#[derive(Clone, Debug)]
#[allow(clippy::large_enum_variant)]
pub enum InMemoryOutput {
    Frames(Vec<Frame>),
    Rgb(ColorFrame),
}

/// Everything a worker reports, in emission order.
#[derive(Clone, Debug)]
pub enum AlignmentEvent {
    TranslationDetermined { index: usize, translation: Translation },
    DiscRadiusFound { index: usize, radius: f64 },
    DiscRadiusChosen { radius: f64 },
    StabilizationProgress { fraction: f64 },
    StabilizationFailed { message: String },
    OutputSaved { index: usize, path: PathBuf },
    OutputProduced { index: usize },
    TranslationsReady(Vec<Translation>),
    InMemoryResult(InMemoryOutput),
    Completed { error: Option<String> },
    Aborted { reason: AbortReason, message: String },
}

impl AlignmentEvent {
    /// `Completed` and `Aborted` end a run's event stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed { .. } | Self::Aborted { .. })
    }
}

/// Coordinator lifecycle, used for logging and progress display.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AlignmentState {
    Idle,
    EstimatingOrDetecting,
    Stabilizing,
    Rendering,
    Completed,
    Aborted,
}

impl AlignmentState {
    /// State a run is in once `event` has been emitted, if it changes.
    pub fn after(event: &AlignmentEvent) -> Option<Self> {
        match event {
            AlignmentEvent::TranslationDetermined { .. } | AlignmentEvent::DiscRadiusFound { .. } => {
                Some(Self::EstimatingOrDetecting)
            }
            AlignmentEvent::DiscRadiusChosen { .. }
            | AlignmentEvent::StabilizationProgress { .. }
            | AlignmentEvent::StabilizationFailed { .. } => Some(Self::Stabilizing),
            AlignmentEvent::OutputSaved { .. } | AlignmentEvent::OutputProduced { .. } => {
                Some(Self::Rendering)
            }
            AlignmentEvent::TranslationsReady(_) | AlignmentEvent::InMemoryResult(_) => None,
            AlignmentEvent::Completed { .. } => Some(Self::Completed),
            AlignmentEvent::Aborted { .. } => Some(Self::Aborted),
        }
    }
}

impl std::fmt::Display for AlignmentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::EstimatingOrDetecting => write!(f, "Measuring frames"),
            Self::Stabilizing => write!(f, "Stabilizing"),
            Self::Rendering => write!(f, "Rendering output"),
            Self::Completed => write!(f, "Completed"),
            Self::Aborted => write!(f, "Aborted"),
        }
    }
}

/// Summary of a successful run.
#[derive(Clone, Debug)]
pub struct AlignmentOutcome {
    pub translations: Vec<Translation>,
}
