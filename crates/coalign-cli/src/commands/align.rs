use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, ValueEnum};
use coalign_core::pipeline::config::{AlignmentConfig, AlignmentMethod, CropMode, OutputFormat};
use coalign_core::pipeline::{
    AlignmentCoordinator, AlignmentEvent, AlignmentInput, AlignmentParameters,
};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use crate::summary::{print_alignment_summary, print_saved_outputs};

#[derive(Clone, Copy, ValueEnum)]
pub enum MethodArg {
    Phase,
    Limb,
}

impl From<MethodArg> for AlignmentMethod {
    fn from(arg: MethodArg) -> Self {
        match arg {
            MethodArg::Phase => AlignmentMethod::PhaseCorrelation,
            MethodArg::Limb => AlignmentMethod::Limb,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum CropArg {
    Crop,
    Pad,
}

impl From<CropArg> for CropMode {
    fn from(arg: CropArg) -> Self {
        match arg {
            CropArg::Crop => CropMode::CropToIntersection,
            CropArg::Pad => CropMode::PadToBoundingBox,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum FormatArg {
    Tiff,
    Png,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Tiff => OutputFormat::Tiff16,
            FormatArg::Png => OutputFormat::Png8,
        }
    }
}

#[derive(Args)]
pub struct AlignArgs {
    /// Input images, in sequence order; the first is the reference
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Alignment config file (TOML); flags below override it
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Alignment method
    #[arg(long, value_enum)]
    pub method: Option<MethodArg>,

    /// Sub-pixel refinement for phase correlation (`--subpixel false` disables)
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    pub subpixel: Option<bool>,

    /// Output canvas: intersection of all frames or their bounding box
    #[arg(long, value_enum)]
    pub crop: Option<CropArg>,

    /// Directory for aligned images (must exist)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Suffix appended to each output file name
    #[arg(long)]
    pub suffix: Option<String>,

    /// Stretch each input to the full [0, 1] range before aligning
    #[arg(long)]
    pub normalize: bool,

    /// Output file format
    #[arg(long, value_enum)]
    pub format: Option<FormatArg>,
}

fn build_config(args: &AlignArgs) -> Result<AlignmentConfig> {
    let mut config: AlignmentConfig = if let Some(ref config_path) = args.config {
        let contents = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config {}", config_path.display()))?;
        toml::from_str(&contents).context("Invalid alignment config")?
    } else {
        AlignmentConfig::default()
    };

    if let Some(method) = args.method {
        config.method = method.into();
    }
    if let Some(subpixel) = args.subpixel {
        config.subpixel = subpixel;
    }
    if let Some(crop) = args.crop {
        config.crop_mode = crop.into();
    }
    if let Some(ref dir) = args.output_dir {
        config.output_dir = dir.clone();
    }
    if let Some(ref suffix) = args.suffix {
        config.output_suffix = Some(suffix.clone());
    }
    if args.normalize {
        config.normalize_on_load = true;
    }
    if let Some(format) = args.format {
        config.output_format = format.into();
    }
    Ok(config)
}

fn bar(len: u64, template: &str) -> Result<ProgressBar> {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(template)?
            .progress_chars("=> "),
    );
    Ok(pb)
}

pub fn run(args: &AlignArgs) -> Result<()> {
    let config = build_config(args)?;
    debug!(?config, "Resolved alignment config");
    let total = args.files.len() as u64;
    print_alignment_summary(&config, args.files.len());

    let params = AlignmentParameters::new(AlignmentInput::Paths(args.files.clone()), config);
    let mut coordinator = AlignmentCoordinator::new();
    let events = coordinator.start(params)?;

    let measure = bar(total, "Measuring   [{bar:40}] {pos}/{len}")?;
    let mut stabilize: Option<ProgressBar> = None;
    let mut save: Option<ProgressBar> = None;
    let mut saved = Vec::new();
    let mut outcome = None;

    for event in events.iter() {
        match event {
            AlignmentEvent::TranslationDetermined { .. } | AlignmentEvent::DiscRadiusFound { .. } => {
                measure.inc(1);
            }
            AlignmentEvent::DiscRadiusChosen { radius } => {
                measure.finish();
                println!("Consensus disc radius: {radius:.2} px");
                stabilize = Some(bar(100, "Stabilizing [{bar:40}] {pos}%")?);
            }
            AlignmentEvent::StabilizationProgress { fraction } => {
                if let Some(ref pb) = stabilize {
                    pb.set_position((fraction * 100.0).round() as u64);
                }
            }
            AlignmentEvent::StabilizationFailed { .. } => {
                if let Some(ref pb) = stabilize {
                    pb.abandon();
                }
            }
            AlignmentEvent::OutputSaved { path, .. } => {
                if save.is_none() {
                    measure.finish();
                    if let Some(ref pb) = stabilize {
                        pb.finish();
                    }
                    save = Some(bar(total, "Saving      [{bar:40}] {pos}/{len}")?);
                }
                if let Some(ref pb) = save {
                    pb.inc(1);
                }
                saved.push(path);
            }
            AlignmentEvent::OutputProduced { .. }
            | AlignmentEvent::TranslationsReady(_)
            | AlignmentEvent::InMemoryResult(_) => {}
            AlignmentEvent::Completed { error } => outcome = Some(error),
            AlignmentEvent::Aborted { reason, message } => {
                measure.abandon();
                if let Some(ref pb) = save {
                    pb.abandon();
                }
                coordinator.join();
                bail!("{reason}: {message}");
            }
        }
    }
    coordinator.join();

    match outcome {
        Some(None) => {
            if let Some(ref pb) = save {
                pb.finish();
            }
            print_saved_outputs(&saved);
            Ok(())
        }
        Some(Some(error)) => bail!("Alignment worker failed: {error}"),
        None => bail!("Alignment worker exited without a result"),
    }
}
