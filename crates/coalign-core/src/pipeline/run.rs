use std::path::PathBuf;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::align::{estimate_translation, mean_centered};
use crate::cancel::CancelToken;
use crate::detection::detect_limb;
use crate::error::{AlignError, Result};
use crate::frame::{Frame, ImageSize, Translation};
use crate::geometry::{plan_canvas, CanvasRect};
use crate::io::image_io::save_frame;
use crate::io::FrameSource;
use crate::render::{combine_rgb, render_frame};
use crate::stabilize::{initial_radius, stabilize};

use super::config::{AlignmentConfig, AlignmentMethod};
use super::types::{
    AlignmentEvent, AlignmentOutcome, AlignmentParameters, AlignmentState, InMemoryOutput,
};

/// Run one alignment synchronously, reporting progress through `emit`.
///
/// Emits every non-terminal event; the caller decides how the run ends.
/// See [`run_and_report`] for the variant that also emits the terminal event.
pub fn run_alignment<F>(
    params: AlignmentParameters,
    cancel: &CancelToken,
    mut emit: F,
) -> Result<AlignmentOutcome>
where
    F: FnMut(AlignmentEvent),
{
    params.validate()?;
    let AlignmentParameters {
        inputs,
        config,
        recombine_rgb,
    } = params;

    let in_memory = inputs.is_in_memory();
    let source = inputs.into_source(config.normalize_on_load);
    let total = source.len();
    let start = Instant::now();
    info!(
        images = total,
        method = %config.method,
        crop = %config.crop_mode,
        in_memory,
        rgb = recombine_rgb,
        "Starting alignment"
    );

    let sizes = (0..total)
        .map(|i| source.size(i))
        .collect::<Result<Vec<ImageSize>>>()?;
    cancel.checkpoint()?;

    log_state(AlignmentState::EstimatingOrDetecting);
    let translations = match config.method {
        AlignmentMethod::PhaseCorrelation => {
            let sequential = phase_translations(source.as_ref(), &config, cancel, &mut emit)?;
            if recombine_rgb {
                mean_centered(&sequential)
            } else {
                sequential
            }
        }
        AlignmentMethod::Limb => limb_translations(source.as_ref(), &config, cancel, &mut emit)?,
    };
    cancel.checkpoint()?;

    let canvas = plan_canvas(&sizes, &translations, config.crop_mode)?;
    info!(
        x = canvas.x,
        y = canvas.y,
        width = canvas.width,
        height = canvas.height,
        "Output canvas planned"
    );

    log_state(AlignmentState::Rendering);
    if in_memory {
        let frames = render_in_memory(source.as_ref(), &translations, &canvas, cancel, &mut emit)?;
        emit(AlignmentEvent::TranslationsReady(translations.clone()));
        let output = if recombine_rgb {
            let color = combine_rgb(frames)
                .ok_or_else(|| AlignError::Geometry("RGB channels differ in size".into()))?;
            InMemoryOutput::Rgb(color)
        } else {
            InMemoryOutput::Frames(frames)
        };
        emit(AlignmentEvent::InMemoryResult(output));
    } else {
        for (index, &translation) in translations.iter().enumerate() {
            cancel.checkpoint()?;
            let frame = source.load(index)?;
            let rendered = render_frame(&frame, translation, &canvas, cancel)?;
            let path = output_path(&config, &source.name(index));
            save_frame(&rendered, &path, config.output_format)?;
            debug!(index, path = %path.display(), "Saved aligned frame");
            emit(AlignmentEvent::OutputSaved { index, path });
        }
    }

    info!(
        images = total,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Alignment complete"
    );
    Ok(AlignmentOutcome { translations })
}

/// Run one alignment and finish the event stream with exactly one terminal
/// event.
pub fn run_and_report<F>(
    params: AlignmentParameters,
    cancel: &CancelToken,
    mut emit: F,
) -> Result<AlignmentOutcome>
where
    F: FnMut(AlignmentEvent),
{
    let result = run_alignment(params, cancel, &mut emit);
    match &result {
        Ok(_) => {
            log_state(AlignmentState::Completed);
            emit(AlignmentEvent::Completed { error: None });
        }
        Err(e) => {
            log_state(AlignmentState::Aborted);
            match e {
                AlignError::Cancelled => info!("Alignment cancelled"),
                _ => warn!(error = %e, "Alignment aborted"),
            }
            emit(AlignmentEvent::Aborted {
                reason: e.abort_reason(),
                message: e.to_string(),
            });
        }
    }
    result
}

/// Sequential phase correlation: each frame against its predecessor,
/// accumulated so every translation is relative to frame 0.
fn phase_translations<F>(
    source: &dyn FrameSource,
    config: &AlignmentConfig,
    cancel: &CancelToken,
    emit: &mut F,
) -> Result<Vec<Translation>>
where
    F: FnMut(AlignmentEvent),
{
    let total = source.len();
    let mut translations = Vec::with_capacity(total);
    translations.push(Translation::default());
    emit(AlignmentEvent::TranslationDetermined {
        index: 0,
        translation: Translation::default(),
    });

    let mut previous = source.load(0)?;
    for index in 1..total {
        cancel.checkpoint()?;
        let current = source.load(index)?;
        let step = estimate_translation(
            &previous.data,
            &current.data,
            config.subpixel,
            &config.phase,
            cancel,
        )?;
        let translation = translations[index - 1] + step;
        debug!(index, %step, %translation, "Translation determined");
        emit(AlignmentEvent::TranslationDetermined { index, translation });
        translations.push(translation);
        previous = current;
    }

    Ok(translations)
}

/// Per-frame limb detection followed by sequence-wide stabilization.
fn limb_translations<F>(
    source: &dyn FrameSource,
    config: &AlignmentConfig,
    cancel: &CancelToken,
    emit: &mut F,
) -> Result<Vec<Translation>>
where
    F: FnMut(AlignmentEvent),
{
    let mut detections = Vec::with_capacity(source.len());
    for index in 0..source.len() {
        cancel.checkpoint()?;
        let frame = source.load(index)?;
        let detection = detect_limb(&frame.data, index, &config.limb, cancel)?;
        emit(AlignmentEvent::DiscRadiusFound {
            index,
            radius: detection.disc.radius,
        });
        detections.push(detection);
    }
    cancel.checkpoint()?;

    log_state(AlignmentState::Stabilizing);
    if let Some(radius) = initial_radius(&detections) {
        info!(radius, "Consensus disc radius chosen");
        emit(AlignmentEvent::DiscRadiusChosen { radius });
    }

    let result = stabilize(&detections, &config.stabilization, cancel, |fraction| {
        emit(AlignmentEvent::StabilizationProgress { fraction })
    });
    match result {
        Ok(stabilization) => Ok(stabilization.translations),
        Err(e @ AlignError::Convergence { .. }) => {
            emit(AlignmentEvent::StabilizationFailed {
                message: e.to_string(),
            });
            Err(e)
        }
        Err(e) => Err(e),
    }
}

fn render_in_memory<F>(
    source: &dyn FrameSource,
    translations: &[Translation],
    canvas: &CanvasRect,
    cancel: &CancelToken,
    emit: &mut F,
) -> Result<Vec<Frame>>
where
    F: FnMut(AlignmentEvent),
{
    let mut frames = Vec::with_capacity(translations.len());
    for (index, &translation) in translations.iter().enumerate() {
        cancel.checkpoint()?;
        let frame = source.load(index)?;
        frames.push(render_frame(&frame, translation, canvas, cancel)?);
        emit(AlignmentEvent::OutputProduced { index });
    }
    Ok(frames)
}

/// `<output_dir>/<stem><suffix>.<ext>`
pub fn output_path(config: &AlignmentConfig, stem: &str) -> PathBuf {
    let suffix = config.output_suffix.as_deref().unwrap_or("");
    config.output_dir.join(format!(
        "{stem}{suffix}.{}",
        config.output_format.extension()
    ))
}

fn log_state(state: AlignmentState) {
    debug!(%state, "Alignment state");
}
