//! Output canvas planning.
//!
//! The canvas lives in the reference frame's coordinate system. A frame with
//! translation `t` and size `(w, h)` covers `[-t.dx, -t.dx + w) x
//! [-t.dy, -t.dy + h)` there.

use crate::error::{AlignError, Result};
use crate::frame::{ImageSize, Translation};
use crate::pipeline::config::CropMode;

/// Output rectangle common to all frames, in reference-frame pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CanvasRect {
    pub x: i64,
    pub y: i64,
    pub width: usize,
    pub height: usize,
}

impl CanvasRect {
    pub fn area(&self) -> usize {
        self.width * self.height
    }
}

/// Compute the output canvas for frames of the given sizes and translations.
///
/// `CropToIntersection` keeps whole pixels covered by every frame and fails
/// with a geometry error when nothing is shared. `PadToBoundingBox` grows
/// outward to whole pixels so every frame fits entirely.
pub fn plan_canvas(
    sizes: &[ImageSize],
    translations: &[Translation],
    mode: CropMode,
) -> Result<CanvasRect> {
    if sizes.is_empty() {
        return Err(AlignError::Input("No frames to plan a canvas for".into()));
    }
    if sizes.len() != translations.len() {
        return Err(AlignError::Input(format!(
            "{} image sizes but {} translations",
            sizes.len(),
            translations.len()
        )));
    }

    let extents = sizes.iter().zip(translations).map(|(size, t)| {
        let left = -t.dx;
        let top = -t.dy;
        (left, top, left + size.width as f64, top + size.height as f64)
    });

    let (left, top, right, bottom) = match mode {
        CropMode::CropToIntersection => {
            let (l, t, r, b) = extents.fold(
                (f64::NEG_INFINITY, f64::NEG_INFINITY, f64::INFINITY, f64::INFINITY),
                |(l, t, r, b), (el, et, er, eb)| (l.max(el), t.max(et), r.min(er), b.min(eb)),
            );
            // Snap inward so no canvas pixel falls outside any frame.
            (l.ceil(), t.ceil(), r.floor(), b.floor())
        }
        CropMode::PadToBoundingBox => {
            let (l, t, r, b) = extents.fold(
                (f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
                |(l, t, r, b), (el, et, er, eb)| (l.min(el), t.min(et), r.max(er), b.max(eb)),
            );
            (l.floor(), t.floor(), r.ceil(), b.ceil())
        }
    };

    let width = right - left;
    let height = bottom - top;
    if !(width >= 1.0 && height >= 1.0) {
        return Err(AlignError::Geometry(format!(
            "Frames do not overlap ({mode}): common area is {}x{}",
            width.max(0.0),
            height.max(0.0)
        )));
    }

    Ok(CanvasRect {
        x: left as i64,
        y: top as i64,
        width: width as usize,
        height: height as usize,
    })
}
