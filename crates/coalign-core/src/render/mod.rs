//! Resampling frames onto the planned output canvas.

mod resample;

use ndarray::{Array2, Axis};
use rayon::prelude::*;

use crate::cancel::CancelToken;
use crate::consts::{CANCEL_CHECK_ROWS, COLOR_CHANNEL_COUNT, PARALLEL_PIXEL_THRESHOLD};
use crate::error::Result;
use crate::frame::{ColorFrame, Frame, Translation};
use crate::geometry::CanvasRect;

pub use resample::bilinear_sample;

/// Render `frame` onto `canvas`, undoing its `translation`.
///
/// Canvas pixel `(x, y)` shows the source at
/// `(canvas.x + x + dx, canvas.y + y + dy)`. Integer translations copy pixels
/// exactly; fractional ones are bilinearly interpolated. Areas not covered by
/// the source are zero. Cancellation is polled once per band of
/// `CANCEL_CHECK_ROWS` rows.
pub fn render_frame(
    frame: &Frame,
    translation: Translation,
    canvas: &CanvasRect,
    cancel: &CancelToken,
) -> Result<Frame> {
    let src_x0 = canvas.x as f64 + translation.dx;
    let src_y0 = canvas.y as f64 + translation.dy;
    let integral = translation.dx.fract() == 0.0 && translation.dy.fract() == 0.0;

    let (sh, sw) = frame.data.dim();
    let source = &frame.data;
    let fill_row = |row: usize, mut out: ndarray::ArrayViewMut1<f32>| {
        let sy = src_y0 + row as f64;
        if integral {
            let sy = sy as i64;
            for (col, px) in out.iter_mut().enumerate() {
                let sx = src_x0 as i64 + col as i64;
                *px = if sy >= 0 && sx >= 0 && (sy as usize) < sh && (sx as usize) < sw {
                    source[[sy as usize, sx as usize]]
                } else {
                    0.0
                };
            }
        } else {
            for (col, px) in out.iter_mut().enumerate() {
                *px = bilinear_sample(source, sy, src_x0 + col as f64);
            }
        }
    };

    let mut result = Array2::<f32>::zeros((canvas.height, canvas.width));
    let parallel = canvas.area() >= PARALLEL_PIXEL_THRESHOLD;

    for (band, mut rows) in result
        .axis_chunks_iter_mut(Axis(0), CANCEL_CHECK_ROWS)
        .enumerate()
    {
        cancel.checkpoint()?;
        let first_row = band * CANCEL_CHECK_ROWS;
        if parallel {
            rows.axis_iter_mut(Axis(0))
                .into_par_iter()
                .enumerate()
                .for_each(|(i, out)| fill_row(first_row + i, out));
        } else {
            for (i, out) in rows.axis_iter_mut(Axis(0)).enumerate() {
                fill_row(first_row + i, out);
            }
        }
    }

    Ok(Frame::new(result, frame.original_bit_depth))
}

/// Stack three rendered channel frames into one color image.
pub fn combine_rgb(mut channels: Vec<Frame>) -> Option<ColorFrame> {
    if channels.len() != COLOR_CHANNEL_COUNT {
        return None;
    }
    let blue = channels.pop()?;
    let green = channels.pop()?;
    let red = channels.pop()?;
    if red.size() != green.size() || green.size() != blue.size() {
        return None;
    }
    Some(ColorFrame { red, green, blue })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(h: usize, w: usize) -> Frame {
        Frame::new(
            Array2::from_shape_fn((h, w), |(r, c)| (r * w + c) as f32),
            16,
        )
    }

    #[test]
    fn integer_translation_copies_pixels() {
        let frame = ramp(6, 8);
        let canvas = CanvasRect { x: 0, y: 0, width: 5, height: 4 };
        let out = render_frame(&frame, Translation::new(2.0, 1.0), &canvas, &CancelToken::new()).unwrap();
        assert_eq!(out.data.dim(), (4, 5));
        assert_eq!(out.data[[0, 0]], frame.data[[1, 2]]);
        assert_eq!(out.data[[3, 4]], frame.data[[4, 6]]);
    }

    #[test]
    fn padded_area_is_zero() {
        let frame = Frame::new(Array2::from_elem((4, 4), 1.0f32), 8);
        let canvas = CanvasRect { x: -2, y: 0, width: 6, height: 4 };
        let out = render_frame(&frame, Translation::default(), &canvas, &CancelToken::new()).unwrap();
        assert_eq!(out.data[[0, 0]], 0.0);
        assert_eq!(out.data[[0, 1]], 0.0);
        assert_eq!(out.data[[0, 2]], 1.0);
    }

    #[test]
    fn half_pixel_translation_interpolates() {
        let frame = ramp(4, 4);
        let canvas = CanvasRect { x: 0, y: 0, width: 2, height: 2 };
        let out = render_frame(&frame, Translation::new(0.5, 0.0), &canvas, &CancelToken::new()).unwrap();
        assert!((out.data[[0, 0]] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn cancelled_render_fails() {
        let frame = ramp(4, 4);
        let canvas = CanvasRect { x: 0, y: 0, width: 4, height: 4 };
        let cancel = CancelToken::new();
        cancel.cancel();
        assert!(render_frame(&frame, Translation::default(), &canvas, &cancel).is_err());
    }
}
