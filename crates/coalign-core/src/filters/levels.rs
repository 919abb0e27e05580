use crate::frame::Frame;

/// Stretch the frame's value range linearly to [0.0, 1.0].
///
/// Frames with a constant value are left untouched.
pub fn normalize_range(frame: &Frame) -> Frame {
    let (min, max) = frame
        .data
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let span = max - min;
    if !span.is_finite() || span <= f32::EPSILON {
        return frame.clone();
    }
    let data = frame.data.mapv(|v| (v - min) / span);
    Frame::new(data, frame.original_bit_depth)
}
