mod common;

use ndarray::Array2;

use coalign_core::error::AlignError;
use coalign_core::frame::{Frame, ImageSize};
use coalign_core::io::image_io::{image_dimensions, load_image, save_frame, save_png, save_tiff};
use coalign_core::io::{FrameSource, PathSource};
use coalign_core::pipeline::config::OutputFormat;

#[test]
fn test_save_load_roundtrip_tiff() {
    let mut data = Array2::<f32>::zeros((4, 6));
    data[[0, 1]] = 0.5;
    data[[1, 0]] = 1.0;
    data[[2, 3]] = 0.25;
    let frame = Frame::new(data, 16);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test.tif");

    save_tiff(&frame, &path).unwrap();
    let loaded = load_image(&path).unwrap();

    assert_eq!((loaded.width(), loaded.height()), (6, 4));
    assert_eq!(loaded.original_bit_depth, 16);
    assert!((loaded.data[[0, 1]] - 0.5).abs() < 1e-3);
    assert!((loaded.data[[1, 0]] - 1.0).abs() < 1e-4);
    assert!((loaded.data[[2, 3]] - 0.25).abs() < 1e-3);
}

#[test]
fn test_png_is_eight_bit() {
    let frame = Frame::new(Array2::from_elem((8, 5), 0.5f32), 16);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test.png");

    save_png(&frame, &path).unwrap();
    let loaded = load_image(&path).unwrap();
    assert_eq!(loaded.original_bit_depth, 8);
    assert!((loaded.data[[3, 2]] - 128.0 / 255.0).abs() < 1e-3);
}

#[test]
fn test_save_frame_clamps_values() {
    let mut data = Array2::<f32>::zeros((2, 2));
    data[[0, 0]] = -0.5;
    data[[1, 1]] = 1.5;
    let frame = Frame::new(data, 16);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clamped.tif");

    save_frame(&frame, &path, OutputFormat::Tiff16).unwrap();
    let loaded = load_image(&path).unwrap();
    assert_eq!(loaded.data[[0, 0]], 0.0);
    assert_eq!(loaded.data[[1, 1]], 1.0);
}

#[test]
fn test_dimensions_without_decoding() {
    let frame = common::shifted_noise(12, 20, 0, 0);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dims.png");
    save_png(&frame, &path).unwrap();
    assert_eq!(
        image_dimensions(&path).unwrap(),
        ImageSize {
            width: 20,
            height: 12
        }
    );
}

#[test]
fn test_path_source_normalizes_on_load() {
    let data = Array2::from_shape_fn((4, 4), |(r, c)| 0.25 + 0.01 * (r * 4 + c) as f32);
    let frame = Frame::new(data, 16);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dim.tif");
    save_tiff(&frame, &path).unwrap();

    let source = PathSource::new(vec![path], true);
    let loaded = source.load(0).unwrap();
    let max = loaded.data.iter().cloned().fold(f32::MIN, f32::max);
    let min = loaded.data.iter().cloned().fold(f32::MAX, f32::min);
    assert!((max - 1.0).abs() < 1e-6);
    assert!(min.abs() < 1e-6);
    assert_eq!(source.name(0), "dim");
}

#[test]
fn test_missing_file_is_input_error() {
    let source = PathSource::new(vec!["/nonexistent/frame.tif".into()], false);
    assert!(matches!(source.size(0), Err(AlignError::Input(_))));
    assert!(matches!(source.load(0), Err(AlignError::Input(_))));
}
