use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::error::{AlignError, Result};
use crate::filters::levels::normalize_range;
use crate::frame::{Frame, ImageSize};

use super::image_io::{image_dimensions, load_image};

/// Load-by-index access to the frames of a run, hiding whether they come
/// from disk or memory.
pub trait FrameSource: Send + Sync {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Dimensions of frame `index`, without necessarily decoding it.
    fn size(&self, index: usize) -> Result<ImageSize>;

    /// Decode (or share) frame `index`.
    fn load(&self, index: usize) -> Result<Arc<Frame>>;

    /// Base name used for output files.
    fn name(&self, index: usize) -> String;
}

/// Frames decoded on demand from image files.
pub struct PathSource {
    paths: Vec<PathBuf>,
    normalize: bool,
}

impl PathSource {
    pub fn new(paths: Vec<PathBuf>, normalize: bool) -> Self {
        Self { paths, normalize }
    }

    fn path(&self, index: usize) -> Result<&Path> {
        self.paths
            .get(index)
            .map(PathBuf::as_path)
            .ok_or_else(|| out_of_range(index, self.paths.len()))
    }
}

impl FrameSource for PathSource {
    fn len(&self) -> usize {
        self.paths.len()
    }

    fn size(&self, index: usize) -> Result<ImageSize> {
        let path = self.path(index)?;
        image_dimensions(path).map_err(|e| unreadable(path, e))
    }

    fn load(&self, index: usize) -> Result<Arc<Frame>> {
        let path = self.path(index)?;
        debug!(index, path = %path.display(), "Loading frame");
        let frame = load_image(path).map_err(|e| unreadable(path, e))?;
        Ok(Arc::new(if self.normalize {
            normalize_range(&frame)
        } else {
            frame
        }))
    }

    fn name(&self, index: usize) -> String {
        self.paths
            .get(index)
            .and_then(|p| p.file_stem())
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("frame_{index:04}"))
    }
}

/// Already decoded frames shared with the caller.
pub struct MemorySource {
    frames: Vec<Arc<Frame>>,
    normalize: bool,
}

impl MemorySource {
    pub fn new(frames: Vec<Arc<Frame>>, normalize: bool) -> Self {
        Self { frames, normalize }
    }

    fn frame(&self, index: usize) -> Result<&Arc<Frame>> {
        self.frames
            .get(index)
            .ok_or_else(|| out_of_range(index, self.frames.len()))
    }
}

impl FrameSource for MemorySource {
    fn len(&self) -> usize {
        self.frames.len()
    }

    fn size(&self, index: usize) -> Result<ImageSize> {
        Ok(self.frame(index)?.size())
    }

    fn load(&self, index: usize) -> Result<Arc<Frame>> {
        let frame = self.frame(index)?;
        if self.normalize {
            Ok(Arc::new(normalize_range(frame)))
        } else {
            Ok(Arc::clone(frame))
        }
    }

    fn name(&self, index: usize) -> String {
        format!("frame_{index:04}")
    }
}

fn out_of_range(index: usize, total: usize) -> AlignError {
    AlignError::Input(format!("Frame index {index} out of range (total: {total})"))
}

fn unreadable(path: &Path, err: AlignError) -> AlignError {
    AlignError::Input(format!("Cannot read {}: {err}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    #[test]
    fn memory_source_shares_frames() {
        let frame = Arc::new(Frame::new(Array2::from_elem((3, 5), 0.5f32), 8));
        let source = MemorySource::new(vec![Arc::clone(&frame)], false);
        let loaded = source.load(0).unwrap();
        assert!(Arc::ptr_eq(&frame, &loaded));
        assert_eq!(source.size(0).unwrap(), ImageSize { width: 5, height: 3 });
        assert!(source.load(1).is_err());
    }

    #[test]
    fn path_source_names_from_stem() {
        let source = PathSource::new(vec![PathBuf::from("/data/moon_001.tif")], false);
        assert_eq!(source.name(0), "moon_001");
        assert!(source.load(0).is_err());
    }
}
