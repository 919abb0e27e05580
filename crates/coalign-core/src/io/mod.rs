pub mod image_io;
pub mod source;

pub use source::{FrameSource, MemorySource, PathSource};
