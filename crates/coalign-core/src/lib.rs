pub mod align;
pub mod cancel;
pub mod consts;
pub mod detection;
pub mod error;
pub mod filters;
pub mod frame;
pub mod geometry;
pub mod io;
pub mod pipeline;
pub mod render;
pub mod stabilize;
