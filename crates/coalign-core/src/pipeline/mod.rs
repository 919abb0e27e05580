pub mod config;
mod coordinator;
mod run;
mod types;

pub use coordinator::AlignmentCoordinator;
pub use run::{output_path, run_alignment, run_and_report};
pub use types::{
    AlignmentEvent, AlignmentInput, AlignmentOutcome, AlignmentParameters, AlignmentState,
    InMemoryOutput,
};
