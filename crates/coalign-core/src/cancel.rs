use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::consts::CANCEL_CHECK_ROWS;
use crate::error::{AlignError, Result};

/// Cooperative cancellation flag shared between a caller and a worker.
///
/// Cloning is cheap; all clones observe the same flag.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// Returns `Err(AlignError::Cancelled)` once cancellation was requested.
    pub fn checkpoint(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(AlignError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Row-loop checkpoint: only polls the flag every `CANCEL_CHECK_ROWS` rows.
    pub fn checkpoint_row(&self, row: usize) -> Result<()> {
        if row % CANCEL_CHECK_ROWS == 0 {
            self.checkpoint()
        } else {
            Ok(())
        }
    }
}
