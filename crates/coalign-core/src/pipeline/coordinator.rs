use std::panic::{self, AssertUnwindSafe};
use std::sync::{mpsc, Arc, Mutex};
use std::thread::JoinHandle;

use tracing::{error, info};

use crate::cancel::CancelToken;
use crate::error::{AlignError, Result};

use super::run::run_and_report;
use super::types::{AlignmentEvent, AlignmentParameters, AlignmentState};

/// Runs alignments on a background worker thread, one at a time.
///
/// Events arrive on the receiver returned by [`start`](Self::start); the
/// stream always ends with exactly one `Completed` or `Aborted` event.
#[derive(Debug)]
pub struct AlignmentCoordinator {
    cancel: CancelToken,
    state: Arc<Mutex<AlignmentState>>,
    handle: Option<JoinHandle<()>>,
}

impl Default for AlignmentCoordinator {
    fn default() -> Self {
        Self {
            cancel: CancelToken::new(),
            state: Arc::new(Mutex::new(AlignmentState::Idle)),
            handle: None,
        }
    }
}

impl AlignmentCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn a worker for `params`. Fails while a previous run is still active.
    pub fn start(&mut self, params: AlignmentParameters) -> Result<mpsc::Receiver<AlignmentEvent>> {
        if self.is_running() {
            return Err(AlignError::Input(
                "An alignment is already running; join it before starting another".into(),
            ));
        }
        self.join();

        let (tx, rx) = mpsc::channel::<AlignmentEvent>();
        let cancel = CancelToken::new();
        self.cancel = cancel.clone();
        set_state(&self.state, AlignmentState::EstimatingOrDetecting);
        let state = Arc::clone(&self.state);

        let handle = std::thread::Builder::new()
            .name("coalign-worker".into())
            .spawn(move || worker(params, cancel, state, tx))
            .map_err(|e| AlignError::Input(format!("Failed to spawn worker thread: {e}")))?;

        self.handle = Some(handle);
        Ok(rx)
    }

    /// Request cancellation of the active run. Has no effect when idle.
    pub fn cancel(&self) {
        if self.is_running() {
            info!("Cancellation requested");
        }
        self.cancel.cancel();
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stage of the current or most recent run.
    pub fn state(&self) -> AlignmentState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Wait for the active run's worker thread to exit.
    pub fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            // The worker catches panics from the run itself.
            if handle.join().is_err() {
                error!("Alignment worker thread panicked");
            }
        }
    }
}

impl Drop for AlignmentCoordinator {
    fn drop(&mut self) {
        self.cancel.cancel();
        self.join();
    }
}

fn set_state(state: &Mutex<AlignmentState>, next: AlignmentState) {
    *state.lock().unwrap_or_else(|e| e.into_inner()) = next;
}

fn worker(
    params: AlignmentParameters,
    cancel: CancelToken,
    state: Arc<Mutex<AlignmentState>>,
    tx: mpsc::Sender<AlignmentEvent>,
) {
    let events = tx.clone();
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        // A failed send means the receiver was dropped; the run still finishes.
        let _ = run_and_report(params, &cancel, |event| {
            if let Some(next) = AlignmentState::after(&event) {
                set_state(&state, next);
            }
            let _ = events.send(event);
        });
    }));

    if let Err(payload) = outcome {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".into());
        error!(%message, "Alignment worker panicked");
        set_state(&state, AlignmentState::Aborted);
        let _ = tx.send(AlignmentEvent::Completed {
            error: Some(message),
        });
    }
}
