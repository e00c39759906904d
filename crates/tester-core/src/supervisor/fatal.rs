use std::sync::{Mutex, PoisonError};

use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

use super::SupervisorError;

/// Root cancellation plus the first fatal error, shared by every supervised task.
pub(super) struct Fatal {
    root: CancellationToken,
    first: Mutex<Option<SupervisorError>>,
}

impl Fatal {
    pub(super) fn new() -> Self {
        Self {
            root: CancellationToken::new(),
            first: Mutex::new(None),
        }
    }

    pub(super) fn token(&self) -> CancellationToken {
        self.root.clone()
    }

    pub(super) fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.root.cancelled()
    }

    /// Cancels everything without recording an error.
    pub(super) fn drain(&self) {
        self.root.cancel();
    }

    /// Records `err` unless an earlier error is already stored, then cancels everything.
    pub(super) fn fail(&self, err: SupervisorError) {
        {
            let mut first = self.first.lock().unwrap_or_else(PoisonError::into_inner);
            if first.is_none() {
                *first = Some(err);
            }
        }
        self.root.cancel();
    }

    pub(super) fn take(&self) -> Option<SupervisorError> {
        self.first
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}
