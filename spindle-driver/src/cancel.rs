//! Cooperative cancellation of generator runs.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::Duration,
};

use thiserror::Error;

use crate::GeneratorDriverRunResult;

/// A shareable cancellation signal.
///
/// Cloning yields a handle to the same signal. Once cancelled, a token stays
/// cancelled.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the signal.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Raise the signal once `timeout` has elapsed.
    ///
    /// The timer runs on a detached thread and only holds a handle to the
    /// token.
    pub fn cancel_after(&self, timeout: Duration) {
        let token = self.clone();
        thread::spawn(move || {
            thread::sleep(timeout);
            token.cancel();
        });
    }
}

/// A run stopped because its cancellation token was raised.
///
/// Nothing from a cancelled run is committed: the driver it was started from
/// is unchanged. `partial` holds the results of the generators that completed
/// (no generated trees) and the cancellation diagnostic.
#[derive(Debug, Clone, Error)]
#[error("generator run cancelled after {completed} of {total} generators completed")]
pub struct Cancelled {
    pub partial: GeneratorDriverRunResult,
    pub completed: usize,
    pub total: usize,
}
