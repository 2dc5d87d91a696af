// Layer 1: Standard library imports
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

// Layer 2: Third-party crate imports
use dashmap::DashMap;
use tokio::task::JoinHandle;
use tracing::trace;

// Layer 3: Internal module imports
use super::traits::{TimerDriver, TimerSink};
use crate::util::TimerId;

/// Timer binding backed by the Tokio runtime: each armed timer is a
/// spawned task sleeping for the timeout, tracked in a concurrent map so
/// cancellation can abort it.
///
/// Must be used from within a Tokio runtime (the spawn panics
/// otherwise); loopless setups use
/// [`ManualTimer`](super::manual::ManualTimer) or
/// [`NoopTimer`](super::manual::NoopTimer) instead.
#[derive(Default)]
pub struct TokioTimer {
    tasks: Arc<DashMap<TimerId, JoinHandle<()>>>,
}

impl TokioTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of timers currently armed (fired timers unregister
    /// themselves).
    pub fn armed(&self) -> usize {
        self.tasks.len()
    }
}

impl TimerDriver for TokioTimer {
    fn start_timer(&self, sink: TimerSink, id: TimerId, timeout: Duration) {
        let tasks = Arc::clone(&self.tasks);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            trace!(%id, "timer fired");
            tasks.remove(&id);
            sink.elapsed(id);
        });
        self.tasks.insert(id, handle);
    }

    fn cancel_timer(&self, id: TimerId) {
        if let Some((_, handle)) = self.tasks.remove(&id) {
            handle.abort();
            trace!(%id, "timer cancelled");
        }
    }
}

impl fmt::Debug for TokioTimer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokioTimer")
            .field("armed", &self.tasks.len())
            .finish()
    }
}
