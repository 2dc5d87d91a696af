// Layer 1: Standard library imports
use std::fmt;
use std::time::Duration;

// Layer 2: Third-party crate imports
// (none for this module)

// Layer 3: Internal module imports
use crate::message::{AnyMessage, TimerElapsed};
use crate::supervisor::WeakSupervisor;
use crate::util::TimerId;

/// Contract between a supervisor and its event-loop integration.
///
/// Implementations schedule single-shot timers; on fire they call
/// [`TimerSink::elapsed`], which enqueues the trigger into the owning
/// supervisor's locality (fires are never delivered on the caller's
/// stack). `cancel_timer` must be idempotent: cancelling a fired or
/// already-cancelled id is a no-op.
pub trait TimerDriver: Send + Sync + 'static {
    /// Schedule a single-shot timer for `timeout`, reporting through
    /// `sink` under `id`.
    fn start_timer(&self, sink: TimerSink, id: TimerId, timeout: Duration);

    /// Cancel the timer `id` if it has not fired yet.
    fn cancel_timer(&self, id: TimerId);
}

/// Fire-reporting half handed to the driver; holds only a weak
/// supervisor reference so an armed timer never delays teardown.
#[derive(Clone)]
pub struct TimerSink {
    supervisor: WeakSupervisor,
}

impl TimerSink {
    pub(crate) fn new(supervisor: WeakSupervisor) -> Self {
        Self { supervisor }
    }

    /// Report that timer `id` fired. Enqueues a [`TimerElapsed`] message
    /// to the owning supervisor; a dead supervisor swallows the fire.
    pub fn elapsed(&self, id: TimerId) {
        if let Some(sup) = self.supervisor.upgrade() {
            let dest = sup.address().clone();
            sup.post(AnyMessage::to(dest, TimerElapsed { id }));
        }
    }
}

impl fmt::Debug for TimerSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerSink")
            .field("supervisor_alive", &self.supervisor.upgrade().is_some())
            .finish()
    }
}
