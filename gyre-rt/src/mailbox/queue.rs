// Layer 1: Standard library imports
use std::collections::VecDeque;

// Layer 2: Third-party crate imports
use parking_lot::Mutex;
use tokio::sync::Notify;

// Layer 3: Internal module imports
use crate::message::AnyMessage;

/// The FIFO queue owned by a locality leader.
///
/// `push` is safe to call from any thread and wakes an idle dispatch
/// task; everything else about a locality is mutated only from within
/// its own dispatch loop. Messages are popped exactly once, which is
/// what makes delivery of a given message instance at-most-once.
#[derive(Debug, Default)]
pub struct LocalityQueue {
    items: Mutex<VecDeque<AnyMessage>>,
    notify: Notify,
}

impl LocalityQueue {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Thread-safe append; wakes the dispatch task if it is parked.
    pub(crate) fn push(&self, message: AnyMessage) {
        self.items.lock().push_back(message);
        self.notify.notify_one();
    }

    /// Pop the oldest message, if any.
    pub(crate) fn pop(&self) -> Option<AnyMessage> {
        self.items.lock().pop_front()
    }

    /// Wake the dispatch task without enqueuing anything (used when the
    /// leader's lifecycle state changed and the loop must re-check it).
    pub(crate) fn wake(&self) {
        self.notify.notify_one();
    }

    /// Park until the next `push` or `wake`.
    pub(crate) async fn parked(&self) {
        self.notify.notified().await;
    }

    pub(crate) fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }
}
