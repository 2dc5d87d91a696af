// Layer 1: Standard library imports
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

// Layer 2: Third-party crate imports
use parking_lot::Mutex;

// Layer 3: Internal module imports
use super::traits::{TimerDriver, TimerSink};
use crate::util::TimerId;

/// Deterministic timer binding: nothing fires until the test says so.
///
/// Armed timers accumulate; [`fire`](ManualTimer::fire) delivers one by
/// id, [`fire_all`](ManualTimer::fire_all) delivers everything. Firing
/// only enqueues the trigger — the locality still has to be processed
/// for the timeout response to materialize.
#[derive(Default)]
pub struct ManualTimer {
    pending: Mutex<Vec<PendingTimer>>,
    started: AtomicUsize,
}

struct PendingTimer {
    id: TimerId,
    timeout: Duration,
    sink: TimerSink,
}

impl ManualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of timers ever armed, fired or not. One timer is
    /// armed per request sent, so this doubles as a request counter in
    /// tests.
    pub fn started(&self) -> usize {
        self.started.load(Ordering::Acquire)
    }

    /// Ids of the currently armed timers, in arming order.
    pub fn pending(&self) -> Vec<TimerId> {
        self.pending.lock().iter().map(|t| t.id).collect()
    }

    /// The configured timeout of an armed timer.
    pub fn timeout_of(&self, id: TimerId) -> Option<Duration> {
        self.pending
            .lock()
            .iter()
            .find(|t| t.id == id)
            .map(|t| t.timeout)
    }

    /// Fire one armed timer. Returns whether it was armed.
    pub fn fire(&self, id: TimerId) -> bool {
        let timer = {
            let mut pending = self.pending.lock();
            let index = pending.iter().position(|t| t.id == id);
            index.map(|i| pending.remove(i))
        };
        match timer {
            Some(t) => {
                t.sink.elapsed(t.id);
                true
            }
            None => false,
        }
    }

    /// Fire every armed timer, in arming order. Returns how many fired.
    pub fn fire_all(&self) -> usize {
        let drained: Vec<PendingTimer> = std::mem::take(&mut *self.pending.lock());
        let count = drained.len();
        for t in &drained {
            t.sink.elapsed(t.id);
        }
        count
    }

    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }
}

impl TimerDriver for ManualTimer {
    fn start_timer(&self, sink: TimerSink, id: TimerId, timeout: Duration) {
        self.started.fetch_add(1, Ordering::AcqRel);
        self.pending.lock().push(PendingTimer { id, timeout, sink });
    }

    fn cancel_timer(&self, id: TimerId) {
        self.pending.lock().retain(|t| t.id != id);
    }
}

impl fmt::Debug for ManualTimer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualTimer")
            .field("pending", &self.pending())
            .finish()
    }
}

/// Binding for loopless operation: timers are accepted and forgotten,
/// so no request ever times out. Mirrors driving a tree to completion
/// with nothing but `process()` calls.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTimer;

impl TimerDriver for NoopTimer {
    fn start_timer(&self, _sink: TimerSink, _id: TimerId, _timeout: Duration) {}

    fn cancel_timer(&self, _id: TimerId) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::supervisor::{Supervisor, SupervisorConfig};
    use crate::system::SystemContext;
    use crate::util::RequestId;

    fn sink() -> (Supervisor, TimerSink) {
        let sup = SystemContext::new()
            .create_supervisor(SupervisorConfig::default(), Arc::new(NoopTimer))
            .unwrap();
        let sink = TimerSink::new(sup.weak());
        (sup, sink)
    }

    #[test]
    fn test_manual_timer_arms_and_fires() {
        let (sup, sink) = sink();
        sup.process(); // drain bootstrap traffic
        let timer = ManualTimer::new();
        let id = RequestId::from_value(1);

        timer.start_timer(sink, id, Duration::from_millis(10));
        assert_eq!(timer.pending(), vec![id]);
        assert_eq!(timer.timeout_of(id), Some(Duration::from_millis(10)));

        assert!(timer.fire(id));
        assert!(timer.is_empty());
        assert_eq!(sup.queue_len(), 1); // the TimerElapsed trigger
    }

    #[test]
    fn test_manual_timer_cancel_is_idempotent() {
        let (_sup, sink) = sink();
        let timer = ManualTimer::new();
        let id = RequestId::from_value(2);

        timer.start_timer(sink, id, Duration::from_millis(5));
        timer.cancel_timer(id);
        timer.cancel_timer(id); // second cancel is a no-op
        assert!(!timer.fire(id));
    }

    #[test]
    fn test_fire_all_preserves_order() {
        let (_sup, sink) = sink();
        let timer = ManualTimer::new();
        for n in 1..=3 {
            timer.start_timer(sink.clone(), RequestId::from_value(n), Duration::ZERO);
        }
        assert_eq!(timer.fire_all(), 3);
        assert!(timer.is_empty());
    }

    #[test]
    fn test_dead_supervisor_swallows_fire() {
        let sink = {
            let (sup, sink) = sink();
            drop(sup);
            sink
        };
        // No supervisor left; firing must not panic.
        sink.elapsed(RequestId::from_value(9));
    }
}
