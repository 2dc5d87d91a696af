//! The external timer binding: what an event-loop integration must
//! provide, plus the bundled implementations.
//!
//! The core only ever needs single-shot timers keyed by request id. A
//! binding schedules them however its loop likes and reports fires
//! through the [`TimerSink`], which re-enters the owning supervisor's
//! locality through its queue.

pub mod manual;
pub mod tokio;
pub mod traits;

pub use self::tokio::TokioTimer;
pub use manual::{ManualTimer, NoopTimer};
pub use traits::{TimerDriver, TimerSink};
