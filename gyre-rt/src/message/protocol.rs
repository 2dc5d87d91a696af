//! Built-in control payloads driving the lifecycle, subscription, and
//! timer protocols.
//!
//! These travel through the same dispatch machinery as application
//! payloads; supervisors subscribe handlers for them at their own
//! address during bootstrap.

// Layer 1: Standard library imports
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

// Layer 2: Third-party crate imports
use parking_lot::Mutex;

// Layer 3: Internal module imports
use super::envelope::AnyMessage;
use super::traits::{Message, Requestable};
use crate::dispatch::HandlerRef;
use crate::util::{Address, TimerId};

/// Asks the actor at `actor` to run its initialization. Sent as a
/// request by the creating supervisor; the reply confirms (or fails)
/// the init.
#[derive(Debug, Clone)]
pub struct InitializeActor {
    /// Address of the actor being initialized.
    pub actor: Address,
}

impl Message for InitializeActor {
    const MESSAGE_TYPE: &'static str = "initialize_actor";
}

impl Requestable for InitializeActor {
    type Reply = ();
}

/// Moves a confirmed actor into the operational state. Plain send, no
/// reply expected.
#[derive(Debug, Clone)]
pub struct StartActor {
    /// Address of the actor being started.
    pub actor: Address,
}

impl Message for StartActor {
    const MESSAGE_TYPE: &'static str = "start_actor";
}

/// Asks the actor at `actor` to shut down. Sent as a request bounded by
/// the supervisor's shutdown timeout.
#[derive(Debug, Clone)]
pub struct ShutdownRequest {
    /// Address of the actor being shut down.
    pub actor: Address,
}

impl Message for ShutdownRequest {
    const MESSAGE_TYPE: &'static str = "shutdown_request";
}

impl Requestable for ShutdownRequest {
    type Reply = ();
}

/// Routes a shutdown wish to the supervisor responsible for `subject`.
/// Duplicate triggers for the same subject collapse into one shutdown
/// request.
#[derive(Debug, Clone)]
pub struct ShutdownTrigger {
    /// The actor (or supervisor) that should shut down.
    pub subject: Address,
}

impl Message for ShutdownTrigger {
    const MESSAGE_TYPE: &'static str = "shutdown_trigger";
}

/// Queries the lifecycle state of `subject` from the supervisor that
/// owns it. Replies with [`crate::actor::ActorState::Unknown`] for
/// addresses the supervisor does not know.
#[derive(Debug, Clone)]
pub struct StateRequest {
    /// Address whose state is queried.
    pub subject: Address,
}

impl Message for StateRequest {
    const MESSAGE_TYPE: &'static str = "state_request";
}

impl Requestable for StateRequest {
    type Reply = crate::actor::ActorState;
}

/// Carries a handler to the supervisor owning `target` so it can be
/// registered as a foreign subscription entry there.
#[derive(Clone)]
pub struct ExternalSubscription {
    pub(crate) target: Address,
    pub(crate) handler: HandlerRef,
}

impl Message for ExternalSubscription {
    const MESSAGE_TYPE: &'static str = "external_subscription";
}

impl fmt::Debug for ExternalSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExternalSubscription")
            .field("target", &self.target)
            .field("handler", &self.handler)
            .finish()
    }
}

/// First phase of removing a foreign subscription entry: the owner of
/// `target` drops the entry and then completes `done`.
#[derive(Clone)]
pub struct CommitUnsubscription {
    pub(crate) target: Address,
    pub(crate) handler: HandlerRef,
    pub(crate) done: Option<CommitCallback>,
}

impl Message for CommitUnsubscription {
    const MESSAGE_TYPE: &'static str = "commit_unsubscription";
}

impl fmt::Debug for CommitUnsubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommitUnsubscription")
            .field("target", &self.target)
            .field("handler", &self.handler)
            .finish()
    }
}

/// Second phase of the unsubscription round trip: every foreign point of
/// `actor` has been dropped, so its shutdown can finish.
#[derive(Debug, Clone)]
pub struct UnsubscriptionsComplete {
    /// The actor whose foreign points are all gone.
    pub actor: Address,
}

impl Message for UnsubscriptionsComplete {
    const MESSAGE_TYPE: &'static str = "unsubscriptions_complete";
}

/// Hands a message that matched a foreign subscription entry to the
/// supervisor owning the handler, which invokes it in its own locality.
/// Wrapper envelopes are never wrapped a second time.
#[derive(Clone)]
pub struct HandlerCall {
    pub(crate) origin: AnyMessage,
    pub(crate) handler: HandlerRef,
}

impl Message for HandlerCall {
    const MESSAGE_TYPE: &'static str = "handler_call";
}

impl fmt::Debug for HandlerCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerCall")
            .field("origin", &self.origin)
            .field("handler", &self.handler)
            .finish()
    }
}

/// Injected by the timer binding when a single-shot timer fires; the
/// owning supervisor consults its request registry under this id.
#[derive(Debug, Clone)]
pub struct TimerElapsed {
    /// Id of the fired timer (the guarded request's id).
    pub id: TimerId,
}

impl Message for TimerElapsed {
    const MESSAGE_TYPE: &'static str = "timer_elapsed";
}

/// Shared countdown executed by subscription owners as they drop an
/// actor's foreign entries; the closure runs exactly once, when the last
/// point has been dropped.
#[derive(Clone)]
pub(crate) struct CommitCallback {
    inner: Arc<CallbackState>,
}

struct CallbackState {
    remaining: AtomicUsize,
    on_complete: Mutex<Option<Box<dyn FnOnce() + Send>>>,
}

impl CommitCallback {
    pub(crate) fn new(count: usize, on_complete: impl FnOnce() + Send + 'static) -> Self {
        Self {
            inner: Arc::new(CallbackState {
                remaining: AtomicUsize::new(count),
                on_complete: Mutex::new(Some(Box::new(on_complete))),
            }),
        }
    }

    /// Count one dropped point; runs the completion on the last call.
    pub(crate) fn complete(&self) {
        if self.inner.remaining.fetch_sub(1, Ordering::AcqRel) == 1 {
            if let Some(f) = self.inner.on_complete.lock().take() {
                f();
            }
        }
    }
}

impl fmt::Debug for CommitCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommitCallback")
            .field("remaining", &self.inner.remaining.load(Ordering::Acquire))
            .finish()
    }
}
