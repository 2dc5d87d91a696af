//! Actor lifecycle states and the behavior state machine.
//!
//! The state graph is monotonic with two sanctioned exceptions: an actor
//! enters `Initializing` from `New`, and a shutdown request received
//! before init completes aborts the init (`Initializing` →
//! `ShuttingDown`). Every other transition is one-way.

// Layer 1: Standard library imports
use std::fmt::{self, Display};

// Layer 2: Third-party crate imports
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

// Layer 3: Internal module imports
use crate::message::{InitializeActor, Request, ShutdownRequest};

/// Lifecycle state of an actor or supervisor.
///
/// ```text
/// New -> Initializing -> Initialized -> Operational -> ShuttingDown -> Shutdown
///             |                |                            ^
///             +----------------+----------------------------+
///                     (aborted init / early shutdown)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActorState {
    /// Constructed, init request not yet processed.
    New,

    /// Init request received; subscriptions are being wired.
    Initializing,

    /// Init confirmed; waiting for the start message.
    Initialized,

    /// Processing application messages.
    Operational,

    /// Shutdown started; subscription points are being torn down.
    ShuttingDown,

    /// Terminal state; no handler of this actor will run again.
    Shutdown,

    /// Reported for addresses a supervisor does not know.
    Unknown,
}

impl ActorState {
    /// Whether the unsubscribing phase has been entered. Handlers are
    /// never invoked for an owner in one of these states.
    pub fn has_entered_shutdown(&self) -> bool {
        matches!(self, Self::ShuttingDown | Self::Shutdown)
    }

    /// Whether this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Shutdown)
    }

    /// Whether the state graph admits `self -> next`.
    pub fn can_transition_to(&self, next: ActorState) -> bool {
        use ActorState::*;
        matches!(
            (self, next),
            (New, Initializing)
                | (Initializing, Initialized)
                | (Initializing, ShuttingDown)
                | (Initialized, Operational)
                | (Initialized, ShuttingDown)
                | (Operational, ShuttingDown)
                | (ShuttingDown, Shutdown)
        )
    }
}

impl Default for ActorState {
    fn default() -> Self {
        Self::New
    }
}

impl Display for ActorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::New => "new",
            Self::Initializing => "initializing",
            Self::Initialized => "initialized",
            Self::Operational => "operational",
            Self::ShuttingDown => "shutting_down",
            Self::Shutdown => "shutdown",
            Self::Unknown => "unknown",
        };
        write!(f, "{name}")
    }
}

/// Substate of the behavior driving init and shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BehaviorStage {
    /// No lifecycle phase in progress.
    Idle,

    /// Init request accepted, wiring in progress.
    InitStarted,

    /// Init confirmed and replied.
    InitEnded,

    /// Shutdown request accepted.
    ShutdownStarted,

    /// Supervisors only: waiting for children to confirm shutdown.
    ShutdownChildren,

    /// Subscription points are being dropped (reverse order).
    Unsubscribing,

    /// Shutdown confirmed and replied; terminal.
    ShutdownEnded,
}

/// Lifecycle bookkeeping shared by actors and supervisors: the state,
/// the behavior stage, the transition timestamp, and the stashed init
/// and shutdown requests awaiting a reply.
#[derive(Debug)]
pub(crate) struct LifecycleCell {
    state: ActorState,
    stage: BehaviorStage,
    last_transition: DateTime<Utc>,
    init_request: Option<Request<InitializeActor>>,
    shutdown_request: Option<Request<ShutdownRequest>>,
}

impl LifecycleCell {
    pub(crate) fn new() -> Self {
        Self {
            state: ActorState::New,
            stage: BehaviorStage::Idle,
            last_transition: Utc::now(),
            init_request: None,
            shutdown_request: None,
        }
    }

    pub(crate) fn state(&self) -> ActorState {
        self.state
    }

    pub(crate) fn stage(&self) -> BehaviorStage {
        self.stage
    }

    pub(crate) fn last_transition(&self) -> DateTime<Utc> {
        self.last_transition
    }

    pub(crate) fn transition_to(&mut self, next: ActorState) {
        if !self.state.can_transition_to(next) {
            warn!(from = %self.state, to = %next, "lifecycle transition outside the state graph");
        }
        self.state = next;
        self.last_transition = Utc::now();
    }

    pub(crate) fn set_stage(&mut self, stage: BehaviorStage) {
        self.stage = stage;
    }

    pub(crate) fn set_init_request(&mut self, request: Request<InitializeActor>) {
        self.init_request = Some(request);
    }

    pub(crate) fn take_init_request(&mut self) -> Option<Request<InitializeActor>> {
        self.init_request.take()
    }

    pub(crate) fn set_shutdown_request(&mut self, request: Request<ShutdownRequest>) {
        self.shutdown_request = Some(request);
    }

    pub(crate) fn take_shutdown_request(&mut self) -> Option<Request<ShutdownRequest>> {
        self.shutdown_request.take()
    }
}

impl Default for LifecycleCell {
    fn default() -> Self {
        Self::new()
    }
}
