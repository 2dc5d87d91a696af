//! Supervisor lifecycle behavior: the init barrier over pending
//! children and the child-first shutdown cascade.
//!
//! Plain actors drive their behavior from their own built-in handlers
//! (see `actor::core`); supervisors extend the same state machine with
//! the phases that involve children, which is what lives here. All
//! functions run on the supervisor's own dispatch loop.

// Layer 1: Standard library imports
// (none)

// Layer 2: Third-party crate imports
use tracing::{debug, trace, warn};

// Layer 3: Internal module imports
use super::config::SupervisionPolicy;
use super::core::Supervisor;
use crate::actor::{ActorState, BehaviorStage};
use crate::message::{
    InitializeActor, Request, Response, ShutdownRequest, StartActor,
};
use crate::system::ErrorCode;
use crate::util::Address;

/// The supervisor's own `InitializeActor` request (from its parent, or
/// from itself for roots). Enters INIT_STARTED; the confirm waits on
/// the init barrier.
pub(crate) fn on_own_initialize(sup: &Supervisor, request: Request<InitializeActor>) {
    {
        let mut lifecycle = sup.inner.lifecycle.lock();
        if lifecycle.state() != ActorState::New {
            debug!(sup = %sup.address(), "duplicate init request ignored");
            return;
        }
        lifecycle.transition_to(ActorState::Initializing);
        lifecycle.set_stage(BehaviorStage::InitStarted);
        lifecycle.set_init_request(request);
    }
    continue_init(sup);
}

/// Confirm the supervisor's own init once no child created before init
/// completion is still initializing.
pub(crate) fn continue_init(sup: &Supervisor) {
    {
        let lifecycle = sup.inner.lifecycle.lock();
        if lifecycle.state() != ActorState::Initializing
            || lifecycle.stage() != BehaviorStage::InitStarted
        {
            return;
        }
    }
    if !sup.inner.pending_init.lock().is_empty() {
        trace!(sup = %sup.address(), "init barrier still waiting on children");
        return;
    }
    let pending = sup.inner.lifecycle.lock().take_init_request();
    if let Some(request) = &pending {
        sup.reply(request, ());
    }
    let mut lifecycle = sup.inner.lifecycle.lock();
    lifecycle.transition_to(ActorState::Initialized);
    lifecycle.set_stage(BehaviorStage::InitEnded);
}

/// The supervisor's own `StartActor`.
pub(crate) fn on_own_start(sup: &Supervisor, _message: StartActor) {
    let mut lifecycle = sup.inner.lifecycle.lock();
    if lifecycle.state() == ActorState::Initialized {
        lifecycle.transition_to(ActorState::Operational);
    }
}

/// A child was created; while the supervisor's own init is unfinished,
/// the init barrier must also wait for it.
pub(crate) fn on_create_child(sup: &Supervisor, address: &Address) {
    let gating = matches!(
        sup.state(),
        ActorState::New | ActorState::Initializing
    );
    if gating {
        sup.inner.pending_init.lock().insert(address.clone());
    }
}

/// A child answered its init request.
///
/// Errors apply the supervision policy: `ShutdownSelf` while the
/// supervisor itself is initializing aborts its init and tears the
/// subtree down; otherwise only the failing child is shut down.
/// Successful children are started.
pub(crate) fn on_init_confirm(sup: &Supervisor, response: Response<InitializeActor>) {
    let address = response.request().actor.clone();
    let in_init = sup.state() == ActorState::Initializing;
    let was_pending = sup.inner.pending_init.lock().remove(&address);
    let mut continue_after = was_pending && in_init;

    match response.error() {
        Some(code) => {
            debug!(sup = %sup.address(), child = %address, %code, "child failed to initialize");
            if in_init && sup.inner.policy == SupervisionPolicy::ShutdownSelf {
                continue_after = false;
                sup.do_shutdown();
            } else {
                sup.request_child_shutdown(&address);
            }
        }
        None => {
            sup.send(
                &address,
                StartActor {
                    actor: address.clone(),
                },
            );
        }
    }
    if continue_after {
        continue_init(sup);
    }
}

/// The supervisor's own `ShutdownRequest` (from its parent).
pub(crate) fn on_own_shutdown(sup: &Supervisor, request: Request<ShutdownRequest>) {
    {
        let mut lifecycle = sup.inner.lifecycle.lock();
        if lifecycle.state().has_entered_shutdown() {
            trace!(sup = %sup.address(), "duplicate shutdown request ignored");
            return;
        }
        lifecycle.set_shutdown_request(request);
    }
    shutdown_start(sup);
}

/// Enter SHUTDOWN_STARTED: abort a pending init (its requester gets an
/// error reply) and begin the child cascade.
pub(crate) fn shutdown_start(sup: &Supervisor) {
    let aborted_init = {
        let mut lifecycle = sup.inner.lifecycle.lock();
        if lifecycle.state().has_entered_shutdown() {
            return;
        }
        let aborted = lifecycle.take_init_request();
        lifecycle.transition_to(ActorState::ShuttingDown);
        lifecycle.set_stage(BehaviorStage::ShutdownStarted);
        aborted
    };
    if let Some(request) = &aborted_init {
        debug!(sup = %sup.address(), "shutdown aborted a pending init");
        sup.reply_err(request, ErrorCode::InitFailed);
    }
    shutdown_children(sup);
}

/// Request shutdown of every child that has none in flight yet; with an
/// empty child table, fall straight through to own unsubscription.
fn shutdown_children(sup: &Supervisor) {
    let targets: Option<Vec<Address>> = {
        let mut children = sup.inner.children.lock();
        if children.is_empty() {
            None
        } else {
            Some(
                children
                    .iter_mut()
                    .filter(|(_, slot)| !slot.shutdown_requesting)
                    .map(|(address, slot)| {
                        slot.shutdown_requesting = true;
                        address.clone()
                    })
                    .collect(),
            )
        }
    };
    match targets {
        None => unsubscribe_self(sup),
        Some(targets) => {
            sup.inner
                .lifecycle
                .lock()
                .set_stage(BehaviorStage::ShutdownChildren);
            for address in targets {
                sup.send_request(
                    &address,
                    ShutdownRequest {
                        actor: address.clone(),
                    },
                    sup.address().clone(),
                    sup.inner.shutdown_timeout,
                );
            }
        }
    }
}

/// A child answered its shutdown request (or its timer fabricated the
/// answer). Timeouts are surfaced once through the system context; the
/// child is removed either way so the cascade terminates.
pub(crate) fn on_shutdown_confirm(sup: &Supervisor, response: Response<ShutdownRequest>) {
    let address = response.request().actor.clone();
    {
        if let Some(slot) = sup.inner.children.lock().get_mut(&address) {
            slot.shutdown_requesting = false;
        }
    }
    if let Some(code) = response.error() {
        warn!(sup = %sup.address(), child = %address, %code, "child failed to acknowledge shutdown");
        sup.inner.context.on_error(ErrorCode::ShutdownFailed);
    }
    let purged = sup.inner.subscriptions.lock().purge_owner(&address);
    if purged > 0 {
        debug!(child = %address, purged, "dropped stale subscription entries of removed child");
    }
    sup.remove_child(&address);
}

/// The child table drained while shutting down; move on to own
/// unsubscription.
pub(crate) fn on_children_drained(sup: &Supervisor) {
    let proceed = {
        let lifecycle = sup.inner.lifecycle.lock();
        lifecycle.state() == ActorState::ShuttingDown
            && lifecycle.stage() == BehaviorStage::ShutdownChildren
    };
    if proceed {
        unsubscribe_self(sup);
    }
}

/// Drop the supervisor's own subscription points (all local, reverse
/// order), confirm the pending shutdown request, and reach `Shutdown`.
fn unsubscribe_self(sup: &Supervisor) {
    sup.inner
        .lifecycle
        .lock()
        .set_stage(BehaviorStage::Unsubscribing);
    let points = {
        let mut own = sup.inner.own_points.lock();
        let mut points = std::mem::take(&mut *own);
        points.reverse();
        points
    };
    for point in &points {
        sup.commit_unsubscription(point.address(), &point.handler);
    }

    let pending = sup.inner.lifecycle.lock().take_shutdown_request();
    if let Some(request) = &pending {
        sup.reply(request, ());
    }
    {
        let mut lifecycle = sup.inner.lifecycle.lock();
        lifecycle.transition_to(ActorState::Shutdown);
        lifecycle.set_stage(BehaviorStage::ShutdownEnded);
    }
    debug!(sup = %sup.address(), "supervisor shut down");
    // Let a parked dispatch task observe the terminal state and exit.
    sup.inner.queue.wake();
}
