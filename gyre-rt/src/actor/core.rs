// Layer 1: Standard library imports
use std::any::Any;
use std::sync::{OnceLock, Weak};

// Layer 2: Third-party crate imports
use parking_lot::Mutex;
use tracing::{debug, trace, warn};

// Layer 3: Internal module imports
use super::lifecycle::{ActorState, BehaviorStage, LifecycleCell};
use super::traits::Actor;
use crate::dispatch::SubscriptionPoint;
use crate::message::protocol::CommitCallback;
use crate::message::{
    AnyMessage, CommitUnsubscription, InitializeActor, Message, Request, RequestBuilder,
    Requestable, ShutdownRequest, ShutdownTrigger, StartActor, UnsubscriptionsComplete,
};
use crate::supervisor::{Supervisor, WeakSupervisor};
use crate::system::ErrorCode;
use crate::util::Address;

/// The runtime state every actor embeds: its address, a non-owning
/// reference to the enclosing supervisor, the lifecycle cell, and the
/// ordered list of subscription points.
///
/// The core is constructed by the supervisor during `create_actor` and
/// handed to the actor's builder closure; user code never assembles one
/// by hand.
pub struct ActorCore {
    address: Address,
    supervisor: WeakSupervisor,
    lifecycle: LifecycleCell,
    points: Vec<SubscriptionPoint>,
    cell: OnceLock<Box<dyn Any + Send + Sync>>,
}

impl ActorCore {
    pub(crate) fn new(address: Address, supervisor: WeakSupervisor) -> Self {
        Self {
            address,
            supervisor,
            lifecycle: LifecycleCell::new(),
            points: Vec::new(),
            cell: OnceLock::new(),
        }
    }

    /// This actor's own address.
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ActorState {
        self.lifecycle.state()
    }

    /// Current behavior stage.
    pub fn stage(&self) -> BehaviorStage {
        self.lifecycle.stage()
    }

    /// The enclosing supervisor, unless the tree is already gone.
    pub fn supervisor(&self) -> Option<Supervisor> {
        self.supervisor.upgrade()
    }

    /// Number of currently recorded subscription points.
    pub fn subscription_count(&self) -> usize {
        self.points.len()
    }

    /// Send `payload` to `dest` as a plain message.
    pub fn send<M: Message>(&self, dest: &Address, payload: M) {
        match self.supervisor() {
            Some(sup) => sup.post(AnyMessage::to(dest.clone(), payload)),
            None => warn!(dest = %dest, "send from an actor without a live supervisor dropped"),
        }
    }

    /// Begin a request to `dest`; the exchange goes on the wire when the
    /// builder's `send(timeout)` is called. Replies arrive at this
    /// actor's address as `Response<T>` messages.
    pub fn request<T: Requestable>(&self, dest: &Address, payload: T) -> RequestBuilder<T> {
        RequestBuilder::new(
            self.supervisor(),
            dest.clone(),
            self.address.clone(),
            payload,
        )
    }

    /// Answer `request` with a success value.
    pub fn reply<T: Requestable>(&self, request: &Request<T>, value: T::Reply) {
        if let Some(sup) = self.supervisor() {
            sup.reply(request, value);
        }
    }

    /// Answer `request` with an error code.
    pub fn reply_err<T: Requestable>(&self, request: &Request<T>, code: ErrorCode) {
        if let Some(sup) = self.supervisor() {
            sup.reply_err(request, code);
        }
    }

    /// Ask the enclosing supervisor to shut this actor down. Safe to
    /// call repeatedly; duplicate triggers collapse at the supervisor.
    pub fn do_shutdown(&self) {
        if let Some(sup) = self.supervisor() {
            self.send(
                sup.address(),
                ShutdownTrigger {
                    subject: self.address.clone(),
                },
            );
        }
    }

    pub(crate) fn supervisor_weak(&self) -> &WeakSupervisor {
        &self.supervisor
    }

    pub(crate) fn lifecycle_mut(&mut self) -> &mut LifecycleCell {
        &mut self.lifecycle
    }

    pub(crate) fn push_point(&mut self, point: SubscriptionPoint) {
        self.points.push(point);
    }

    pub(crate) fn remove_point(&mut self, point: &SubscriptionPoint) -> bool {
        let before = self.points.len();
        self.points
            .retain(|p| !p.matches(point.address(), &point.handler));
        self.points.len() != before
    }

    /// Attach the shared cell so typed subscription can hand weak
    /// references to handlers. Called once, right after the cell exists.
    pub(crate) fn bind_cell<A: Actor>(&self, cell: Weak<Mutex<A>>) {
        if self.cell.set(Box::new(cell)).is_err() {
            warn!(actor = %self.address, "actor cell bound twice");
        }
    }

    pub(crate) fn typed_cell<A: Actor>(&self) -> Weak<Mutex<A>> {
        match self
            .cell
            .get()
            .and_then(|boxed| boxed.downcast_ref::<Weak<Mutex<A>>>())
        {
            Some(weak) => weak.clone(),
            None => {
                warn!(actor = %self.address, "actor cell not bound; handler will never fire");
                Weak::new()
            }
        }
    }

    /// Drop every subscription point in reverse insertion order. Local
    /// entries are removed synchronously; the foreign remainder is
    /// returned for the commit round trip.
    fn begin_unsubscription(&mut self) -> Vec<SubscriptionPoint> {
        self.lifecycle.set_stage(BehaviorStage::Unsubscribing);
        let mut points = std::mem::take(&mut self.points);
        points.reverse();

        let Some(sup) = self.supervisor() else {
            return Vec::new();
        };
        let mut foreign = Vec::new();
        for point in points {
            if point.address().owned_by(&sup) {
                sup.commit_unsubscription(point.address(), &point.handler);
            } else {
                foreign.push(point);
            }
        }
        foreign
    }

    /// Send the commit round trip for the foreign points; the shared
    /// callback reports back to our supervisor once the last owner has
    /// dropped its entry.
    fn commit_foreign_unsubscriptions(&self, points: Vec<SubscriptionPoint>) {
        let actor = self.address.clone();
        let sup_weak = self.supervisor.clone();
        let callback = CommitCallback::new(points.len(), move || {
            if let Some(sup) = sup_weak.upgrade() {
                let dest = sup.address().clone();
                sup.post(AnyMessage::to(dest, UnsubscriptionsComplete { actor }));
            }
        });
        for point in points {
            match point.address().supervisor() {
                Some(owner) => self.send(
                    owner.address(),
                    CommitUnsubscription {
                        target: point.address().clone(),
                        handler: point.handler.clone(),
                        done: Some(callback.clone()),
                    },
                ),
                // Owner already gone; its map died with it.
                None => callback.complete(),
            }
        }
    }
}

/// Built-in handler for the actor's own `InitializeActor` request.
///
/// Drives INIT_STARTED: stash the request, run the wiring hook, and on
/// success confirm (reply, state `Initialized`). A failed hook is
/// replied with its code; the supervisor applies policy.
pub(crate) fn handle_initialize<A: Actor>(actor: &mut A, request: Request<InitializeActor>) {
    if actor.core().state() != ActorState::New {
        debug!(actor = %actor.core().address(), "duplicate init request ignored");
        return;
    }
    {
        let core = actor.core_mut();
        core.lifecycle_mut().transition_to(ActorState::Initializing);
        core.lifecycle_mut().set_stage(BehaviorStage::InitStarted);
        core.lifecycle_mut().set_init_request(request);
    }
    match actor.on_initialize() {
        Ok(()) => {
            let core = actor.core_mut();
            if let Some(req) = core.lifecycle_mut().take_init_request() {
                core.reply(&req, ());
            }
            core.lifecycle_mut().transition_to(ActorState::Initialized);
            core.lifecycle_mut().set_stage(BehaviorStage::InitEnded);
        }
        Err(code) => {
            debug!(actor = %actor.core().address(), %code, "init hook failed");
            let core = actor.core_mut();
            if let Some(req) = core.lifecycle_mut().take_init_request() {
                core.reply_err(&req, code);
            }
        }
    }
}

/// Built-in handler for `StartActor`: confirmed actors turn operational
/// and get their start hook.
pub(crate) fn handle_start<A: Actor>(actor: &mut A, _message: StartActor) {
    if actor.core().state() != ActorState::Initialized {
        trace!(actor = %actor.core().address(), "start skipped outside Initialized");
        return;
    }
    actor
        .core_mut()
        .lifecycle_mut()
        .transition_to(ActorState::Operational);
    actor.on_start();
}

/// Built-in handler for the actor's own `ShutdownRequest`.
///
/// Drives SHUTDOWN_STARTED → UNSUBSCRIPTION_STARTED: a pending init is
/// aborted with an error reply, every subscription point is dropped in
/// reverse order, and the shutdown finishes immediately when no foreign
/// commit is outstanding.
pub(crate) fn handle_shutdown<A: Actor>(actor: &mut A, request: Request<ShutdownRequest>) {
    let foreign = {
        let core = actor.core_mut();
        core.lifecycle_mut().set_shutdown_request(request);
        if core.state() == ActorState::Initializing {
            if let Some(init) = core.lifecycle_mut().take_init_request() {
                core.reply_err(&init, ErrorCode::InitFailed);
            }
        }
        core.lifecycle_mut().transition_to(ActorState::ShuttingDown);
        core.lifecycle_mut().set_stage(BehaviorStage::ShutdownStarted);
        core.begin_unsubscription()
    };
    if foreign.is_empty() {
        finish_shutdown(actor);
    } else {
        actor.core().commit_foreign_unsubscriptions(foreign);
    }
}

/// Final step of an actor's shutdown: answer the pending request, reach
/// `Shutdown`, and run the hook. Invoked directly when no foreign commit
/// was outstanding, or from the supervisor once the last commit landed.
pub(crate) fn finish_shutdown<A: Actor>(actor: &mut A) {
    if actor.core().state() != ActorState::ShuttingDown {
        return;
    }
    {
        let core = actor.core_mut();
        if let Some(req) = core.lifecycle_mut().take_shutdown_request() {
            core.reply(&req, ());
        }
        core.lifecycle_mut().transition_to(ActorState::Shutdown);
        core.lifecycle_mut().set_stage(BehaviorStage::ShutdownEnded);
    }
    actor.on_shutdown();
}
