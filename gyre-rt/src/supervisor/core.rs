// Layer 1: Standard library imports
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

// Layer 2: Third-party crate imports
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

// Layer 3: Internal module imports
use super::behavior;
use super::config::{SupervisionPolicy, SupervisorConfig};
use super::error::SupervisorError;
use crate::actor::core::{handle_initialize, handle_shutdown, handle_start};
use crate::actor::lifecycle::LifecycleCell;
use crate::actor::{Actor, ActorCore, ActorState};
use crate::dispatch::{HandlerEntry, HandlerRef, SubscriptionMap, SubscriptionPoint};
use crate::mailbox::LocalityQueue;
use crate::message::envelope::ResponseToken;
use crate::message::{
    AnyMessage, CommitUnsubscription, ExternalSubscription, HandlerCall, InitializeActor, Message,
    Request, Requestable, Response, ShutdownRequest, ShutdownTrigger, StartActor, StateRequest,
    TimerElapsed, TypeTag, UnsubscriptionsComplete,
};
use crate::system::{ErrorCode, SystemContext};
use crate::timer::{TimerDriver, TimerSink};
use crate::util::{Address, LocalityToken, RequestId};

/// A supervisor: an actor that owns child actors, a subscription map, a
/// request registry, and — when it leads its locality — the FIFO queue
/// and dispatch loop serving every supervisor in that locality.
///
/// The handle is cheap to clone; all state lives behind it. A root
/// supervisor is created through
/// [`SystemContext::create_supervisor`](crate::system::SystemContext::create_supervisor),
/// children through [`create_supervisor`](Supervisor::create_supervisor)
/// and [`create_actor`](Supervisor::create_actor).
///
/// Driving the loop is either manual ([`process`](Supervisor::process)
/// drains the queue on the caller's thread, the loopless mode) or bound
/// to Tokio ([`start`](Supervisor::start) spawns the dispatch task).
#[derive(Clone)]
pub struct Supervisor {
    pub(crate) inner: Arc<SupervisorInner>,
}

/// Non-owning supervisor reference, held by addresses, handler entries,
/// actor cores, and timer sinks.
#[derive(Clone)]
pub(crate) struct WeakSupervisor(pub(crate) Weak<SupervisorInner>);

impl WeakSupervisor {
    pub(crate) fn upgrade(&self) -> Option<Supervisor> {
        self.0.upgrade().map(|inner| Supervisor { inner })
    }
}

pub(crate) struct SupervisorInner {
    pub(crate) context: SystemContext,
    pub(crate) parent: Option<WeakSupervisor>,
    pub(crate) locality: LocalityToken,
    /// The locality leader's queue; non-leaders hold the same `Arc`.
    pub(crate) queue: Arc<LocalityQueue>,
    pub(crate) leader: WeakSupervisor,
    pub(crate) is_leader: bool,
    pub(crate) timer: Arc<dyn TimerDriver>,
    pub(crate) shutdown_timeout: Duration,
    pub(crate) policy: SupervisionPolicy,
    pub(crate) address: Address,
    pub(crate) lifecycle: Mutex<LifecycleCell>,
    pub(crate) subscriptions: Mutex<SubscriptionMap>,
    pub(crate) children: Mutex<HashMap<Address, ChildSlot>>,
    pub(crate) pending_init: Mutex<HashSet<Address>>,
    pub(crate) requests: Mutex<HashMap<RequestId, PendingRequest>>,
    pub(crate) next_request_id: AtomicU64,
    pub(crate) own_points: Mutex<Vec<SubscriptionPoint>>,
    pub(crate) loop_task: Mutex<Option<JoinHandle<()>>>,
}

/// Child-table slot: the child itself plus the flag that collapses
/// duplicate shutdown triggers into a single request.
#[derive(Clone)]
pub(crate) struct ChildSlot {
    pub(crate) child: Arc<dyn ChildCell>,
    pub(crate) shutdown_requesting: bool,
}

/// Type-erased view of a child the supervisor can drive without knowing
/// its concrete type.
pub(crate) trait ChildCell: Send + Sync {
    fn state(&self) -> ActorState;

    /// Every foreign point of the child has been dropped; finish its
    /// shutdown.
    fn unsubscriptions_complete(&self);
}

struct CellHandle<A: Actor> {
    cell: Arc<Mutex<A>>,
}

impl<A: Actor> ChildCell for CellHandle<A> {
    fn state(&self) -> ActorState {
        self.cell.lock().core().state()
    }

    fn unsubscriptions_complete(&self) {
        let mut actor = self.cell.lock();
        crate::actor::core::finish_shutdown(&mut *actor);
    }
}

impl ChildCell for Supervisor {
    fn state(&self) -> ActorState {
        Supervisor::state(self)
    }

    fn unsubscriptions_complete(&self) {
        // Supervisors only subscribe at their own address, so they never
        // have foreign points to wait for.
        debug!(sup = %self.address(), "unexpected unsubscription completion for a supervisor");
    }
}

/// An entry in the request registry: kept until the reply or the timer
/// fire settles the exchange, whichever comes first.
pub(crate) struct PendingRequest {
    #[allow(dead_code)] // diagnostic echo of what is in flight
    pub(crate) request: AnyMessage,
    pub(crate) reply_to: Address,
    pub(crate) timeout_reply: Box<dyn FnOnce() -> AnyMessage + Send>,
}

/// Owning handle to a created actor, returned by
/// [`Supervisor::create_actor`]. Lets the caller wire peer addresses
/// before processing starts and inspect the actor afterwards.
pub struct ActorHandle<A: Actor> {
    address: Address,
    cell: Arc<Mutex<A>>,
}

impl<A: Actor> ActorHandle<A> {
    /// The actor's address.
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// The actor's current lifecycle state.
    pub fn state(&self) -> ActorState {
        self.cell.lock().core().state()
    }

    /// Inspect the actor under its lock. Do not call from inside the
    /// actor's own handlers.
    pub fn with<R>(&self, f: impl FnOnce(&A) -> R) -> R {
        f(&self.cell.lock())
    }

    /// Mutate the actor under its lock (peer wiring before processing).
    pub fn with_mut<R>(&self, f: impl FnOnce(&mut A) -> R) -> R {
        f(&mut self.cell.lock())
    }
}

impl<A: Actor> Clone for ActorHandle<A> {
    fn clone(&self) -> Self {
        Self {
            address: self.address.clone(),
            cell: Arc::clone(&self.cell),
        }
    }
}

impl<A: Actor> fmt::Debug for ActorHandle<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActorHandle")
            .field("address", &self.address)
            .finish()
    }
}

impl Supervisor {
    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    pub(crate) fn new_root(
        context: SystemContext,
        config: SupervisorConfig,
        timer: Arc<dyn TimerDriver>,
    ) -> Supervisor {
        let locality = config.locality.unwrap_or_else(LocalityToken::unique);
        let queue = Arc::new(LocalityQueue::new());
        let sup = Self::build(context, None, locality, queue, None, &config, timer);
        sup.register_builtins();

        // Self-bootstrap: the root has no parent to initialize it.
        let addr = sup.address().clone();
        sup.send_request(
            &addr,
            InitializeActor { actor: addr.clone() },
            addr.clone(),
            config.shutdown_timeout,
        );
        sup
    }

    #[allow(clippy::too_many_arguments)]
    fn build(
        context: SystemContext,
        parent: Option<WeakSupervisor>,
        locality: LocalityToken,
        queue: Arc<LocalityQueue>,
        leader: Option<WeakSupervisor>,
        config: &SupervisorConfig,
        timer: Arc<dyn TimerDriver>,
    ) -> Supervisor {
        let is_leader = leader.is_none();
        let inner = Arc::new_cyclic(|weak: &Weak<SupervisorInner>| {
            let self_weak = WeakSupervisor(weak.clone());
            SupervisorInner {
                context,
                parent,
                locality,
                queue,
                leader: leader.clone().unwrap_or_else(|| self_weak.clone()),
                is_leader,
                timer,
                shutdown_timeout: config.shutdown_timeout,
                policy: config.policy,
                address: Address::new(self_weak, locality),
                lifecycle: Mutex::new(LifecycleCell::new()),
                subscriptions: Mutex::new(SubscriptionMap::new()),
                children: Mutex::new(HashMap::new()),
                pending_init: Mutex::new(HashSet::new()),
                requests: Mutex::new(HashMap::new()),
                next_request_id: AtomicU64::new(1),
                own_points: Mutex::new(Vec::new()),
                loop_task: Mutex::new(None),
            }
        });
        Supervisor { inner }
    }

    /// Subscribe the built-in protocol handlers at the supervisor's own
    /// address and record them for teardown.
    fn register_builtins(&self) {
        let own = self.address().clone();
        let handlers: Vec<HandlerRef> = vec![
            HandlerEntry::for_supervisor::<HandlerCall>(self, Self::on_handler_call),
            HandlerEntry::for_supervisor::<ExternalSubscription>(self, Self::on_external_subscription),
            HandlerEntry::for_supervisor::<CommitUnsubscription>(self, Self::on_commit_unsubscription),
            HandlerEntry::for_supervisor::<UnsubscriptionsComplete>(self, Self::on_unsubscriptions_complete),
            HandlerEntry::for_supervisor::<ShutdownTrigger>(self, Self::on_shutdown_trigger),
            HandlerEntry::for_supervisor::<TimerElapsed>(self, Self::on_timer_trigger),
            HandlerEntry::for_supervisor::<Request<StateRequest>>(self, Self::on_state_request),
            HandlerEntry::for_supervisor::<Request<InitializeActor>>(self, behavior::on_own_initialize),
            HandlerEntry::for_supervisor::<StartActor>(self, behavior::on_own_start),
            HandlerEntry::for_supervisor::<Request<ShutdownRequest>>(self, behavior::on_own_shutdown),
            HandlerEntry::for_supervisor::<Response<InitializeActor>>(self, behavior::on_init_confirm),
            HandlerEntry::for_supervisor::<Response<ShutdownRequest>>(self, behavior::on_shutdown_confirm),
        ];
        let mut points = self.inner.own_points.lock();
        for handler in handlers {
            self.subscribe_local(own.clone(), Arc::clone(&handler));
            points.push(SubscriptionPoint {
                address: own.clone(),
                handler,
            });
        }
    }

    // ------------------------------------------------------------------
    // Identity & introspection
    // ------------------------------------------------------------------

    /// This supervisor's own address.
    pub fn address(&self) -> &Address {
        &self.inner.address
    }

    /// The locality this supervisor belongs to.
    pub fn locality(&self) -> LocalityToken {
        self.inner.locality
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ActorState {
        self.inner.lifecycle.lock().state()
    }

    /// The parent supervisor, if this is not a root and the parent is
    /// still alive.
    pub fn parent(&self) -> Option<Supervisor> {
        self.inner.parent.as_ref().and_then(WeakSupervisor::upgrade)
    }

    /// Whether two handles refer to the same supervisor.
    pub fn ptr_eq(&self, other: &Supervisor) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Number of live children.
    pub fn children_count(&self) -> usize {
        self.inner.children.lock().len()
    }

    /// Total subscription entries registered in this supervisor's map.
    pub fn subscription_count(&self) -> usize {
        self.inner.subscriptions.lock().entry_count()
    }

    /// Whether any subscription entry is owned by the actor at `owner`.
    pub fn has_subscriptions_of(&self, owner: &Address) -> bool {
        self.inner.subscriptions.lock().contains_owner(owner)
    }

    /// Messages currently queued in this supervisor's locality.
    pub fn queue_len(&self) -> usize {
        self.inner.queue.len()
    }

    /// Requests awaiting a reply or a timeout.
    pub fn pending_request_count(&self) -> usize {
        self.inner.requests.lock().len()
    }

    pub(crate) fn weak(&self) -> WeakSupervisor {
        WeakSupervisor(Arc::downgrade(&self.inner))
    }

    /// Mint a fresh address owned by this supervisor.
    pub fn create_address(&self) -> Address {
        Address::new(self.weak(), self.inner.locality)
    }

    // ------------------------------------------------------------------
    // Child creation
    // ------------------------------------------------------------------

    /// Create a child actor and start its init round.
    ///
    /// `build` receives the injected [`ActorCore`] and returns the actor
    /// value. The child enters the child table immediately and gets an
    /// `InitializeActor` request bounded by `timeout`; if this
    /// supervisor has not finished its own init, its init barrier now
    /// also waits for the child.
    ///
    /// Rejected once shutdown has started — the actor is then never
    /// constructed.
    pub fn create_actor<A, F>(
        &self,
        timeout: Duration,
        build: F,
    ) -> Result<ActorHandle<A>, SupervisorError>
    where
        A: Actor,
        F: FnOnce(ActorCore) -> A,
    {
        if self.state().has_entered_shutdown() {
            return Err(SupervisorError::ShuttingDown {
                address: self.address().to_string(),
            });
        }
        let address = self.create_address();
        let core = ActorCore::new(address.clone(), self.weak());
        let cell = Arc::new(Mutex::new(build(core)));
        cell.lock().core().bind_cell(Arc::downgrade(&cell));

        let lifecycle_handlers: [HandlerRef; 3] = [
            HandlerEntry::for_actor::<A, Request<InitializeActor>>(
                Arc::downgrade(&cell),
                address.clone(),
                self.weak(),
                handle_initialize::<A>,
            ),
            HandlerEntry::for_actor::<A, StartActor>(
                Arc::downgrade(&cell),
                address.clone(),
                self.weak(),
                handle_start::<A>,
            ),
            HandlerEntry::for_actor::<A, Request<ShutdownRequest>>(
                Arc::downgrade(&cell),
                address.clone(),
                self.weak(),
                handle_shutdown::<A>,
            ),
        ];
        {
            let mut actor = cell.lock();
            for handler in lifecycle_handlers {
                self.subscribe_local(address.clone(), Arc::clone(&handler));
                actor.core_mut().push_point(SubscriptionPoint {
                    address: address.clone(),
                    handler,
                });
            }
        }

        self.inner.children.lock().insert(
            address.clone(),
            ChildSlot {
                child: Arc::new(CellHandle {
                    cell: Arc::clone(&cell),
                }),
                shutdown_requesting: false,
            },
        );
        behavior::on_create_child(self, &address);
        self.send_request(
            &address,
            InitializeActor {
                actor: address.clone(),
            },
            self.address().clone(),
            timeout,
        );
        debug!(sup = %self.address(), child = %address, "actor created");
        Ok(ActorHandle { address, cell })
    }

    /// Create a child supervisor and start its init round.
    ///
    /// Without an explicit locality in `config` the child joins this
    /// supervisor's locality and queue; with a fresh token it leads its
    /// own locality (and needs its own `process`/`start` driving).
    pub fn create_supervisor(
        &self,
        timeout: Duration,
        config: SupervisorConfig,
        timer: Arc<dyn TimerDriver>,
    ) -> Result<Supervisor, SupervisorError> {
        config.validate()?;
        if self.state().has_entered_shutdown() {
            return Err(SupervisorError::ShuttingDown {
                address: self.address().to_string(),
            });
        }
        let locality = config.locality.unwrap_or(self.inner.locality);
        let (queue, leader) = if locality == self.inner.locality {
            (Arc::clone(&self.inner.queue), Some(self.inner.leader.clone()))
        } else {
            (Arc::new(LocalityQueue::new()), None)
        };
        let child = Self::build(
            self.inner.context.clone(),
            Some(self.weak()),
            locality,
            queue,
            leader,
            &config,
            timer,
        );
        child.register_builtins();

        let address = child.address().clone();
        self.inner.children.lock().insert(
            address.clone(),
            ChildSlot {
                child: Arc::new(child.clone()),
                shutdown_requesting: false,
            },
        );
        behavior::on_create_child(self, &address);
        self.send_request(
            &address,
            InitializeActor {
                actor: address.clone(),
            },
            self.address().clone(),
            timeout,
        );
        debug!(sup = %self.address(), child = %address, "supervisor created");
        Ok(child)
    }

    // ------------------------------------------------------------------
    // Messaging
    // ------------------------------------------------------------------

    /// Send `payload` to `dest` as a plain message.
    pub fn send<M: Message>(&self, dest: &Address, payload: M) {
        self.post(AnyMessage::to(dest.clone(), payload));
    }

    /// Append to this supervisor's locality queue. Thread-safe; wakes
    /// the dispatch task. Cross-locality destinations are forwarded when
    /// the message is popped.
    pub(crate) fn post(&self, message: AnyMessage) {
        self.inner.queue.push(message);
    }

    /// Register a request, arm its timer, and enqueue it.
    pub(crate) fn send_request<T: Requestable>(
        &self,
        dest: &Address,
        payload: T,
        reply_to: Address,
        timeout: Duration,
    ) -> RequestId {
        let id = RequestId::from_value(self.inner.next_request_id.fetch_add(1, Ordering::Relaxed));
        let request = Request::new(id, reply_to.clone(), payload);
        let message = AnyMessage::to(dest.clone(), request.clone());

        let timeout_reply = {
            let reply_to = reply_to.clone();
            let request = request.clone();
            Box::new(move || {
                AnyMessage::response(
                    reply_to,
                    Response::failure(&request, ErrorCode::RequestTimeout),
                    ResponseToken {
                        id,
                        timed_out: true,
                    },
                )
            })
        };
        self.inner.requests.lock().insert(
            id,
            PendingRequest {
                request: message.clone(),
                reply_to,
                timeout_reply,
            },
        );
        self.inner
            .timer
            .start_timer(TimerSink::new(self.weak()), id, timeout);
        self.post(message);
        id
    }

    /// Answer `request` with a success value.
    pub fn reply<T: Requestable>(&self, request: &Request<T>, value: T::Reply) {
        self.post(AnyMessage::response(
            request.reply_to().clone(),
            Response::success(request, value),
            ResponseToken {
                id: request.id(),
                timed_out: false,
            },
        ));
    }

    /// Answer `request` with an error code.
    pub fn reply_err<T: Requestable>(&self, request: &Request<T>, code: ErrorCode) {
        self.post(AnyMessage::response(
            request.reply_to().clone(),
            Response::failure(request, code),
            ResponseToken {
                id: request.id(),
                timed_out: false,
            },
        ));
    }

    // ------------------------------------------------------------------
    // Dispatch loop
    // ------------------------------------------------------------------

    /// Drain this locality's queue on the caller's thread.
    ///
    /// Every popped message is routed: destinations in this locality are
    /// delivered straight through their owning supervisor's subscription
    /// map (which preserves total order inside the locality); foreign
    /// destinations are forwarded to their own locality's queue.
    pub fn process(&self) {
        while let Some(message) = self.inner.queue.pop() {
            let Some(dest_sup) = message.destination().supervisor() else {
                warn!(dest = %message.destination(), "destination supervisor gone; message dropped");
                continue;
            };
            if dest_sup.inner.locality == self.inner.locality {
                dest_sup.deliver_local(&message);
            } else {
                trace!(
                    dest = %message.destination(),
                    message_type = message.message_type(),
                    "forwarding across localities"
                );
                dest_sup.post(message);
            }
        }
    }

    /// Deliver one message through this supervisor's subscription map.
    ///
    /// Responses settle their registry entry first: a live id cancels
    /// the timer; a dead id means the timeout already fired and the late
    /// reply is dropped. All matching handlers run before the caller
    /// pops the next message; foreign entries are handed to their owning
    /// supervisor wrapped in a [`HandlerCall`].
    fn deliver_local(&self, message: &AnyMessage) {
        if let Some(token) = message.response_token() {
            if !token.timed_out {
                let settled = self.inner.requests.lock().remove(&token.id);
                match settled {
                    Some(_) => self.inner.timer.cancel_timer(token.id),
                    None => {
                        trace!(id = %token.id, "late response dropped; request already timed out");
                        return;
                    }
                }
            }
        }

        let recipients = self
            .inner
            .subscriptions
            .lock()
            .recipients(message.destination(), message.tag());
        if recipients.is_empty() {
            // A commit that reaches a supervisor whose protocol handlers
            // are already gone must still settle, or the unsubscribing
            // actor would wait forever for an acknowledgement.
            if let Some(commit) = message.downcast_cloned::<CommitUnsubscription>() {
                self.inner
                    .subscriptions
                    .lock()
                    .remove(&commit.target, &commit.handler);
                if let Some(done) = commit.done {
                    done.complete();
                }
                return;
            }
            trace!(
                dest = %message.destination(),
                message_type = message.message_type(),
                "no subscribers; message dropped"
            );
            return;
        }
        for entry in recipients {
            if entry.mine {
                entry.handler.call(message);
            } else {
                if message.tag() == TypeTag::of::<HandlerCall>() {
                    warn!("refusing to nest a handler_call envelope");
                    continue;
                }
                let Some(owner) = entry.handler.owner_supervisor() else {
                    continue;
                };
                let dest = owner.address().clone();
                owner.post(AnyMessage::to(
                    dest,
                    HandlerCall {
                        origin: message.clone(),
                        handler: Arc::clone(&entry.handler),
                    },
                ));
            }
        }
    }

    /// Bind this locality to the Tokio runtime: spawn the dispatch task.
    ///
    /// Only meaningful on the locality leader; other members delegate.
    /// The task drains the queue, parks on the wakeup, and exits once
    /// the leader has shut down.
    pub fn start(&self) {
        if !self.inner.is_leader {
            if let Some(leader) = self.inner.leader.upgrade() {
                leader.start();
            }
            return;
        }
        let mut task = self.inner.loop_task.lock();
        if task.is_some() {
            return;
        }
        let sup = self.clone();
        *task = Some(tokio::spawn(async move {
            loop {
                sup.process();
                if sup.state() == ActorState::Shutdown {
                    break;
                }
                if sup.inner.queue.is_empty() {
                    sup.inner.queue.parked().await;
                }
            }
            trace!(sup = %sup.address(), "dispatch task exited");
        }));
    }

    /// Unbind from the runtime: abort the dispatch task if one runs.
    pub fn stop(&self) {
        if let Some(task) = self.inner.loop_task.lock().take() {
            task.abort();
            return;
        }
        if !self.inner.is_leader {
            if let Some(leader) = self.inner.leader.upgrade() {
                leader.stop();
            }
        }
    }

    // ------------------------------------------------------------------
    // Subscription bookkeeping
    // ------------------------------------------------------------------

    pub(crate) fn subscribe_local(&self, address: Address, handler: HandlerRef) {
        if !address.owned_by(self) {
            warn!(subject = %address, "refusing subscription at an address this supervisor does not own");
            return;
        }
        let mine = handler
            .owner_supervisor()
            .is_some_and(|owner| owner.ptr_eq(self));
        trace!(subject = %address, message_type = handler.message_type(), mine, "subscription added");
        self.inner.subscriptions.lock().insert(address, handler, mine);
    }

    pub(crate) fn commit_unsubscription(&self, address: &Address, handler: &HandlerRef) {
        let removed = self.inner.subscriptions.lock().remove(address, handler);
        trace!(subject = %address, message_type = handler.message_type(), removed, "subscription removed");
    }

    // ------------------------------------------------------------------
    // Shutdown plumbing
    // ------------------------------------------------------------------

    /// Trigger this supervisor's shutdown.
    ///
    /// Routed through the parent when there is one (the parent then
    /// drives us down through the child protocol); a root enters
    /// shutdown directly. Idempotent.
    pub fn do_shutdown(&self) {
        let upstream = self.parent().unwrap_or_else(|| self.clone());
        let dest = upstream.address().clone();
        self.post(AnyMessage::to(
            dest,
            ShutdownTrigger {
                subject: self.address().clone(),
            },
        ));
    }

    /// Send a shutdown request to a child unless one is already in
    /// flight.
    pub(crate) fn request_child_shutdown(&self, address: &Address) {
        let should_send = {
            let mut children = self.inner.children.lock();
            match children.get_mut(address) {
                Some(slot) if !slot.shutdown_requesting => {
                    slot.shutdown_requesting = true;
                    true
                }
                Some(_) => {
                    trace!(
                        child = %address,
                        code = %ErrorCode::AlreadyShuttingDown,
                        "duplicate shutdown trigger collapsed"
                    );
                    false
                }
                None => {
                    debug!(child = %address, "shutdown trigger for unknown child ignored");
                    false
                }
            }
        };
        if should_send {
            self.send_request(
                address,
                ShutdownRequest {
                    actor: address.clone(),
                },
                self.address().clone(),
                self.inner.shutdown_timeout,
            );
        }
    }

    /// Drop a child from the table; continues the shutdown cascade and
    /// the init barrier if either was waiting on it.
    pub(crate) fn remove_child(&self, address: &Address) {
        let now_empty = {
            let mut children = self.inner.children.lock();
            children.remove(address);
            children.is_empty()
        };
        let was_pending = self.inner.pending_init.lock().remove(address);
        if now_empty {
            behavior::on_children_drained(self);
        }
        if was_pending {
            behavior::continue_init(self);
        }
    }

    // ------------------------------------------------------------------
    // Built-in handlers
    // ------------------------------------------------------------------

    /// A message matched a foreign entry elsewhere and was handed over;
    /// invoke the handler in our locality.
    fn on_handler_call(_sup: &Supervisor, message: HandlerCall) {
        message.handler.call(&message.origin);
    }

    /// Another supervisor's actor subscribes to one of our addresses.
    /// Silently ignored once we are shutting down.
    fn on_external_subscription(sup: &Supervisor, message: ExternalSubscription) {
        if sup.state().has_entered_shutdown() {
            debug!(
                subject = %message.target,
                "foreign subscription ignored; owner is shutting down"
            );
            return;
        }
        sup.subscribe_local(message.target, message.handler);
    }

    /// Drop one foreign entry and count it off on the shared callback.
    fn on_commit_unsubscription(sup: &Supervisor, message: CommitUnsubscription) {
        sup.commit_unsubscription(&message.target, &message.handler);
        if let Some(done) = message.done {
            done.complete();
        }
    }

    /// The last foreign point of one of our children has been dropped.
    fn on_unsubscriptions_complete(sup: &Supervisor, message: UnsubscriptionsComplete) {
        let child = sup
            .inner
            .children
            .lock()
            .get(&message.actor)
            .map(|slot| Arc::clone(&slot.child));
        match child {
            Some(child) => child.unsubscriptions_complete(),
            None => debug!(actor = %message.actor, "unsubscription completion for unknown child"),
        }
    }

    /// Route a shutdown wish: self goes up (or straight down for roots),
    /// children get a flag-guarded request.
    fn on_shutdown_trigger(sup: &Supervisor, message: ShutdownTrigger) {
        if message.subject == *sup.address() {
            if sup.parent().is_some() {
                sup.do_shutdown();
            } else {
                behavior::shutdown_start(sup);
            }
        } else {
            sup.request_child_shutdown(&message.subject);
        }
    }

    /// A timer fired. A live registry entry fabricates the timeout
    /// response; a settled one means the reply won the race.
    fn on_timer_trigger(sup: &Supervisor, message: TimerElapsed) {
        let pending = sup.inner.requests.lock().remove(&message.id);
        match pending {
            Some(entry) => {
                debug!(id = %message.id, reply_to = %entry.reply_to, "request timed out");
                sup.post((entry.timeout_reply)());
            }
            None => trace!(id = %message.id, "timer for settled request ignored"),
        }
    }

    /// Answer a state query for ourselves or one of our children.
    fn on_state_request(sup: &Supervisor, request: Request<StateRequest>) {
        let subject = &request.payload().subject;
        let state = if subject == sup.address() {
            sup.state()
        } else {
            let child = sup
                .inner
                .children
                .lock()
                .get(subject)
                .map(|slot| Arc::clone(&slot.child));
            match child {
                Some(child) => child.state(),
                None => ActorState::Unknown,
            }
        };
        sup.reply(&request, state);
    }
}

impl fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Supervisor")
            .field("address", &self.inner.address)
            .field("state", &self.state())
            .field("locality", &self.inner.locality)
            .field("is_leader", &self.inner.is_leader)
            .field("children", &self.children_count())
            .finish()
    }
}
