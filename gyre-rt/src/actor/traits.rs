// Layer 1: Standard library imports
// (none)

// Layer 2: Third-party crate imports
use tracing::{debug, warn};

// Layer 3: Internal module imports
use super::core::ActorCore;
use crate::dispatch::{HandlerEntry, SubscriptionPoint};
use crate::message::{CommitUnsubscription, ExternalSubscription, Message};
use crate::system::ErrorCode;
use crate::util::Address;

/// A long-lived unit of state and behavior with an address, a lifecycle,
/// and typed message handlers.
///
/// Implementors embed an [`ActorCore`] (injected at creation by the
/// supervisor) and expose it through `core` / `core_mut`; everything
/// else is optional hooks. Handlers run to completion on the locality's
/// dispatch loop and must not block it.
///
/// # Example
///
/// ```rust,ignore
/// use gyre_rt::prelude::*;
///
/// struct Pinger {
///     core: ActorCore,
///     ponger: Address,
/// }
///
/// impl Actor for Pinger {
///     fn core(&self) -> &ActorCore { &self.core }
///     fn core_mut(&mut self) -> &mut ActorCore { &mut self.core }
///
///     fn on_initialize(&mut self) -> Result<(), ErrorCode> {
///         let addr = self.core.address().clone();
///         self.subscribe(&addr, Pinger::on_pong);
///         Ok(())
///     }
///
///     fn on_start(&mut self) {
///         self.core.send(&self.ponger, Ping);
///     }
/// }
/// ```
pub trait Actor: Send + 'static {
    /// The runtime core injected at creation.
    fn core(&self) -> &ActorCore;

    /// Mutable access to the runtime core.
    fn core_mut(&mut self) -> &mut ActorCore;

    /// Wire subscriptions and acquire resources. Runs while the actor is
    /// `Initializing`; an `Err` is replied to the creating supervisor,
    /// which applies its supervision policy.
    fn on_initialize(&mut self) -> Result<(), ErrorCode> {
        Ok(())
    }

    /// Called once the supervisor has confirmed the whole init round and
    /// the actor turned `Operational`.
    fn on_start(&mut self) {}

    /// Called after the actor reached `Shutdown`: every subscription
    /// point is gone and the pending shutdown request (if any) has been
    /// answered.
    fn on_shutdown(&mut self) {}
}

/// Sized companion of [`Actor`]: typed subscribe/unsubscribe, which need
/// the concrete actor type to bind a method to a payload.
pub trait ActorExt: Actor + Sized {
    /// Subscribe `method` to payloads of type `M` arriving at `address`.
    ///
    /// A local address (owned by this actor's supervisor) is registered
    /// immediately; an address owned by another supervisor is registered
    /// via an `ExternalSubscription` round trip and takes effect when
    /// the owner processes it. The returned point is also recorded on
    /// the actor for reverse-order teardown.
    fn subscribe<M: Message>(
        &mut self,
        address: &Address,
        method: fn(&mut Self, M),
    ) -> SubscriptionPoint;

    /// Undo one `subscribe`. Local entries are removed immediately;
    /// foreign entries through the commit round trip.
    fn unsubscribe(&mut self, point: &SubscriptionPoint);
}

impl<A: Actor> ActorExt for A {
    fn subscribe<M: Message>(
        &mut self,
        address: &Address,
        method: fn(&mut Self, M),
    ) -> SubscriptionPoint {
        let handler = {
            let core = self.core();
            HandlerEntry::for_actor::<Self, M>(
                core.typed_cell::<Self>(),
                core.address().clone(),
                core.supervisor_weak().clone(),
                method,
            )
        };
        let point = SubscriptionPoint {
            address: address.clone(),
            handler,
        };
        self.core_mut().push_point(point.clone());

        let core = self.core();
        match core.supervisor() {
            Some(sup) if address.owned_by(&sup) => {
                sup.subscribe_local(address.clone(), point.handler.clone());
            }
            Some(_) => match address.supervisor() {
                Some(owner) => {
                    debug!(subject = %address, "requesting foreign subscription");
                    core.send(
                        owner.address(),
                        ExternalSubscription {
                            target: address.clone(),
                            handler: point.handler.clone(),
                        },
                    );
                }
                None => warn!(subject = %address, "subscription target has no live supervisor"),
            },
            None => warn!("subscribing actor has no live supervisor"),
        }
        point
    }

    fn unsubscribe(&mut self, point: &SubscriptionPoint) {
        if !self.core_mut().remove_point(point) {
            debug!(subject = %point.address(), "unsubscribe of an unknown point ignored");
            return;
        }
        let core = self.core();
        match core.supervisor() {
            Some(sup) if point.address().owned_by(&sup) => {
                sup.commit_unsubscription(point.address(), &point.handler);
            }
            Some(_) => {
                if let Some(owner) = point.address().supervisor() {
                    core.send(
                        owner.address(),
                        CommitUnsubscription {
                            target: point.address().clone(),
                            handler: point.handler.clone(),
                            done: None,
                        },
                    );
                }
            }
            None => {}
        }
    }
}
