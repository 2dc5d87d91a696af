// Layer 1: Standard library imports
use std::fmt;
use std::sync::{Arc, Weak};

// Layer 2: Third-party crate imports
use parking_lot::Mutex;

// Layer 3: Internal module imports
use crate::actor::Actor;
use crate::message::{AnyMessage, Message, TypeTag};
use crate::supervisor::{Supervisor, WeakSupervisor};
use crate::util::Address;

/// Shared handle to a handler entry. Identity (pointer equality) is what
/// makes unsubscription unambiguous when several handlers share an
/// address and payload type.
pub type HandlerRef = Arc<HandlerEntry>;

/// A typed callback bound to an owning actor and an expected payload
/// type, invokable against a type-erased message.
///
/// The entry holds only a weak reference to its actor, so a registered
/// handler never delays the actor's teardown. Invocation is guarded
/// twice: the payload tag must match, and the owner must not have
/// entered the unsubscribing phase of its shutdown.
pub struct HandlerEntry {
    tag: TypeTag,
    message_type: &'static str,
    owner: Address,
    owner_sup: WeakSupervisor,
    invoke: Box<dyn Fn(&AnyMessage) + Send + Sync>,
}

impl HandlerEntry {
    /// Entry dispatching to a method of a user actor.
    pub(crate) fn for_actor<A: Actor, M: Message>(
        cell: Weak<Mutex<A>>,
        owner: Address,
        owner_sup: WeakSupervisor,
        method: fn(&mut A, M),
    ) -> HandlerRef {
        let invoke = Box::new(move |msg: &AnyMessage| {
            let Some(cell) = cell.upgrade() else {
                return;
            };
            let mut actor = cell.lock();
            if actor.core().state().has_entered_shutdown() {
                return;
            }
            if let Some(payload) = msg.downcast_cloned::<M>() {
                method(&mut *actor, payload);
            }
        });
        Arc::new(Self {
            tag: TypeTag::of::<M>(),
            message_type: M::MESSAGE_TYPE,
            owner,
            owner_sup,
            invoke,
        })
    }

    /// Entry dispatching to a supervisor-internal handler.
    pub(crate) fn for_supervisor<M: Message>(
        sup: &Supervisor,
        method: fn(&Supervisor, M),
    ) -> HandlerRef {
        let weak = sup.weak();
        let invoke = Box::new(move |msg: &AnyMessage| {
            let Some(sup) = weak.upgrade() else {
                return;
            };
            if let Some(payload) = msg.downcast_cloned::<M>() {
                method(&sup, payload);
            }
        });
        Arc::new(Self {
            tag: TypeTag::of::<M>(),
            message_type: M::MESSAGE_TYPE,
            owner: sup.address().clone(),
            owner_sup: sup.weak(),
            invoke,
        })
    }

    /// Invoke against a type-erased message; a tag mismatch silently
    /// skips the handler so several handlers can share one address.
    pub fn call(&self, msg: &AnyMessage) {
        if msg.tag() == self.tag {
            (self.invoke)(msg);
        }
    }

    /// Expected payload tag.
    pub fn tag(&self) -> TypeTag {
        self.tag
    }

    /// Diagnostic name of the expected payload type.
    pub fn message_type(&self) -> &'static str {
        self.message_type
    }

    /// Address of the owning actor.
    pub fn owner(&self) -> &Address {
        &self.owner
    }

    /// Supervisor enclosing the owning actor, if still alive.
    pub(crate) fn owner_supervisor(&self) -> Option<Supervisor> {
        self.owner_sup.upgrade()
    }
}

impl fmt::Debug for HandlerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerEntry")
            .field("message_type", &self.message_type)
            .field("owner", &self.owner)
            .finish()
    }
}
