// Layer 1: Standard library imports
use std::collections::HashMap;
use std::sync::Arc;

// Layer 2: Third-party crate imports
// (none for this module)

// Layer 3: Internal module imports
use super::handler::HandlerRef;
use crate::message::TypeTag;
use crate::util::Address;

/// An actor's record of one active subscription, kept in insertion order
/// and torn down in reverse order during shutdown.
#[derive(Debug, Clone)]
pub struct SubscriptionPoint {
    pub(crate) address: Address,
    pub(crate) handler: HandlerRef,
}

impl SubscriptionPoint {
    /// The subscribed address.
    pub fn address(&self) -> &Address {
        &self.address
    }

    pub(crate) fn matches(&self, address: &Address, handler: &HandlerRef) -> bool {
        self.address == *address && Arc::ptr_eq(&self.handler, handler)
    }
}

/// One registered handler at an address. `mine` marks entries whose
/// owning actor lives under the supervisor that holds this map; foreign
/// entries are invoked via a wrapped hand-off to their own supervisor.
#[derive(Debug, Clone)]
pub(crate) struct SubscriptionEntry {
    pub handler: HandlerRef,
    pub mine: bool,
}

/// Per-supervisor map of subscriptions, keyed by address and then by
/// payload type tag. Entries at one key are kept in subscription order,
/// which is the order handlers are invoked in.
#[derive(Debug, Default)]
pub struct SubscriptionMap {
    map: HashMap<Address, HashMap<TypeTag, Vec<SubscriptionEntry>>>,
}

impl SubscriptionMap {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, address: Address, handler: HandlerRef, mine: bool) {
        self.map
            .entry(address)
            .or_default()
            .entry(handler.tag())
            .or_default()
            .push(SubscriptionEntry { handler, mine });
    }

    /// Snapshot of the entries registered for `(address, tag)`, in
    /// subscription order. Cloned out so handlers may re-enter the map
    /// (subscribe, unsubscribe) while the snapshot is being walked.
    pub(crate) fn recipients(&self, address: &Address, tag: TypeTag) -> Vec<SubscriptionEntry> {
        self.map
            .get(address)
            .and_then(|by_tag| by_tag.get(&tag))
            .cloned()
            .unwrap_or_default()
    }

    /// Remove the entry for `handler` at `address`. Empty inner maps are
    /// pruned so a drained map compares empty. Returns whether an entry
    /// was removed.
    pub(crate) fn remove(&mut self, address: &Address, handler: &HandlerRef) -> bool {
        let Some(by_tag) = self.map.get_mut(address) else {
            return false;
        };
        let tag = handler.tag();
        let Some(entries) = by_tag.get_mut(&tag) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|e| !Arc::ptr_eq(&e.handler, handler));
        let removed = entries.len() != before;
        if entries.is_empty() {
            by_tag.remove(&tag);
        }
        if by_tag.is_empty() {
            self.map.remove(address);
        }
        removed
    }

    /// Drop every entry whose handler is owned by `owner`, at any
    /// address. Returns the number of dropped entries.
    pub(crate) fn purge_owner(&mut self, owner: &Address) -> usize {
        let mut dropped = 0;
        self.map.retain(|_, by_tag| {
            by_tag.retain(|_, entries| {
                let before = entries.len();
                entries.retain(|e| e.handler.owner() != owner);
                dropped += before - entries.len();
                !entries.is_empty()
            });
            !by_tag.is_empty()
        });
        dropped
    }

    /// Whether any entry anywhere is owned by `owner`.
    pub(crate) fn contains_owner(&self, owner: &Address) -> bool {
        self.map
            .values()
            .flat_map(|by_tag| by_tag.values())
            .flatten()
            .any(|e| e.handler.owner() == owner)
    }

    /// Total number of registered entries.
    pub(crate) fn entry_count(&self) -> usize {
        self.map
            .values()
            .flat_map(|by_tag| by_tag.values())
            .map(Vec::len)
            .sum()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    use crate::actor::{Actor, ActorCore};
    use crate::dispatch::HandlerEntry;
    use crate::message::Message;
    use crate::supervisor::{Supervisor, SupervisorConfig};
    use crate::system::SystemContext;
    use crate::timer::NoopTimer;

    #[derive(Debug, Clone)]
    struct Tick;

    impl Message for Tick {
        const MESSAGE_TYPE: &'static str = "tick";
    }

    #[derive(Debug, Clone)]
    struct Tock;

    impl Message for Tock {
        const MESSAGE_TYPE: &'static str = "tock";
    }

    struct Probe {
        core: ActorCore,
    }

    impl Actor for Probe {
        fn core(&self) -> &ActorCore {
            &self.core
        }

        fn core_mut(&mut self) -> &mut ActorCore {
            &mut self.core
        }
    }

    fn on_tick(_actor: &mut Probe, _msg: Tick) {}
    fn on_tock(_actor: &mut Probe, _msg: Tock) {}

    struct Harness {
        sup: Supervisor,
        owner: Address,
        cell: Arc<Mutex<Probe>>,
    }

    fn harness() -> Harness {
        let sup = SystemContext::new()
            .create_supervisor(SupervisorConfig::default(), Arc::new(NoopTimer))
            .unwrap();
        let owner = sup.create_address();
        let cell = Arc::new(Mutex::new(Probe {
            core: ActorCore::new(owner.clone(), sup.weak()),
        }));
        Harness { sup, owner, cell }
    }

    impl Harness {
        fn tick_handler(&self) -> HandlerRef {
            HandlerEntry::for_actor::<Probe, Tick>(
                Arc::downgrade(&self.cell),
                self.owner.clone(),
                self.sup.weak(),
                on_tick,
            )
        }

        fn tock_handler(&self) -> HandlerRef {
            HandlerEntry::for_actor::<Probe, Tock>(
                Arc::downgrade(&self.cell),
                self.owner.clone(),
                self.sup.weak(),
                on_tock,
            )
        }
    }

    #[test]
    fn test_insert_and_recipients_in_order() {
        let h = harness();
        let addr = h.sup.create_address();
        let first = h.tick_handler();
        let second = h.tick_handler();

        let mut map = SubscriptionMap::new();
        map.insert(addr.clone(), first.clone(), true);
        map.insert(addr.clone(), second.clone(), false);

        let recipients = map.recipients(&addr, TypeTag::of::<Tick>());
        assert_eq!(recipients.len(), 2);
        assert!(Arc::ptr_eq(&recipients[0].handler, &first));
        assert!(recipients[0].mine);
        assert!(Arc::ptr_eq(&recipients[1].handler, &second));
        assert!(!recipients[1].mine);
    }

    #[test]
    fn test_recipients_split_by_tag() {
        let h = harness();
        let addr = h.sup.create_address();
        let mut map = SubscriptionMap::new();
        map.insert(addr.clone(), h.tick_handler(), true);
        map.insert(addr.clone(), h.tock_handler(), true);

        assert_eq!(map.recipients(&addr, TypeTag::of::<Tick>()).len(), 1);
        assert_eq!(map.recipients(&addr, TypeTag::of::<Tock>()).len(), 1);
        assert_eq!(map.entry_count(), 2);
    }

    #[test]
    fn test_remove_prunes_empty_levels() {
        let h = harness();
        let addr = h.sup.create_address();
        let handler = h.tick_handler();

        let mut map = SubscriptionMap::new();
        map.insert(addr.clone(), handler.clone(), true);
        assert!(map.remove(&addr, &handler));
        assert!(map.is_empty());
        assert!(!map.remove(&addr, &handler));
    }

    #[test]
    fn test_remove_targets_exact_handler() {
        let h = harness();
        let addr = h.sup.create_address();
        let keep = h.tick_handler();
        let drop_me = h.tick_handler();

        let mut map = SubscriptionMap::new();
        map.insert(addr.clone(), keep.clone(), true);
        map.insert(addr.clone(), drop_me.clone(), true);
        map.remove(&addr, &drop_me);

        let recipients = map.recipients(&addr, TypeTag::of::<Tick>());
        assert_eq!(recipients.len(), 1);
        assert!(Arc::ptr_eq(&recipients[0].handler, &keep));
    }

    #[test]
    fn test_purge_owner_sweeps_every_address() {
        let h = harness();
        let a = h.sup.create_address();
        let b = h.sup.create_address();

        let mut map = SubscriptionMap::new();
        map.insert(a.clone(), h.tick_handler(), true);
        map.insert(b.clone(), h.tock_handler(), true);
        assert!(map.contains_owner(&h.owner));

        assert_eq!(map.purge_owner(&h.owner), 2);
        assert!(!map.contains_owner(&h.owner));
        assert!(map.is_empty());
    }

    #[test]
    fn test_subscription_point_matches() {
        let h = harness();
        let addr = h.sup.create_address();
        let handler = h.tick_handler();
        let point = SubscriptionPoint {
            address: addr.clone(),
            handler: handler.clone(),
        };

        assert!(point.matches(&addr, &handler));
        assert!(!point.matches(&addr, &h.tick_handler()));
    }
}
