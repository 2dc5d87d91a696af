// Layer 1: Standard library imports
use std::fmt::{self, Display};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

// Layer 2: Third-party crate imports
use uuid::Uuid;

// Layer 3: Internal module imports
use super::ids::LocalityToken;
use crate::supervisor::{Supervisor, WeakSupervisor};

/// Process-local identity for a message destination.
///
/// An address is minted by exactly one supervisor and never migrates.
/// It is cheap to clone (reference-counted) and compares by identity:
/// two `Address` values are equal iff they refer to the same issued
/// address, never because they "look alike".
///
/// The address holds a non-owning reference to its issuing supervisor,
/// so in-flight messages and subscription entries do not keep a
/// supervisor alive after its tree has been torn down.
#[derive(Clone)]
pub struct Address {
    inner: Arc<AddressInner>,
}

struct AddressInner {
    id: Uuid,
    supervisor: WeakSupervisor,
    locality: LocalityToken,
}

impl Address {
    pub(crate) fn new(supervisor: WeakSupervisor, locality: LocalityToken) -> Self {
        Self {
            inner: Arc::new(AddressInner {
                id: Uuid::new_v4(),
                supervisor,
                locality,
            }),
        }
    }

    /// The locality token of the supervisor that issued this address.
    pub fn locality(&self) -> LocalityToken {
        self.inner.locality
    }

    /// Whether two addresses are served by the same dispatch loop.
    pub fn same_locality(&self, other: &Address) -> bool {
        self.inner.locality == other.inner.locality
    }

    /// Upgrade the back-reference to the issuing supervisor.
    ///
    /// Returns `None` once the supervisor has been dropped; messages to
    /// such an address are discarded by the dispatch loop.
    pub(crate) fn supervisor(&self) -> Option<Supervisor> {
        self.inner.supervisor.upgrade()
    }

    /// Whether `sup` is the supervisor that issued this address.
    pub(crate) fn owned_by(&self, sup: &Supervisor) -> bool {
        self.inner
            .supervisor
            .upgrade()
            .is_some_and(|owner| owner.ptr_eq(sup))
    }

    fn short_id(&self) -> String {
        self.inner.id.simple().to_string()[..8].to_string()
    }
}

impl PartialEq for Address {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for Address {}

impl Hash for Address {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.id.hash(state);
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "addr@{}", self.short_id())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Address")
            .field("id", &self.short_id())
            .field("locality", &self.inner.locality)
            .finish()
    }
}
