// Layer 1: Standard library imports
use std::fmt::{self, Display};

// Layer 2: Third-party crate imports
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Layer 3: Internal module imports
// (none)

/// Identifier of an in-flight request and of the single-shot timer
/// guarding it.
///
/// Request ids are allocated from a per-supervisor monotonic counter and
/// are never reused over the supervisor's lifetime, including after a
/// timer cancellation. The first allocated id is `1`; `0` never appears
/// on the wire.
///
/// # Example
/// ```rust
/// use gyre_rt::util::RequestId;
///
/// let id = RequestId::from_value(7);
/// assert_eq!(id.value(), 7);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestId(u64);

impl RequestId {
    /// Create a RequestId from a raw counter value.
    pub fn from_value(value: u64) -> Self {
        Self(value)
    }

    /// Get the underlying counter value.
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Timers are keyed by the request they guard, so timer ids are request
/// ids. The alias keeps binding signatures readable.
pub type TimerId = RequestId;

/// Opaque token identifying the group of supervisors that share one
/// serialized dispatch loop.
///
/// Two addresses belong to the same locality iff their tokens are equal.
/// A supervisor created without an explicit token inherits its parent's
/// locality (and therefore the parent's queue and dispatch task); a fresh
/// token makes it the leader of a new locality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocalityToken(Uuid);

impl LocalityToken {
    /// Mint a token no other locality shares.
    pub fn unique() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for LocalityToken {
    fn default() -> Self {
        Self::unique()
    }
}

impl Display for LocalityToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
