// Layer 1: Standard library imports
use std::fmt::Debug;

// Layer 2: Third-party crate imports
// (none for this module)

// Layer 3: Internal module imports
// (none)

/// A routable payload type.
///
/// Dispatch is driven by a stable per-type tag checked at handler entry,
/// so a handler subscribed for one payload type silently skips every
/// other type delivered to the same address. `MESSAGE_TYPE` is a
/// human-readable name used only in diagnostics; it does not participate
/// in routing.
///
/// Payloads are cloned out of the shared envelope on delivery, which is
/// why `Clone` is required.
///
/// # Example
/// ```rust
/// use gyre_rt::message::Message;
///
/// #[derive(Debug, Clone)]
/// struct Ping;
///
/// impl Message for Ping {
///     const MESSAGE_TYPE: &'static str = "ping";
/// }
/// ```
pub trait Message: Send + Sync + Clone + Debug + 'static {
    /// Diagnostic name of the payload type (compile-time constant).
    const MESSAGE_TYPE: &'static str;
}

/// A payload that can travel as a request and be answered.
///
/// `Reply` is the value carried by a successful response. Lifecycle
/// protocol payloads use `()`; introspection payloads carry real data
/// (the state request replies with an [`crate::actor::ActorState`]).
pub trait Requestable: Message {
    /// Value type carried by a successful response.
    type Reply: Send + Sync + Clone + Debug + 'static;
}
