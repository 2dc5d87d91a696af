//! Message types, envelopes, and the request/response protocol.
//!
//! A payload type implements [`Message`] to become routable; the runtime
//! wraps payloads in the type-erased [`AnyMessage`] envelope for transit
//! through locality queues. [`Request`] and [`Response`] add the
//! timeout-bounded request/response protocol on top of plain sends.

pub mod envelope;
pub mod protocol;
pub mod request;
pub mod traits;

pub use envelope::{AnyMessage, TypeTag};
pub use protocol::{
    CommitUnsubscription, ExternalSubscription, HandlerCall, InitializeActor, ShutdownRequest,
    ShutdownTrigger, StartActor, StateRequest, TimerElapsed, UnsubscriptionsComplete,
};
pub use request::{Request, RequestBuilder, Response};
pub use traits::{Message, Requestable};
