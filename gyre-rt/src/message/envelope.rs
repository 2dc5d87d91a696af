// Layer 1: Standard library imports
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

// Layer 2: Third-party crate imports
// (none for this module)

// Layer 3: Internal module imports
use super::traits::Message;
use crate::util::{Address, RequestId};

/// Stable per-payload-type tag, checked at handler entry.
///
/// Two tags are equal iff they denote the same payload type; the tag is
/// stable for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeTag(TypeId);

impl TypeTag {
    /// Tag of payload type `M`.
    pub fn of<M: 'static>() -> Self {
        Self(TypeId::of::<M>())
    }
}

/// Marks an envelope as a response and links it to its request.
///
/// `timed_out` distinguishes runtime-fabricated timeout responses from
/// ordinary replies: a timeout response is enqueued *after* its registry
/// entry was removed and must not be dropped by the liveness check that
/// discards late replies.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ResponseToken {
    pub id: RequestId,
    pub timed_out: bool,
}

/// Type-erased message envelope: a destination address, the payload's
/// type tag, and the payload itself, shared and immutable once sent.
///
/// Cloning an envelope clones the `Arc`, not the payload; a given message
/// instance is popped from a queue at most once, so each instance is
/// delivered at most once.
#[derive(Clone)]
pub struct AnyMessage {
    dest: Address,
    tag: TypeTag,
    message_type: &'static str,
    payload: Arc<dyn Any + Send + Sync>,
    response: Option<ResponseToken>,
}

impl AnyMessage {
    /// Wrap `payload` for delivery to `dest`.
    pub fn to<M: Message>(dest: Address, payload: M) -> Self {
        Self {
            dest,
            tag: TypeTag::of::<M>(),
            message_type: M::MESSAGE_TYPE,
            payload: Arc::new(payload),
            response: None,
        }
    }

    /// Wrap a response payload, linking it to the request it answers.
    pub(crate) fn response<M: Message>(dest: Address, payload: M, token: ResponseToken) -> Self {
        Self {
            dest,
            tag: TypeTag::of::<M>(),
            message_type: M::MESSAGE_TYPE,
            payload: Arc::new(payload),
            response: Some(token),
        }
    }

    /// Destination address of this message.
    pub fn destination(&self) -> &Address {
        &self.dest
    }

    /// Stable tag of the payload type.
    pub fn tag(&self) -> TypeTag {
        self.tag
    }

    /// Diagnostic name of the payload type.
    pub fn message_type(&self) -> &'static str {
        self.message_type
    }

    /// Clone the payload out of the envelope if it is of type `M`.
    pub fn downcast_cloned<M: Message>(&self) -> Option<M> {
        self.payload.downcast_ref::<M>().cloned()
    }

    pub(crate) fn response_token(&self) -> Option<ResponseToken> {
        self.response
    }
}

impl fmt::Debug for AnyMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnyMessage")
            .field("dest", &self.dest)
            .field("message_type", &self.message_type)
            .field("response", &self.response)
            .finish()
    }
}
