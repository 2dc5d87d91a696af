// Layer 1: Standard library imports
use std::time::Duration;

// Layer 2: Third-party crate imports
// (none for this module)

// Layer 3: Internal module imports
use super::traits::{Message, Requestable};
use crate::supervisor::Supervisor;
use crate::system::ErrorCode;
use crate::util::{Address, RequestId};

/// A payload travelling as a request: the wrapped payload plus the reply
/// address and the id that pairs the eventual response (or timeout) with
/// this exchange.
#[derive(Debug, Clone)]
pub struct Request<T: Requestable> {
    id: RequestId,
    reply_to: Address,
    payload: T,
}

impl<T: Requestable> Request<T> {
    pub(crate) fn new(id: RequestId, reply_to: Address, payload: T) -> Self {
        Self {
            id,
            reply_to,
            payload,
        }
    }

    /// Id pairing this request with its response.
    pub fn id(&self) -> RequestId {
        self.id
    }

    /// Address the response must be sent to.
    pub fn reply_to(&self) -> &Address {
        &self.reply_to
    }

    /// The wrapped payload.
    pub fn payload(&self) -> &T {
        &self.payload
    }
}

impl<T: Requestable> Message for Request<T> {
    const MESSAGE_TYPE: &'static str = T::MESSAGE_TYPE;
}

/// The answer to a [`Request`]: echoes the request payload, carries the
/// reply value on success, and an [`ErrorCode`] otherwise.
///
/// Exactly one response reaches the reply handler for a given request:
/// either the success reply or a runtime-fabricated response carrying
/// [`ErrorCode::RequestTimeout`].
#[derive(Debug, Clone)]
pub struct Response<T: Requestable> {
    id: RequestId,
    request: T,
    reply: Option<T::Reply>,
    error: Option<ErrorCode>,
}

impl<T: Requestable> Response<T> {
    pub(crate) fn success(request: &Request<T>, value: T::Reply) -> Self {
        Self {
            id: request.id,
            request: request.payload.clone(),
            reply: Some(value),
            error: None,
        }
    }

    pub(crate) fn failure(request: &Request<T>, code: ErrorCode) -> Self {
        Self {
            id: request.id,
            request: request.payload.clone(),
            reply: None,
            error: Some(code),
        }
    }

    /// Id of the request this response answers.
    pub fn id(&self) -> RequestId {
        self.id
    }

    /// Echo of the original request payload.
    pub fn request(&self) -> &T {
        &self.request
    }

    /// Reply value, present on success.
    pub fn reply(&self) -> Option<&T::Reply> {
        self.reply.as_ref()
    }

    /// Error code, present on failure or timeout.
    pub fn error(&self) -> Option<ErrorCode> {
        self.error
    }

    /// Whether the exchange succeeded.
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

impl<T: Requestable> Message for Response<T> {
    const MESSAGE_TYPE: &'static str = T::MESSAGE_TYPE;
}

/// Fluent second half of `request(dest, payload)`: nothing goes on the
/// wire until [`send`](RequestBuilder::send) supplies the timeout.
#[derive(Debug)]
pub struct RequestBuilder<T: Requestable> {
    supervisor: Option<Supervisor>,
    dest: Address,
    reply_to: Address,
    payload: T,
}

impl<T: Requestable> RequestBuilder<T> {
    pub(crate) fn new(
        supervisor: Option<Supervisor>,
        dest: Address,
        reply_to: Address,
        payload: T,
    ) -> Self {
        Self {
            supervisor,
            dest,
            reply_to,
            payload,
        }
    }

    /// Register the request, arm its timer, and enqueue it.
    ///
    /// Returns the allocated id, or `None` when the issuing supervisor is
    /// already gone (the request is silently discarded in that case).
    pub fn send(self, timeout: Duration) -> Option<RequestId> {
        let sup = self.supervisor?;
        Some(sup.send_request(&self.dest, self.payload, self.reply_to, timeout))
    }
}
