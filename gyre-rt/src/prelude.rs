//! Convenient glob import for application code.
//!
//! ```rust
//! use gyre_rt::prelude::*;
//! ```

pub use crate::actor::{Actor, ActorCore, ActorExt, ActorState};
pub use crate::message::{Message, Request, Requestable, Response, StateRequest};
pub use crate::supervisor::{
    ActorHandle, SupervisionPolicy, Supervisor, SupervisorConfig, SupervisorError,
};
pub use crate::system::{ErrorCode, SystemContext};
pub use crate::timer::{ManualTimer, NoopTimer, TimerDriver, TokioTimer};
pub use crate::util::{Address, LocalityToken, RequestId};
