//! # gyre-rt - Hierarchical Actor Runtime
//!
//! A message-passing concurrency runtime: long-lived actors exchange
//! typed messages through opaque [`Address`]es, are organized into
//! parent/child supervision trees, and move through a well-defined
//! lifecycle (init → operating → shutdown) with timeout-bounded
//! request/response exchanges.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use gyre_rt::prelude::*;
//!
//! #[derive(Debug, Clone)]
//! struct Ping;
//! impl Message for Ping {
//!     const MESSAGE_TYPE: &'static str = "ping";
//! }
//!
//! struct Ponger {
//!     core: ActorCore,
//! }
//!
//! impl Actor for Ponger {
//!     fn core(&self) -> &ActorCore { &self.core }
//!     fn core_mut(&mut self) -> &mut ActorCore { &mut self.core }
//!
//!     fn on_initialize(&mut self) -> Result<(), ErrorCode> {
//!         let own = self.core.address().clone();
//!         self.subscribe(&own, Ponger::on_ping);
//!         Ok(())
//!     }
//! }
//!
//! impl Ponger {
//!     fn on_ping(&mut self, _msg: Ping) {
//!         println!("ping!");
//!         self.core.do_shutdown();
//!     }
//! }
//!
//! fn main() {
//!     let ctx = SystemContext::new();
//!     let sup = ctx
//!         .create_supervisor(SupervisorConfig::default(), Arc::new(NoopTimer))
//!         .unwrap();
//!     let ponger = sup
//!         .create_actor(Duration::from_millis(500), |core| Ponger { core })
//!         .unwrap();
//!
//!     sup.process(); // drive init
//!     sup.send(ponger.address(), Ping);
//!     sup.process(); // deliver, shut the ponger down
//! }
//! ```
//!
//! # Model
//!
//! - **Addresses** are process-local, identity-compared, and cheap to
//!   clone; each carries a locality token and a non-owning reference to
//!   its issuing supervisor.
//! - **Localities** group supervisors behind one serialized FIFO queue
//!   with a single dispatch loop; different localities may run on
//!   independent loops and exchange messages through thread-safe
//!   enqueues. Within a locality, delivery order is total.
//! - **Handlers** are synchronous and run to completion; control returns
//!   to the dispatch loop only between invocations. Blocking a locality
//!   blocks every actor in it.
//! - **Supervision** is child-first: a supervisor confirms its own init
//!   only after every child created before init completion has
//!   confirmed, and reaches `Shutdown` only after every child has (or a
//!   shutdown timeout has fired and been reported).
//! - **Requests** pair a monotonic id with a single-shot timer; the
//!   reply handler receives exactly one of the success response or a
//!   fabricated [`ErrorCode::RequestTimeout`] response.
//!
//! # Module Organization
//!
//! - [`actor`] - Actor trait, embedded core, lifecycle state machine
//! - [`message`] - Message trait, envelopes, request/response protocol
//! - [`dispatch`] - Handler entries and the subscription map
//! - [`mailbox`] - The per-locality FIFO queue
//! - [`supervisor`] - Supervisors, dispatch loop, supervision protocol
//! - [`system`] - System context and protocol error codes
//! - [`timer`] - Timer binding contract and bundled drivers
//! - [`util`] - Addresses, ids, locality tokens

pub mod actor;
pub mod dispatch;
pub mod mailbox;
pub mod message;
pub mod prelude;
pub mod supervisor;
pub mod system;
pub mod timer;
pub mod util;

// Re-export commonly used types
pub use actor::{Actor, ActorCore, ActorExt, ActorState, BehaviorStage};
pub use dispatch::SubscriptionPoint;
pub use message::{
    AnyMessage, Message, Request, RequestBuilder, Requestable, Response, StateRequest, TypeTag,
};
pub use supervisor::{
    ActorHandle, SupervisionPolicy, Supervisor, SupervisorConfig, SupervisorError,
};
pub use system::{ErrorCode, SystemContext};
pub use timer::{ManualTimer, NoopTimer, TimerDriver, TimerSink, TokioTimer};
pub use util::{Address, LocalityToken, RequestId, TimerId};
