//! Typed handler entries and the per-supervisor subscription map.

pub mod handler;
pub mod subscriptions;

pub use handler::{HandlerEntry, HandlerRef};
pub use subscriptions::{SubscriptionMap, SubscriptionPoint};
