//! Utility types shared across the runtime.
//!
//! Contains the identifier newtypes ([`RequestId`], [`TimerId`],
//! [`LocalityToken`]) and the process-local [`Address`] used to route
//! messages between actors.

pub mod address;
pub mod ids;

pub use address::Address;
pub use ids::{LocalityToken, RequestId, TimerId};
