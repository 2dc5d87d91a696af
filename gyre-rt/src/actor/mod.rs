//! User-facing actor surface: the [`Actor`] trait, the embedded
//! [`ActorCore`], and the lifecycle state machine.

pub mod core;
pub mod lifecycle;
pub mod traits;

pub use self::core::ActorCore;
pub use lifecycle::{ActorState, BehaviorStage};
pub use traits::{Actor, ActorExt};
