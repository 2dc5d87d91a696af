// Layer 1: Standard library imports
use std::fmt;
use std::sync::Arc;

// Layer 2: Third-party crate imports
use parking_lot::RwLock;
use tracing::error;

// Layer 3: Internal module imports
use super::errors::ErrorCode;
use crate::supervisor::{Supervisor, SupervisorConfig, SupervisorError};
use crate::timer::TimerDriver;

type ErrorHandler = Box<dyn Fn(ErrorCode) + Send + Sync>;

/// Per-process context injected into root supervisors.
///
/// There is no global state: tests construct their own context, and the
/// only thing it carries is the factory for root supervisors and the
/// error callback for failures that have no parent to escalate to
/// (shutdown timeouts at the root, for example).
///
/// The default error handler logs through `tracing`.
#[derive(Clone, Default)]
pub struct SystemContext {
    inner: Arc<ContextInner>,
}

#[derive(Default)]
struct ContextInner {
    on_error: RwLock<Option<ErrorHandler>>,
}

impl SystemContext {
    /// A context with the default (logging) error handler.
    pub fn new() -> Self {
        Self::default()
    }

    /// A context that reports unrecoverable conditions to `handler`.
    pub fn with_error_handler(handler: impl Fn(ErrorCode) + Send + Sync + 'static) -> Self {
        let ctx = Self::new();
        ctx.set_error_handler(handler);
        ctx
    }

    /// Replace the error handler.
    pub fn set_error_handler(&self, handler: impl Fn(ErrorCode) + Send + Sync + 'static) {
        *self.inner.on_error.write() = Some(Box::new(handler));
    }

    /// Report an unrecoverable condition.
    pub fn on_error(&self, code: ErrorCode) {
        match &*self.inner.on_error.read() {
            Some(handler) => handler(code),
            None => error!(%code, "unrecoverable runtime condition"),
        }
    }

    /// Create a root supervisor bound to this context.
    ///
    /// The supervisor becomes the leader of its locality (a fresh one
    /// unless the config pins a token) and immediately queues its own
    /// init request; drive it with [`Supervisor::process`] or spawn the
    /// dispatch task with [`Supervisor::start`].
    pub fn create_supervisor(
        &self,
        config: SupervisorConfig,
        timer: Arc<dyn TimerDriver>,
    ) -> Result<Supervisor, SupervisorError> {
        config.validate()?;
        Ok(Supervisor::new_root(self.clone(), config, timer))
    }
}

impl fmt::Debug for SystemContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SystemContext")
            .field("has_error_handler", &self.inner.on_error.read().is_some())
            .finish()
    }
}
