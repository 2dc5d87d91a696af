//! Error types for supervisor operations.

// Layer 1: Standard library imports
// (none)

// Layer 2: Third-party crate imports
use thiserror::Error;

// Layer 3: Internal module imports
// (none)

/// Errors returned by supervisor API calls.
///
/// Protocol-level failures (timeouts, init failures) are not errors in
/// this sense — they travel inside responses and through the system
/// context. This enum covers misuse of the API surface itself.
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// The configuration cannot be used as given.
    #[error("invalid supervisor configuration: {reason}")]
    InvalidConfiguration { reason: String },

    /// Child creation was attempted after shutdown had started; the
    /// child was never constructed and never entered the child table.
    #[error("supervisor {address} is shutting down; child creation rejected")]
    ShuttingDown { address: String },

    /// The given address is not a child of this supervisor.
    #[error("no child registered at {address}")]
    ChildNotFound { address: String },
}

impl SupervisorError {
    /// Whether this error came from a create call racing a shutdown.
    pub fn is_shutting_down(&self) -> bool {
        matches!(self, Self::ShuttingDown { .. })
    }

    /// Whether this error reports an unknown child address.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ChildNotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_configuration_message() {
        let err = SupervisorError::InvalidConfiguration {
            reason: "shutdown_timeout must be non-zero".into(),
        };
        assert!(err.to_string().contains("shutdown_timeout"));
        assert!(!err.is_shutting_down());
    }

    #[test]
    fn test_shutting_down_classification() {
        let err = SupervisorError::ShuttingDown {
            address: "addr@deadbeef".into(),
        };
        assert!(err.is_shutting_down());
        assert!(!err.is_not_found());
        assert!(err.to_string().contains("addr@deadbeef"));
    }

    #[test]
    fn test_child_not_found_classification() {
        let err = SupervisorError::ChildNotFound {
            address: "addr@0".into(),
        };
        assert!(err.is_not_found());
    }
}
