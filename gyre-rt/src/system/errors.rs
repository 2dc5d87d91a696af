// Layer 1: Standard library imports
// (none)

// Layer 2: Third-party crate imports
use serde::{Deserialize, Serialize};
use thiserror::Error;

// Layer 3: Internal module imports
// (none)

/// Protocol-level error kinds, carried inside responses and surfaced
/// through the system context — never thrown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum ErrorCode {
    /// A request did not receive a reply within its timeout; delivered
    /// to the requester as the response's error field.
    #[error("request timed out")]
    RequestTimeout,

    /// A child's init completed with an error (or was aborted by an
    /// early shutdown); handled by the parent per supervision policy.
    #[error("actor initialization failed")]
    InitFailed,

    /// A child did not acknowledge shutdown within the supervisor's
    /// shutdown timeout; surfaced via the system context.
    #[error("actor shutdown failed")]
    ShutdownFailed,

    /// Internal: a shutdown was requested for a subject that is already
    /// shutting down. De-duplicated silently, never surfaced.
    #[error("already shutting down")]
    AlreadyShuttingDown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_display() {
        assert_eq!(ErrorCode::RequestTimeout.to_string(), "request timed out");
        assert_eq!(
            ErrorCode::ShutdownFailed.to_string(),
            "actor shutdown failed"
        );
    }

    #[test]
    fn test_error_code_equality() {
        assert_eq!(ErrorCode::InitFailed, ErrorCode::InitFailed);
        assert_ne!(ErrorCode::InitFailed, ErrorCode::RequestTimeout);
    }

    #[test]
    fn test_error_code_serde() {
        let json = serde_json::to_string(&ErrorCode::RequestTimeout).unwrap();
        let back: ErrorCode = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ErrorCode::RequestTimeout);
    }
}
