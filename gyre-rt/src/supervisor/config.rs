// Layer 1: Standard library imports
use std::time::Duration;

// Layer 2: Third-party crate imports
use serde::{Deserialize, Serialize};

// Layer 3: Internal module imports
use super::error::SupervisorError;
use crate::util::LocalityToken;

/// Default bound on a child's shutdown acknowledgement.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Child-init-failure disposition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SupervisionPolicy {
    /// A child failing to initialize aborts the supervisor's own init
    /// and tears the whole subtree down.
    ShutdownSelf,

    /// A child failing to initialize is shut down alone; the supervisor
    /// carries on.
    Escalate,
}

impl Default for SupervisionPolicy {
    fn default() -> Self {
        Self::ShutdownSelf
    }
}

/// Supervisor configuration.
///
/// Loop-specific options (which runtime drives the loop, which timer
/// binding is used) are not part of the config — they are passed to the
/// creation call — so a config stays plain data and serializes.
///
/// # Examples
///
/// ```rust
/// use std::time::Duration;
/// use gyre_rt::supervisor::{SupervisionPolicy, SupervisorConfig};
///
/// let config = SupervisorConfig::builder()
///     .with_shutdown_timeout(Duration::from_millis(500))
///     .with_policy(SupervisionPolicy::Escalate)
///     .build()
///     .unwrap();
/// assert_eq!(config.policy, SupervisionPolicy::Escalate);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupervisorConfig {
    /// Maximum time awaited for any child-shutdown reply; exceeding it
    /// surfaces a shutdown failure.
    pub shutdown_timeout: Duration,

    /// Child-init-failure disposition.
    pub policy: SupervisionPolicy,

    /// Locality this supervisor joins. `None` inherits the parent's
    /// locality (a fresh one for roots); an explicit token makes the
    /// supervisor the leader of that locality if it is new.
    pub locality: Option<LocalityToken>,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
            policy: SupervisionPolicy::default(),
            locality: None,
        }
    }
}

impl SupervisorConfig {
    /// Create a configuration builder.
    pub fn builder() -> SupervisorConfigBuilder {
        SupervisorConfigBuilder::default()
    }

    /// Check the configuration for nonsensical values.
    pub fn validate(&self) -> Result<(), SupervisorError> {
        if self.shutdown_timeout.is_zero() {
            return Err(SupervisorError::InvalidConfiguration {
                reason: "shutdown_timeout must be non-zero".into(),
            });
        }
        Ok(())
    }
}

/// Builder for [`SupervisorConfig`].
#[derive(Debug, Default)]
pub struct SupervisorConfigBuilder {
    shutdown_timeout: Option<Duration>,
    policy: Option<SupervisionPolicy>,
    locality: Option<LocalityToken>,
}

impl SupervisorConfigBuilder {
    /// Bound on child-shutdown acknowledgements.
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = Some(timeout);
        self
    }

    /// Child-init-failure disposition.
    pub fn with_policy(mut self, policy: SupervisionPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Join an explicit locality instead of inheriting.
    pub fn with_locality(mut self, locality: LocalityToken) -> Self {
        self.locality = Some(locality);
        self
    }

    /// Build and validate the configuration.
    pub fn build(self) -> Result<SupervisorConfig, SupervisorError> {
        let config = SupervisorConfig {
            shutdown_timeout: self.shutdown_timeout.unwrap_or(DEFAULT_SHUTDOWN_TIMEOUT),
            policy: self.policy.unwrap_or_default(),
            locality: self.locality,
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SupervisorConfig::default();
        assert_eq!(config.shutdown_timeout, DEFAULT_SHUTDOWN_TIMEOUT);
        assert_eq!(config.policy, SupervisionPolicy::ShutdownSelf);
        assert!(config.locality.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_overrides() {
        let token = LocalityToken::unique();
        let config = SupervisorConfig::builder()
            .with_shutdown_timeout(Duration::from_millis(10))
            .with_policy(SupervisionPolicy::Escalate)
            .with_locality(token)
            .build()
            .unwrap();

        assert_eq!(config.shutdown_timeout, Duration::from_millis(10));
        assert_eq!(config.policy, SupervisionPolicy::Escalate);
        assert_eq!(config.locality, Some(token));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let result = SupervisorConfig::builder()
            .with_shutdown_timeout(Duration::ZERO)
            .build();
        assert!(matches!(
            result,
            Err(SupervisorError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_config_serde_round_trip() {
        let config = SupervisorConfig::builder()
            .with_shutdown_timeout(Duration::from_secs(1))
            .build()
            .unwrap();
        let json = serde_json::to_string(&config).unwrap();
        let back: SupervisorConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.shutdown_timeout, config.shutdown_timeout);
        assert_eq!(back.policy, config.policy);
    }
}
