//! Configuration validation

use std::time::Duration;

use super::types::{BuildstepConfig, LockConfig};
use crate::{
    lock::{LockHandle, RetryPolicy},
    Error, PropertyKey, Result,
};

impl BuildstepConfig {
    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any values are out of range or invalid
    pub fn validate(&self) -> Result<()> {
        self.lock.validate()
    }
}

impl LockConfig {
    /// # Errors
    ///
    /// Returns error if any values are out of range or invalid
    pub fn validate(&self) -> Result<()> {
        if !(10..=600_000).contains(&self.retry_interval_ms) {
            return Err(Error::InvalidConfig(
                "lock.retry_interval_ms must be 10-600000".to_string(),
            ));
        }

        if self.max_attempts == Some(0) {
            return Err(Error::InvalidConfig(
                "lock.max_attempts must be at least 1 - unset it to retry forever".to_string(),
            ));
        }

        if self.handle_key.trim().is_empty() {
            return Err(Error::InvalidConfig(
                "lock.handle_key cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Retry policy for [`AcquireLock`](crate::lock::AcquireLock).
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        let policy = RetryPolicy::default()
            .with_interval(Duration::from_millis(self.retry_interval_ms));
        match self.max_attempts {
            Some(max) => policy.with_max_attempts(max),
            None => policy,
        }
    }

    #[must_use]
    pub fn handle_key(&self) -> PropertyKey<LockHandle> {
        PropertyKey::named(self.handle_key.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(BuildstepConfig::default().validate().is_ok());
    }

    #[test]
    fn test_retry_interval_too_low() {
        let mut config = BuildstepConfig::default();
        config.lock.retry_interval_ms = 5;

        let result = config.validate();
        assert!(matches!(result, Err(Error::InvalidConfig(ref msg)) if msg.contains("10-600000")));
    }

    #[test]
    fn test_zero_max_attempts_rejected() {
        let mut config = BuildstepConfig::default();
        config.lock.max_attempts = Some(0);

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_blank_handle_key_rejected() {
        let mut config = BuildstepConfig::default();
        config.lock.handle_key = "  ".to_string();

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_retry_policy_conversion() {
        let config = LockConfig {
            retry_interval_ms: 250,
            max_attempts: Some(4),
            handle_key: "board".to_string(),
        };

        let policy = config.retry_policy();
        assert_eq!(policy.interval, Duration::from_millis(250));
        assert_eq!(policy.max_attempts, Some(4));
        assert_eq!(config.handle_key().name(), "board");
    }
}
