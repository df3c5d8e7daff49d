//! Configuration merging logic
//!
//! Later layers override earlier ones (defaults → global → project →
//! explicit file → env). Only keys a layer actually sets take effect.

use super::types::{BuildstepConfig, LockConfig, PartialBuildstepConfig, PartialLockConfig};

impl BuildstepConfig {
    /// Merge a file layer into this config (the layer takes precedence)
    #[must_use]
    pub fn merge(self, other: PartialBuildstepConfig) -> Self {
        Self {
            lock: self.lock.merge(other.lock),
        }
    }
}

impl LockConfig {
    fn merge(self, other: PartialLockConfig) -> Self {
        Self {
            retry_interval_ms: other.retry_interval_ms.unwrap_or(self.retry_interval_ms),
            max_attempts: other.max_attempts.or(self.max_attempts),
            handle_key: other.handle_key.unwrap_or(self.handle_key),
        }
    }
}
