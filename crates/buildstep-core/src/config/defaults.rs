//! Default configuration values

use super::types::{BuildstepConfig, LockConfig};
use crate::lock::DEFAULT_HANDLE_KEY;

const DEFAULT_RETRY_INTERVAL_MS: u64 = 1000;

#[allow(clippy::derivable_impls)]
impl Default for BuildstepConfig {
    fn default() -> Self {
        Self {
            lock: LockConfig::default(),
        }
    }
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            retry_interval_ms: DEFAULT_RETRY_INTERVAL_MS,
            max_attempts: None,
            handle_key: DEFAULT_HANDLE_KEY.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_defaults_match_reference_behavior() {
        let config = BuildstepConfig::default();
        assert_eq!(config.lock.retry_interval_ms, 1000);
        assert_eq!(config.lock.max_attempts, None);
        assert_eq!(config.lock.handle_key, "flock_fd");
    }

    #[test]
    fn test_empty_toml_yields_defaults() {
        let parsed: BuildstepConfig = toml::from_str("").expect("empty config parses");
        assert_eq!(parsed, BuildstepConfig::default());
    }
}
