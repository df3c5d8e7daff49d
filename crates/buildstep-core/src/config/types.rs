//! Configuration type definitions
//!
//! Pure data holders; behavior lives in the sibling modules.

use serde::{Deserialize, Serialize};

/// Root configuration structure
///
/// Loaded from defaults → global → project → explicit file → env vars
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BuildstepConfig {
    pub lock: LockConfig,
}

/// Settings for the lock coordinator steps.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LockConfig {
    /// Back-off between contended lock attempts
    pub retry_interval_ms: u64,
    /// Total lock attempts before giving up; unset retries forever
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,
    /// Build property the lock handle is published under
    pub handle_key: String,
}

/// One config file as written: keys left out stay `None` so they do not
/// override earlier layers.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PartialBuildstepConfig {
    pub lock: PartialLockConfig,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PartialLockConfig {
    pub retry_interval_ms: Option<u64>,
    pub max_attempts: Option<u32>,
    pub handle_key: Option<String>,
}
