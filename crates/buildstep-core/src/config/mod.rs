//! Configuration loading and management
//!
//! # Hierarchy
//!
//! Configuration is loaded in this order (later overrides earlier):
//! 1. Built-in defaults
//! 2. Global config: `<config dir>/buildstep/config.toml`
//! 3. Project config: `.buildstep/config.toml`
//! 4. An explicit file (`buildstep --config <file>`)
//! 5. Environment variables: `BUILDSTEP_*`
//!
//! # Example Config
//!
//! ```toml
//! [lock]
//! retry_interval_ms = 500
//! max_attempts = 120
//! handle_key = "fpga_lock"
//! ```
//!
//! # Module Structure
//!
//! - `types`: Configuration structure definitions
//! - `defaults`: Default value implementations
//! - `load`: Loading from files and environment
//! - `merge`: Configuration merging logic
//! - `validate`: Range and shape checks

mod defaults;
mod load;
mod merge;
mod types;
mod validate;

#[cfg(test)]
mod tests_loading;

pub use load::{global_config_path, load_config, load_toml_file, project_config_path};
pub use types::{BuildstepConfig, LockConfig, PartialBuildstepConfig, PartialLockConfig};
