//! Configuration loading from files and environment
//!
//! Every layer returns a new config; nothing is mutated in place.

use std::path::{Path, PathBuf};

use super::types::{BuildstepConfig, PartialBuildstepConfig};
use crate::{Error, Result};

/// Load configuration from all sources with hierarchy
///
/// `explicit` is a file named on the command line. Unlike the global and
/// project files it must exist.
///
/// # Errors
///
/// Returns error if:
/// - A config file is malformed TOML
/// - The explicit file cannot be read
/// - An environment override cannot be parsed
/// - Config values fail validation
pub fn load_config(explicit: Option<&Path>) -> Result<BuildstepConfig> {
    let config = BuildstepConfig::default();

    let config = match global_config_path() {
        Some(global_path) if global_path.exists() => config.merge(load_toml_file(&global_path)?),
        _ => config,
    };

    let project_path = project_config_path()?;
    let config = if project_path.exists() {
        config.merge(load_toml_file(&project_path)?)
    } else {
        config
    };

    let config = match explicit {
        Some(path) => config.merge(load_toml_file(path)?),
        None => config,
    };

    let config = config.apply_env_vars()?;
    config.validate()?;

    tracing::debug!(?config, "Loaded configuration");
    Ok(config)
}

/// Get path to global config file
pub fn global_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "buildstep")
        .map(|proj_dirs| proj_dirs.config_dir().join("config.toml"))
}

/// Get path to project config file
///
/// # Errors
///
/// Returns error if current directory cannot be determined
pub fn project_config_path() -> Result<PathBuf> {
    std::env::current_dir()
        .map(|dir| dir.join(".buildstep/config.toml"))
        .map_err(|e| Error::Io(format!("Failed to get current directory: {e}")))
}

/// Load a TOML file into a partial config
///
/// # Errors
///
/// Returns error if:
/// - File cannot be read
/// - Path is a directory instead of a file
/// - TOML is malformed
pub fn load_toml_file(path: &Path) -> Result<PartialBuildstepConfig> {
    if path.is_dir() {
        return Err(Error::Io(format!(
            "Config path is a directory, not a file: {}",
            path.display()
        )));
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Io(format!("Failed to read config file {}: {e}", path.display())))?;

    toml::from_str(&content).map_err(|e| {
        Error::Parse(format!(
            "Failed to parse config file {}: {e}",
            path.display()
        ))
    })
}

impl BuildstepConfig {
    /// Apply `BUILDSTEP_*` environment variable overrides
    ///
    /// # Errors
    ///
    /// Returns error if environment variable values are invalid
    pub fn apply_env_vars(self) -> Result<Self> {
        self.apply_env_from(|name| std::env::var(name).ok())
    }

    /// Apply overrides read through `lookup` instead of the process
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns error if a value cannot be parsed
    pub fn apply_env_from<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("BUILDSTEP_LOCK_RETRY_MS") {
            self.lock.retry_interval_ms = value.trim().parse().map_err(|e| {
                Error::InvalidConfig(format!("Invalid BUILDSTEP_LOCK_RETRY_MS value: {e}"))
            })?;
        }

        if let Some(value) = lookup("BUILDSTEP_LOCK_MAX_ATTEMPTS") {
            self.lock.max_attempts = Some(value.trim().parse().map_err(|e| {
                Error::InvalidConfig(format!("Invalid BUILDSTEP_LOCK_MAX_ATTEMPTS value: {e}"))
            })?);
        }

        if let Some(value) = lookup("BUILDSTEP_HANDLE_KEY") {
            if value.is_empty() {
                return Err(Error::InvalidConfig(
                    "BUILDSTEP_HANDLE_KEY cannot be empty - unset the variable or provide a key"
                        .to_string(),
                ));
            }
            self.lock.handle_key = value;
        }

        Ok(self)
    }
}
