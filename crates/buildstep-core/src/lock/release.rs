use std::path::PathBuf;

use async_trait::async_trait;

use super::{default_handle_key, LockHandle};
use crate::{
    step::{Step, StepContext},
    Outcome, PropertyKey, Result,
};

/// Close the handle published by a matching [`AcquireLock`](super::AcquireLock).
///
/// Runs even after earlier failures, so a lock taken by the build is always
/// given back.
#[derive(Debug)]
pub struct ReleaseLock {
    filename: PathBuf,
    handle_key: PropertyKey<LockHandle>,
}

impl ReleaseLock {
    pub fn new(filename: impl Into<PathBuf>) -> Self {
        Self {
            filename: filename.into(),
            handle_key: default_handle_key(),
        }
    }

    #[must_use]
    pub fn with_handle_key(mut self, handle_key: PropertyKey<LockHandle>) -> Self {
        self.handle_key = handle_key;
        self
    }

    pub fn filename(&self) -> &std::path::Path {
        &self.filename
    }
}

#[async_trait]
impl Step for ReleaseLock {
    fn name(&self) -> &str {
        "unlock"
    }

    fn always_run(&self) -> bool {
        true
    }

    async fn run(&mut self, cx: &mut StepContext<'_>) -> Result<Outcome> {
        let shown = self.filename.display().to_string();

        let Some(handle) = cx.properties.take(&self.handle_key) else {
            tracing::debug!(path = %shown, key = self.handle_key.name(), "Nothing to unlock");
            cx.status.set_text(["skipped", "unlock", shown.as_str()]);
            return Ok(Outcome::Skipped);
        };

        if let Err(err) = handle.release() {
            tracing::warn!(path = %shown, error = %err, "Unlock failed, closing handle anyway");
            cx.status.add_log("summary", err.to_string());
        }
        cx.status.set_text(["unlocked", shown.as_str()]);
        Ok(Outcome::Success)
    }
}
