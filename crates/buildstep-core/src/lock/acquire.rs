use std::{
    fs::File,
    path::{Path, PathBuf},
    time::Duration,
};

use async_trait::async_trait;

use super::{default_handle_key, open_for_locking, try_lock_exclusive, LockHandle};
use crate::{
    step::{Step, StepContext},
    timer::{wait_or_interrupt, Wakeup},
    Error, Outcome, PropertyKey, Result,
};

const SOURCE: &str = "AcquireLock";

/// One non-blocking lock attempt on an open file.
type LockAttempt = fn(&File, &Path) -> Result<()>;

/// How long to back off between contended attempts, and how many attempts
/// to make in total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub interval: Duration,
    /// `None` retries until the lock frees up or the build is interrupted.
    pub max_attempts: Option<u32>,
}

impl RetryPolicy {
    #[must_use]
    pub const fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    #[must_use]
    pub const fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    const fn exhausted(&self, attempts: u32) -> bool {
        match self.max_attempts {
            Some(max) => attempts >= max,
            None => false,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            max_attempts: None,
        }
    }
}

/// Take an exclusive advisory lock on `filename` and publish the handle.
#[derive(Debug)]
pub struct AcquireLock {
    filename: PathBuf,
    handle_key: PropertyKey<LockHandle>,
    retry: RetryPolicy,
    attempts: u32,
}

impl AcquireLock {
    pub fn new(filename: impl Into<PathBuf>) -> Self {
        Self {
            filename: filename.into(),
            handle_key: default_handle_key(),
            retry: RetryPolicy::default(),
            attempts: 0,
        }
    }

    #[must_use]
    pub fn with_handle_key(mut self, handle_key: PropertyKey<LockHandle>) -> Self {
        self.handle_key = handle_key;
        self
    }

    #[must_use]
    pub const fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn filename(&self) -> &Path {
        &self.filename
    }

    /// Lock attempts made by the last run, including the first.
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Attempt loop: contention backs off and retries, anything else ends
    /// the step on the spot.
    async fn lock_with_retry(
        &mut self,
        cx: &mut StepContext<'_>,
        file: File,
        attempt: LockAttempt,
    ) -> Result<Outcome> {
        let shown = self.filename.display().to_string();
        loop {
            self.attempts = self.attempts.saturating_add(1);
            match attempt(&file, &self.filename) {
                Ok(()) => {
                    tracing::debug!(
                        path = %shown,
                        attempts = self.attempts,
                        "Acquired lock"
                    );
                    let handle = LockHandle::new(self.filename.clone(), file);
                    cx.properties.set(&self.handle_key, handle, SOURCE);
                    cx.status.set_text(["locked", shown.as_str()]);
                    return Ok(Outcome::Success);
                }
                Err(err) if err.is_contention() => {
                    if self.retry.exhausted(self.attempts) {
                        return Err(Error::RetryLimitExceeded {
                            path: self.filename.clone(),
                            attempts: self.attempts,
                        });
                    }
                    tracing::debug!(
                        path = %shown,
                        attempt = self.attempts,
                        retry_in_ms = %self.retry.interval.as_millis(),
                        "Lock contended, retrying"
                    );
                    cx.status.retrying()?;
                    match wait_or_interrupt(self.retry.interval, cx.interrupt).await {
                        Wakeup::Elapsed => cx.status.resume()?,
                        Wakeup::Interrupted(reason) => {
                            tracing::debug!(path = %shown, "Lock wait interrupted, closing file");
                            return Err(Error::Interrupted { reason });
                        }
                    }
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[async_trait]
impl Step for AcquireLock {
    fn name(&self) -> &str {
        "lock"
    }

    async fn run(&mut self, cx: &mut StepContext<'_>) -> Result<Outcome> {
        let shown = self.filename.display().to_string();
        cx.status.set_text(["locking", shown.as_str()]);
        self.attempts = 0;

        let file = open_for_locking(&self.filename)?;

        if cx.properties.contains(self.handle_key.name()) {
            return Err(Error::AlreadyHeld {
                key: self.handle_key.name().to_string(),
            });
        }

        self.lock_with_retry(cx, file, try_lock_exclusive).await
    }
}
