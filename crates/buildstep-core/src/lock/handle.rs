use std::{
    fs::File,
    path::{Path, PathBuf},
};

use fs2::FileExt;

use crate::{Error, PropertyKey, Result};

/// Property name the lock handle is published under unless configured.
pub const DEFAULT_HANDLE_KEY: &str = "flock_fd";

#[must_use]
pub const fn default_handle_key() -> PropertyKey<LockHandle> {
    PropertyKey::new(DEFAULT_HANDLE_KEY)
}

/// An open descriptor holding an exclusive advisory lock.
///
/// Dropping the handle closes the descriptor, which releases the lock.
#[derive(Debug)]
pub struct LockHandle {
    path: PathBuf,
    file: File,
}

impl LockHandle {
    pub(crate) const fn new(path: PathBuf, file: File) -> Self {
        Self { path, file }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Raw descriptor backing the lock.
    #[cfg(unix)]
    pub fn raw_fd(&self) -> std::os::fd::RawFd {
        use std::os::fd::AsRawFd;
        self.file.as_raw_fd()
    }

    /// Unlock explicitly, then close. The descriptor is closed even when the
    /// unlock call reports an error.
    pub fn release(self) -> Result<()> {
        FileExt::unlock(&self.file).map_err(|e| Error::LockError {
            path: self.path.clone(),
            source: e.into(),
        })
    }
}

impl Drop for LockHandle {
    fn drop(&mut self) {
        tracing::debug!("Closed lock handle: {}", self.path.display());
    }
}
