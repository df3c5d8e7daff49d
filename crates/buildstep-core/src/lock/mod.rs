//! Advisory file lock coordination.
//!
//! [`AcquireLock`] opens a path, takes a non-blocking exclusive `flock`-style
//! lock through `fs2`, and publishes the resulting [`LockHandle`] into the
//! build properties. [`ReleaseLock`] takes the handle back out and closes it.
//! The lock lives exactly as long as the handle's descriptor, so closing is
//! releasing.
//!
//! # Example
//!
//! ```no_run
//! use buildstep_core::{
//!     lock::{AcquireLock, ReleaseLock},
//!     Build, Step,
//! };
//!
//! # async fn demo() {
//! let mut steps: Vec<Box<dyn Step>> = vec![
//!     Box::new(AcquireLock::new("/tmp/fpga.lock")),
//!     Box::new(ReleaseLock::new("/tmp/fpga.lock")),
//! ];
//! let report = Build::new().run(&mut steps).await;
//! println!("{}", report.result());
//! # }
//! ```

mod acquire;
mod handle;
mod release;

use std::{fs::File, io, path::Path};

use fs2::FileExt;

pub use acquire::{AcquireLock, RetryPolicy};
pub use handle::{default_handle_key, LockHandle, DEFAULT_HANDLE_KEY};
pub use release::ReleaseLock;

use crate::{Error, Result};

/// Open the lock target read-only. The file must already exist.
pub(crate) fn open_for_locking(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| Error::ResourceUnavailable {
        path: path.to_path_buf(),
        source: e.into(),
    })
}

/// Single non-blocking attempt at an exclusive lock on `file`.
pub(crate) fn try_lock_exclusive(file: &File, path: &Path) -> Result<()> {
    FileExt::try_lock_exclusive(file).map_err(|err| {
        if is_contention(&err) {
            Error::Contention {
                path: path.to_path_buf(),
            }
        } else {
            Error::LockError {
                path: path.to_path_buf(),
                source: err.into(),
            }
        }
    })
}

fn is_contention(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::WouldBlock
        || err.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}
