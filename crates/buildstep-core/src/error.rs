//! Error types for build steps.
//!
//! Every failure a step can report is a distinct variant. Lock contention is
//! the only recoverable one: [`AcquireLock`](crate::lock::AcquireLock)
//! absorbs it and retries, so it never leaves the lock coordinator unless a
//! retry cap turns it into [`Error::RetryLimitExceeded`].

use std::{io, path::PathBuf};

use thiserror::Error;

use crate::status::{Outcome, StepState};

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// The lock target could not be opened (missing, unreadable)
    #[error("cannot open file '{path}': {source}")]
    ResourceUnavailable {
        path: PathBuf,
        #[source]
        source: IoErrorKind,
    },

    /// The handle key already holds a value in this build
    #[error("property '{key}' is already set")]
    AlreadyHeld { key: String },

    /// The lock is currently held by another holder
    #[error("lock on '{path}' is held by another holder")]
    Contention { path: PathBuf },

    /// Contention outlasted the configured attempt budget
    #[error("lock on '{path}' still held by another holder after {attempts} attempts")]
    RetryLimitExceeded { path: PathBuf, attempts: u32 },

    /// Locking failed for a reason other than contention
    #[error("failed to lock '{path}': {source}")]
    LockError {
        path: PathBuf,
        #[source]
        source: IoErrorKind,
    },

    /// The step was interrupted before it could finish
    #[error("interrupted: {reason}")]
    Interrupted { reason: String },

    /// A second terminal outcome was recorded for the same step
    #[error("step already finished with outcome {previous}")]
    AlreadyFinished { previous: Outcome },

    /// The lifecycle does not allow this transition
    #[error("invalid step transition {from} -> {to}")]
    InvalidTransition { from: StepState, to: StepState },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(String),

    /// An external command could not be started or awaited
    #[error("failed to run '{program}': {source}")]
    Command {
        program: String,
        #[source]
        source: IoErrorKind,
    },
}

impl Error {
    /// Terminal outcome a step reports when its run ends with this error.
    #[must_use]
    pub const fn outcome(&self) -> Outcome {
        match self {
            Self::Interrupted { .. } => Outcome::Exception,
            _ => Outcome::Failure,
        }
    }

    /// Process exit code for CLI front-ends.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidConfig(_) | Self::Parse(_) => 3,
            Self::Interrupted { .. } => 2,
            _ => 1,
        }
    }

    /// Whether the failure is contention that a retry may resolve.
    #[must_use]
    pub const fn is_contention(&self) -> bool {
        matches!(self, Self::Contention { .. })
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// IO error kinds (cloneable, no source chain issues)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IoErrorKind {
    NotFound,
    PermissionDenied,
    WouldBlock,
    InvalidInput,
    Interrupted,
    Other(String),
}

impl std::fmt::Display for IoErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound => write!(f, "not found"),
            Self::PermissionDenied => write!(f, "permission denied"),
            Self::WouldBlock => write!(f, "would block"),
            Self::InvalidInput => write!(f, "invalid input"),
            Self::Interrupted => write!(f, "interrupted"),
            Self::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for IoErrorKind {}

impl From<io::Error> for IoErrorKind {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound,
            io::ErrorKind::PermissionDenied => Self::PermissionDenied,
            io::ErrorKind::WouldBlock => Self::WouldBlock,
            io::ErrorKind::InvalidInput => Self::InvalidInput,
            io::ErrorKind::Interrupted => Self::Interrupted,
            _ => Self::Other(err.to_string()),
        }
    }
}
