//! # Buildstep Core
//!
//! Asynchronous, cancellable build steps for a sequential build runner.
//!
//! ## Laws (Compiler Enforced)
//!
//! - No `unwrap()` / `expect()` / `panic!()` outside tests - returns `Result` instead
//! - No `unsafe` - safe Rust only
//!
//! ## Steps
//!
//! - [`Delay`]: completes after a fixed time
//! - [`lock::AcquireLock`] / [`lock::ReleaseLock`]: exclusive advisory file
//!   lock, retried while contended, handed between steps through
//!   [`BuildProperties`]
//! - [`command::CommandStep`]: runs a program and judges its output with a
//!   [`command::CommandEvaluator`]
//!
//! Every step can be interrupted while it waits. A pending wait is dropped,
//! never fired late, and the step ends with an exception.

pub mod build;
pub mod command;
pub mod config;
mod delay;
mod error;
mod interrupt;
pub mod lifecycle;
pub mod lock;
pub mod observer;
mod properties;
mod status;
mod step;
pub mod timer;

pub use build::{Build, BuildReport, InterruptHandle};
pub use delay::Delay;
pub use error::{Error, IoErrorKind, Result};
pub use interrupt::Interrupt;
pub use lifecycle::LifecycleState;
pub use properties::{BuildProperties, PropertyKey};
pub use status::{Outcome, StepState, StepStatus};
pub use step::{run_step, Step, StepContext};
