//! Command-line surface: argument definitions, setup and handlers.

pub mod commands;
pub mod handlers;
pub mod setup;
pub mod signals;

pub use commands::build_cli;
