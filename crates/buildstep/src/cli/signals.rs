//! Turn SIGINT / SIGTERM into a build interrupt.
//!
//! The first signal interrupts the build so always-run steps can unwind.
//! A second one exits immediately.

use anyhow::{Context, Result};
use buildstep_core::InterruptHandle;

/// Exit code when a repeated signal cuts the unwind short.
pub const FORCED_EXIT_CODE: i32 = 130;

/// Interrupt the build for `received`. Returns `false` once the build had
/// already been interrupted, i.e. the caller should stop waiting and exit.
fn interrupt_or_force(handle: &InterruptHandle, received: &str) -> bool {
    if handle.interrupt(format!("received {received}")) {
        tracing::info!("Received {received}, interrupting build");
        true
    } else {
        tracing::warn!("Received {received} again, exiting without cleanup");
        false
    }
}

#[allow(clippy::exit)]
fn force_exit() -> ! {
    std::process::exit(FORCED_EXIT_CODE)
}

/// Spawn a task that interrupts the build on termination signals.
///
/// # Errors
/// Returns an error if the signal handlers cannot be installed
#[cfg(unix)]
pub fn forward_signals(handle: InterruptHandle) -> Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigint = signal(SignalKind::interrupt()).context("Failed to setup SIGINT")?;
    let mut sigterm = signal(SignalKind::terminate()).context("Failed to setup SIGTERM")?;

    tokio::spawn(async move {
        loop {
            let received = tokio::select! {
                _ = sigint.recv() => "SIGINT",
                _ = sigterm.recv() => "SIGTERM",
            };
            if !interrupt_or_force(&handle, received) {
                force_exit();
            }
        }
    });
    Ok(())
}

/// # Errors
/// Never fails on this platform
#[cfg(not(unix))]
pub fn forward_signals(handle: InterruptHandle) -> Result<()> {
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if !interrupt_or_force(&handle, "Ctrl-C") {
                force_exit();
            }
        }
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use buildstep_core::Build;

    use super::*;

    #[test]
    fn test_second_signal_requests_forced_exit() {
        let build = Build::new();
        let handle = build.interrupt_handle();

        assert!(interrupt_or_force(&handle, "SIGINT"));
        assert!(handle.is_interrupted());
        assert!(!interrupt_or_force(&handle, "SIGINT"));
        assert!(!interrupt_or_force(&handle, "SIGTERM"));
    }
}
