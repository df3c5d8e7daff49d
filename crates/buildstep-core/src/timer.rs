//! Cancellable timer waits.
//!
//! A pending wait is a future; cancelling it means dropping it, which is
//! exactly what happens when the interrupt branch wins the race. A wait
//! that lost the race can never fire afterwards.

use std::time::Duration;

use crate::Interrupt;

/// Why a [`wait_or_interrupt`] call returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Wakeup {
    Elapsed,
    Interrupted(String),
}

/// Wait for `delay` unless `interrupt` fires first.
///
/// A zero delay still yields to the scheduler once, so a step never
/// completes a timed wait without giving an interrupt the chance to land.
pub async fn wait_or_interrupt(delay: Duration, interrupt: &Interrupt) -> Wakeup {
    if delay.is_zero() {
        tokio::task::yield_now().await;
    }

    tokio::select! {
        biased;
        reason = interrupt.interrupted() => Wakeup::Interrupted(reason),
        () = tokio::time::sleep(delay) => Wakeup::Elapsed,
    }
}
