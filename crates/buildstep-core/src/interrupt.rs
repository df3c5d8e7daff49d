//! Interrupt token shared between a build and the step it is running.
//!
//! Interruption is monotonic: once requested it stays requested, and the
//! first reason wins. Waiters that subscribe after the request still see it.

use std::sync::Arc;

use tokio::sync::watch;

#[derive(Debug, Clone)]
pub struct Interrupt {
    reason_tx: Arc<watch::Sender<Option<String>>>,
}

impl Interrupt {
    #[must_use]
    pub fn new() -> Self {
        let (reason_tx, _) = watch::channel(None);
        Self {
            reason_tx: Arc::new(reason_tx),
        }
    }

    /// Request interruption. Returns `false` if it had already been requested.
    pub fn interrupt(&self, reason: impl Into<String>) -> bool {
        let reason = reason.into();
        let first = self.reason_tx.send_if_modified(|current| {
            if current.is_some() {
                false
            } else {
                *current = Some(reason.clone());
                true
            }
        });
        if first {
            tracing::info!(%reason, "Interrupt requested");
        }
        first
    }

    pub fn is_interrupted(&self) -> bool {
        self.reason_tx.borrow().is_some()
    }

    pub fn reason(&self) -> Option<String> {
        self.reason_tx.borrow().clone()
    }

    /// Resolves with the reason once interruption has been requested.
    pub async fn interrupted(&self) -> String {
        let mut reason_rx = self.reason_tx.subscribe();
        let reason = reason_rx
            .wait_for(Option::is_some)
            .await
            .map(|reason| reason.clone().unwrap_or_default());
        match reason {
            Ok(reason) => reason,
            // The sender lives in `self`, so the channel cannot close here.
            Err(_) => std::future::pending().await,
        }
    }
}

impl Default for Interrupt {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_first_reason_wins() {
        let interrupt = Interrupt::new();
        assert!(!interrupt.is_interrupted());

        assert!(interrupt.interrupt("user"));
        assert!(!interrupt.interrupt("timeout"));

        assert!(interrupt.is_interrupted());
        assert_eq!(interrupt.reason().as_deref(), Some("user"));
    }

    #[tokio::test]
    async fn test_waiter_sees_earlier_interrupt() {
        let interrupt = Interrupt::new();
        interrupt.interrupt("already");
        let reason = tokio::time::timeout(Duration::from_secs(1), interrupt.interrupted()).await;
        assert_eq!(reason.ok().as_deref(), Some("already"));
    }

    #[tokio::test]
    async fn test_clone_wakes_waiter() {
        let interrupt = Interrupt::new();
        let handle = interrupt.clone();

        let waiter = tokio::spawn(async move { interrupt.interrupted().await });
        tokio::task::yield_now().await;
        handle.interrupt("signal");

        let reason = waiter.await.unwrap_or_default();
        assert_eq!(reason, "signal");
    }

    #[test]
    fn test_waiter_stays_pending_until_interrupt() {
        let interrupt = Interrupt::new();
        let mut waiter = tokio_test::task::spawn(interrupt.interrupted());

        tokio_test::assert_pending!(waiter.poll());
        interrupt.interrupt("stop");

        assert!(waiter.is_woken());
        tokio_test::assert_ready_eq!(waiter.poll(), "stop".to_string());
    }
}
