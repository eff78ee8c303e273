//! Cooperative cancellation for long-running fetch loops.
//!
//! A [`CancelHandle`]/[`CancelToken`] pair built on `tokio::sync::watch`.
//! The fetcher checks the token between batches and races it against both
//! of its sleep points, so a Ctrl-C lands promptly even mid-backoff.

use std::time::Duration;

use tokio::sync::watch;

/// Sender half: trip this to stop the fetch loop.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    /// Signal cancellation. Idempotent.
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

/// Receiver half: polled and awaited by the fetch loop.
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Sleep for `duration`, waking early if cancellation is requested.
    ///
    /// Returns `true` if the sleep was interrupted by cancellation.
    pub async fn sleep(&self, duration: Duration) -> bool {
        let mut rx = self.rx.clone();
        tokio::select! {
            _ = tokio::time::sleep(duration) => false,
            _ = async {
                loop {
                    if *rx.borrow() {
                        break;
                    }
                    if rx.changed().await.is_err() {
                        // Handle dropped without cancelling: no signal can
                        // ever arrive, so let the sleep win.
                        std::future::pending::<()>().await;
                    }
                }
            } => true,
        }
    }
}

/// Create a connected handle/token pair.
pub fn channel() -> (CancelHandle, CancelToken) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancelToken { rx })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_starts_uncancelled() {
        let (_handle, token) = channel();
        assert!(!token.is_cancelled());
    }

    #[test]
    fn cancel_is_visible_and_idempotent() {
        let (handle, token) = channel();
        handle.cancel();
        handle.cancel();
        assert!(token.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn sleep_completes_when_not_cancelled() {
        let (_handle, token) = channel();
        let start = tokio::time::Instant::now();
        let interrupted = token.sleep(Duration::from_secs(10)).await;
        assert!(!interrupted);
        assert_eq!(start.elapsed(), Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn sleep_wakes_early_on_cancel() {
        let (handle, token) = channel();

        let sleeper = tokio::spawn(async move { token.sleep(Duration::from_secs(60)).await });

        tokio::time::sleep(Duration::from_secs(1)).await;
        handle.cancel();

        let interrupted = sleeper.await.unwrap();
        assert!(interrupted);
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_handle_does_not_interrupt_sleep() {
        let (handle, token) = channel();
        drop(handle);
        let interrupted = token.sleep(Duration::from_secs(3)).await;
        assert!(!interrupted);
    }

    #[tokio::test]
    async fn already_cancelled_sleep_returns_immediately() {
        let (handle, token) = channel();
        handle.cancel();
        let interrupted = token.sleep(Duration::from_secs(3600)).await;
        assert!(interrupted);
    }
}
