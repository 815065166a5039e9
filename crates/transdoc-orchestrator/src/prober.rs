//! Availability prober
//!
//! Object stores may not show a just-written object right away. Submitting a
//! job against an invisible input makes the remote service fail with a vague
//! error, so the input is confirmed with `head` first.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use transdoc_core::constants::MAX_PREFLIGHT_BACKOFF_MS;
use transdoc_storage::BlobStore;

/// Delay before retry number `attempt` (1-based): `base * 2^(attempt-1)`, capped.
pub(crate) fn compute_backoff_delay(base: Duration, attempt: u32) -> Duration {
    let factor = 2_u32.saturating_pow(attempt.saturating_sub(1));
    base.saturating_mul(factor)
        .min(Duration::from_millis(MAX_PREFLIGHT_BACKOFF_MS))
}

#[derive(Clone)]
pub struct AvailabilityProber {
    store: Arc<dyn BlobStore>,
    request_timeout: Duration,
}

impl AvailabilityProber {
    pub fn new(store: Arc<dyn BlobStore>, request_timeout: Duration) -> Self {
        Self {
            store,
            request_timeout,
        }
    }

    /// Check `key` up to `max_attempts` times with exponential backoff.
    ///
    /// Returns false once attempts are exhausted; whether that is fatal is up
    /// to the caller. Failed or timed-out checks count as "not visible yet".
    #[tracing::instrument(skip_all, fields(key = %key))]
    pub async fn wait_until_visible(&self, key: &str, max_attempts: u32, base_delay: Duration) -> bool {
        for attempt in 1..=max_attempts {
            match timeout(self.request_timeout, self.store.head(key)).await {
                Ok(Ok(true)) => {
                    tracing::debug!(attempt, "Input visible");
                    return true;
                }
                Ok(Ok(false)) => {
                    tracing::debug!(attempt, max_attempts, "Input not visible yet");
                }
                Ok(Err(e)) => {
                    tracing::warn!(attempt, error = %e, "Existence check failed");
                }
                Err(_) => {
                    tracing::warn!(
                        attempt,
                        timeout_ms = self.request_timeout.as_millis() as u64,
                        "Existence check timed out"
                    );
                }
            }

            if attempt < max_attempts {
                sleep(compute_backoff_delay(base_delay, attempt)).await;
            }
        }

        tracing::warn!(max_attempts, "Input never became visible");
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use transdoc_storage::MemoryStorage;

    #[test]
    fn backoff_doubles_and_caps() {
        let base = Duration::from_millis(500);
        assert_eq!(compute_backoff_delay(base, 1), Duration::from_millis(500));
        assert_eq!(compute_backoff_delay(base, 2), Duration::from_millis(1000));
        assert_eq!(compute_backoff_delay(base, 4), Duration::from_millis(4000));
        assert_eq!(compute_backoff_delay(base, 6), Duration::from_millis(10_000));
        assert_eq!(compute_backoff_delay(base, 40), Duration::from_millis(10_000));
    }

    #[tokio::test(start_paused = true)]
    async fn visible_after_lag() {
        let storage = MemoryStorage::with_visibility_lag(2);
        storage
            .put("uploads/1-a.pdf", Bytes::from_static(b"x"), None)
            .await
            .unwrap();
        let prober = AvailabilityProber::new(Arc::new(storage.clone()), Duration::from_secs(5));

        assert!(
            prober
                .wait_until_visible("uploads/1-a.pdf", 5, Duration::from_millis(100))
                .await
        );
        assert_eq!(storage.head_calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_attempts() {
        let storage = MemoryStorage::new();
        let prober = AvailabilityProber::new(Arc::new(storage.clone()), Duration::from_secs(5));

        assert!(
            !prober
                .wait_until_visible("uploads/missing.pdf", 5, Duration::from_millis(100))
                .await
        );
        assert_eq!(storage.head_calls(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn stays_visible_once_confirmed() {
        let storage = MemoryStorage::new();
        storage.insert_visible("uploads/1-a.pdf", "x");
        let prober = AvailabilityProber::new(Arc::new(storage), Duration::from_secs(5));

        for _ in 0..3 {
            assert!(
                prober
                    .wait_until_visible("uploads/1-a.pdf", 1, Duration::from_millis(100))
                    .await
            );
        }
    }
}
