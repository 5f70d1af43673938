//! Minimum spacing between upstream chain calls.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};

/// Process-wide limiter for calls to the chain-access provider.
///
/// Holds the async lock across its sleep, so waiters are released one at a
/// time in the order they arrived (tokio's mutex is fair).
#[derive(Debug)]
pub struct UpstreamRateLimiter {
    min_interval: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl UpstreamRateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_call: Mutex::new(None),
        }
    }

    /// Wait until at least `min_interval` has passed since the previous
    /// `acquire` returned.
    pub async fn acquire(&self) {
        let mut last_call = self.last_call.lock().await;

        if let Some(previous) = *last_call {
            let ready_at = previous + self.min_interval;
            if ready_at > Instant::now() {
                tracing::trace!(
                    wait_ms = (ready_at - Instant::now()).as_millis() as u64,
                    "Upstream rate limit: waiting"
                );
                sleep_until(ready_at).await;
            }
        }

        *last_call = Some(Instant::now());
    }
}
