//! Request pacing for the fetchers.
//!
//! Each fetcher owns one [`RateGate`]: a single-slot pacing gate that
//! enforces a minimum interval between consecutive requests from that
//! instance. This is not a token bucket — there is no burst allowance, only
//! "sleep the remainder if the last request was too recent". The gate is
//! per-instance state; callers sharing one fetcher across tasks are
//! serialized by the internal mutex.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

pub struct RateGate {
    min_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl RateGate {
    #[must_use]
    pub fn new(min_interval_ms: u64) -> Self {
        Self {
            min_interval: Duration::from_millis(min_interval_ms),
            last_request: Mutex::new(None),
        }
    }

    /// Sleeps until at least `min_interval` has elapsed since the previous
    /// call, then records the current instant as the new "last request".
    ///
    /// The lock is held across the sleep so concurrent callers cannot slip
    /// through the gate together.
    pub async fn wait(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}

/// Linear backoff delay before retry `attempt` (1-based): `base_ms * attempt`.
#[must_use]
pub fn backoff_delay(base_ms: u64, attempt: u32) -> Duration {
    Duration::from_millis(base_ms.saturating_mul(u64::from(attempt)))
}
