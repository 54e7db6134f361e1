//! Rate limiter for polite use of shared public APIs.
//!
//! Each logical remote service (the geocoder, the spatial interpreter) owns
//! one `RateLimiter` with its own minimum delay. Callers may pipeline
//! several requests, but dispatch *timing* stays serialized: no two calls
//! through the same instance start less than `min_delay` apart.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::Instant;

/// Rate limiter enforcing a concurrency cap and a minimum dispatch interval.
pub struct RateLimiter {
    semaphore: Arc<Semaphore>,
    min_delay: Duration,
    last_dispatch: tokio::sync::Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Create a new rate limiter.
    ///
    /// - `max_in_flight`: how many requests may be in flight at once
    /// - `min_delay`: minimum spacing between request dispatches
    pub fn new(max_in_flight: usize, min_delay: Duration) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(max_in_flight.max(1))),
            min_delay,
            last_dispatch: tokio::sync::Mutex::new(None),
        }
    }

    /// Acquire permission to dispatch a request. Sleeps until the minimum
    /// interval since the previous dispatch through this instance has
    /// elapsed. The first dispatch never waits.
    pub async fn acquire(&self) -> RateLimitGuard {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .expect("limiter semaphore is never closed");

        {
            let mut last = self.last_dispatch.lock().await;
            if let Some(previous) = *last {
                let elapsed = previous.elapsed();
                if elapsed < self.min_delay {
                    tokio::time::sleep(self.min_delay - elapsed).await;
                }
            }
            *last = Some(Instant::now());
        }

        RateLimitGuard { _permit: permit }
    }

    /// The configured minimum spacing between dispatches.
    pub fn min_delay(&self) -> Duration {
        self.min_delay
    }
}

/// Guard that frees an in-flight slot when dropped.
pub struct RateLimitGuard {
    _permit: tokio::sync::OwnedSemaphorePermit,
}
