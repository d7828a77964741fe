//! Global attempt pacing
//!
//! A token bucket shared by all workers. Capacity is a single token, so
//! the configured rate is a hard ceiling with no burst: at 10 attempts
//! per second, 100 candidates take at least ten seconds of wall clock.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

/// Shared token bucket limiting sustained attempts per second.
pub struct RateLimiter {
    rate_per_sec: f64,
    state: Mutex<BucketState>,
}

impl RateLimiter {
    /// A limiter permitting `rate_per_sec` sustained acquisitions.
    /// A rate of zero or below disables limiting.
    pub fn new(rate_per_sec: f64) -> Self {
        Self {
            rate_per_sec,
            state: Mutex::new(BucketState {
                tokens: 1.0,
                last_refill: Instant::now(),
            }),
        }
    }

    pub fn is_unlimited(&self) -> bool {
        self.rate_per_sec <= 0.0
    }

    /// Wait until an attempt may proceed. Fair only in aggregate; the
    /// guarantee is the sustained rate, not per-worker ordering.
    pub async fn acquire(&self) {
        if self.is_unlimited() {
            return;
        }

        loop {
            let wait = {
                let mut state = self.state.lock().await;
                let now = Instant::now();
                let elapsed = now.duration_since(state.last_refill).as_secs_f64();
                state.tokens = (state.tokens + elapsed * self.rate_per_sec).min(1.0);
                state.last_refill = now;

                if state.tokens >= 1.0 {
                    state.tokens -= 1.0;
                    None
                } else {
                    Some(Duration::from_secs_f64(
                        (1.0 - state.tokens) / self.rate_per_sec,
                    ))
                }
            };

            match wait {
                None => return,
                Some(delay) => tokio::time::sleep(delay).await,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Instant as StdInstant;

    #[tokio::test]
    async fn test_unlimited_rate_never_waits() {
        let limiter = RateLimiter::new(0.0);
        let start = StdInstant::now();
        for _ in 0..1_000 {
            limiter.acquire().await;
        }
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_sustained_rate_is_a_floor_on_wall_clock() {
        // 50/s with 10 acquisitions must take at least ~180ms
        // (the first token is free).
        let limiter = RateLimiter::new(50.0);
        let start = StdInstant::now();
        for _ in 0..10 {
            limiter.acquire().await;
        }
        assert!(start.elapsed() >= Duration::from_millis(170));
    }

    #[tokio::test]
    async fn test_rate_holds_across_concurrent_workers() {
        let limiter = Arc::new(RateLimiter::new(100.0));
        let start = StdInstant::now();

        let mut handles = Vec::new();
        for _ in 0..4 {
            let limiter = Arc::clone(&limiter);
            handles.push(tokio::spawn(async move {
                for _ in 0..5 {
                    limiter.acquire().await;
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        // 20 acquisitions at 100/s need at least ~190ms regardless of
        // how many tasks share the limiter.
        assert!(start.elapsed() >= Duration::from_millis(180));
    }
}
