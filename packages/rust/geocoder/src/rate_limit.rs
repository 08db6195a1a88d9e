//! Request throttling between geocoding calls.

use std::time::Duration;

use async_trait::async_trait;

/// Pause policy applied after every query.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Wait until the next request may be sent.
    async fn pause(&self);
}

/// Fixed pause after each request.
///
/// Nominatim's public usage policy allows at most one request per second.
#[derive(Debug, Clone, Copy)]
pub struct FixedDelay {
    delay: Duration,
}

impl FixedDelay {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Default for FixedDelay {
    fn default() -> Self {
        Self::from_millis(1000)
    }
}

#[async_trait]
impl RateLimiter for FixedDelay {
    async fn pause(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

/// No throttling. For tests and self-hosted providers.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

#[async_trait]
impl RateLimiter for NoDelay {
    async fn pause(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn fixed_delay_waits_at_least_delay() {
        let limiter = FixedDelay::from_millis(30);
        let start = Instant::now();
        limiter.pause().await;
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[tokio::test]
    async fn no_delay_returns_immediately() {
        let start = Instant::now();
        NoDelay.pause().await;
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[test]
    fn default_delay_is_one_second() {
        assert_eq!(FixedDelay::default().delay(), Duration::from_secs(1));
    }
}
