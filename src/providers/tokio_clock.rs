//! Tokio-based clock implementation.

use async_trait::async_trait;
use std::time::{Duration, Instant};

use crate::traits::Clock;

/// Production clock backed by Tokio's timer.
///
/// `now` reads Tokio's clock rather than the OS clock, so a runtime started
/// with paused time (`#[tokio::test(start_paused = true)]`) auto-advances both
/// sleeps and budgets consistently.
///
/// # Examples
///
/// ```rust
/// use usdc_bridge::providers::TokioClock;
///
/// let clock = TokioClock::new();
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

impl TokioClock {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Clock for TokioClock {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    fn now(&self) -> Instant {
        tokio::time::Instant::now().into_std()
    }
}
