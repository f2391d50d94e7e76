//! Bounded exponential-backoff polling.
//!
//! [`poll_with_backoff`] repeatedly runs an async probe until it yields a
//! value, fails terminally, the caller cancels, or a wall-clock budget runs
//! out. Time is read from an injected [`Clock`], so tests can simulate a full
//! fifteen-minute attestation wait instantly.

use std::future::Future;
use std::time::Duration;

use bon::Builder;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::traits::Clock;

/// Default first delay between attempts.
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_secs(5);

/// Default upper bound for a single delay.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(30);

/// Default growth factor applied after every attempt.
pub const DEFAULT_MULTIPLIER: f64 = 1.5;

/// Default wall-clock budget. Standard attestation finality for chains that
/// settle to Ethereum is 13-19 minutes.
pub const DEFAULT_BUDGET: Duration = Duration::from_secs(15 * 60);

/// Backoff policy for [`poll_with_backoff`].
///
/// # Examples
///
/// ```rust
/// use usdc_bridge::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::builder()
///     .initial_delay(Duration::from_secs(2))
///     .budget(Duration::from_secs(120))
///     .build();
///
/// assert_eq!(policy.delay_for_attempt(1), Duration::from_secs(2));
/// assert_eq!(policy.max_delay, Duration::from_secs(30));
/// ```
#[derive(Builder, Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    #[builder(default = DEFAULT_INITIAL_DELAY)]
    pub initial_delay: Duration,
    #[builder(default = DEFAULT_MULTIPLIER)]
    pub multiplier: f64,
    #[builder(default = DEFAULT_MAX_DELAY)]
    pub max_delay: Duration,
    /// Hard wall-clock limit across all attempts, independent of attempt count.
    #[builder(default = DEFAULT_BUDGET)]
    pub budget: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::attestation()
    }
}

impl RetryPolicy {
    /// Policy for standard attestation finality: 5 s growing by 1.5x up to
    /// 30 s, for at most 15 minutes.
    pub fn attestation() -> Self {
        Self {
            initial_delay: DEFAULT_INITIAL_DELAY,
            multiplier: DEFAULT_MULTIPLIER,
            max_delay: DEFAULT_MAX_DELAY,
            budget: DEFAULT_BUDGET,
        }
    }

    /// Policy for chains with fast native finality.
    pub fn fast() -> Self {
        Self {
            initial_delay: Duration::from_secs(2),
            multiplier: 1.5,
            max_delay: Duration::from_secs(10),
            budget: Duration::from_secs(5 * 60),
        }
    }

    /// Delay to wait after the given 1-based attempt.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(64) as i32;
        let factor = self.multiplier.max(1.0).powi(exponent);
        let secs = self.initial_delay.as_secs_f64() * factor;
        if !secs.is_finite() || secs >= self.max_delay.as_secs_f64() {
            self.max_delay
        } else {
            Duration::from_secs_f64(secs)
        }
    }
}

/// Why polling stopped without a value.
#[derive(Debug, PartialEq)]
pub enum PollError<E> {
    /// The budget was spent while the probe kept reporting "not yet".
    TimedOut { attempts: u32, elapsed: Duration },
    /// The caller's cancellation token fired.
    Cancelled { attempts: u32 },
    /// The probe reported a terminal failure.
    Failed(E),
}

/// Polls `probe` until it returns `Ok(Some(_))`.
///
/// `Ok(None)` means "not yet, keep polling"; `Err(_)` stops immediately. The
/// probe receives the 1-based attempt number. Sleeps are clipped so the
/// final attempt happens at the budget boundary instead of past it.
pub async fn poll_with_backoff<T, E, F, Fut>(
    clock: &dyn Clock,
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    mut probe: F,
) -> Result<T, PollError<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Option<T>, E>>,
{
    let started = clock.now();
    let mut attempt: u32 = 0;

    loop {
        if cancel.is_cancelled() {
            debug!(attempts = attempt, event = "poll_cancelled");
            return Err(PollError::Cancelled { attempts: attempt });
        }

        attempt += 1;
        match probe(attempt).await {
            Ok(Some(value)) => {
                debug!(attempts = attempt, event = "poll_resolved");
                return Ok(value);
            }
            Ok(None) => {}
            Err(e) => return Err(PollError::Failed(e)),
        }

        let elapsed = clock.now().saturating_duration_since(started);
        if elapsed >= policy.budget {
            warn!(
                attempts = attempt,
                elapsed_secs = elapsed.as_secs(),
                budget_secs = policy.budget.as_secs(),
                event = "poll_budget_exhausted"
            );
            return Err(PollError::TimedOut {
                attempts: attempt,
                elapsed,
            });
        }

        let delay = policy.delay_for_attempt(attempt).min(policy.budget - elapsed);
        debug!(
            attempt = attempt,
            delay_ms = delay.as_millis() as u64,
            event = "poll_pending"
        );

        tokio::select! {
            _ = clock.sleep(delay) => {}
            _ = cancel.cancelled() => {
                debug!(attempts = attempt, event = "poll_cancelled");
                return Err(PollError::Cancelled { attempts: attempt });
            }
        }
    }
}
