//! Per-protocol health tracking.
//!
//! Each protocol instance owns one [`HealthTracker`] and updates it exactly
//! once per executed `bridge()` call. Orchestrators read the resulting
//! [`ProtocolHealth`] snapshot to decide which mechanism to offer.

use std::sync::Mutex;
use std::time::{Duration, SystemTime};

use serde::Serialize;
use tracing::{info, warn};

/// Consecutive failures at which a protocol is marked unhealthy.
pub const MAX_CONSECUTIVE_FAILURES: u32 = 5;

/// Success rate below which a protocol is marked unhealthy.
pub const MIN_SUCCESS_RATE: f64 = 0.70;

/// Observations required before the success-rate floor applies.
pub const MIN_OBSERVATIONS_FOR_RATE: u64 = 5;

/// Success rate reported before any observation.
pub const PRIOR_SUCCESS_RATE: f64 = 0.95;

/// Average duration reported before any success: the attestation ceiling.
pub const PRIOR_AVERAGE_TIME: Duration = Duration::from_secs(15 * 60);

/// Point-in-time health of one protocol.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolHealth {
    pub protocol: String,
    pub is_healthy: bool,
    pub success_rate: f64,
    #[serde(rename = "averageTimeMs", serialize_with = "serialize_millis")]
    pub average_time: Duration,
    pub consecutive_failures: u32,
    pub last_failure: Option<SystemTime>,
}

fn serialize_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

#[derive(Debug, Default)]
struct Counters {
    successes: u64,
    failures: u64,
    consecutive_failures: u32,
    total_success_time: Duration,
    last_failure: Option<SystemTime>,
}

/// Rolling success/failure counters for one protocol instance.
///
/// Counters sit behind a mutex so a protocol shared across tasks updates
/// them atomically.
#[derive(Debug)]
pub struct HealthTracker {
    protocol: String,
    counters: Mutex<Counters>,
}

impl HealthTracker {
    pub fn new(protocol: impl Into<String>) -> Self {
        Self {
            protocol: protocol.into(),
            counters: Mutex::new(Counters::default()),
        }
    }

    /// Protocol this tracker reports for.
    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    pub fn record_success(&self, elapsed: Duration) {
        let mut counters = self.lock();
        counters.successes += 1;
        counters.total_success_time += elapsed;
        counters.consecutive_failures = 0;

        info!(
            protocol = %self.protocol,
            elapsed_ms = elapsed.as_millis() as u64,
            successes = counters.successes,
            event = "protocol_success_recorded"
        );
    }

    pub fn record_failure(&self) {
        self.record_failure_at(SystemTime::now());
    }

    pub fn record_failure_at(&self, at: SystemTime) {
        let mut counters = self.lock();
        counters.failures += 1;
        counters.consecutive_failures = counters.consecutive_failures.saturating_add(1);
        counters.last_failure = Some(at);

        warn!(
            protocol = %self.protocol,
            consecutive_failures = counters.consecutive_failures,
            failures = counters.failures,
            event = "protocol_failure_recorded"
        );
    }

    /// Current health snapshot.
    pub fn snapshot(&self) -> ProtocolHealth {
        let counters = self.lock();
        let total = counters.successes + counters.failures;

        let success_rate = if total == 0 {
            PRIOR_SUCCESS_RATE
        } else {
            counters.successes as f64 / total as f64
        };

        let average_time = if counters.successes == 0 {
            PRIOR_AVERAGE_TIME
        } else {
            counters.total_success_time / counters.successes as u32
        };

        let too_many_failures = counters.consecutive_failures >= MAX_CONSECUTIVE_FAILURES;
        let rate_too_low = total >= MIN_OBSERVATIONS_FOR_RATE && success_rate < MIN_SUCCESS_RATE;

        ProtocolHealth {
            protocol: self.protocol.clone(),
            is_healthy: !(too_many_failures || rate_too_low),
            success_rate,
            average_time,
            consecutive_failures: counters.consecutive_failures,
            last_failure: counters.last_failure,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Counters> {
        // Counters stay consistent even if a holder panicked mid-update.
        self.counters
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
