//! Attestation polling with endpoint fallback and caching.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use alloy_primitives::{Bytes, FixedBytes};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn, Instrument};

use crate::error::{BridgeError, Result};
use crate::protocol::AttestationStatus;
use crate::retry::{poll_with_backoff, PollError, RetryPolicy};
use crate::spans;
use crate::traits::{AttestationProvider, Clock};

/// Polls an ordered list of attestation endpoints until the attestation for
/// a message hash is available.
///
/// On each attempt endpoints are tried in order; an endpoint that errors is
/// skipped silently and the next one is asked. The first endpoint that
/// answers decides the attempt. Completed attestations are cached, so the
/// same hash never costs a second request.
pub struct AttestationPoller {
    providers: Vec<Arc<dyn AttestationProvider>>,
    clock: Arc<dyn Clock>,
    policy: RetryPolicy,
    cache: Mutex<HashMap<FixedBytes<32>, Bytes>>,
}

impl AttestationPoller {
    pub fn new(
        providers: Vec<Arc<dyn AttestationProvider>>,
        clock: Arc<dyn Clock>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            providers,
            clock,
            policy,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Cached attestation for a hash, if one has completed.
    pub fn cached(&self, message_hash: &FixedBytes<32>) -> Option<Bytes> {
        self.cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(message_hash)
            .cloned()
    }

    /// Waits for the attestation of `message_hash`.
    ///
    /// # Errors
    ///
    /// - [`BridgeError::AttestationTimeout`] when the policy budget is spent
    /// - [`BridgeError::AttestationFailed`] when an endpoint reports `failed`
    /// - [`BridgeError::Cancelled`] when `cancel` fires
    pub async fn fetch(
        &self,
        message_hash: FixedBytes<32>,
        cancel: &CancellationToken,
    ) -> Result<Bytes> {
        if let Some(attestation) = self.cached(&message_hash) {
            debug!(
                message_hash = %message_hash,
                event = "attestation_cache_hit"
            );
            return Ok(attestation);
        }

        let outcome = poll_with_backoff(self.clock.as_ref(), &self.policy, cancel, |attempt| {
            self.try_endpoints(message_hash, attempt)
        })
        .await;

        match outcome {
            Ok(attestation) => {
                info!(
                    message_hash = %message_hash,
                    attestation_length_bytes = attestation.len(),
                    event = "attestation_complete"
                );
                self.cache
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner())
                    .insert(message_hash, attestation.clone());
                Ok(attestation)
            }
            Err(PollError::TimedOut { attempts, elapsed }) => {
                let error = BridgeError::AttestationTimeout {
                    elapsed_secs: elapsed.as_secs(),
                    attempts,
                };
                spans::record_error(&error);
                Err(error)
            }
            Err(PollError::Cancelled { attempts }) => {
                info!(attempts = attempts, event = "attestation_polling_cancelled");
                Err(BridgeError::Cancelled)
            }
            Err(PollError::Failed(error)) => {
                spans::record_error(&error);
                Err(error)
            }
        }
    }

    /// One polling attempt across all endpoints.
    async fn try_endpoints(
        &self,
        message_hash: FixedBytes<32>,
        attempt: u32,
    ) -> Result<Option<Bytes>> {
        for provider in &self.providers {
            let endpoint = provider.endpoint();
            let response = match provider
                .get_attestation(message_hash)
                .instrument(spans::get_attestation(endpoint, attempt))
                .await
            {
                Ok(response) => response,
                Err(e) => {
                    debug!(
                        endpoint = endpoint,
                        attempt = attempt,
                        error = %e,
                        event = "attestation_endpoint_failed"
                    );
                    continue;
                }
            };

            if let Some(signature) = response
                .signature()
                .filter(|_| response.status == AttestationStatus::Complete)
            {
                return Ok(Some(signature));
            }

            if response.status == AttestationStatus::Failed {
                return Err(BridgeError::AttestationFailed {
                    reason: response
                        .error
                        .unwrap_or_else(|| "attestation service reported failure".to_string()),
                });
            }

            debug!(
                endpoint = endpoint,
                attempt = attempt,
                status = ?response.status,
                event = "attestation_pending"
            );
            return Ok(None);
        }

        warn!(
            attempt = attempt,
            endpoints = self.providers.len(),
            event = "all_attestation_endpoints_failed"
        );
        Ok(None)
    }
}
