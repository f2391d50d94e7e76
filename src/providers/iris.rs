//! Circle Iris API attestation provider implementation.

use alloy_primitives::{hex, FixedBytes};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::{debug, instrument, trace};
use url::Url;

use crate::bridge::{IRIS_API_SANDBOX_V1, IRIS_API_V1};
use crate::error::{BridgeError, Result};
use crate::protocol::AttestationResponse;
use crate::traits::AttestationProvider;

/// Attestation provider speaking the Iris v1 contract:
/// `GET {base}/attestations/{0x-messageHash}`.
///
/// The same type serves the authority's own endpoint, a same-origin proxy
/// and any alternate mirror, since all three expose the identical contract.
///
/// # Examples
///
/// ```rust,no_run
/// use usdc_bridge::providers::IrisAttestationProvider;
/// use usdc_bridge::AttestationProvider;
/// use alloy_primitives::FixedBytes;
///
/// # async fn example() -> Result<(), usdc_bridge::BridgeError> {
/// let provider = IrisAttestationProvider::production();
/// let message_hash: FixedBytes<32> = [0u8; 32].into();
/// let response = provider.get_attestation(message_hash).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct IrisAttestationProvider {
    base_url: String,
    client: Client,
}

impl IrisAttestationProvider {
    /// Creates a provider for the given base URL, e.g.
    /// `https://iris-api.circle.com/v1`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Creates a provider sharing an existing HTTP client.
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Creates a provider for Circle's production environment.
    pub fn production() -> Self {
        Self::new(IRIS_API_V1)
    }

    /// Creates a provider for Circle's sandbox (testnet) environment.
    pub fn sandbox() -> Self {
        Self::new(IRIS_API_SANDBOX_V1)
    }

    /// Full request URL for a message hash.
    pub fn attestation_url(&self, message_hash: FixedBytes<32>) -> Result<Url> {
        let url = format!(
            "{}/attestations/{}",
            self.base_url,
            hex::encode_prefixed(message_hash)
        );
        Ok(Url::parse(&url)?)
    }
}

#[async_trait]
impl AttestationProvider for IrisAttestationProvider {
    #[instrument(skip(self), fields(message_hash = %hex::encode(message_hash)))]
    async fn get_attestation(&self, message_hash: FixedBytes<32>) -> Result<AttestationResponse> {
        let url = self.attestation_url(message_hash)?;
        trace!(url = %url, event = "attestation_request_sent");

        let response = self.client.get(url).send().await?;
        let status_code = response.status();
        trace!(status_code = %status_code, event = "attestation_response_received");

        if status_code == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|h| h.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(300);

            debug!(
                retry_after_seconds = retry_after,
                endpoint = %self.base_url,
                event = "attestation_rate_limited"
            );
            return Err(BridgeError::Provider(format!(
                "rate limited by {}, retry after {retry_after}s",
                self.base_url
            )));
        }

        // The message is not indexed until the burn has a few confirmations.
        if status_code == StatusCode::NOT_FOUND {
            debug!(event = "attestation_not_indexed_yet");
            return Ok(AttestationResponse::pending());
        }

        response.error_for_status_ref()?;

        let body = response.text().await?;
        let attestation: AttestationResponse = serde_json::from_str(&body)?;
        debug!(status = ?attestation.status, event = "attestation_response_parsed");

        Ok(attestation)
    }

    fn endpoint(&self) -> &str {
        &self.base_url
    }
}
