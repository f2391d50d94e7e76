//! Manual fallback: send the user somewhere they can bridge by hand.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use alloy_primitives::U256;
use async_trait::async_trait;
use tracing::info;
use url::Url;

use super::bridge_trait::BridgeProtocol;
use super::config::ManualFallbackConfig;
use super::params::BridgeParams;
use super::result::{BridgeDetails, BridgeResult, BridgeStatus, Estimate};
use super::status::{BridgeStage, StatusReporter};
use crate::chain::Chain;
use crate::error::Result;
use crate::health::{HealthTracker, ProtocolHealth};

/// Protocol name reported by [`ManualFallbackProtocol`].
pub const MANUAL_PROTOCOL: &str = "manual";

/// Rough time for a user to complete a transfer by hand.
const MANUAL_ESTIMATE: Duration = Duration::from_secs(30 * 60);

/// Degenerate protocol that never moves funds.
///
/// It supports every route, always validates and is always healthy, so an
/// orchestrator always has something to offer. `bridge()` succeeds with
/// status `manual_action_required` and a redirect URL carrying the route.
#[derive(Debug)]
pub struct ManualFallbackProtocol {
    config: ManualFallbackConfig,
    health: HealthTracker,
}

impl Default for ManualFallbackProtocol {
    fn default() -> Self {
        Self::new(ManualFallbackConfig::default())
    }
}

impl ManualFallbackProtocol {
    pub fn new(config: ManualFallbackConfig) -> Self {
        Self {
            config,
            health: HealthTracker::new(MANUAL_PROTOCOL),
        }
    }

    /// Redirect URL for a transfer:
    /// `{base}?from=..&to=..&amount=..&recipient=..`.
    pub fn redirect_url(&self, params: &BridgeParams) -> Result<Url> {
        let mut url = Url::parse(&self.config.redirect_base_url)?;
        url.query_pairs_mut()
            .append_pair("from", &params.source_chain().to_string())
            .append_pair("to", &params.destination_chain().to_string())
            .append_pair("amount", params.amount())
            .append_pair("recipient", params.destination_address());
        Ok(url)
    }
}

#[async_trait]
impl BridgeProtocol for ManualFallbackProtocol {
    fn name(&self) -> &str {
        MANUAL_PROTOCOL
    }

    fn supports(&self, _source: Chain, _destination: Chain) -> bool {
        true
    }

    async fn estimate(&self, _params: &BridgeParams) -> Result<Estimate> {
        Ok(Estimate {
            fee: U256::ZERO,
            time: MANUAL_ESTIMATE,
        })
    }

    fn validate(&self, _params: &BridgeParams) -> Result<()> {
        Ok(())
    }

    async fn bridge(&self, params: &BridgeParams) -> Result<BridgeResult> {
        let url = self.redirect_url(params)?;
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        let bridge_id = if params.is_dry_run() {
            format!("dryrun-{MANUAL_PROTOCOL}-{millis}")
        } else {
            format!("{MANUAL_PROTOCOL}-{millis}")
        };

        info!(
            bridge_id = %bridge_id,
            redirect_url = %url,
            event = "manual_bridge_redirect"
        );

        StatusReporter::new(params.status_tx().cloned()).report(
            BridgeStage::ManualActionRequired,
            format!("Complete the transfer at {url}"),
        );

        if !params.is_dry_run() {
            self.health.record_success(Duration::ZERO);
        }

        Ok(BridgeResult::succeeded(
            MANUAL_PROTOCOL,
            BridgeStatus::ManualActionRequired,
            bridge_id,
            BridgeDetails {
                recipient: Some(params.destination_address().to_string()),
                redirect_url: Some(url.to_string()),
                ..Default::default()
            },
        ))
    }

    fn health(&self) -> ProtocolHealth {
        ProtocolHealth {
            is_healthy: true,
            ..self.health.snapshot()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_chains::NamedChain;
    use tokio::sync::mpsc;

    fn params() -> BridgeParams {
        BridgeParams::builder()
            .source_chain(Chain::Solana)
            .destination_chain(Chain::Evm(NamedChain::Base))
            .amount("12.5")
            .destination_address("0x742d35Cc6634C0532925a3b844Bc9e7595f8fA0d")
            .build()
    }

    #[test]
    fn test_redirect_url() {
        let url = ManualFallbackProtocol::default()
            .redirect_url(&params())
            .unwrap();
        insta::assert_snapshot!(url.as_str(), @"https://portalbridge.com/?from=solana&to=base&amount=12.5&recipient=0x742d35Cc6634C0532925a3b844Bc9e7595f8fA0d");
    }

    #[tokio::test]
    async fn test_bridge_returns_manual_action() {
        let protocol = ManualFallbackProtocol::default();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let params = BridgeParams::builder()
            .source_chain(Chain::Evm(NamedChain::Arbitrum))
            .destination_chain(Chain::Evm(NamedChain::Base))
            .amount("1")
            .destination_address("not-validated")
            .status_tx(tx)
            .build();

        assert!(protocol.validate(&params).is_ok());
        let result = protocol.bridge(&params).await.unwrap();

        assert!(result.success());
        assert_eq!(result.status(), BridgeStatus::ManualActionRequired);
        assert!(result.bridge_id().starts_with("manual-"));
        assert!(result
            .details()
            .redirect_url
            .as_deref()
            .unwrap()
            .contains("from=arbitrum"));
        assert_eq!(rx.try_recv().unwrap().stage, BridgeStage::ManualActionRequired);
        assert!(protocol.health().is_healthy);
    }

    #[tokio::test]
    async fn test_supports_everything_for_free() {
        let protocol = ManualFallbackProtocol::default();
        assert!(protocol.supports(Chain::SolanaDevnet, Chain::Evm(NamedChain::Polygon)));

        let estimate = protocol.estimate(&params()).await.unwrap();
        assert_eq!(estimate.fee, U256::ZERO);
    }
}
