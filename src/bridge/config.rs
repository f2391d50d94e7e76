use std::env;
use std::sync::Arc;
use std::time::Duration;

use alloy_chains::NamedChain;
use bon::Builder;
use tracing::debug;
use url::Url;

use crate::chain::Chain;
use crate::error::Result;
use crate::providers::{IrisAttestationProvider, DEFAULT_CONFIRMATION_TIMEOUT};
use crate::retry::RetryPolicy;
use crate::traits::AttestationProvider;

/// Circle Iris API v1 base URLs
///
/// See <https://developers.circle.com/stablecoins/cctp-apis>
pub const IRIS_API_V1: &str = "https://iris-api.circle.com/v1";
pub const IRIS_API_SANDBOX_V1: &str = "https://iris-api-sandbox.circle.com/v1";

/// Same-origin proxy in front of the attestation API.
pub const ENV_ATTESTATION_PROXY_URL: &str = "BRIDGE_ATTESTATION_PROXY_URL";
/// Overrides the authority's direct endpoint.
pub const ENV_ATTESTATION_API_URL: &str = "BRIDGE_ATTESTATION_API_URL";
/// Mirror consulted after the direct endpoint.
pub const ENV_ATTESTATION_ALT_URL: &str = "BRIDGE_ATTESTATION_ALT_URL";

/// Default redirect target of the manual fallback.
pub const DEFAULT_MANUAL_REDIRECT_URL: &str = "https://portalbridge.com/";

/// Attestation endpoints, consulted in order on every polling attempt:
/// proxy (if any), direct, alternate (if any).
///
/// # Examples
///
/// ```rust
/// use usdc_bridge::AttestationEndpoints;
///
/// let endpoints = AttestationEndpoints::builder()
///     .proxy("https://app.example.com/api/attestation")
///     .direct("https://iris-api.circle.com/v1")
///     .build();
///
/// assert_eq!(endpoints.urls().len(), 2);
/// ```
#[derive(Builder, Debug, Clone, PartialEq, Eq)]
pub struct AttestationEndpoints {
    #[builder(into)]
    pub proxy: Option<String>,
    #[builder(into, default = IRIS_API_V1.to_string())]
    pub direct: String,
    #[builder(into)]
    pub alternate: Option<String>,
}

impl Default for AttestationEndpoints {
    fn default() -> Self {
        Self::production()
    }
}

impl AttestationEndpoints {
    pub fn production() -> Self {
        Self {
            proxy: None,
            direct: IRIS_API_V1.to_string(),
            alternate: None,
        }
    }

    pub fn sandbox() -> Self {
        Self {
            proxy: None,
            direct: IRIS_API_SANDBOX_V1.to_string(),
            alternate: None,
        }
    }

    /// Reads endpoint overrides from the environment (and a `.env` file if
    /// present), falling back to Circle's production or sandbox API.
    ///
    /// Every configured URL must parse.
    pub fn from_env(testnet: bool) -> Result<Self> {
        dotenvy::dotenv().ok();

        let base = if testnet {
            Self::sandbox()
        } else {
            Self::production()
        };

        let endpoints = Self {
            proxy: non_empty_var(ENV_ATTESTATION_PROXY_URL),
            direct: non_empty_var(ENV_ATTESTATION_API_URL).unwrap_or(base.direct),
            alternate: non_empty_var(ENV_ATTESTATION_ALT_URL),
        };

        for url in endpoints.urls() {
            Url::parse(url)?;
        }

        debug!(
            proxy = ?endpoints.proxy,
            direct = %endpoints.direct,
            alternate = ?endpoints.alternate,
            event = "attestation_endpoints_loaded"
        );
        Ok(endpoints)
    }

    /// Endpoints in consultation order.
    pub fn urls(&self) -> Vec<&str> {
        self.proxy
            .iter()
            .chain(std::iter::once(&self.direct))
            .chain(self.alternate.iter())
            .map(String::as_str)
            .collect()
    }

    /// One HTTP provider per endpoint, in consultation order.
    pub fn providers(&self) -> Vec<Arc<dyn AttestationProvider>> {
        self.urls()
            .into_iter()
            .map(|url| Arc::new(IrisAttestationProvider::new(url)) as Arc<dyn AttestationProvider>)
            .collect()
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Configuration for the attestation (burn-and-mint) protocol.
///
/// # Examples
///
/// ```rust
/// use usdc_bridge::{AttestationBridgeConfig, Chain};
/// use alloy_chains::NamedChain;
///
/// let config = AttestationBridgeConfig::builder().build();
/// assert_eq!(config.settlement_chain, Chain::Evm(NamedChain::Base));
/// assert!(config.source_chains().contains(&Chain::Solana));
///
/// let testnet = AttestationBridgeConfig::testnet();
/// assert!(testnet.source_chains().contains(&Chain::SolanaDevnet));
/// ```
#[derive(Builder, Debug, Clone, PartialEq)]
pub struct AttestationBridgeConfig {
    /// Chain every transfer settles on.
    #[builder(default = Chain::Evm(NamedChain::Base))]
    pub settlement_chain: Chain,
    /// Chains a transfer may start from. Empty means the defaults for the
    /// settlement chain's environment.
    #[builder(default)]
    pub source_chains: Vec<Chain>,
    /// Attestation endpoints. `None` means Circle's API for the settlement
    /// chain's environment.
    pub endpoints: Option<AttestationEndpoints>,
    #[builder(default = RetryPolicy::attestation())]
    pub retry: RetryPolicy,
    /// Longest wait for a submitted transaction to be confirmed.
    #[builder(default = DEFAULT_CONFIRMATION_TIMEOUT)]
    pub confirmation_timeout: Duration,
}

impl Default for AttestationBridgeConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl AttestationBridgeConfig {
    /// Settles on Base Sepolia and polls the sandbox API.
    pub fn testnet() -> Self {
        Self::builder()
            .settlement_chain(Chain::Evm(NamedChain::BaseSepolia))
            .build()
    }

    pub fn source_chains(&self) -> Vec<Chain> {
        if !self.source_chains.is_empty() {
            return self.source_chains.clone();
        }

        if self.settlement_chain.is_testnet() {
            vec![
                Chain::Evm(NamedChain::Sepolia),
                Chain::Evm(NamedChain::ArbitrumSepolia),
                Chain::SolanaDevnet,
            ]
        } else {
            vec![
                Chain::Evm(NamedChain::Mainnet),
                Chain::Evm(NamedChain::Arbitrum),
                Chain::Evm(NamedChain::Optimism),
                Chain::Evm(NamedChain::Avalanche),
                Chain::Evm(NamedChain::Polygon),
                Chain::Solana,
            ]
        }
    }

    pub fn endpoints(&self) -> AttestationEndpoints {
        match &self.endpoints {
            Some(endpoints) => endpoints.clone(),
            None if self.settlement_chain.is_testnet() => AttestationEndpoints::sandbox(),
            None => AttestationEndpoints::production(),
        }
    }
}

/// Configuration for the manual fallback.
#[derive(Builder, Debug, Clone, PartialEq, Eq)]
pub struct ManualFallbackConfig {
    /// Page the user is sent to; route parameters are appended as a query.
    #[builder(into, default = DEFAULT_MANUAL_REDIRECT_URL.to_string())]
    pub redirect_base_url: String,
}

impl Default for ManualFallbackConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_order() {
        let endpoints = AttestationEndpoints::builder()
            .proxy("https://app.example.com/api/attestation")
            .alternate("https://mirror.example.com/v1")
            .build();

        assert_eq!(
            endpoints.urls(),
            vec![
                "https://app.example.com/api/attestation",
                IRIS_API_V1,
                "https://mirror.example.com/v1"
            ]
        );
        assert_eq!(endpoints.providers().len(), 3);
    }

    // Sole reader and writer of the attestation env vars.
    #[test]
    fn test_endpoints_from_env() {
        let keys = [
            ENV_ATTESTATION_PROXY_URL,
            ENV_ATTESTATION_API_URL,
            ENV_ATTESTATION_ALT_URL,
        ];
        for key in keys {
            env::remove_var(key);
        }

        assert_eq!(
            AttestationEndpoints::from_env(false).unwrap(),
            AttestationEndpoints::production()
        );
        assert_eq!(
            AttestationEndpoints::from_env(true).unwrap(),
            AttestationEndpoints::sandbox()
        );

        env::set_var(ENV_ATTESTATION_PROXY_URL, "https://app.example.com/api/attestation");
        env::set_var(ENV_ATTESTATION_API_URL, "  ");
        env::set_var(ENV_ATTESTATION_ALT_URL, "https://mirror.example.com/v1");
        let endpoints = AttestationEndpoints::from_env(true).unwrap();
        assert_eq!(
            endpoints.urls(),
            vec![
                "https://app.example.com/api/attestation",
                IRIS_API_SANDBOX_V1,
                "https://mirror.example.com/v1"
            ]
        );

        env::set_var(ENV_ATTESTATION_API_URL, "not a url");
        let result = AttestationEndpoints::from_env(false);

        for key in keys {
            env::remove_var(key);
        }
        assert!(matches!(result, Err(crate::BridgeError::Url(_))));
    }

    #[test]
    fn test_testnet_settlement_uses_sandbox() {
        let config = AttestationBridgeConfig::testnet();
        assert_eq!(config.endpoints(), AttestationEndpoints::sandbox());
        assert!(!config.source_chains().contains(&Chain::Solana));
    }

    #[test]
    fn test_explicit_sources_override_defaults() {
        let config = AttestationBridgeConfig::builder()
            .source_chains(vec![Chain::Evm(NamedChain::Arbitrum)])
            .build();
        assert_eq!(config.source_chains(), vec![Chain::Evm(NamedChain::Arbitrum)]);
        assert_eq!(config.retry, RetryPolicy::attestation());
    }

    #[test]
    fn test_manual_default_redirect() {
        assert_eq!(
            ManualFallbackConfig::default().redirect_base_url,
            DEFAULT_MANUAL_REDIRECT_URL
        );
    }
}
