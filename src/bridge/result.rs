//! Outcome types returned by [`BridgeProtocol`](super::BridgeProtocol).

use std::time::Duration;

use alloy_primitives::{Bytes, FixedBytes, U256};
use serde::Serialize;

use crate::classifier::classify_error;
use crate::error::{BridgeError, ErrorCode};

/// Coarse state of a transfer when its result was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BridgeStatus {
    /// Nothing was submitted (dry run).
    Pending,
    /// Attested but not yet minted. With `requires_manual_mint` set, the
    /// caller holds everything needed to redeem on the destination chain.
    Minting,
    Complete,
    ManualActionRequired,
    Failed,
}

/// Recovery and diagnostic data attached to a result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<Bytes>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_hash: Option<FixedBytes<32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attestation: Option<Bytes>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient: Option<String>,
    pub requires_manual_mint: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mint_error: Option<String>,
}

/// Final outcome of one `bridge()` call. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeResult {
    success: bool,
    protocol: String,
    status: BridgeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    source_tx_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    destination_tx_hash: Option<String>,
    bridge_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_code: Option<ErrorCode>,
    suggest_fallback: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    fallback_reason: Option<String>,
    details: BridgeDetails,
}

impl BridgeResult {
    pub(crate) fn succeeded(
        protocol: &str,
        status: BridgeStatus,
        bridge_id: String,
        details: BridgeDetails,
    ) -> Self {
        Self {
            success: true,
            protocol: protocol.to_string(),
            status,
            source_tx_hash: None,
            destination_tx_hash: None,
            bridge_id,
            error: None,
            error_code: None,
            suggest_fallback: false,
            fallback_reason: None,
            details,
        }
    }

    /// A failed result, classified through the error taxonomy.
    pub(crate) fn failed(
        protocol: &str,
        bridge_id: String,
        error: &BridgeError,
        details: BridgeDetails,
    ) -> Self {
        let classification = classify_error(error);
        Self {
            success: false,
            protocol: protocol.to_string(),
            status: BridgeStatus::Failed,
            source_tx_hash: None,
            destination_tx_hash: None,
            bridge_id,
            error: Some(error.to_string()),
            error_code: Some(classification.code),
            suggest_fallback: classification.suggest_fallback,
            fallback_reason: classification.fallback_reason.map(str::to_string),
            details,
        }
    }

    pub(crate) fn with_source_tx(mut self, tx_hash: Option<String>) -> Self {
        self.source_tx_hash = tx_hash;
        self
    }

    /// Withdraws the fallback suggestion, for failures where starting another
    /// mechanism could move the same funds twice.
    pub(crate) fn without_fallback(mut self) -> Self {
        self.suggest_fallback = false;
        self.fallback_reason = None;
        self
    }

    pub(crate) fn with_destination_tx(mut self, tx_hash: String) -> Self {
        self.destination_tx_hash = Some(tx_hash);
        self
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    pub fn status(&self) -> BridgeStatus {
        self.status
    }

    pub fn source_tx_hash(&self) -> Option<&str> {
        self.source_tx_hash.as_deref()
    }

    pub fn destination_tx_hash(&self) -> Option<&str> {
        self.destination_tx_hash.as_deref()
    }

    pub fn bridge_id(&self) -> &str {
        &self.bridge_id
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn error_code(&self) -> Option<ErrorCode> {
        self.error_code
    }

    pub fn suggest_fallback(&self) -> bool {
        self.suggest_fallback
    }

    pub fn fallback_reason(&self) -> Option<&str> {
        self.fallback_reason.as_deref()
    }

    pub fn details(&self) -> &BridgeDetails {
        &self.details
    }
}

/// Non-binding cost and latency for a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Estimate {
    /// Protocol fee in USDC base units (6 decimals). Gas is not included.
    pub fee: U256,
    pub time: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_result_carries_classification() {
        let error = BridgeError::AttestationTimeout {
            elapsed_secs: 900,
            attempts: 34,
        };
        let details = BridgeDetails {
            message_hash: Some(FixedBytes::from([7u8; 32])),
            ..Default::default()
        };

        let result = BridgeResult::failed("cctp", "cctp-0707".to_string(), &error, details)
            .with_source_tx(Some("0xburn".to_string()));

        assert!(!result.success());
        assert_eq!(result.status(), BridgeStatus::Failed);
        assert_eq!(result.error_code(), Some(ErrorCode::AttestationTimeout));
        assert!(result.suggest_fallback());
        assert!(result.fallback_reason().is_some());
        assert_eq!(result.source_tx_hash(), Some("0xburn"));
        assert!(result.details().message_hash.is_some());
    }

    #[test]
    fn test_serialized_shape() {
        let result = BridgeResult::succeeded(
            "manual",
            BridgeStatus::ManualActionRequired,
            "manual-1".to_string(),
            BridgeDetails {
                redirect_url: Some("https://portalbridge.com/?from=solana".to_string()),
                ..Default::default()
            },
        );

        let json = serde_json::to_string_pretty(&result).unwrap();
        insta::assert_snapshot!(json, @r###"
        {
          "success": true,
          "protocol": "manual",
          "status": "manual_action_required",
          "bridgeId": "manual-1",
          "suggestFallback": false,
          "details": {
            "requiresManualMint": false,
            "redirectUrl": "https://portalbridge.com/?from=solana"
          }
        }
        "###);
    }
}
