use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::classifier;

/// Fixed failure taxonomy shared by every bridging protocol.
///
/// Orchestrators branch on these codes (and on the fallback hint that the
/// [`classifier`](crate::classifier) attaches to them), so variants are never
/// renamed once published.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    WalletRejected,
    InsufficientFunds,
    NonceError,
    TransactionTimeout,
    TransactionFailed,
    AttestationTimeout,
    AttestationFailed,
    UnsupportedRoute,
    ProtocolUnavailable,
    Unknown,
}

impl ErrorCode {
    /// Wire representation, e.g. `ATTESTATION_TIMEOUT`.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::WalletRejected => "WALLET_REJECTED",
            Self::InsufficientFunds => "INSUFFICIENT_FUNDS",
            Self::NonceError => "NONCE_ERROR",
            Self::TransactionTimeout => "TRANSACTION_TIMEOUT",
            Self::TransactionFailed => "TRANSACTION_FAILED",
            Self::AttestationTimeout => "ATTESTATION_TIMEOUT",
            Self::AttestationFailed => "ATTESTATION_FAILED",
            Self::UnsupportedRoute => "UNSUPPORTED_ROUTE",
            Self::ProtocolUnavailable => "PROTOCOL_UNAVAILABLE",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Wallet rejected the request: {reason}")]
    WalletRejected { reason: String },

    #[error("Insufficient funds: {reason}")]
    InsufficientFunds { reason: String },

    #[error("Nonce error: {reason}")]
    Nonce { reason: String },

    #[error("Transaction timeout: {reason}")]
    TransactionTimeout { reason: String },

    #[error("Transaction failed: {reason}")]
    TransactionFailed { reason: String },

    #[error("Attestation timeout after {elapsed_secs} seconds ({attempts} attempts)")]
    AttestationTimeout { elapsed_secs: u64, attempts: u32 },

    #[error("Attestation failed: {reason}")]
    AttestationFailed { reason: String },

    #[error("Route not supported: {source_chain} -> {destination_chain}")]
    UnsupportedRoute {
        source_chain: String,
        destination_chain: String,
    },

    #[error("Chain not supported: {0}")]
    UnsupportedChain(String),

    #[error("Protocol {protocol} unavailable: {reason}")]
    ProtocolUnavailable { protocol: String, reason: String },

    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("ABI encoding/decoding error: {0}")]
    Abi(#[from] alloy_sol_types::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl BridgeError {
    /// Builds a typed error from a raw failure message (wallet, RPC node or
    /// program error text) using the classifier's taxonomy.
    pub fn from_signal(signal: impl Into<String>) -> Self {
        let reason = signal.into();
        match classifier::classify(&reason).code {
            ErrorCode::WalletRejected => Self::WalletRejected { reason },
            ErrorCode::InsufficientFunds => Self::InsufficientFunds { reason },
            ErrorCode::NonceError => Self::Nonce { reason },
            ErrorCode::TransactionTimeout => Self::TransactionTimeout { reason },
            ErrorCode::AttestationFailed => Self::AttestationFailed { reason },
            _ => Self::TransactionFailed { reason },
        }
    }

    /// Taxonomy code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::WalletRejected { .. } | Self::Cancelled => ErrorCode::WalletRejected,
            Self::InsufficientFunds { .. } => ErrorCode::InsufficientFunds,
            Self::Nonce { .. } => ErrorCode::NonceError,
            Self::TransactionTimeout { .. } => ErrorCode::TransactionTimeout,
            Self::TransactionFailed { .. } | Self::Abi(_) => ErrorCode::TransactionFailed,
            Self::AttestationTimeout { .. } => ErrorCode::AttestationTimeout,
            Self::AttestationFailed { .. } => ErrorCode::AttestationFailed,
            Self::UnsupportedRoute { .. } | Self::UnsupportedChain(_) => {
                ErrorCode::UnsupportedRoute
            }
            Self::ProtocolUnavailable { .. } => ErrorCode::ProtocolUnavailable,
            Self::Provider(reason) => classifier::classify(reason).code,
            Self::Network(e) if e.is_timeout() => ErrorCode::TransactionTimeout,
            Self::InvalidParams(_) | Self::Network(_) | Self::Json(_) | Self::Url(_) => {
                ErrorCode::Unknown
            }
        }
    }
}

impl From<alloy_json_rpc::RpcError<alloy_transport::TransportErrorKind>> for BridgeError {
    fn from(err: alloy_json_rpc::RpcError<alloy_transport::TransportErrorKind>) -> Self {
        Self::from_signal(err.to_string())
    }
}

impl From<alloy_contract::Error> for BridgeError {
    fn from(err: alloy_contract::Error) -> Self {
        Self::from_signal(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
