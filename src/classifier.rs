//! Failure classification and fallback decisions.
//!
//! Raw failure signals come from many places: wallet extensions, RPC nodes,
//! program logs, the attestation authority. This module maps them onto the
//! fixed [`ErrorCode`] taxonomy and decides whether an orchestrator should
//! offer a different bridging mechanism.
//!
//! The fallback hint is true only when switching mechanism could plausibly
//! help. Causes specific to the user or their balance recur identically on
//! any protocol and never suggest a fallback.
//!
//! # Example
//!
//! ```rust
//! use usdc_bridge::{classify, ErrorCode};
//!
//! let classification = classify("insufficient funds for gas");
//! assert_eq!(classification.code, ErrorCode::InsufficientFunds);
//! assert!(!classification.suggest_fallback);
//! ```

use serde::Serialize;

use crate::error::{BridgeError, ErrorCode};

/// Result of classifying a failure signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    pub code: ErrorCode,
    pub user_message: &'static str,
    pub suggest_fallback: bool,
    pub fallback_reason: Option<&'static str>,
}

impl Classification {
    /// Classification for a known taxonomy code.
    pub fn for_code(code: ErrorCode) -> Self {
        let (user_message, fallback_reason) = match code {
            ErrorCode::WalletRejected => ("The transaction was rejected in your wallet.", None),
            ErrorCode::InsufficientFunds => (
                "Insufficient balance to cover the transfer amount and network fees.",
                None,
            ),
            ErrorCode::NonceError => (
                "Your wallet's transaction queue is out of sync.",
                Some("Wallet nonce desync; another mechanism submits a fresh transaction"),
            ),
            ErrorCode::TransactionTimeout => (
                "The network took too long to confirm the transaction.",
                Some("Source chain congestion; another mechanism may route around it"),
            ),
            ErrorCode::TransactionFailed => ("The transaction failed on-chain.", None),
            ErrorCode::AttestationTimeout => (
                "The attestation service has not confirmed the transfer yet.",
                Some("Attestation is slow; an alternative protocol may settle faster"),
            ),
            ErrorCode::AttestationFailed => (
                "The attestation service rejected the transfer. Manual investigation is required.",
                None,
            ),
            ErrorCode::UnsupportedRoute => (
                "This route is not supported by the selected bridge.",
                Some("Route unsupported by this protocol"),
            ),
            ErrorCode::ProtocolUnavailable => (
                "The bridge is temporarily unavailable.",
                Some("Protocol unavailable"),
            ),
            ErrorCode::Unknown => ("An unexpected error occurred.", None),
        };

        Self {
            code,
            user_message,
            suggest_fallback: fallback_reason.is_some(),
            fallback_reason,
        }
    }
}

/// Maps a raw failure message to a classification.
///
/// Matching is case-insensitive and ordered: user- and balance-specific causes
/// are checked before the transient ones, so "user rejected ... timeout" is a
/// rejection. Unrecognized signals are `TRANSACTION_FAILED` without fallback.
pub fn classify(signal: &str) -> Classification {
    let signal = signal.to_ascii_lowercase();
    let has = |needle: &str| signal.contains(needle);

    let code = if has("attestation") && (has("timeout") || has("timed out") || has("budget")) {
        ErrorCode::AttestationTimeout
    } else if has("attestation") && has("fail") {
        ErrorCode::AttestationFailed
    } else if has("insufficient funds")
        || has("insufficient balance")
        || has("exceeds balance")
    {
        ErrorCode::InsufficientFunds
    } else if has("user rejected")
        || has("rejected the request")
        || has("denied")
        || has("cancelled by user")
    {
        ErrorCode::WalletRejected
    } else if has("nonce") || has("replacement") {
        ErrorCode::NonceError
    } else if has("timeout") || has("timed out") {
        ErrorCode::TransactionTimeout
    } else if has("unsupported route") || has("not supported") {
        ErrorCode::UnsupportedRoute
    } else if has("unavailable") {
        ErrorCode::ProtocolUnavailable
    } else {
        ErrorCode::TransactionFailed
    };

    Classification::for_code(code)
}

/// Classifies a typed error, preferring its structured code.
pub fn classify_error(error: &BridgeError) -> Classification {
    Classification::for_code(error.code())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("insufficient funds for gas", ErrorCode::InsufficientFunds, false)]
    #[case("request timed out after 8000ms", ErrorCode::TransactionTimeout, true)]
    #[case("user rejected the request", ErrorCode::WalletRejected, false)]
    #[case("User denied transaction signature", ErrorCode::WalletRejected, false)]
    #[case("nonce too low", ErrorCode::NonceError, true)]
    #[case("replacement fee too low", ErrorCode::NonceError, true)]
    #[case("attestation budget exceeded", ErrorCode::AttestationTimeout, true)]
    #[case("Attestation polling timed out", ErrorCode::AttestationTimeout, true)]
    #[case("attestation failed", ErrorCode::AttestationFailed, false)]
    #[case("execution reverted: ERC20: burn amount exceeds balance", ErrorCode::InsufficientFunds, false)]
    #[case("something strange happened", ErrorCode::TransactionFailed, false)]
    fn test_classify_signal(
        #[case] signal: &str,
        #[case] code: ErrorCode,
        #[case] suggest_fallback: bool,
    ) {
        let classification = classify(signal);
        assert_eq!(classification.code, code);
        assert_eq!(classification.suggest_fallback, suggest_fallback);
    }

    #[test]
    fn test_user_specific_causes_never_suggest_fallback() {
        for code in [
            ErrorCode::WalletRejected,
            ErrorCode::InsufficientFunds,
            ErrorCode::TransactionFailed,
            ErrorCode::AttestationFailed,
        ] {
            let classification = Classification::for_code(code);
            assert!(!classification.suggest_fallback, "{code} suggested fallback");
            assert!(classification.fallback_reason.is_none());
        }
    }

    #[test]
    fn test_rejection_wins_over_timeout() {
        let classification = classify("User rejected the request before timeout");
        assert_eq!(classification.code, ErrorCode::WalletRejected);
    }

    #[test]
    fn test_classify_typed_error() {
        let error = BridgeError::AttestationTimeout {
            elapsed_secs: 900,
            attempts: 40,
        };
        let classification = classify_error(&error);
        assert_eq!(classification.code, ErrorCode::AttestationTimeout);
        assert!(classification.suggest_fallback);
    }
}
