//! OpenTelemetry span helpers for bridge operations
//!
//! Span names are static and every attribute is structured, so the spans can
//! be exported as-is. The protocol implementations use them internally; they
//! are public for callers that want to wrap their own orchestration in the
//! same hierarchy.
//!
//! # Example
//!
//! ```rust
//! use usdc_bridge::{spans, Chain};
//! use alloy_chains::NamedChain;
//! use alloy_primitives::FixedBytes;
//!
//! let span = spans::poll_attestation(
//!     &FixedBytes::from([0u8; 32]),
//!     &Chain::Evm(NamedChain::Arbitrum),
//!     &Chain::Evm(NamedChain::Base),
//!     900,
//! );
//! let _guard = span.enter();
//! ```

use alloy_primitives::{hex, Address, FixedBytes, U256};
use tracing::Span;

use crate::chain::Chain;

/// Create span for one `bridge()` execution.
///
/// Parent: caller's span
/// Children: every other span in this module
#[inline]
pub fn bridge(protocol: &str, source_chain: &Chain, destination_chain: &Chain, amount: &str) -> Span {
    tracing::info_span!(
        "usdc_bridge.bridge",
        protocol = protocol,
        source_chain = %source_chain,
        destination_chain = %destination_chain,
        amount = amount,
        bridge_id = tracing::field::Empty,
        error.type = tracing::field::Empty,
        error.message = tracing::field::Empty,
        error.context = tracing::field::Empty,
        otel.status_code = "OK",
    )
}

/// Create span for USDC deposit and burn transaction creation on an EVM
/// source chain.
///
/// Parent: usdc_bridge.bridge
/// Children: None
#[inline]
pub fn deposit_for_burn(
    from_address: &Address,
    mint_recipient: &FixedBytes<32>,
    destination_domain: u32,
    burn_token: &Address,
    amount: &U256,
) -> Span {
    tracing::info_span!(
        "usdc_bridge.deposit_for_burn",
        from_address = %from_address,
        mint_recipient = %mint_recipient,
        destination_domain = destination_domain,
        burn_token = %burn_token,
        amount = %amount,
        error.type = tracing::field::Empty,
        error.message = tracing::field::Empty,
        error.context = tracing::field::Empty,
        otel.status_code = "OK",
    )
}

/// Create span for the `deposit_for_burn` program call on Solana.
///
/// Parent: usdc_bridge.bridge
/// Children: None (the wallet capability owns the RPC spans)
#[inline]
pub fn svm_deposit_for_burn(owner: &str, destination_domain: u32, amount: u64) -> Span {
    tracing::info_span!(
        "usdc_bridge.svm_deposit_for_burn",
        owner = owner,
        destination_domain = destination_domain,
        amount = amount,
        error.type = tracing::field::Empty,
        error.message = tracing::field::Empty,
        otel.status_code = "OK",
    )
}

/// Create span for extracting the message from a confirmed burn.
///
/// Parent: usdc_bridge.bridge
/// Children: None
#[inline]
pub fn extract_message(tx_hash: &str, source_chain: &Chain) -> Span {
    tracing::debug_span!(
        "usdc_bridge.extract_message",
        tx_hash = tx_hash,
        source_chain = %source_chain,
    )
}

/// Create span for polling the attestation service with backoff.
///
/// Parent: usdc_bridge.bridge
/// Children: usdc_bridge.get_attestation (one per endpoint per attempt)
#[inline]
pub fn poll_attestation(
    message_hash: &FixedBytes<32>,
    source_chain: &Chain,
    destination_chain: &Chain,
    budget_secs: u64,
) -> Span {
    tracing::info_span!(
        "usdc_bridge.poll_attestation",
        message_hash = %hex::encode(message_hash),
        source_chain = %source_chain,
        destination_chain = %destination_chain,
        budget_secs = budget_secs,
        error.type = tracing::field::Empty,
        error.message = tracing::field::Empty,
        error.source = tracing::field::Empty,
        otel.status_code = "OK",
    )
}

/// Create span for a single attestation request to one endpoint.
///
/// Parent: usdc_bridge.poll_attestation
/// Children: HTTP client request spans
#[inline]
pub fn get_attestation(endpoint: &str, attempt: u32) -> Span {
    tracing::debug_span!(
        "usdc_bridge.get_attestation",
        endpoint = endpoint,
        attempt = attempt,
    )
}

/// Create span for receiving the message on the destination chain.
///
/// Parent: usdc_bridge.bridge
/// Children: wallet RPC calls
#[inline]
pub fn receive_message(
    message_hash: &FixedBytes<32>,
    destination_chain: &Chain,
    attestation_length: usize,
) -> Span {
    tracing::info_span!(
        "usdc_bridge.receive_message",
        message_hash = %hex::encode(message_hash),
        destination_chain = %destination_chain,
        attestation_length_bytes = attestation_length,
    )
}

/// Record error attributes on the current span.
///
/// Follows OpenTelemetry semantic conventions for error tracking:
/// `error.type`, `error.message` and, when present, `error.source`.
pub fn record_error<E: std::error::Error>(error: &E) {
    let current_span = tracing::Span::current();
    current_span.record(
        "error.type",
        error.to_string().split(':').next().unwrap_or("Unknown"),
    );
    current_span.record("error.message", error.to_string());
    current_span.record("otel.status_code", "ERROR");

    if let Some(source) = error.source() {
        current_span.record("error.source", source.to_string());
    }
}

/// Record error attributes with custom context on the current span.
///
/// # Example
///
/// ```rust
/// use usdc_bridge::spans;
///
/// let span = tracing::info_span!("usdc_bridge.operation");
/// let _guard = span.enter();
///
/// spans::record_error_with_context(
///     "ATTESTATION_TIMEOUT",
///     "no attestation after 900 seconds",
///     Some("burn is final; message retained for manual mint"),
/// );
/// ```
pub fn record_error_with_context(
    error_type: &str,
    error_message: &str,
    additional_context: Option<&str>,
) {
    let current_span = tracing::Span::current();
    current_span.record("error.type", error_type);
    current_span.record("error.message", error_message);
    current_span.record("otel.status_code", "ERROR");

    if let Some(context) = additional_context {
        current_span.record("error.context", context);
    }
}
