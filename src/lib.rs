//! # usdc-bridge
//!
//! Protocol-agnostic USDC bridging with a Circle CCTP burn-and-mint
//! implementation.
//!
//! A transfer burns USDC on the source chain (an EVM chain or Solana), waits
//! for Circle's attestation service to sign the burn message and mints the
//! same amount on the settlement chain. Every protocol implements
//! [`BridgeProtocol`], so an orchestrator can pick one per route, compare
//! estimates and health, and fall back to another when a result says
//! switching could help.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use usdc_bridge::{
//!     AttestationBridgeProtocol, BridgeParams, BridgeProtocol, Chain, ManualFallbackProtocol,
//!     WalletHandle,
//! };
//! use usdc_bridge::testing::FakeSvmWallet;
//! use alloy_chains::NamedChain;
//!
//! # async fn example() -> usdc_bridge::Result<()> {
//! let protocols: Vec<Arc<dyn BridgeProtocol>> = vec![
//!     Arc::new(AttestationBridgeProtocol::builder().build()),
//!     Arc::new(ManualFallbackProtocol::default()),
//! ];
//!
//! let wallet = FakeSvmWallet::new("9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM");
//! let params = BridgeParams::builder()
//!     .source_chain(Chain::Solana)
//!     .destination_chain(Chain::Evm(NamedChain::Base))
//!     .amount("25")
//!     .destination_address("0x742d35Cc6634C0532925a3b844Bc9e7595f8fA0d")
//!     .source_wallet(WalletHandle::Svm(Arc::new(wallet)))
//!     .build();
//!
//! for protocol in &protocols {
//!     if !protocol.supports(params.source_chain(), params.destination_chain()) {
//!         continue;
//!     }
//!     let result = protocol.bridge(&params).await?;
//!     if result.success() || !result.suggest_fallback() {
//!         break;
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Public API
//!
//! - [`BridgeProtocol`] - the capability contract, with
//!   [`AttestationBridgeProtocol`] and [`ManualFallbackProtocol`]
//! - [`BridgeParams`], [`BridgeResult`] and [`StatusUpdate`] - transfer input,
//!   outcome and progress notifications
//! - [`BridgeError`], [`ErrorCode`] and [`classify`] - the failure taxonomy
//! - [`HealthTracker`] and [`ProtocolHealth`] - rolling per-protocol health
//! - [`RetryPolicy`] and [`poll_with_backoff`] - bounded backoff polling
//! - [`EvmWallet`], [`SvmWallet`], [`AttestationProvider`] and [`Clock`] -
//!   the outside-world seams, with production adapters in [`providers`] and
//!   fakes in [`testing`]

mod bridge;
mod chain;
mod classifier;
mod error;
mod health;
mod protocol;
mod retry;
mod traits;

pub mod contracts;
pub mod providers;
pub mod testing;

// Public module for advanced users who need custom instrumentation
pub mod spans;

pub use bridge::{
    deposit_for_burn_instruction, instruction_discriminator, parse_usdc_amount,
    AttestationBridgeConfig, AttestationBridgeProtocol, AttestationEndpoints, AttestationPoller,
    BridgeDetails, BridgeParams, BridgeProtocol, BridgeResult, BridgeStage, BridgeStatus,
    Estimate, ManualFallbackConfig, ManualFallbackProtocol, StatusUpdate, WalletHandle,
    CCTP_PROTOCOL, DEFAULT_MANUAL_REDIRECT_URL, ENV_ATTESTATION_ALT_URL, ENV_ATTESTATION_API_URL,
    ENV_ATTESTATION_PROXY_URL, IRIS_API_SANDBOX_V1, IRIS_API_V1, MANUAL_PROTOCOL,
    SPL_TOKEN_PROGRAM, SYSTEM_PROGRAM, USDC_DECIMALS,
};
pub use chain::{addresses, Chain, ChainFamily};
pub use classifier::{classify, classify_error, Classification};
pub use error::{BridgeError, ErrorCode, Result};
pub use health::{
    HealthTracker, ProtocolHealth, MAX_CONSECUTIVE_FAILURES, MIN_OBSERVATIONS_FOR_RATE,
    MIN_SUCCESS_RATE, PRIOR_AVERAGE_TIME, PRIOR_SUCCESS_RATE,
};
pub use protocol::{
    parse_signature, AttestationResponse, AttestationStatus, BurnMessage, CctpMessage,
    DomainId, InvalidDomainId, MessageHeader, PROGRAM_DATA_PREFIX, SIGNATURE_LENGTH,
};
pub use retry::{
    poll_with_backoff, PollError, RetryPolicy, DEFAULT_BUDGET, DEFAULT_INITIAL_DELAY,
    DEFAULT_MAX_DELAY, DEFAULT_MULTIPLIER,
};
pub use traits::{
    AttestationProvider, Clock, EvmReceipt, EvmWallet, SvmAccount, SvmConfirmation,
    SvmProgramCall, SvmWallet,
};
