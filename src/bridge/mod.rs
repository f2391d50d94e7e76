//! Bridging protocols
//!
//! [`BridgeProtocol`] is the capability contract an orchestrator selects
//! over. Two implementations live here: [`AttestationBridgeProtocol`], which
//! burns USDC on the source chain and mints it on the settlement chain once
//! Circle has attested the burn, and [`ManualFallbackProtocol`], which sends
//! the user somewhere they can finish the transfer by hand.

mod attestation;
mod bridge_trait;
mod cctp;
mod config;
mod evm;
mod manual;
mod params;
mod result;
mod status;
mod svm;

pub use attestation::AttestationPoller;
pub use bridge_trait::BridgeProtocol;
pub use cctp::{AttestationBridgeProtocol, CCTP_PROTOCOL};
pub use config::{
    AttestationBridgeConfig, AttestationEndpoints, ManualFallbackConfig,
    DEFAULT_MANUAL_REDIRECT_URL, ENV_ATTESTATION_ALT_URL, ENV_ATTESTATION_API_URL,
    ENV_ATTESTATION_PROXY_URL, IRIS_API_SANDBOX_V1, IRIS_API_V1,
};
pub use manual::{ManualFallbackProtocol, MANUAL_PROTOCOL};
pub use params::{parse_usdc_amount, BridgeParams, WalletHandle, USDC_DECIMALS};
pub use result::{BridgeDetails, BridgeResult, BridgeStatus, Estimate};
pub use status::{BridgeStage, StatusUpdate};
pub use svm::{
    deposit_for_burn_instruction, instruction_discriminator, SPL_TOKEN_PROGRAM, SYSTEM_PROGRAM,
};
