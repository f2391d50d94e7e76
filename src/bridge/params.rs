use std::fmt;
use std::sync::Arc;

use alloy_primitives::utils::{parse_units, ParseUnits};
use alloy_primitives::U256;
use bon::Builder;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;

use super::status::StatusUpdate;
use crate::chain::{Chain, ChainFamily};
use crate::error::{BridgeError, Result};
use crate::traits::{EvmWallet, SvmWallet};

/// USDC uses 6 decimals on every supported chain.
pub const USDC_DECIMALS: u8 = 6;

/// Source-chain signer, tagged by chain family.
#[derive(Clone)]
pub enum WalletHandle {
    Evm(Arc<dyn EvmWallet>),
    Svm(Arc<dyn SvmWallet>),
}

impl WalletHandle {
    pub fn family(&self) -> ChainFamily {
        match self {
            Self::Evm(_) => ChainFamily::Evm,
            Self::Svm(_) => ChainFamily::Svm,
        }
    }

    /// Signer address (EVM) or public key (Solana) as text.
    pub fn account(&self) -> String {
        match self {
            Self::Evm(wallet) => wallet.address().to_string(),
            Self::Svm(wallet) => wallet.public_key(),
        }
    }
}

impl fmt::Debug for WalletHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Evm(wallet) => f
                .debug_struct("Evm")
                .field("address", &wallet.address())
                .field("chain", &wallet.chain())
                .finish(),
            Self::Svm(wallet) => f
                .debug_struct("Svm")
                .field("public_key", &wallet.public_key())
                .finish(),
        }
    }
}

/// Parameters for one USDC transfer.
///
/// # Example
///
/// ```rust
/// use usdc_bridge::{BridgeParams, Chain};
/// use alloy_chains::NamedChain;
///
/// let params = BridgeParams::builder()
///     .source_chain(Chain::Evm(NamedChain::Arbitrum))
///     .destination_chain(Chain::Evm(NamedChain::Base))
///     .amount("25.5")
///     .destination_address("0x742d35Cc6634C0532925a3b844Bc9e7595f8fA0d")
///     .dry_run(true)
///     .build();
///
/// assert_eq!(params.amount_units().unwrap().to::<u64>(), 25_500_000);
/// ```
#[derive(Builder, Clone)]
pub struct BridgeParams {
    source_chain: Chain,
    destination_chain: Chain,
    /// Decimal USDC amount, e.g. `"10.25"`.
    #[builder(into)]
    amount: String,
    #[builder(into)]
    destination_address: String,
    source_wallet: Option<WalletHandle>,
    /// Signer on the destination chain, used to submit the mint.
    destination_wallet: Option<Arc<dyn EvmWallet>>,
    #[builder(default)]
    dry_run: bool,
    status_tx: Option<UnboundedSender<StatusUpdate>>,
    #[builder(default)]
    cancel: CancellationToken,
}

impl BridgeParams {
    pub fn source_chain(&self) -> Chain {
        self.source_chain
    }

    pub fn destination_chain(&self) -> Chain {
        self.destination_chain
    }

    pub fn amount(&self) -> &str {
        &self.amount
    }

    /// The amount in USDC base units.
    pub fn amount_units(&self) -> Result<U256> {
        parse_usdc_amount(&self.amount)
    }

    pub fn destination_address(&self) -> &str {
        &self.destination_address
    }

    pub fn source_wallet(&self) -> Option<&WalletHandle> {
        self.source_wallet.as_ref()
    }

    pub fn destination_wallet(&self) -> Option<&Arc<dyn EvmWallet>> {
        self.destination_wallet.as_ref()
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn status_tx(&self) -> Option<&UnboundedSender<StatusUpdate>> {
        self.status_tx.as_ref()
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }
}

impl fmt::Debug for BridgeParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BridgeParams")
            .field("source_chain", &self.source_chain)
            .field("destination_chain", &self.destination_chain)
            .field("amount", &self.amount)
            .field("destination_address", &self.destination_address)
            .field("source_wallet", &self.source_wallet)
            .field("has_destination_wallet", &self.destination_wallet.is_some())
            .field("dry_run", &self.dry_run)
            .finish_non_exhaustive()
    }
}

/// Parses a decimal USDC amount into base units, rejecting zero, negative
/// values and more than [`USDC_DECIMALS`] fractional digits.
pub fn parse_usdc_amount(amount: &str) -> Result<U256> {
    let amount = amount.trim();
    if let Some((_, fraction)) = amount.split_once('.') {
        if fraction.len() > usize::from(USDC_DECIMALS) {
            return Err(BridgeError::InvalidParams(format!(
                "amount {amount:?} has more than {USDC_DECIMALS} decimal places"
            )));
        }
    }

    let parsed = parse_units(amount, USDC_DECIMALS)
        .map_err(|e| BridgeError::InvalidParams(format!("invalid amount {amount:?}: {e}")))?;

    match parsed {
        ParseUnits::U256(units) if !units.is_zero() => Ok(units),
        _ => Err(BridgeError::InvalidParams(format!(
            "amount must be greater than zero, got {amount:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeSvmWallet;
    use alloy_chains::NamedChain;
    use rstest::rstest;

    #[rstest]
    #[case("1", 1_000_000)]
    #[case("10.5", 10_500_000)]
    #[case("0.000001", 1)]
    #[case(" 250 ", 250_000_000)]
    fn test_parse_usdc_amount(#[case] raw: &str, #[case] expected: u64) {
        assert_eq!(parse_usdc_amount(raw).unwrap(), U256::from(expected));
    }

    #[rstest]
    #[case("0")]
    #[case("0.0")]
    #[case("-5")]
    #[case("abc")]
    #[case("")]
    #[case("1.0000001")]
    #[case("0.0000001")]
    fn test_parse_usdc_amount_rejects(#[case] raw: &str) {
        assert!(matches!(
            parse_usdc_amount(raw),
            Err(BridgeError::InvalidParams(_))
        ));
    }

    #[test]
    fn test_parse_usdc_amount_reports_excess_precision() {
        let Err(BridgeError::InvalidParams(reason)) = parse_usdc_amount("1.0000001") else {
            panic!("expected a precision error");
        };
        assert!(reason.contains("decimal places"), "{reason}");
    }

    #[test]
    fn test_bridge_params_builder() {
        let wallet = FakeSvmWallet::new("9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM");
        let params = BridgeParams::builder()
            .source_chain(Chain::Solana)
            .destination_chain(Chain::Evm(NamedChain::Base))
            .amount("5")
            .destination_address("0x742d35Cc6634C0532925a3b844Bc9e7595f8fA0d")
            .source_wallet(WalletHandle::Svm(Arc::new(wallet)))
            .build();

        assert_eq!(params.source_chain(), Chain::Solana);
        assert_eq!(params.amount(), "5");
        assert!(!params.is_dry_run());
        assert!(params.destination_wallet().is_none());
        assert_eq!(
            params.source_wallet().map(WalletHandle::family),
            Some(ChainFamily::Svm)
        );
        assert!(!params.cancel_token().is_cancelled());
    }
}
