//! Alloy-based EVM wallet implementation.

use std::time::Duration;

use alloy_chains::NamedChain;
use alloy_network::Ethereum;
use alloy_primitives::{Address, TxHash, U256};
use alloy_provider::{PendingTransactionBuilder, PendingTransactionError, Provider, WatchTxError};
use alloy_rpc_types::TransactionRequest;
use async_trait::async_trait;
use tracing::{debug, info, instrument};

use crate::contracts::Erc20;
use crate::error::{BridgeError, Result};
use crate::traits::{EvmReceipt, EvmWallet};

/// Default time to wait for a submitted transaction to be mined.
pub const DEFAULT_CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(180);

/// Production EVM wallet wrapping an Alloy [`Provider`] that carries a
/// wallet filler (so `send_transaction` signs locally).
///
/// # Examples
///
/// ```rust,no_run
/// use usdc_bridge::providers::AlloyEvmWallet;
/// use alloy_chains::NamedChain;
/// use alloy_primitives::address;
/// use alloy_provider::ProviderBuilder;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let provider = ProviderBuilder::new()
///     .connect("https://arb1.arbitrum.io/rpc")
///     .await?;
///
/// let wallet = AlloyEvmWallet::new(
///     provider,
///     address!("1234567890123456789012345678901234567890"),
///     NamedChain::Arbitrum,
/// );
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct AlloyEvmWallet<P> {
    provider: P,
    address: Address,
    chain: NamedChain,
    confirmation_timeout: Duration,
}

impl<P> AlloyEvmWallet<P>
where
    P: Provider<Ethereum> + Send + Sync,
{
    pub fn new(provider: P, address: Address, chain: NamedChain) -> Self {
        Self {
            provider,
            address,
            chain,
            confirmation_timeout: DEFAULT_CONFIRMATION_TIMEOUT,
        }
    }

    pub fn with_confirmation_timeout(mut self, timeout: Duration) -> Self {
        self.confirmation_timeout = timeout;
        self
    }

    /// Returns a reference to the underlying Alloy provider.
    pub fn inner(&self) -> &P {
        &self.provider
    }
}

#[async_trait]
impl<P> EvmWallet for AlloyEvmWallet<P>
where
    P: Provider<Ethereum> + Send + Sync,
{
    fn address(&self) -> Address {
        self.address
    }

    fn chain(&self) -> NamedChain {
        self.chain
    }

    #[instrument(skip(self), fields(chain = %self.chain))]
    async fn allowance(&self, token: Address, spender: Address) -> Result<U256> {
        let allowance = Erc20::new(token, &self.provider)
            .allowance(self.address, spender)
            .call()
            .await?;

        debug!(
            owner = %self.address,
            spender = %spender,
            allowance = %allowance,
            event = "allowance_retrieved"
        );
        Ok(allowance)
    }

    #[instrument(skip(self, tx), fields(chain = %self.chain))]
    async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxHash> {
        let pending = self.provider.send_transaction(tx).await?;
        let tx_hash = *pending.tx_hash();

        info!(tx_hash = %tx_hash, event = "transaction_submitted");
        Ok(tx_hash)
    }

    #[instrument(skip(self), fields(chain = %self.chain))]
    async fn wait_for_receipt(&self, tx_hash: TxHash) -> Result<EvmReceipt> {
        let receipt = PendingTransactionBuilder::new(self.provider.root().clone(), tx_hash)
            .with_timeout(Some(self.confirmation_timeout))
            .get_receipt()
            .await
            .map_err(|e| match e {
                PendingTransactionError::TxWatcher(WatchTxError::Timeout) => {
                    BridgeError::TransactionTimeout {
                        reason: format!(
                            "{tx_hash} not mined within {}s",
                            self.confirmation_timeout.as_secs()
                        ),
                    }
                }
                other => BridgeError::from_signal(other.to_string()),
            })?;

        info!(
            tx_hash = %receipt.transaction_hash,
            block_number = ?receipt.block_number,
            success = receipt.status(),
            event = "transaction_confirmed"
        );

        Ok(EvmReceipt {
            tx_hash: receipt.transaction_hash,
            success: receipt.status(),
            logs: receipt.inner.logs().iter().map(|log| log.inner.clone()).collect(),
        })
    }
}
