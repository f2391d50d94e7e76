//! Burn-and-mint bridging through Circle's attestation service (CCTP v1).

use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use alloy_primitives::{hex, Address, Bytes, FixedBytes, U256};
use async_trait::async_trait;
use bon::bon;
use tracing::{error, info, warn, Instrument};

use super::attestation::AttestationPoller;
use super::bridge_trait::BridgeProtocol;
use super::config::AttestationBridgeConfig;
use super::params::BridgeParams;
use super::result::{BridgeDetails, BridgeResult, BridgeStatus, Estimate};
use super::status::{BridgeStage, StatusReporter};
use super::{evm, svm};
use crate::chain::{Chain, ChainFamily};
use crate::contracts::MessageTransmitterContract;
use crate::error::{BridgeError, Result};
use crate::health::{HealthTracker, ProtocolHealth};
use crate::protocol::CctpMessage;
use crate::providers::TokioClock;
use crate::spans;
use crate::traits::{AttestationProvider, Clock, EvmWallet};

/// Protocol name reported by [`AttestationBridgeProtocol`].
pub const CCTP_PROTOCOL: &str = "cctp";

/// A source-chain burn that has been confirmed and whose message was found.
#[derive(Debug, Clone)]
pub(crate) struct ConfirmedBurn {
    pub tx_hash: String,
    pub message: CctpMessage,
}

/// A burn that did not produce a message. `tx_hash` is set once the burn
/// transaction was broadcast.
#[derive(Debug)]
pub(crate) struct BurnFailure {
    pub error: BridgeError,
    pub tx_hash: Option<String>,
    /// The burn may have moved funds: it is still in flight, or it was mined
    /// without a recoverable message. Another mechanism must not be offered.
    pub committed: bool,
}

impl BurnFailure {
    /// The burn transaction was mined and reverted, so nothing moved.
    pub fn reverted(error: BridgeError, tx_hash: String) -> Self {
        Self {
            error,
            tx_hash: Some(tx_hash),
            committed: false,
        }
    }

    /// The burn was broadcast and may have moved, or will move, funds.
    pub fn committed(error: BridgeError, tx_hash: String) -> Self {
        Self {
            error,
            tx_hash: Some(tx_hash),
            committed: true,
        }
    }
}

impl From<BridgeError> for BurnFailure {
    fn from(error: BridgeError) -> Self {
        Self {
            error,
            tx_hash: None,
            committed: false,
        }
    }
}

/// USDC bridge that burns on the source chain, waits for the attestation and
/// mints on the settlement chain.
///
/// Sources are EVM chains (burned through `TokenMessenger.depositForBurn`)
/// or Solana (burned through the `deposit_for_burn` program instruction).
/// The destination is always the configured settlement chain.
///
/// Once the burn is confirmed every outcome carries the message, so funds
/// can always be recovered: a missing destination signer or a failed mint
/// yields a successful result with status [`BridgeStatus::Minting`] and
/// `requires_manual_mint` set.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use usdc_bridge::{AttestationBridgeProtocol, BridgeParams, BridgeProtocol, Chain, WalletHandle};
/// use usdc_bridge::providers::AlloyEvmWallet;
/// use alloy_chains::NamedChain;
/// use alloy_primitives::address;
/// use alloy_provider::ProviderBuilder;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let provider = ProviderBuilder::new()
///     .connect("https://arb1.arbitrum.io/rpc")
///     .await?;
/// let wallet = AlloyEvmWallet::new(
///     provider,
///     address!("1234567890123456789012345678901234567890"),
///     NamedChain::Arbitrum,
/// );
///
/// let cctp = AttestationBridgeProtocol::builder().build();
/// let params = BridgeParams::builder()
///     .source_chain(Chain::Evm(NamedChain::Arbitrum))
///     .destination_chain(Chain::Evm(NamedChain::Base))
///     .amount("100")
///     .destination_address("0x742d35Cc6634C0532925a3b844Bc9e7595f8fA0d")
///     .source_wallet(WalletHandle::Evm(Arc::new(wallet)))
///     .build();
///
/// let result = cctp.bridge(&params).await?;
/// if result.details().requires_manual_mint {
///     println!("mint later with attestation {:?}", result.details().attestation);
/// }
/// # Ok(())
/// # }
/// ```
pub struct AttestationBridgeProtocol {
    config: AttestationBridgeConfig,
    source_chains: Vec<Chain>,
    poller: AttestationPoller,
    health: HealthTracker,
}

#[bon]
impl AttestationBridgeProtocol {
    /// `attestation_providers` defaults to one HTTP provider per configured
    /// endpoint and `clock` to the Tokio timer.
    #[builder]
    pub fn new(
        #[builder(default)] config: AttestationBridgeConfig,
        attestation_providers: Option<Vec<Arc<dyn AttestationProvider>>>,
        clock: Option<Arc<dyn Clock>>,
    ) -> Self {
        let providers = attestation_providers.unwrap_or_else(|| config.endpoints().providers());
        let clock = clock.unwrap_or_else(|| Arc::new(TokioClock::new()));
        let poller = AttestationPoller::new(providers, clock, config.retry);

        Self {
            source_chains: config.source_chains(),
            config,
            poller,
            health: HealthTracker::new(CCTP_PROTOCOL),
        }
    }

    pub fn config(&self) -> &AttestationBridgeConfig {
        &self.config
    }

    pub fn settlement_chain(&self) -> Chain {
        self.config.settlement_chain
    }

    pub fn source_chains(&self) -> &[Chain] {
        &self.source_chains
    }

    pub fn poller(&self) -> &AttestationPoller {
        &self.poller
    }

    /// Awaits a wallet submission, giving up after the configured
    /// confirmation timeout.
    pub(crate) async fn confirm<T, F>(&self, submission: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let timeout = self.config.confirmation_timeout;
        tokio::select! {
            biased;
            outcome = submission => outcome,
            _ = self.poller.clock().sleep(timeout) => Err(BridgeError::TransactionTimeout {
                reason: format!("transaction not confirmed within {} seconds", timeout.as_secs()),
            }),
        }
    }

    async fn execute(&self, params: &BridgeParams, amount: U256) -> BridgeResult {
        let reporter = StatusReporter::new(params.status_tx().cloned());
        let bridge_id = format!("{CCTP_PROTOCOL}-{}", unix_millis());

        if params.cancel_token().is_cancelled() {
            let failure = BurnFailure::from(BridgeError::Cancelled);
            return self.fail_burn(params, bridge_id, failure, &reporter);
        }

        let burn = match params.source_chain().family() {
            ChainFamily::Evm => evm::burn(self, params, amount, &reporter).await,
            ChainFamily::Svm => svm::burn(self, params, amount, &reporter).await,
        };

        match burn {
            Ok(burn) => self.complete_transfer(params, burn, &reporter).await,
            Err(failure) => self.fail_burn(params, bridge_id, failure, &reporter),
        }
    }

    fn fail_burn(
        &self,
        params: &BridgeParams,
        bridge_id: String,
        failure: BurnFailure,
        reporter: &StatusReporter,
    ) -> BridgeResult {
        spans::record_error_with_context(
            failure.error.code().as_str(),
            &failure.error.to_string(),
            failure
                .committed
                .then_some("burn transaction broadcast; message not recovered"),
        );
        error!(
            bridge_id = %bridge_id,
            error = %failure.error,
            source_tx_hash = ?failure.tx_hash,
            committed = failure.committed,
            event = "burn_failed"
        );
        reporter.report(BridgeStage::Failed, failure.error.to_string());

        let result = BridgeResult::failed(
            CCTP_PROTOCOL,
            bridge_id,
            &failure.error,
            BridgeDetails {
                recipient: Some(params.destination_address().to_string()),
                ..Default::default()
            },
        )
        .with_source_tx(failure.tx_hash);

        if failure.committed {
            result.without_fallback()
        } else {
            result
        }
    }

    /// Everything after the irreversible burn: attestation, then mint or a
    /// manual-mint handoff.
    async fn complete_transfer(
        &self,
        params: &BridgeParams,
        burn: ConfirmedBurn,
        reporter: &StatusReporter,
    ) -> BridgeResult {
        let message_hash = burn.message.hash();
        let bridge_id = bridge_id_for(&message_hash);
        let mut details = BridgeDetails {
            message: Some(burn.message.bytes().clone()),
            message_hash: Some(message_hash),
            recipient: Some(params.destination_address().to_string()),
            ..Default::default()
        };

        tracing::Span::current().record("bridge_id", bridge_id.as_str());
        reporter.report(
            BridgeStage::WaitingAttestation,
            format!("Waiting for attestation of {message_hash}"),
        );

        let attestation = match self
            .poller
            .fetch(message_hash, params.cancel_token())
            .instrument(spans::poll_attestation(
                &message_hash,
                &params.source_chain(),
                &params.destination_chain(),
                self.config.retry.budget.as_secs(),
            ))
            .await
        {
            Ok(attestation) => attestation,
            Err(e) => {
                spans::record_error_with_context(
                    e.code().as_str(),
                    &e.to_string(),
                    Some("burn is final; message retained for manual mint"),
                );
                error!(
                    bridge_id = %bridge_id,
                    message_hash = %message_hash,
                    error = %e,
                    event = "attestation_not_obtained"
                );
                reporter.report(BridgeStage::Failed, e.to_string());
                return BridgeResult::failed(CCTP_PROTOCOL, bridge_id, &e, details)
                    .with_source_tx(Some(burn.tx_hash));
            }
        };

        details.attestation = Some(attestation.clone());
        reporter.report(BridgeStage::AttestationReceived, "Attestation received");

        let wallet = match self.destination_signer(params) {
            Some(wallet) => wallet,
            None => {
                info!(
                    bridge_id = %bridge_id,
                    event = "manual_mint_required"
                );
                details.requires_manual_mint = true;
                reporter.report(
                    BridgeStage::ManualActionRequired,
                    format!("Submit the mint on {} to receive funds", params.destination_chain()),
                );
                return BridgeResult::succeeded(
                    CCTP_PROTOCOL,
                    BridgeStatus::Minting,
                    bridge_id,
                    details,
                )
                .with_source_tx(Some(burn.tx_hash));
            }
        };

        reporter.report(
            BridgeStage::Minting,
            format!("Minting on {}", params.destination_chain()),
        );

        match self
            .mint(
                wallet.as_ref(),
                params.destination_chain(),
                &burn.message,
                attestation.clone(),
            )
            .instrument(spans::receive_message(
                &message_hash,
                &params.destination_chain(),
                attestation.len(),
            ))
            .await
        {
            Ok(destination_tx) => {
                info!(
                    bridge_id = %bridge_id,
                    destination_tx_hash = %destination_tx,
                    event = "bridge_complete"
                );
                reporter.report_tx(BridgeStage::Complete, "Transfer complete", &destination_tx);
                BridgeResult::succeeded(CCTP_PROTOCOL, BridgeStatus::Complete, bridge_id, details)
                    .with_source_tx(Some(burn.tx_hash))
                    .with_destination_tx(destination_tx)
            }
            Err(e) => {
                warn!(
                    bridge_id = %bridge_id,
                    error = %e,
                    event = "mint_failed_manual_mint_required"
                );
                details.requires_manual_mint = true;
                details.mint_error = Some(e.to_string());
                reporter.report(
                    BridgeStage::ManualActionRequired,
                    format!("Mint failed, submit it manually: {e}"),
                );
                BridgeResult::succeeded(CCTP_PROTOCOL, BridgeStatus::Minting, bridge_id, details)
                    .with_source_tx(Some(burn.tx_hash))
            }
        }
    }

    /// Destination signer, if one was supplied and is on the settlement chain.
    fn destination_signer(&self, params: &BridgeParams) -> Option<Arc<dyn EvmWallet>> {
        let wallet = params.destination_wallet()?;
        if params.destination_chain().as_evm() == Some(wallet.chain()) {
            Some(Arc::clone(wallet))
        } else {
            warn!(
                wallet_chain = %wallet.chain(),
                destination_chain = %params.destination_chain(),
                event = "destination_wallet_chain_mismatch"
            );
            None
        }
    }

    /// Submits `receiveMessage` and returns the destination transaction hash.
    async fn mint(
        &self,
        wallet: &dyn EvmWallet,
        destination: Chain,
        message: &CctpMessage,
        attestation: Bytes,
    ) -> Result<String> {
        let transmitter = MessageTransmitterContract::new(destination.message_transmitter_address()?);
        let tx = transmitter.receive_message_transaction(
            wallet.address(),
            message.bytes().clone(),
            attestation,
        );

        let tx_hash = wallet.send_transaction(tx).await?;
        let receipt = self.confirm(wallet.wait_for_receipt(tx_hash)).await?;
        if !receipt.success {
            return Err(BridgeError::TransactionFailed {
                reason: format!("receiveMessage reverted in {}", receipt.tx_hash),
            });
        }
        Ok(receipt.tx_hash.to_string())
    }
}

#[async_trait]
impl BridgeProtocol for AttestationBridgeProtocol {
    fn name(&self) -> &str {
        CCTP_PROTOCOL
    }

    fn supports(&self, source: Chain, destination: Chain) -> bool {
        source != destination
            && destination == self.config.settlement_chain
            && self.source_chains.contains(&source)
    }

    async fn estimate(&self, params: &BridgeParams) -> Result<Estimate> {
        Ok(Estimate {
            fee: U256::ZERO,
            time: params.source_chain().confirmation_average_time()?,
        })
    }

    fn validate(&self, params: &BridgeParams) -> Result<()> {
        let source = params.source_chain();
        let destination = params.destination_chain();

        if !self.supports(source, destination) {
            return Err(BridgeError::UnsupportedRoute {
                source_chain: source.to_string(),
                destination_chain: destination.to_string(),
            });
        }

        params.amount_units()?;
        destination.validate_address(params.destination_address())?;

        if let Some(wallet) = params.source_wallet() {
            if wallet.family() != source.family() {
                return Err(BridgeError::InvalidParams(format!(
                    "source wallet is for the {:?} family but {source} is {:?}",
                    wallet.family(),
                    source.family()
                )));
            }
        }

        Ok(())
    }

    async fn bridge(&self, params: &BridgeParams) -> Result<BridgeResult> {
        self.validate(params)?;
        let amount = params.amount_units()?;

        if params.is_dry_run() {
            let bridge_id = format!("dryrun-{CCTP_PROTOCOL}-{}", unix_millis());
            info!(
                bridge_id = %bridge_id,
                source_chain = %params.source_chain(),
                destination_chain = %params.destination_chain(),
                amount = %amount,
                event = "dry_run"
            );
            return Ok(BridgeResult::succeeded(
                CCTP_PROTOCOL,
                BridgeStatus::Pending,
                bridge_id,
                BridgeDetails {
                    recipient: Some(params.destination_address().to_string()),
                    ..Default::default()
                },
            ));
        }

        let span = spans::bridge(
            CCTP_PROTOCOL,
            &params.source_chain(),
            &params.destination_chain(),
            params.amount(),
        );

        let clock = self.poller.clock();
        let started = clock.now();
        let result = self.execute(params, amount).instrument(span).await;

        if result.success() {
            self.health
                .record_success(clock.now().saturating_duration_since(started));
        } else {
            self.health.record_failure();
        }

        Ok(result)
    }

    fn health(&self) -> ProtocolHealth {
        self.health.snapshot()
    }
}

/// Bridge id derived from the message: `cctp-` followed by the first 16 hex
/// digits of the message hash.
fn bridge_id_for(message_hash: &FixedBytes<32>) -> String {
    let hash = hex::encode(message_hash);
    format!("{CCTP_PROTOCOL}-{}", &hash[..16])
}

/// Destination account as the 32-byte `mintRecipient`.
pub(crate) fn evm_mint_recipient(destination_address: &str) -> Result<FixedBytes<32>> {
    Address::from_str(destination_address)
        .map(|address| address.into_word())
        .map_err(|e| {
            BridgeError::InvalidParams(format!(
                "invalid destination address {destination_address}: {e}"
            ))
        })
}

fn unix_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::params::WalletHandle;
    use crate::error::ErrorCode;
    use crate::protocol::DomainId;
    use crate::testing::{
        sample_burn_message, signature_hex, FakeAttestationProvider, FakeClock, FakeEvmWallet,
    };
    use alloy_chains::NamedChain;
    use rstest::rstest;
    use std::time::Duration;

    const RECIPIENT: &str = "0x742d35Cc6634C0532925a3b844Bc9e7595f8fA0d";

    fn protocol(provider: &FakeAttestationProvider, clock: &FakeClock) -> AttestationBridgeProtocol {
        AttestationBridgeProtocol::builder()
            .attestation_providers(vec![Arc::new(provider.clone()) as Arc<dyn AttestationProvider>])
            .clock(Arc::new(clock.clone()) as Arc<dyn Clock>)
            .build()
    }

    fn params(source: Chain) -> BridgeParams {
        BridgeParams::builder()
            .source_chain(source)
            .destination_chain(Chain::Evm(NamedChain::Base))
            .amount("10")
            .destination_address(RECIPIENT)
            .build()
    }

    #[rstest]
    #[case(Chain::Evm(NamedChain::Arbitrum), Chain::Evm(NamedChain::Base), true)]
    #[case(Chain::Solana, Chain::Evm(NamedChain::Base), true)]
    #[case(Chain::Evm(NamedChain::Base), Chain::Evm(NamedChain::Base), false)]
    #[case(Chain::Evm(NamedChain::Base), Chain::Evm(NamedChain::Arbitrum), false)]
    #[case(Chain::Evm(NamedChain::Sepolia), Chain::Evm(NamedChain::Base), false)]
    fn test_supports(#[case] source: Chain, #[case] destination: Chain, #[case] expected: bool) {
        let protocol = protocol(&FakeAttestationProvider::new(), &FakeClock::new());
        assert_eq!(protocol.supports(source, destination), expected);
    }

    #[test]
    fn test_validate_rejects_bad_recipient() {
        let protocol = protocol(&FakeAttestationProvider::new(), &FakeClock::new());
        let params = BridgeParams::builder()
            .source_chain(Chain::Evm(NamedChain::Arbitrum))
            .destination_chain(Chain::Evm(NamedChain::Base))
            .amount("10")
            .destination_address("0x1234")
            .build();

        assert!(matches!(
            protocol.validate(&params),
            Err(BridgeError::InvalidParams(_))
        ));
    }

    #[test]
    fn test_validate_rejects_wrong_wallet_family() {
        let protocol = protocol(&FakeAttestationProvider::new(), &FakeClock::new());
        let wallet = FakeEvmWallet::new(NamedChain::Mainnet, Address::repeat_byte(1));
        let params = BridgeParams::builder()
            .source_chain(Chain::Solana)
            .destination_chain(Chain::Evm(NamedChain::Base))
            .amount("10")
            .destination_address(RECIPIENT)
            .source_wallet(WalletHandle::Evm(Arc::new(wallet)))
            .build();

        assert!(protocol.validate(&params).is_err());
    }

    #[tokio::test]
    async fn test_estimate_uses_confirmation_time() {
        let protocol = protocol(&FakeAttestationProvider::new(), &FakeClock::new());

        let estimate = protocol.estimate(&params(Chain::Solana)).await.unwrap();
        assert_eq!(estimate.fee, U256::ZERO);
        assert_eq!(estimate.time, Duration::from_secs(25));

        let estimate = protocol
            .estimate(&params(Chain::Evm(NamedChain::Avalanche)))
            .await
            .unwrap();
        assert_eq!(estimate.time, Duration::from_secs(20));
    }

    #[tokio::test]
    async fn test_missing_signer_is_wallet_rejected() {
        let provider = FakeAttestationProvider::new();
        let protocol = protocol(&provider, &FakeClock::new());

        let result = protocol
            .bridge(&params(Chain::Evm(NamedChain::Arbitrum)))
            .await
            .unwrap();

        assert!(!result.success());
        assert_eq!(result.error_code(), Some(ErrorCode::WalletRejected));
        assert!(!result.suggest_fallback());
        assert!(result.source_tx_hash().is_none());
        assert_eq!(provider.total_calls(), 0);
        assert_eq!(protocol.health().consecutive_failures, 1);
    }

    #[tokio::test]
    async fn test_signer_on_wrong_chain_is_rejected_without_calls() {
        let provider = FakeAttestationProvider::new();
        let protocol = protocol(&provider, &FakeClock::new());
        let wallet = FakeEvmWallet::new(NamedChain::Mainnet, Address::repeat_byte(1));
        let params = BridgeParams::builder()
            .source_chain(Chain::Evm(NamedChain::Arbitrum))
            .destination_chain(Chain::Evm(NamedChain::Base))
            .amount("10")
            .destination_address(RECIPIENT)
            .source_wallet(WalletHandle::Evm(Arc::new(wallet.clone())))
            .build();

        let result = protocol.bridge(&params).await.unwrap();

        assert_eq!(result.error_code(), Some(ErrorCode::WalletRejected));
        assert_eq!(wallet.call_count(), 0);
    }

    #[tokio::test]
    async fn test_bridge_id_uses_message_hash() {
        let clock = FakeClock::new();
        let provider = FakeAttestationProvider::new();
        let message = sample_burn_message(DomainId::Arbitrum, 11, 10_000_000);
        let hash = CctpMessage::new(message.clone()).hash();
        provider.add_complete_response(hash, &signature_hex(1));

        let wallet = FakeEvmWallet::new(NamedChain::Arbitrum, Address::repeat_byte(1))
            .with_allowance(U256::MAX)
            .with_burn_message(message);
        let params = BridgeParams::builder()
            .source_chain(Chain::Evm(NamedChain::Arbitrum))
            .destination_chain(Chain::Evm(NamedChain::Base))
            .amount("10")
            .destination_address(RECIPIENT)
            .source_wallet(WalletHandle::Evm(Arc::new(wallet)))
            .build();

        let result = protocol(&provider, &clock).bridge(&params).await.unwrap();

        assert_eq!(result.bridge_id(), bridge_id_for(&hash));
        assert_eq!(result.bridge_id().len(), "cctp-".len() + 16);
        assert_eq!(result.status(), BridgeStatus::Minting);
    }

    #[test]
    fn test_evm_mint_recipient_is_left_padded() {
        let word = evm_mint_recipient(RECIPIENT).unwrap();
        assert_eq!(&word[..12], &[0u8; 12]);
        assert_eq!(
            Address::from_slice(&word[12..]),
            Address::from_str(RECIPIENT).unwrap()
        );
    }
}
