//! Burn path for EVM source chains.

use std::sync::Arc;

use alloy_primitives::{Address, U256};
use tracing::{debug, info};

use super::cctp::{evm_mint_recipient, AttestationBridgeProtocol, BurnFailure, ConfirmedBurn};
use super::params::{BridgeParams, WalletHandle};
use super::status::{BridgeStage, StatusReporter};
use crate::chain::Chain;
use crate::contracts::{Erc20Contract, TokenMessengerContract};
use crate::error::{BridgeError, Result};
use crate::protocol::CctpMessage;
use crate::spans;
use crate::traits::EvmWallet;

/// Approves if needed, burns through `TokenMessenger.depositForBurn` and
/// pulls the message out of the burn receipt.
pub(crate) async fn burn(
    protocol: &AttestationBridgeProtocol,
    params: &BridgeParams,
    amount: U256,
    reporter: &StatusReporter,
) -> std::result::Result<ConfirmedBurn, BurnFailure> {
    let source = params.source_chain();
    let wallet = signer(params, source)?;
    let usdc = source.usdc_address()?;
    let token_messenger = source.token_messenger_address()?;
    let destination_domain = params.destination_chain().domain_id()?.as_u32();
    let mint_recipient = evm_mint_recipient(params.destination_address())?;

    ensure_allowance(protocol, wallet.as_ref(), usdc, token_messenger, amount, reporter).await?;

    reporter.report(
        BridgeStage::Burning,
        format!("Burning {} USDC on {source}", params.amount()),
    );
    let tx = TokenMessengerContract::new(token_messenger).deposit_for_burn_transaction(
        wallet.address(),
        mint_recipient,
        destination_domain,
        usdc,
        amount,
    );
    let submitted = wallet.send_transaction(tx).await?;
    let tx_hash = submitted.to_string();
    info!(
        tx_hash = %tx_hash,
        source_chain = %source,
        event = "burn_submitted"
    );

    let receipt = protocol
        .confirm(wallet.wait_for_receipt(submitted))
        .await
        .map_err(|error| BurnFailure::committed(error, tx_hash.clone()))?;

    if !receipt.success {
        return Err(BurnFailure::reverted(
            BridgeError::TransactionFailed {
                reason: "depositForBurn reverted".to_string(),
            },
            tx_hash,
        ));
    }

    info!(
        tx_hash = %tx_hash,
        source_chain = %source,
        event = "burn_confirmed"
    );
    reporter.report_tx(BridgeStage::BurnConfirmed, "Burn confirmed", &tx_hash);

    let message = spans::extract_message(&tx_hash, &source)
        .in_scope(|| CctpMessage::from_evm_logs(&receipt.logs));

    match message {
        Ok(Some(message)) => Ok(ConfirmedBurn { tx_hash, message }),
        Ok(None) => Err(BurnFailure::committed(
            BridgeError::TransactionFailed {
                reason: format!(
                    "burn confirmed but no MessageSent event among {} logs",
                    receipt.logs.len()
                ),
            },
            tx_hash,
        )),
        Err(error) => Err(BurnFailure::committed(error, tx_hash)),
    }
}

/// Source wallet when it is an EVM signer connected to `chain`.
fn signer(params: &BridgeParams, chain: Chain) -> Result<Arc<dyn EvmWallet>> {
    match params.source_wallet() {
        Some(WalletHandle::Evm(wallet)) if chain.as_evm() == Some(wallet.chain()) => {
            Ok(Arc::clone(wallet))
        }
        Some(WalletHandle::Evm(wallet)) => Err(BridgeError::WalletRejected {
            reason: format!(
                "wallet is connected to {} but the transfer starts on {chain}",
                wallet.chain()
            ),
        }),
        _ => Err(BridgeError::WalletRejected {
            reason: format!("no EVM signer available on {chain}"),
        }),
    }
}

/// Raises the `TokenMessenger` allowance to `amount` when it falls short.
async fn ensure_allowance(
    protocol: &AttestationBridgeProtocol,
    wallet: &dyn EvmWallet,
    usdc: Address,
    token_messenger: Address,
    amount: U256,
    reporter: &StatusReporter,
) -> Result<()> {
    let current = wallet.allowance(usdc, token_messenger).await?;
    if current >= amount {
        debug!(
            allowance = %current,
            amount = %amount,
            event = "allowance_sufficient"
        );
        return Ok(());
    }

    reporter.report(BridgeStage::Approve, "Approving USDC for the token messenger");
    let tx = Erc20Contract::new(usdc).approve_transaction(wallet.address(), token_messenger, amount);
    let tx_hash = wallet.send_transaction(tx).await?;
    let receipt = protocol.confirm(wallet.wait_for_receipt(tx_hash)).await?;

    if !receipt.success {
        return Err(BridgeError::TransactionFailed {
            reason: format!("approve reverted in {}", receipt.tx_hash),
        });
    }

    reporter.report_tx(
        BridgeStage::ApproveConfirmed,
        "Approval confirmed",
        &receipt.tx_hash.to_string(),
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::Erc20::approveCall;
    use crate::contracts::TokenMessenger::depositForBurnCall;
    use crate::error::ErrorCode;
    use crate::protocol::DomainId;
    use crate::testing::{sample_burn_message, FakeAttestationProvider, FakeClock, FakeEvmWallet};
    use crate::traits::{AttestationProvider, Clock};
    use alloy_chains::NamedChain;
    use alloy_sol_types::SolCall;
    use tokio::sync::mpsc;

    const RECIPIENT: &str = "0x742d35Cc6634C0532925a3b844Bc9e7595f8fA0d";

    fn protocol() -> AttestationBridgeProtocol {
        AttestationBridgeProtocol::builder()
            .attestation_providers(vec![
                Arc::new(FakeAttestationProvider::new()) as Arc<dyn AttestationProvider>
            ])
            .clock(Arc::new(FakeClock::new()) as Arc<dyn Clock>)
            .build()
    }

    fn params(wallet: &FakeEvmWallet) -> BridgeParams {
        BridgeParams::builder()
            .source_chain(Chain::Evm(NamedChain::Arbitrum))
            .destination_chain(Chain::Evm(NamedChain::Base))
            .amount("10")
            .destination_address(RECIPIENT)
            .source_wallet(WalletHandle::Evm(Arc::new(wallet.clone())))
            .build()
    }

    #[tokio::test]
    async fn test_approves_when_allowance_short() {
        let message = sample_burn_message(DomainId::Arbitrum, 1, 10_000_000);
        let wallet = FakeEvmWallet::new(NamedChain::Arbitrum, Address::repeat_byte(1))
            .with_burn_message(message.clone());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let reporter = StatusReporter::new(Some(tx));

        let confirmed = burn(&protocol(), &params(&wallet), U256::from(10_000_000u64), &reporter)
            .await
            .unwrap();

        assert_eq!(confirmed.message.bytes().as_ref(), message.as_slice());
        assert_eq!(
            wallet.sent_selectors(),
            vec![approveCall::SELECTOR, depositForBurnCall::SELECTOR]
        );

        let stages: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|update| update.stage)
            .collect();
        assert_eq!(
            stages,
            vec![
                BridgeStage::Approve,
                BridgeStage::ApproveConfirmed,
                BridgeStage::Burning,
                BridgeStage::BurnConfirmed,
            ]
        );
    }

    #[tokio::test]
    async fn test_skips_approval_when_allowance_sufficient() {
        let wallet = FakeEvmWallet::new(NamedChain::Arbitrum, Address::repeat_byte(1))
            .with_allowance(U256::from(10_000_000u64))
            .with_burn_message(sample_burn_message(DomainId::Arbitrum, 2, 10_000_000));

        burn(
            &protocol(),
            &params(&wallet),
            U256::from(10_000_000u64),
            &StatusReporter::default(),
        )
        .await
        .unwrap();

        assert_eq!(wallet.sent_selectors(), vec![depositForBurnCall::SELECTOR]);
        assert_eq!(wallet.allowance_calls(), 1);
    }

    #[tokio::test]
    async fn test_burn_targets_settlement_domain_and_padded_recipient() {
        let wallet = FakeEvmWallet::new(NamedChain::Arbitrum, Address::repeat_byte(1))
            .with_allowance(U256::MAX)
            .with_burn_message(sample_burn_message(DomainId::Arbitrum, 3, 1));

        burn(&protocol(), &params(&wallet), U256::from(1u64), &StatusReporter::default())
            .await
            .unwrap();

        let sent = wallet.sent_transactions();
        let input = sent[0].input.input().unwrap();
        let call = depositForBurnCall::abi_decode(input).unwrap();

        assert_eq!(call.destinationDomain, DomainId::Base.as_u32());
        assert_eq!(call.mintRecipient, evm_mint_recipient(RECIPIENT).unwrap());
        assert_eq!(call.burnToken, Chain::Evm(NamedChain::Arbitrum).usdc_address().unwrap());
    }

    #[tokio::test]
    async fn test_missing_event_keeps_source_tx_hash() {
        let wallet = FakeEvmWallet::new(NamedChain::Arbitrum, Address::repeat_byte(1))
            .with_allowance(U256::MAX);

        let failure = burn(&protocol(), &params(&wallet), U256::from(1u64), &StatusReporter::default())
            .await
            .unwrap_err();

        assert_eq!(failure.error.code(), ErrorCode::TransactionFailed);
        assert!(failure.tx_hash.is_some());
        assert!(failure.committed);
        assert_eq!(wallet.sent_selectors().len(), 1);
    }

    #[tokio::test]
    async fn test_unmined_burn_times_out_with_its_hash() {
        let wallet = FakeEvmWallet::new(NamedChain::Arbitrum, Address::repeat_byte(1))
            .with_allowance(U256::MAX)
            .stalling_burns();

        let failure = burn(&protocol(), &params(&wallet), U256::from(1u64), &StatusReporter::default())
            .await
            .unwrap_err();

        assert_eq!(failure.error.code(), ErrorCode::TransactionTimeout);
        assert!(failure.committed);
        assert_eq!(
            failure.tx_hash,
            Some(wallet.stalled_transactions()[0].to_string())
        );
    }

    #[tokio::test]
    async fn test_user_rejection_surfaces_as_wallet_rejected() {
        let wallet = FakeEvmWallet::new(NamedChain::Arbitrum, Address::repeat_byte(1))
            .failing_with("User rejected the request.");

        let failure = burn(&protocol(), &params(&wallet), U256::from(1u64), &StatusReporter::default())
            .await
            .unwrap_err();

        assert_eq!(failure.error.code(), ErrorCode::WalletRejected);
        assert!(failure.tx_hash.is_none());
    }
}
