//! Integration tests for the bridging protocols using fake implementations
//!
//! Each test drives a full `bridge()` call through the public API: burn on a
//! fake source wallet, attestation from a scripted provider on a fake clock,
//! and mint on a fake destination wallet.

use std::sync::Arc;
use std::time::Duration;

use alloy_chains::NamedChain;
use alloy_primitives::{Address, U256};
use alloy_sol_types::SolCall;
use tokio::sync::mpsc;
use usdc_bridge::contracts::MessageTransmitter::receiveMessageCall;
use usdc_bridge::testing::{
    sample_burn_message, signature_hex, FakeAttestationProvider, FakeClock, FakeEvmWallet,
    FakeSvmWallet,
};
use usdc_bridge::{
    AttestationBridgeProtocol, AttestationProvider, BridgeError, BridgeParams, BridgeProtocol,
    BridgeStage, BridgeStatus, CctpMessage, Chain, Clock, DomainId, ErrorCode, EvmWallet,
    ManualFallbackProtocol, WalletHandle,
};

const RECIPIENT: &str = "0x742d35Cc6634C0532925a3b844Bc9e7595f8fA0d";
const SOLANA_OWNER: &str = "9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM";

/// Helper function to create a protocol wired to fakes
fn create_protocol(
    providers: &[FakeAttestationProvider],
    clock: &FakeClock,
) -> AttestationBridgeProtocol {
    AttestationBridgeProtocol::builder()
        .attestation_providers(
            providers
                .iter()
                .cloned()
                .map(|p| Arc::new(p) as Arc<dyn AttestationProvider>)
                .collect(),
        )
        .clock(Arc::new(clock.clone()) as Arc<dyn Clock>)
        .build()
}

/// An Arbitrum wallet with enough allowance whose burns emit `message`.
fn arbitrum_wallet(message: &[u8]) -> FakeEvmWallet {
    FakeEvmWallet::new(NamedChain::Arbitrum, Address::repeat_byte(0xaa))
        .with_allowance(U256::MAX)
        .with_burn_message(message.to_vec())
}

fn base_wallet() -> FakeEvmWallet {
    FakeEvmWallet::new(NamedChain::Base, Address::repeat_byte(0xbb))
}

fn evm_params(source: &FakeEvmWallet) -> BridgeParams {
    BridgeParams::builder()
        .source_chain(Chain::Evm(NamedChain::Arbitrum))
        .destination_chain(Chain::Evm(NamedChain::Base))
        .amount("10")
        .destination_address(RECIPIENT)
        .source_wallet(WalletHandle::Evm(Arc::new(source.clone())))
        .build()
}

#[tokio::test]
async fn test_attestation_pending_for_full_budget_times_out_with_recovery_data() {
    let clock = FakeClock::new();
    let attestation = FakeAttestationProvider::new();
    let message = sample_burn_message(DomainId::Arbitrum, 1, 10_000_000);
    let message_hash = CctpMessage::new(message.clone()).hash();
    attestation.add_always_pending(message_hash);

    let wallet = arbitrum_wallet(&message);
    let protocol = create_protocol(&[attestation.clone()], &clock);

    let result = protocol.bridge(&evm_params(&wallet)).await.unwrap();

    assert!(!result.success());
    assert_eq!(result.status(), BridgeStatus::Failed);
    assert_eq!(result.error_code(), Some(ErrorCode::AttestationTimeout));
    assert!(result.suggest_fallback(), "a faster protocol may help");
    assert!(result.source_tx_hash().is_some());
    assert_eq!(
        result.details().message.as_ref().map(|m| m.to_vec()),
        Some(message.clone()),
        "the burn is final, so the message must be retained"
    );
    assert_eq!(clock.total_sleep_time(), Duration::from_secs(15 * 60));
    assert!(attestation.call_count(message_hash) > 1);
}

#[tokio::test]
async fn test_attestation_after_90_seconds_without_destination_signer_requires_manual_mint() {
    let clock = FakeClock::new();
    let attestation = FakeAttestationProvider::new();
    let message = sample_burn_message(DomainId::Arbitrum, 2, 10_000_000);
    let message_hash = CctpMessage::new(message.clone()).hash();
    attestation.add_complete_after(
        message_hash,
        &clock,
        Duration::from_secs(90),
        &signature_hex(2),
    );

    let wallet = arbitrum_wallet(&message);
    let protocol = create_protocol(&[attestation], &clock);

    let result = protocol.bridge(&evm_params(&wallet)).await.unwrap();

    assert!(result.success());
    assert_eq!(result.status(), BridgeStatus::Minting);
    assert!(result.details().requires_manual_mint);
    assert_eq!(result.details().attestation.as_ref().map(|a| a.len()), Some(130));
    assert_eq!(result.details().message_hash, Some(message_hash));
    assert_eq!(result.details().recipient.as_deref(), Some(RECIPIENT));
    assert!(result.destination_tx_hash().is_none());
    assert!(clock.total_sleep_time() >= Duration::from_secs(90));
    assert!(clock.total_sleep_time() < Duration::from_secs(150));
}

#[tokio::test]
async fn test_full_evm_transfer_mints_on_settlement_chain() {
    let clock = FakeClock::new();
    let attestation = FakeAttestationProvider::new();
    let message = sample_burn_message(DomainId::Arbitrum, 3, 10_000_000);
    let message_hash = CctpMessage::new(message.clone()).hash();
    attestation.add_pending_then_complete(message_hash, 2, &signature_hex(1));

    let source = arbitrum_wallet(&message);
    let destination = base_wallet();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let params = BridgeParams::builder()
        .source_chain(Chain::Evm(NamedChain::Arbitrum))
        .destination_chain(Chain::Evm(NamedChain::Base))
        .amount("10")
        .destination_address(RECIPIENT)
        .source_wallet(WalletHandle::Evm(Arc::new(source.clone())))
        .destination_wallet(Arc::new(destination.clone()) as Arc<dyn EvmWallet>)
        .status_tx(tx)
        .build();

    let protocol = create_protocol(&[attestation], &clock);
    let result = protocol.bridge(&params).await.unwrap();

    assert!(result.success());
    assert_eq!(result.status(), BridgeStatus::Complete);
    assert!(result.destination_tx_hash().is_some());
    assert!(!result.details().requires_manual_mint);
    assert_eq!(destination.sent_selectors(), vec![receiveMessageCall::SELECTOR]);

    let mint = &destination.sent_transactions()[0];
    assert_eq!(mint.from, Some(destination.address()));
    assert_eq!(
        mint.to.and_then(|kind| kind.to().copied()),
        Some(Chain::Evm(NamedChain::Base).message_transmitter_address().unwrap())
    );

    let stages: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok())
        .map(|update| update.stage)
        .collect();
    assert_eq!(
        stages,
        vec![
            BridgeStage::Burning,
            BridgeStage::BurnConfirmed,
            BridgeStage::WaitingAttestation,
            BridgeStage::AttestationReceived,
            BridgeStage::Minting,
            BridgeStage::Complete,
        ]
    );

    let health = protocol.health();
    assert!(health.is_healthy);
    assert_eq!(health.success_rate, 1.0);
}

#[tokio::test]
async fn test_reverted_mint_falls_back_to_manual_mint() {
    let clock = FakeClock::new();
    let attestation = FakeAttestationProvider::new();
    let message = sample_burn_message(DomainId::Arbitrum, 4, 10_000_000);
    attestation.add_complete_response(CctpMessage::new(message.clone()).hash(), &signature_hex(1));

    let source = arbitrum_wallet(&message);
    let destination = base_wallet().reverting_mints();
    let params = BridgeParams::builder()
        .source_chain(Chain::Evm(NamedChain::Arbitrum))
        .destination_chain(Chain::Evm(NamedChain::Base))
        .amount("10")
        .destination_address(RECIPIENT)
        .source_wallet(WalletHandle::Evm(Arc::new(source)))
        .destination_wallet(Arc::new(destination) as Arc<dyn EvmWallet>)
        .build();

    let result = create_protocol(&[attestation], &clock)
        .bridge(&params)
        .await
        .unwrap();

    assert!(result.success());
    assert_eq!(result.status(), BridgeStatus::Minting);
    assert!(result.details().requires_manual_mint);
    assert!(result.details().mint_error.is_some());
    assert!(result.details().attestation.is_some());
}

#[tokio::test]
async fn test_destination_signer_on_wrong_chain_is_not_used() {
    let clock = FakeClock::new();
    let attestation = FakeAttestationProvider::new();
    let message = sample_burn_message(DomainId::Arbitrum, 5, 10_000_000);
    attestation.add_complete_response(CctpMessage::new(message.clone()).hash(), &signature_hex(1));

    let destination = FakeEvmWallet::new(NamedChain::Optimism, Address::repeat_byte(0xcc));
    let params = BridgeParams::builder()
        .source_chain(Chain::Evm(NamedChain::Arbitrum))
        .destination_chain(Chain::Evm(NamedChain::Base))
        .amount("10")
        .destination_address(RECIPIENT)
        .source_wallet(WalletHandle::Evm(Arc::new(arbitrum_wallet(&message))))
        .destination_wallet(Arc::new(destination.clone()) as Arc<dyn EvmWallet>)
        .build();

    let result = create_protocol(&[attestation], &clock)
        .bridge(&params)
        .await
        .unwrap();

    assert_eq!(result.status(), BridgeStatus::Minting);
    assert!(result.details().requires_manual_mint);
    assert_eq!(destination.call_count(), 0);
}

#[tokio::test]
async fn test_dry_run_makes_no_calls() {
    let clock = FakeClock::new();
    let attestation = FakeAttestationProvider::new();
    let wallet = arbitrum_wallet(&sample_burn_message(DomainId::Arbitrum, 6, 1));
    let params = BridgeParams::builder()
        .source_chain(Chain::Evm(NamedChain::Arbitrum))
        .destination_chain(Chain::Evm(NamedChain::Base))
        .amount("10")
        .destination_address(RECIPIENT)
        .source_wallet(WalletHandle::Evm(Arc::new(wallet.clone())))
        .dry_run(true)
        .build();

    let protocol = create_protocol(&[attestation.clone()], &clock);
    let result = protocol.bridge(&params).await.unwrap();

    assert!(result.success());
    assert_eq!(result.status(), BridgeStatus::Pending);
    assert!(result.bridge_id().starts_with("dryrun-"));
    assert_eq!(wallet.call_count(), 0);
    assert_eq!(attestation.total_calls(), 0);
    assert_eq!(clock.sleep_count(), 0);
    assert_eq!(protocol.health(), create_protocol(&[], &clock).health());
}

#[tokio::test]
async fn test_unsupported_route_rejected_without_calls() {
    let clock = FakeClock::new();
    let attestation = FakeAttestationProvider::new();
    let wallet = FakeEvmWallet::new(NamedChain::Base, Address::repeat_byte(0xaa));
    let params = BridgeParams::builder()
        .source_chain(Chain::Evm(NamedChain::Base))
        .destination_chain(Chain::Evm(NamedChain::Arbitrum))
        .amount("10")
        .destination_address(RECIPIENT)
        .source_wallet(WalletHandle::Evm(Arc::new(wallet.clone())))
        .build();

    let protocol = create_protocol(&[attestation.clone()], &clock);
    let error = protocol.bridge(&params).await.unwrap_err();

    assert!(matches!(error, BridgeError::UnsupportedRoute { .. }));
    assert_eq!(error.code(), ErrorCode::UnsupportedRoute);
    assert_eq!(wallet.call_count(), 0);
    assert_eq!(attestation.total_calls(), 0);
    assert_eq!(protocol.health().consecutive_failures, 0);
}

#[tokio::test]
async fn test_invalid_amount_rejected_by_validation() {
    let protocol = create_protocol(&[], &FakeClock::new());
    let wallet = arbitrum_wallet(&[]);
    let params = BridgeParams::builder()
        .source_chain(Chain::Evm(NamedChain::Arbitrum))
        .destination_chain(Chain::Evm(NamedChain::Base))
        .amount("0")
        .destination_address(RECIPIENT)
        .source_wallet(WalletHandle::Evm(Arc::new(wallet.clone())))
        .build();

    assert!(matches!(
        protocol.bridge(&params).await,
        Err(BridgeError::InvalidParams(_))
    ));
    assert_eq!(wallet.call_count(), 0);
}

#[tokio::test]
async fn test_missing_message_event_is_transaction_failed() {
    let clock = FakeClock::new();
    let attestation = FakeAttestationProvider::new();
    let wallet =
        FakeEvmWallet::new(NamedChain::Arbitrum, Address::repeat_byte(0xaa)).with_allowance(U256::MAX);

    let result = create_protocol(&[attestation.clone()], &clock)
        .bridge(&evm_params(&wallet))
        .await
        .unwrap();

    assert!(!result.success());
    assert_eq!(result.error_code(), Some(ErrorCode::TransactionFailed));
    assert!(!result.suggest_fallback());
    assert!(result.source_tx_hash().is_some());
    assert_eq!(wallet.sent_transactions().len(), 1, "the burn is never retried");
    assert_eq!(attestation.total_calls(), 0);
}

#[tokio::test]
async fn test_unmined_burn_keeps_its_hash_and_blocks_fallback() {
    let clock = FakeClock::new();
    let attestation = FakeAttestationProvider::new();
    let wallet = FakeEvmWallet::new(NamedChain::Arbitrum, Address::repeat_byte(0xaa))
        .with_allowance(U256::MAX)
        .stalling_burns();

    let protocols: Vec<Arc<dyn BridgeProtocol>> = vec![
        Arc::new(create_protocol(&[attestation.clone()], &clock)),
        Arc::new(ManualFallbackProtocol::default()),
    ];
    let params = evm_params(&wallet);

    let mut outcomes = Vec::new();
    for protocol in &protocols {
        let result = protocol.bridge(&params).await.unwrap();
        let done = result.success() || !result.suggest_fallback();
        outcomes.push(result);
        if done {
            break;
        }
    }

    assert_eq!(outcomes.len(), 1, "the burn may still mine, so nothing else starts");
    let result = &outcomes[0];
    assert!(!result.success());
    assert_eq!(result.error_code(), Some(ErrorCode::TransactionTimeout));
    assert!(!result.suggest_fallback());
    assert_eq!(
        result.source_tx_hash(),
        Some(wallet.stalled_transactions()[0].to_string().as_str())
    );
    assert_eq!(wallet.sent_transactions().len(), 1);
    assert_eq!(attestation.total_calls(), 0);
}

#[tokio::test]
async fn test_solana_source_burns_and_hands_off_mint() {
    let clock = FakeClock::new();
    let attestation = FakeAttestationProvider::new();
    let message = sample_burn_message(DomainId::Solana, 7, 2_500_000);
    let message_hash = CctpMessage::new(message.clone()).hash();
    attestation.add_pending_then_complete(message_hash, 1, &signature_hex(1));

    let wallet = FakeSvmWallet::new(SOLANA_OWNER).with_burn_message(&message);
    let params = BridgeParams::builder()
        .source_chain(Chain::Solana)
        .destination_chain(Chain::Evm(NamedChain::Base))
        .amount("2.5")
        .destination_address(RECIPIENT)
        .source_wallet(WalletHandle::Svm(Arc::new(wallet.clone())))
        .build();

    let result = create_protocol(&[attestation], &clock)
        .bridge(&params)
        .await
        .unwrap();

    assert!(result.success());
    assert_eq!(result.status(), BridgeStatus::Minting);
    assert_eq!(result.source_tx_hash(), Some("5ig1"));
    assert_eq!(result.details().message_hash, Some(message_hash));
    assert_eq!(wallet.calls().len(), 1);
}

#[tokio::test]
async fn test_user_rejection_is_not_a_fallback_case() {
    let clock = FakeClock::new();
    let wallet = FakeSvmWallet::new(SOLANA_OWNER).failing_with("User rejected the request.");
    let params = BridgeParams::builder()
        .source_chain(Chain::Solana)
        .destination_chain(Chain::Evm(NamedChain::Base))
        .amount("1")
        .destination_address(RECIPIENT)
        .source_wallet(WalletHandle::Svm(Arc::new(wallet)))
        .build();

    let result = create_protocol(&[], &clock).bridge(&params).await.unwrap();

    assert_eq!(result.error_code(), Some(ErrorCode::WalletRejected));
    assert!(!result.suggest_fallback());
    assert!(result.source_tx_hash().is_none());
}

#[tokio::test]
async fn test_cancelled_before_burn_submits_nothing() {
    let clock = FakeClock::new();
    let wallet = arbitrum_wallet(&sample_burn_message(DomainId::Arbitrum, 8, 1));
    let params = BridgeParams::builder()
        .source_chain(Chain::Evm(NamedChain::Arbitrum))
        .destination_chain(Chain::Evm(NamedChain::Base))
        .amount("10")
        .destination_address(RECIPIENT)
        .source_wallet(WalletHandle::Evm(Arc::new(wallet.clone())))
        .build();
    params.cancel_token().cancel();

    let result = create_protocol(&[], &clock).bridge(&params).await.unwrap();

    assert_eq!(result.error_code(), Some(ErrorCode::WalletRejected));
    assert_eq!(wallet.call_count(), 0);
}

#[tokio::test]
async fn test_proxy_outage_falls_through_to_direct_endpoint() {
    let clock = FakeClock::new();
    let proxy = FakeAttestationProvider::with_endpoint("proxy");
    let direct = FakeAttestationProvider::with_endpoint("direct");
    let message = sample_burn_message(DomainId::Arbitrum, 9, 10_000_000);
    let message_hash = CctpMessage::new(message.clone()).hash();
    proxy.set_unreachable(true);
    direct.add_complete_response(message_hash, &signature_hex(1));

    let result = create_protocol(&[proxy.clone(), direct.clone()], &clock)
        .bridge(&evm_params(&arbitrum_wallet(&message)))
        .await
        .unwrap();

    assert!(result.success());
    assert_eq!(proxy.call_count(message_hash), 1);
    assert_eq!(direct.call_count(message_hash), 1);
}

#[tokio::test]
async fn test_five_consecutive_failures_mark_protocol_unhealthy() {
    let clock = FakeClock::new();
    let attestation = FakeAttestationProvider::new();
    let protocol = create_protocol(&[attestation.clone()], &clock);
    let unsigned = BridgeParams::builder()
        .source_chain(Chain::Evm(NamedChain::Arbitrum))
        .destination_chain(Chain::Evm(NamedChain::Base))
        .amount("10")
        .destination_address(RECIPIENT)
        .build();

    for _ in 0..4 {
        protocol.bridge(&unsigned).await.unwrap();
    }
    assert!(protocol.health().is_healthy);

    protocol.bridge(&unsigned).await.unwrap();
    let health = protocol.health();
    assert!(!health.is_healthy);
    assert_eq!(health.consecutive_failures, 5);
    assert!(health.last_failure.is_some());

    let message = sample_burn_message(DomainId::Arbitrum, 10, 10_000_000);
    attestation.add_complete_response(CctpMessage::new(message.clone()).hash(), &signature_hex(1));
    let result = protocol
        .bridge(&evm_params(&arbitrum_wallet(&message)))
        .await
        .unwrap();
    assert!(result.success());

    let health = protocol.health();
    assert_eq!(health.consecutive_failures, 0);
    // 1 success out of 6 is still below the minimum success rate.
    assert!(!health.is_healthy);
}

#[tokio::test]
async fn test_orchestrator_falls_back_to_manual_after_timeout() {
    let clock = FakeClock::new();
    let attestation = FakeAttestationProvider::new();
    let message = sample_burn_message(DomainId::Arbitrum, 11, 10_000_000);
    attestation.add_always_pending(CctpMessage::new(message.clone()).hash());

    let protocols: Vec<Arc<dyn BridgeProtocol>> = vec![
        Arc::new(create_protocol(&[attestation], &clock)),
        Arc::new(ManualFallbackProtocol::default()),
    ];
    let params = evm_params(&arbitrum_wallet(&message));

    let mut outcomes = Vec::new();
    for protocol in &protocols {
        if !protocol.supports(params.source_chain(), params.destination_chain()) {
            continue;
        }
        protocol.validate(&params).unwrap();
        let result = protocol.bridge(&params).await.unwrap();
        let done = result.success() || !result.suggest_fallback();
        outcomes.push(result);
        if done {
            break;
        }
    }

    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0].error_code(), Some(ErrorCode::AttestationTimeout));
    assert_eq!(outcomes[1].protocol(), "manual");
    assert_eq!(outcomes[1].status(), BridgeStatus::ManualActionRequired);
    assert!(outcomes[1]
        .details()
        .redirect_url
        .as_deref()
        .is_some_and(|url| url.contains("from=arbitrum") && url.contains("to=base")));
}
