//! Test utilities and fake implementations of the bridge capabilities
//!
//! Every outside-world seam in [`crate::traits`] has a fake here, so a full
//! burn → attest → mint pipeline (including a fifteen-minute attestation
//! timeout) runs in milliseconds without a node, an HTTP server or a real
//! clock.
//!
//! The fakes are cheap to clone and share state between clones, so a test can
//! hand one copy to the protocol and inspect the other afterwards.

use alloy_chains::NamedChain;
use alloy_primitives::{keccak256, Address, Bytes, FixedBytes, Log, LogData, TxHash, U256};
use alloy_rpc_types::TransactionRequest;
use alloy_sol_types::{SolCall, SolEvent, SolValue};
use async_trait::async_trait;
use base64::prelude::*;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::chain::Chain;
use crate::contracts::MessageTransmitter::{receiveMessageCall, MessageSent};
use crate::contracts::TokenMessenger::depositForBurnCall;
use crate::error::{BridgeError, Result};
use crate::protocol::{
    AttestationResponse, BurnMessage, DomainId, MessageHeader, PROGRAM_DATA_PREFIX,
    SIGNATURE_LENGTH,
};
use crate::traits::{
    AttestationProvider, Clock, EvmReceipt, EvmWallet, SvmConfirmation, SvmProgramCall,
    SvmWallet,
};

// ============================================================================
// Message helpers
// ============================================================================

/// Builds a well-formed v1 burn message from `source` to Base.
pub fn sample_burn_message(source: DomainId, nonce: u64, amount: u64) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(MessageHeader::SIZE + BurnMessage::SIZE);
    bytes.extend_from_slice(&0u32.to_be_bytes());
    bytes.extend_from_slice(&source.as_u32().to_be_bytes());
    bytes.extend_from_slice(&DomainId::Base.as_u32().to_be_bytes());
    bytes.extend_from_slice(&nonce.to_be_bytes());
    bytes.extend_from_slice(&[0x11; 32]);
    bytes.extend_from_slice(&[0x22; 32]);
    bytes.extend_from_slice(&[0u8; 32]);
    bytes.extend_from_slice(&0u32.to_be_bytes());
    bytes.extend_from_slice(&[0x33; 32]);
    bytes.extend_from_slice(&[0x44; 32]);
    bytes.extend_from_slice(&U256::from(amount).to_be_bytes::<32>());
    bytes.extend_from_slice(&[0x55; 32]);
    bytes
}

/// A `MessageSent(bytes)` log carrying `message`.
pub fn message_sent_log(message: &[u8]) -> Log {
    let data = (Bytes::copy_from_slice(message),).abi_encode_params();
    Log {
        address: Address::ZERO,
        data: LogData::new_unchecked(vec![MessageSent::SIGNATURE_HASH], data.into()),
    }
}

/// Hex attestation made of `count` 65-byte signatures.
pub fn signature_hex(count: usize) -> String {
    format!("0x{}", "ab".repeat(SIGNATURE_LENGTH * count))
}

// ============================================================================
// Fake Attestation Provider
// ============================================================================

#[derive(Clone, Debug)]
enum Script {
    /// Each call returns the next response; the last one repeats.
    Sequence(Vec<AttestationResponse>),
    /// Pending until the clock reaches `at`, then complete.
    ReadyAt {
        clock: FakeClock,
        at: Instant,
        attestation: String,
    },
}

/// A fake attestation endpoint.
///
/// This allows testing scenarios like:
/// - Immediate success
/// - Pending → Complete progression, by call count or by elapsed time
/// - Failed attestations
/// - An unreachable endpoint (every call errors)
#[derive(Clone, Debug)]
pub struct FakeAttestationProvider {
    endpoint: String,
    scripts: Arc<Mutex<HashMap<FixedBytes<32>, Script>>>,
    call_counts: Arc<Mutex<HashMap<FixedBytes<32>, usize>>>,
    unreachable: Arc<Mutex<bool>>,
}

impl Default for FakeAttestationProvider {
    fn default() -> Self {
        Self::with_endpoint("fake")
    }
}

impl FakeAttestationProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fake whose [`AttestationProvider::endpoint`] label is `endpoint`.
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            scripts: Arc::default(),
            call_counts: Arc::default(),
            unreachable: Arc::default(),
        }
    }

    /// Configure a sequence of responses for a message hash.
    pub fn add_response_sequence(
        &self,
        message_hash: FixedBytes<32>,
        responses: Vec<AttestationResponse>,
    ) {
        self.scripts
            .lock()
            .unwrap()
            .insert(message_hash, Script::Sequence(responses));
    }

    /// Configure an immediate complete response with attestation data
    pub fn add_complete_response(&self, message_hash: FixedBytes<32>, attestation_hex: &str) {
        self.add_response_sequence(
            message_hash,
            vec![AttestationResponse::complete(attestation_hex)],
        );
    }

    /// Configure an immediate failed response
    pub fn add_failed_response(&self, message_hash: FixedBytes<32>, error: &str) {
        self.add_response_sequence(message_hash, vec![AttestationResponse::failed(error)]);
    }

    /// Configure a pending response that never completes
    pub fn add_always_pending(&self, message_hash: FixedBytes<32>) {
        self.add_response_sequence(message_hash, vec![AttestationResponse::pending()]);
    }

    /// Pending for `pending_count` calls, then complete.
    pub fn add_pending_then_complete(
        &self,
        message_hash: FixedBytes<32>,
        pending_count: usize,
        attestation_hex: &str,
    ) {
        let mut responses = vec![AttestationResponse::pending(); pending_count];
        responses.push(AttestationResponse::complete(attestation_hex));
        self.add_response_sequence(message_hash, responses);
    }

    /// Pending until `clock` has advanced `after` from now, then complete.
    pub fn add_complete_after(
        &self,
        message_hash: FixedBytes<32>,
        clock: &FakeClock,
        after: Duration,
        attestation_hex: &str,
    ) {
        self.scripts.lock().unwrap().insert(
            message_hash,
            Script::ReadyAt {
                clock: clock.clone(),
                at: clock.now() + after,
                attestation: attestation_hex.to_string(),
            },
        );
    }

    /// Make every subsequent call fail as if the endpoint were down.
    pub fn set_unreachable(&self, unreachable: bool) {
        *self.unreachable.lock().unwrap() = unreachable;
    }

    /// Number of requests made for a message hash
    pub fn call_count(&self, message_hash: FixedBytes<32>) -> usize {
        self.call_counts
            .lock()
            .unwrap()
            .get(&message_hash)
            .copied()
            .unwrap_or(0)
    }

    /// Number of requests made across all hashes
    pub fn total_calls(&self) -> usize {
        self.call_counts.lock().unwrap().values().sum()
    }
}

#[async_trait]
impl AttestationProvider for FakeAttestationProvider {
    async fn get_attestation(&self, message_hash: FixedBytes<32>) -> Result<AttestationResponse> {
        let call_index = {
            let mut counts = self.call_counts.lock().unwrap();
            let count = counts.entry(message_hash).or_insert(0);
            *count += 1;
            *count - 1
        };

        if *self.unreachable.lock().unwrap() {
            return Err(BridgeError::Provider(format!(
                "{}: connection refused",
                self.endpoint
            )));
        }

        match self.scripts.lock().unwrap().get(&message_hash) {
            Some(Script::Sequence(responses)) => responses
                .get(call_index)
                .or(responses.last())
                .cloned()
                .ok_or_else(|| BridgeError::Provider("empty response script".to_string())),
            Some(Script::ReadyAt {
                clock,
                at,
                attestation,
            }) => {
                if clock.now() >= *at {
                    Ok(AttestationResponse::complete(attestation.clone()))
                } else {
                    Ok(AttestationResponse::pending())
                }
            }
            None => Err(BridgeError::Provider("attestation not found".to_string())),
        }
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

// ============================================================================
// Fake Clock
// ============================================================================

/// A fake clock that allows fast-forwarding time in tests.
///
/// `sleep` returns immediately and advances the clock by the requested
/// duration, so a polling loop sees time pass without waiting.
#[derive(Clone, Debug)]
pub struct FakeClock {
    current_time: Arc<Mutex<Instant>>,
    sleep_log: Arc<Mutex<Vec<Duration>>>,
}

impl Default for FakeClock {
    fn default() -> Self {
        Self {
            current_time: Arc::new(Mutex::new(Instant::now())),
            sleep_log: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl FakeClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fast-forward the clock by the given duration
    pub fn advance(&self, duration: Duration) {
        let mut time = self.current_time.lock().unwrap();
        *time += duration;
    }

    /// Get the total time "slept" by this clock
    pub fn total_sleep_time(&self) -> Duration {
        self.sleep_log.lock().unwrap().iter().sum()
    }

    /// Get the number of times sleep was called
    pub fn sleep_count(&self) -> usize {
        self.sleep_log.lock().unwrap().len()
    }
}

#[async_trait]
impl Clock for FakeClock {
    async fn sleep(&self, duration: Duration) {
        self.sleep_log.lock().unwrap().push(duration);
        self.advance(duration);
    }

    fn now(&self) -> Instant {
        *self.current_time.lock().unwrap()
    }
}

// ============================================================================
// Fake EVM Wallet
// ============================================================================

#[derive(Debug, Default)]
struct EvmWalletState {
    allowance: U256,
    burn_message: Option<Vec<u8>>,
    failure: Option<String>,
    revert_mints: bool,
    stall_burns: bool,
    allowance_calls: usize,
    sent: Vec<TransactionRequest>,
    receipts: HashMap<TxHash, EvmReceipt>,
    stalled: Vec<TxHash>,
}

/// A fake EVM signer.
///
/// Burns (`depositForBurn`) confirm with a `MessageSent` log carrying the
/// configured message; approvals and mints confirm with no logs. Every call is
/// recorded.
///
/// This allows testing scenarios like:
/// - Allowance already sufficient (no approval sent)
/// - A burn receipt without the `MessageSent` event
/// - A wallet rejection or RPC error on submission
/// - A burn that is broadcast but never mined
/// - A reverted mint on the destination chain
#[derive(Clone, Debug)]
pub struct FakeEvmWallet {
    address: Address,
    chain: NamedChain,
    state: Arc<Mutex<EvmWalletState>>,
}

impl FakeEvmWallet {
    pub fn new(chain: NamedChain, address: Address) -> Self {
        Self {
            address,
            chain,
            state: Arc::default(),
        }
    }

    /// Allowance reported for any token/spender pair.
    pub fn with_allowance(self, allowance: U256) -> Self {
        self.state.lock().unwrap().allowance = allowance;
        self
    }

    /// Message emitted by confirmed burns. Without one, burn receipts carry
    /// no `MessageSent` log.
    pub fn with_burn_message(self, message: Vec<u8>) -> Self {
        self.state.lock().unwrap().burn_message = Some(message);
        self
    }

    /// Every submission fails with this raw error text.
    pub fn failing_with(self, signal: impl Into<String>) -> Self {
        self.state.lock().unwrap().failure = Some(signal.into());
        self
    }

    /// `receiveMessage` transactions are mined but revert.
    pub fn reverting_mints(self) -> Self {
        self.state.lock().unwrap().revert_mints = true;
        self
    }

    /// `depositForBurn` transactions broadcast but waiting for their receipt
    /// never returns.
    pub fn stalling_burns(self) -> Self {
        self.state.lock().unwrap().stall_burns = true;
        self
    }

    pub fn sent_transactions(&self) -> Vec<TransactionRequest> {
        self.state.lock().unwrap().sent.clone()
    }

    /// Selectors of the submitted transactions, in order.
    pub fn sent_selectors(&self) -> Vec<[u8; 4]> {
        self.sent_transactions()
            .iter()
            .filter_map(|tx| tx.input.input())
            .filter_map(|input| input.get(..4))
            .filter_map(|selector| selector.try_into().ok())
            .collect()
    }

    /// Hashes of broadcast transactions whose receipt never arrives.
    pub fn stalled_transactions(&self) -> Vec<TxHash> {
        self.state.lock().unwrap().stalled.clone()
    }

    pub fn allowance_calls(&self) -> usize {
        self.state.lock().unwrap().allowance_calls
    }

    /// Reads plus writes made against this wallet
    pub fn call_count(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.allowance_calls + state.sent.len()
    }
}

#[async_trait]
impl EvmWallet for FakeEvmWallet {
    fn address(&self) -> Address {
        self.address
    }

    fn chain(&self) -> NamedChain {
        self.chain
    }

    async fn allowance(&self, _token: Address, _spender: Address) -> Result<U256> {
        let mut state = self.state.lock().unwrap();
        state.allowance_calls += 1;
        Ok(state.allowance)
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxHash> {
        let mut state = self.state.lock().unwrap();
        state.sent.push(tx.clone());

        if let Some(signal) = &state.failure {
            return Err(BridgeError::from_signal(signal.clone()));
        }

        let input = tx.input.input().cloned().unwrap_or_default();
        let selector = input.get(..4).unwrap_or_default();
        let nonce = state.sent.len().to_be_bytes();
        let tx_hash = TxHash::from(keccak256([&input[..], &nonce[..]].concat()));

        let mut receipt = EvmReceipt {
            tx_hash,
            success: true,
            logs: Vec::new(),
        };

        if selector == depositForBurnCall::SELECTOR.as_slice() {
            if state.stall_burns {
                state.stalled.push(tx_hash);
                return Ok(tx_hash);
            }
            if let Some(message) = &state.burn_message {
                receipt.logs.push(message_sent_log(message));
            }
        } else if selector == receiveMessageCall::SELECTOR.as_slice() && state.revert_mints {
            receipt.success = false;
        }

        state.receipts.insert(tx_hash, receipt);
        Ok(tx_hash)
    }

    async fn wait_for_receipt(&self, tx_hash: TxHash) -> Result<EvmReceipt> {
        let receipt = {
            let state = self.state.lock().unwrap();
            if state.stalled.contains(&tx_hash) {
                None
            } else {
                Some(state.receipts.get(&tx_hash).cloned().ok_or_else(|| {
                    BridgeError::Provider(format!("transaction {tx_hash} was never sent"))
                }))
            }
        };

        match receipt {
            Some(receipt) => receipt,
            None => std::future::pending().await,
        }
    }
}

// ============================================================================
// Fake SVM Wallet
// ============================================================================

#[derive(Debug, Default)]
struct SvmWalletState {
    log_messages: Vec<String>,
    failure: Option<String>,
    stall_confirmations: bool,
    calls: Vec<SvmProgramCall>,
}

/// A fake Solana signer returning scripted program logs.
#[derive(Clone, Debug)]
pub struct FakeSvmWallet {
    public_key: String,
    cluster: Chain,
    state: Arc<Mutex<SvmWalletState>>,
}

impl FakeSvmWallet {
    /// A mainnet signer.
    pub fn new(public_key: impl Into<String>) -> Self {
        Self {
            public_key: public_key.into(),
            cluster: Chain::Solana,
            state: Arc::default(),
        }
    }

    pub fn on_cluster(mut self, cluster: Chain) -> Self {
        self.cluster = cluster;
        self
    }

    /// Program logs as emitted by a real `deposit_for_burn`: an unrelated
    /// short event followed by the message.
    pub fn with_burn_message(self, message: &[u8]) -> Self {
        let logs = vec![
            "Program CCTPiPYPc6AsJuwueEnWgSgucamXDZwBd53dQ11YiKX3 invoke [1]".to_string(),
            format!("{PROGRAM_DATA_PREFIX}{}", BASE64_STANDARD.encode([7u8; 48])),
            format!("{PROGRAM_DATA_PREFIX}{}", BASE64_STANDARD.encode(message)),
            "Program CCTPiPYPc6AsJuwueEnWgSgucamXDZwBd53dQ11YiKX3 success".to_string(),
        ];
        self.with_log_messages(logs)
    }

    pub fn with_log_messages(self, logs: Vec<String>) -> Self {
        self.state.lock().unwrap().log_messages = logs;
        self
    }

    pub fn failing_with(self, signal: impl Into<String>) -> Self {
        self.state.lock().unwrap().failure = Some(signal.into());
        self
    }

    /// Sent transactions are never confirmed.
    pub fn stalling_confirmations(self) -> Self {
        self.state.lock().unwrap().stall_confirmations = true;
        self
    }

    pub fn calls(&self) -> Vec<SvmProgramCall> {
        self.state.lock().unwrap().calls.clone()
    }
}

#[async_trait]
impl SvmWallet for FakeSvmWallet {
    fn public_key(&self) -> String {
        self.public_key.clone()
    }

    fn cluster(&self) -> Chain {
        self.cluster
    }

    async fn send_program_call(&self, call: SvmProgramCall) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);

        if let Some(signal) = &state.failure {
            return Err(BridgeError::from_signal(signal.clone()));
        }

        Ok(format!("5ig{}", state.calls.len()))
    }

    async fn confirm_signature(&self, signature: &str) -> Result<SvmConfirmation> {
        let log_messages = {
            let state = self.state.lock().unwrap();
            (!state.stall_confirmations).then(|| state.log_messages.clone())
        };

        match log_messages {
            Some(log_messages) => Ok(SvmConfirmation {
                signature: signature.to_string(),
                log_messages,
            }),
            None => std::future::pending().await,
        }
    }
}
