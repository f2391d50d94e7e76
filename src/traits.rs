//! Core trait abstractions for bridge operations.
//!
//! Everything that touches the outside world sits behind one of these traits:
//! chain wallets, the attestation authority and time. Protocol code only ever
//! sees the traits, so tests can substitute fakes (see [`crate::testing`])
//! and drive a full burn-and-mint pipeline, including fifteen minutes of
//! attestation polling, without a node, a network or a real clock.
//!
//! Wallets are split per chain family. A caller hands the protocol an explicit
//! [`WalletHandle`](crate::WalletHandle) tag instead of an object whose shape
//! has to be inspected at runtime.

use alloy_chains::NamedChain;
use alloy_primitives::{Address, FixedBytes, Log, TxHash, U256};
use alloy_rpc_types::TransactionRequest;
use async_trait::async_trait;
use std::time::{Duration, Instant};

use crate::chain::Chain;
use crate::error::Result;
use crate::protocol::AttestationResponse;

/// Confirmed EVM transaction, reduced to what the bridge consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvmReceipt {
    pub tx_hash: TxHash,
    /// `false` when the transaction was mined but reverted.
    pub success: bool,
    pub logs: Vec<Log>,
}

/// Signing capability for an EVM chain.
///
/// Implementations submit transactions from [`EvmWallet::address`] and wait
/// for them to be mined as two separate steps, so the caller holds the hash
/// of a broadcast transaction even when waiting for it fails. Failures should
/// be mapped through
/// [`BridgeError::from_signal`](crate::BridgeError::from_signal) so that a
/// user rejection surfaces as `WALLET_REJECTED` rather than a generic error.
///
/// # Test Scenarios
///
/// Implementing this trait with fakes enables testing:
/// - Allowance already sufficient (no approval sent)
/// - Burn confirmed without a `MessageSent` log
/// - User rejection at the signing prompt
/// - Reverted mint on the destination chain
#[async_trait]
pub trait EvmWallet: Send + Sync {
    /// Address that signs and pays for transactions.
    fn address(&self) -> Address;

    /// Chain the wallet is currently connected to.
    fn chain(&self) -> NamedChain;

    /// Current ERC20 allowance granted by this wallet to `spender`.
    async fn allowance(&self, token: Address, spender: Address) -> Result<U256>;

    /// Signs and broadcasts the transaction, returning its hash.
    async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxHash>;

    /// Waits for a broadcast transaction to be mined.
    async fn wait_for_receipt(&self, tx_hash: TxHash) -> Result<EvmReceipt>;
}

/// A program invocation on the alt-VM (Solana) family.
///
/// Derived accounts (PDAs, associated token accounts) are resolved by the
/// wallet capability, which owns the chain connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SvmProgramCall {
    /// Base58 program id.
    pub program_id: String,
    /// Named accounts the wallet must resolve and attach, in instruction order.
    pub accounts: Vec<SvmAccount>,
    /// Serialized instruction data (discriminator followed by arguments).
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SvmAccount {
    pub name: &'static str,
    /// Base58 key when known up front, `None` when it must be derived.
    pub pubkey: Option<String>,
    pub is_signer: bool,
    pub is_writable: bool,
}

/// Confirmed alt-VM transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SvmConfirmation {
    /// Base58 transaction signature.
    pub signature: String,
    /// Program log lines from the confirmed transaction's metadata.
    pub log_messages: Vec<String>,
}

/// Signing capability for the alt-VM (Solana) family.
#[async_trait]
pub trait SvmWallet: Send + Sync {
    /// Base58 public key of the signer.
    fn public_key(&self) -> String;

    /// Cluster the wallet is connected to, [`Chain::Solana`] or
    /// [`Chain::SolanaDevnet`].
    fn cluster(&self) -> Chain;

    /// Signs and sends a single program call, returning the base58
    /// transaction signature.
    async fn send_program_call(&self, call: SvmProgramCall) -> Result<String>;

    /// Waits for a sent transaction to be confirmed and returns its logs.
    async fn confirm_signature(&self, signature: &str) -> Result<SvmConfirmation>;
}

/// Trait for attestation retrieval from an attestation endpoint.
///
/// One implementation talks to one endpoint; the bridge layers endpoint
/// fallback and polling on top.
///
/// # Test Scenarios
///
/// Implementing this trait with fakes enables testing:
/// - API timeouts and unreachable proxies
/// - Malformed attestation payloads
/// - State transitions (pending → complete)
/// - Failed attestations
#[async_trait]
pub trait AttestationProvider: Send + Sync {
    /// Fetches the current attestation record for a message hash.
    async fn get_attestation(&self, message_hash: FixedBytes<32>) -> Result<AttestationResponse>;

    /// Short endpoint label for logs.
    fn endpoint(&self) -> &str;
}

/// Trait for time-based operations.
///
/// Enables fast-forward testing where polling loops and budgets advance
/// instantly.
#[async_trait]
pub trait Clock: Send + Sync {
    /// Asynchronously sleeps for the given duration.
    async fn sleep(&self, duration: Duration);

    /// Returns the current instant in time.
    fn now(&self) -> Instant;
}
