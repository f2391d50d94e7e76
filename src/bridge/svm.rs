//! Burn path for Solana sources.
//!
//! The burn is a `deposit_for_burn` call into the TokenMessengerMinter
//! program. Derived accounts (PDAs and the owner's token account) are left to
//! the wallet capability, which owns the cluster connection.

use alloy_primitives::{FixedBytes, U256};
use sha2::{Digest, Sha256};
use tracing::{info, Instrument};

use super::cctp::{evm_mint_recipient, AttestationBridgeProtocol, BurnFailure, ConfirmedBurn};
use super::params::{BridgeParams, WalletHandle};
use super::status::{BridgeStage, StatusReporter};
use crate::chain::{SOLANA_MESSAGE_TRANSMITTER, SOLANA_TOKEN_MESSENGER_MINTER};
use crate::error::BridgeError;
use crate::protocol::CctpMessage;
use crate::spans;
use crate::traits::{SvmAccount, SvmProgramCall};

/// SPL Token program.
pub const SPL_TOKEN_PROGRAM: &str = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA";

/// System program.
pub const SYSTEM_PROGRAM: &str = "11111111111111111111111111111111";

/// Anchor instruction discriminator: the first 8 bytes of
/// `sha256("global:<name>")`.
pub fn instruction_discriminator(name: &str) -> [u8; 8] {
    let digest = Sha256::digest(format!("global:{name}").as_bytes());
    let mut discriminator = [0u8; 8];
    discriminator.copy_from_slice(&digest[..8]);
    discriminator
}

/// Builds the `deposit_for_burn` program call.
///
/// Instruction data is the discriminator followed by the little-endian
/// `amount` (u64), `destination_domain` (u32) and the 32-byte
/// `mint_recipient`.
pub fn deposit_for_burn_instruction(
    owner: &str,
    burn_token_mint: &str,
    amount: u64,
    destination_domain: u32,
    mint_recipient: FixedBytes<32>,
) -> SvmProgramCall {
    let mut data = Vec::with_capacity(8 + 8 + 4 + 32);
    data.extend_from_slice(&instruction_discriminator("deposit_for_burn"));
    data.extend_from_slice(&amount.to_le_bytes());
    data.extend_from_slice(&destination_domain.to_le_bytes());
    data.extend_from_slice(mint_recipient.as_slice());

    let known = |name, pubkey: &str, is_writable| SvmAccount {
        name,
        pubkey: Some(pubkey.to_string()),
        is_signer: false,
        is_writable,
    };
    let derived = |name, is_writable| SvmAccount {
        name,
        pubkey: None,
        is_signer: false,
        is_writable,
    };

    let accounts = vec![
        SvmAccount {
            name: "owner",
            pubkey: Some(owner.to_string()),
            is_signer: true,
            is_writable: false,
        },
        SvmAccount {
            name: "event_rent_payer",
            pubkey: Some(owner.to_string()),
            is_signer: true,
            is_writable: true,
        },
        derived("sender_authority_pda", false),
        derived("burn_token_account", true),
        derived("message_transmitter", true),
        derived("token_messenger", false),
        derived("remote_token_messenger", false),
        derived("token_minter", false),
        derived("local_token", true),
        known("burn_token_mint", burn_token_mint, true),
        SvmAccount {
            name: "message_sent_event_data",
            pubkey: None,
            is_signer: true,
            is_writable: true,
        },
        known("message_transmitter_program", SOLANA_MESSAGE_TRANSMITTER, false),
        known("token_messenger_minter_program", SOLANA_TOKEN_MESSENGER_MINTER, false),
        known("token_program", SPL_TOKEN_PROGRAM, false),
        known("system_program", SYSTEM_PROGRAM, false),
        derived("event_authority", false),
        known("program", SOLANA_TOKEN_MESSENGER_MINTER, false),
    ];

    SvmProgramCall {
        program_id: SOLANA_TOKEN_MESSENGER_MINTER.to_string(),
        accounts,
        data,
    }
}

/// Burns through the TokenMessengerMinter program and extracts the message
/// from the confirmed transaction's program logs.
pub(crate) async fn burn(
    protocol: &AttestationBridgeProtocol,
    params: &BridgeParams,
    amount: U256,
    reporter: &StatusReporter,
) -> Result<ConfirmedBurn, BurnFailure> {
    let source = params.source_chain();
    let Some(WalletHandle::Svm(wallet)) = params.source_wallet() else {
        return Err(BridgeError::WalletRejected {
            reason: format!("no Solana signer available on {source}"),
        }
        .into());
    };
    if wallet.cluster() != source {
        return Err(BridgeError::WalletRejected {
            reason: format!(
                "wallet is connected to {} but the transfer starts on {source}",
                wallet.cluster()
            ),
        }
        .into());
    }

    let amount = u64::try_from(amount).map_err(|_| {
        BridgeError::InvalidParams(format!("amount {amount} does not fit a Solana token amount"))
    })?;
    let mint = source.usdc_mint()?;
    let destination_domain = params.destination_chain().domain_id()?.as_u32();
    let mint_recipient = evm_mint_recipient(params.destination_address())?;
    let owner = wallet.public_key();

    let call = deposit_for_burn_instruction(&owner, mint, amount, destination_domain, mint_recipient);

    reporter.report(
        BridgeStage::Burning,
        format!("Burning {} USDC on {source}", params.amount()),
    );
    let span = spans::svm_deposit_for_burn(&owner, destination_domain, amount);
    let signature = wallet
        .send_program_call(call)
        .instrument(span.clone())
        .await?;
    info!(signature = %signature, event = "svm_burn_submitted");

    let confirmation = protocol
        .confirm(wallet.confirm_signature(&signature))
        .instrument(span)
        .await
        .map_err(|error| BurnFailure::committed(error, signature.clone()))?;

    info!(
        signature = %signature,
        log_lines = confirmation.log_messages.len(),
        event = "svm_burn_confirmed"
    );
    reporter.report_tx(BridgeStage::BurnConfirmed, "Burn confirmed", &signature);

    let message = spans::extract_message(&signature, &source)
        .in_scope(|| CctpMessage::from_program_logs(&confirmation.log_messages));

    match message {
        Some(message) => Ok(ConfirmedBurn {
            tx_hash: signature,
            message,
        }),
        None => Err(BurnFailure::committed(
            BridgeError::TransactionFailed {
                reason: "burn confirmed but no message found in program logs".to_string(),
            },
            signature,
        )),
    }
}
