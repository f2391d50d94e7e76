//! CCTP v1 message extraction and decoding
//!
//! A burn on the source chain emits an opaque message. Its keccak256 hash is
//! the key under which the attestation authority publishes the signature, and
//! the message plus that signature are what the destination chain redeems.
//!
//! # Format
//!
//! Header (116 bytes):
//! - version: uint32
//! - sourceDomain: uint32
//! - destinationDomain: uint32
//! - nonce: uint64
//! - sender: bytes32
//! - recipient: bytes32
//! - destinationCaller: bytes32
//!
//! Burn body (132 bytes): version uint32, burnToken bytes32, mintRecipient
//! bytes32, amount uint256, messageSender bytes32.
//!
//! Reference: <https://developers.circle.com/stablecoins/message-format>

use alloy_primitives::{keccak256, Bytes, FixedBytes, Log, U256};
use alloy_sol_types::SolEvent;
use base64::prelude::*;
use tracing::{debug, trace};

use super::DomainId;
use crate::contracts::MessageTransmitter::MessageSent;
use crate::error::Result;

/// Prefix of the program log line carrying base64 event data on Solana.
pub const PROGRAM_DATA_PREFIX: &str = "Program data: ";

/// Message bytes extracted from a burn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CctpMessage {
    bytes: Bytes,
}

/// Decoded v1 message header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageHeader {
    pub version: u32,
    pub source_domain: Option<DomainId>,
    pub destination_domain: Option<DomainId>,
    pub nonce: u64,
    pub sender: FixedBytes<32>,
    pub recipient: FixedBytes<32>,
    pub destination_caller: FixedBytes<32>,
}

/// Decoded v1 burn message body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BurnMessage {
    pub version: u32,
    pub burn_token: FixedBytes<32>,
    pub mint_recipient: FixedBytes<32>,
    pub amount: U256,
    pub message_sender: FixedBytes<32>,
}

impl MessageHeader {
    /// Size of the message header in bytes; also the shortest payload accepted
    /// as a message.
    pub const SIZE: usize = 116;
}

impl BurnMessage {
    pub const SIZE: usize = 132;
}

impl CctpMessage {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// keccak256 of the message: the attestation lookup key.
    pub fn hash(&self) -> FixedBytes<32> {
        keccak256(&self.bytes)
    }

    /// Finds the `MessageSent` event among confirmed EVM logs.
    ///
    /// Returns `Ok(None)` when no log carries the event topic, and an error if
    /// a matching log cannot be decoded.
    pub fn from_evm_logs(logs: &[Log]) -> Result<Option<Self>> {
        let Some(log) = logs.iter().find(|log| {
            log.topics()
                .first()
                .is_some_and(|topic| *topic == MessageSent::SIGNATURE_HASH)
        }) else {
            debug!(
                available_logs = logs.len(),
                event = "message_sent_event_not_found"
            );
            return Ok(None);
        };

        let decoded = MessageSent::abi_decode_data(&log.data.data)?;
        let message = Self::new(decoded.0);

        debug!(
            message_hash = %message.hash(),
            message_length_bytes = message.len(),
            event = "message_sent_event_extracted"
        );
        Ok(Some(message))
    }

    /// Finds the message among Solana program log lines.
    ///
    /// Only `Program data:` lines whose base64 payload decodes to at least
    /// [`MessageHeader::SIZE`] bytes are accepted; anything shorter is some
    /// other event and is skipped.
    pub fn from_program_logs<S: AsRef<str>>(lines: &[S]) -> Option<Self> {
        lines.iter().find_map(|line| {
            let payload = line.as_ref().strip_prefix(PROGRAM_DATA_PREFIX)?;
            let bytes = match BASE64_STANDARD.decode(payload.trim()) {
                Ok(bytes) => bytes,
                Err(e) => {
                    trace!(error = %e, event = "program_data_not_base64");
                    return None;
                }
            };

            if bytes.len() < MessageHeader::SIZE {
                trace!(
                    length = bytes.len(),
                    event = "program_data_too_short_for_message"
                );
                return None;
            }
            Some(Self::new(bytes))
        })
    }

    /// Decodes the fixed-size header.
    pub fn header(&self) -> Option<MessageHeader> {
        let b = self.bytes.as_ref();
        if b.len() < MessageHeader::SIZE {
            return None;
        }

        Some(MessageHeader {
            version: read_u32(b, 0),
            source_domain: DomainId::from_u32(read_u32(b, 4)),
            destination_domain: DomainId::from_u32(read_u32(b, 8)),
            nonce: u64::from_be_bytes(b[12..20].try_into().ok()?),
            sender: FixedBytes::from_slice(&b[20..52]),
            recipient: FixedBytes::from_slice(&b[52..84]),
            destination_caller: FixedBytes::from_slice(&b[84..116]),
        })
    }

    /// Decodes the burn body following the header.
    pub fn burn_message(&self) -> Option<BurnMessage> {
        let b = self.bytes.get(MessageHeader::SIZE..)?;
        if b.len() < BurnMessage::SIZE {
            return None;
        }

        Some(BurnMessage {
            version: read_u32(b, 0),
            burn_token: FixedBytes::from_slice(&b[4..36]),
            mint_recipient: FixedBytes::from_slice(&b[36..68]),
            amount: U256::from_be_slice(&b[68..100]),
            message_sender: FixedBytes::from_slice(&b[100..132]),
        })
    }
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}
