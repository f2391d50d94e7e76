//! CCTP v1 contract bindings
//!
//! Inline `sol!` bindings for the three contracts a burn-and-mint transfer
//! touches, plus thin wrappers that build unsigned [`TransactionRequest`]s.
//! Signing and submission belong to the [`EvmWallet`](crate::EvmWallet)
//! capability, so the wrappers only need a contract address.
//!
//! [`TransactionRequest`]: alloy_rpc_types::TransactionRequest

mod erc20;
mod message_transmitter;
mod token_messenger;

pub use erc20::{Erc20, Erc20Contract};
pub use message_transmitter::{MessageTransmitter, MessageTransmitterContract};
pub use token_messenger::{TokenMessenger, TokenMessengerContract};
