//! MessageTransmitter contract bindings
//!
//! On the source chain the transmitter emits `MessageSent(bytes)`; on the
//! destination chain `receiveMessage(message, attestation)` verifies the
//! attestation and mints.

use alloy_network::TransactionBuilder;
use alloy_primitives::{Address, Bytes};
use alloy_rpc_types::TransactionRequest;
use alloy_sol_types::{sol, SolCall};
use tracing::info;

use MessageTransmitter::receiveMessageCall;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageTransmitterContract {
    address: Address,
}

impl MessageTransmitterContract {
    pub fn new(address: Address) -> Self {
        Self { address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Create the transaction request for `receiveMessage`.
    pub fn receive_message_transaction(
        &self,
        from_address: Address,
        message: Bytes,
        attestation: Bytes,
    ) -> TransactionRequest {
        info!(
            from_address = %from_address,
            message_length_bytes = message.len(),
            attestation_length_bytes = attestation.len(),
            contract_address = %self.address,
            event = "receive_message_transaction_created"
        );

        let call = receiveMessageCall {
            message,
            attestation,
        };

        TransactionRequest::default()
            .with_from(from_address)
            .with_to(self.address)
            .with_input(call.abi_encode())
    }
}

sol!(
    #[allow(missing_docs)]
    contract MessageTransmitter {
        event MessageSent(bytes message);

        function receiveMessage(bytes calldata message, bytes calldata attestation)
            external
            returns (bool success);

        function usedNonces(bytes32 sourceAndNonce) external view returns (uint256);
    }
);
