//! TokenMessenger contract bindings and wrapper
//!
//! The v1 TokenMessenger burns USDC on the source chain and, through its
//! local MessageTransmitter, emits the message the attestation service signs.

use alloy_network::TransactionBuilder;
use alloy_primitives::{Address, FixedBytes, U256};
use alloy_rpc_types::TransactionRequest;
use alloy_sol_types::{sol, SolCall};
use tracing::info;

use crate::spans;
use TokenMessenger::depositForBurnCall;

/// The CCTP v1 Token Messenger contract wrapper
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenMessengerContract {
    address: Address,
}

impl TokenMessengerContract {
    pub fn new(address: Address) -> Self {
        Self { address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Create the transaction request for `depositForBurn`.
    ///
    /// `mint_recipient` is the destination account left-padded to 32 bytes
    /// (see [`Address::into_word`]).
    pub fn deposit_for_burn_transaction(
        &self,
        from_address: Address,
        mint_recipient: FixedBytes<32>,
        destination_domain: u32,
        burn_token: Address,
        amount: U256,
    ) -> TransactionRequest {
        let span = spans::deposit_for_burn(
            &from_address,
            &mint_recipient,
            destination_domain,
            &burn_token,
            &amount,
        );
        let _guard = span.enter();

        info!(
            from_address = %from_address,
            mint_recipient = %mint_recipient,
            destination_domain = destination_domain,
            burn_token = %burn_token,
            amount = %amount,
            contract_address = %self.address,
            event = "deposit_for_burn_transaction_created"
        );

        let call = depositForBurnCall {
            amount,
            destinationDomain: destination_domain,
            mintRecipient: mint_recipient,
            burnToken: burn_token,
        };

        TransactionRequest::default()
            .with_from(from_address)
            .with_to(self.address)
            .with_input(call.abi_encode())
    }
}

sol!(
    #[allow(missing_docs)]
    contract TokenMessenger {
        event DepositForBurn(
            uint64 indexed nonce,
            address indexed burnToken,
            uint256 amount,
            address indexed depositor,
            bytes32 mintRecipient,
            uint32 destinationDomain,
            bytes32 destinationTokenMessenger,
            bytes32 destinationCaller
        );

        function depositForBurn(
            uint256 amount,
            uint32 destinationDomain,
            bytes32 mintRecipient,
            address burnToken
        ) external returns (uint64 nonce);
    }
);

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    #[test]
    fn test_deposit_for_burn_encoding() {
        let messenger = TokenMessengerContract::new(address!(
            "19330d10D9Cc8751218eaf51E8885D058642E08A"
        ));
        let from = address!("1111111111111111111111111111111111111111");
        let recipient = address!("2222222222222222222222222222222222222222");
        let usdc = address!("af88d065e77c8cC2239327C5EDb3A432268e5831");

        let tx = messenger.deposit_for_burn_transaction(
            from,
            recipient.into_word(),
            6,
            usdc,
            U256::from(25_000_000u64),
        );

        assert_eq!(tx.from, Some(from));
        let decoded = depositForBurnCall::abi_decode(tx.input.input().unwrap()).unwrap();
        assert_eq!(decoded.amount, U256::from(25_000_000u64));
        assert_eq!(decoded.destinationDomain, 6);
        assert_eq!(decoded.burnToken, usdc);
        // Recipient is left-padded: the last 20 bytes are the address.
        assert_eq!(&decoded.mintRecipient[12..], recipient.as_slice());
        assert!(decoded.mintRecipient[..12].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_selector_matches_signature() {
        assert_eq!(
            depositForBurnCall::SIGNATURE,
            "depositForBurn(uint256,uint32,bytes32,address)"
        );
    }
}
