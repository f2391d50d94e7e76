//! ERC20 bindings for allowance and approval
//!
//! A CCTP burn pulls USDC from the sender, so the `TokenMessenger` must hold
//! a sufficient allowance before `depositForBurn` is submitted.

use alloy_network::TransactionBuilder;
use alloy_primitives::{Address, U256};
use alloy_rpc_types::TransactionRequest;
use alloy_sol_types::{sol, SolCall};
use tracing::info;

use Erc20::approveCall;

/// Builds approval transactions against one token contract.
///
/// # Example
///
/// ```rust
/// use usdc_bridge::contracts::Erc20Contract;
/// use alloy_primitives::{address, U256};
///
/// let usdc = Erc20Contract::new(address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"));
/// let owner = address!("1234567890123456789012345678901234567890");
/// let spender = address!("bd3fa81b58ba92a82136038b25adec7066af3155");
///
/// let tx = usdc.approve_transaction(owner, spender, U256::from(1_000_000u64));
/// assert_eq!(tx.from, Some(owner));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Erc20Contract {
    address: Address,
}

impl Erc20Contract {
    pub fn new(address: Address) -> Self {
        Self { address }
    }

    /// Creates (but does not send) an `approve(spender, amount)` transaction.
    pub fn approve_transaction(
        &self,
        from: Address,
        spender: Address,
        amount: U256,
    ) -> TransactionRequest {
        info!(
            from = %from,
            spender = %spender,
            amount = %amount,
            contract_address = %self.address,
            event = "approve_transaction_created"
        );

        let call = approveCall { spender, amount };
        TransactionRequest::default()
            .with_from(from)
            .with_to(self.address)
            .with_input(call.abi_encode())
    }

    pub fn address(&self) -> Address {
        self.address
    }
}

// Minimal ERC20 interface for approval operations
sol!(
    #[allow(missing_docs)]
    #[sol(rpc)]
    contract Erc20 {
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
        function balanceOf(address account) external view returns (uint256);
    }
);
