//! Contract and token addresses for CCTP v1 across supported chains
//!
//! EVM addresses are checksummed constants. Solana program ids and mints are
//! base58 strings because the Solana side is reached through an
//! [`SvmWallet`](crate::SvmWallet) capability rather than typed bindings.

use alloy_primitives::{address, Address};

// MessageTransmitter

/// <https://etherscan.io/address/0x0a992d191DEeC32aFe36203Ad87D7d289a738F81>
pub const ETHEREUM_MESSAGE_TRANSMITTER: Address =
    address!("0a992d191DEeC32aFe36203Ad87D7d289a738F81");

/// <https://snowtrace.io/address/0x8186359af5f57fbb40c6b14a588d2a59c0c29880>
pub const AVALANCHE_MESSAGE_TRANSMITTER: Address =
    address!("8186359af5f57fbb40c6b14a588d2a59c0c29880");

/// <https://optimistic.etherscan.io/address/0x4D41f22c5a0e5c74090899E5a8Fb597a8842b3e8>
pub const OPTIMISM_MESSAGE_TRANSMITTER: Address =
    address!("4D41f22c5a0e5c74090899E5a8Fb597a8842b3e8");

/// <https://arbiscan.io/address/0xC30362313FBBA5cf9163F0bb16a0e01f01a896ca>
pub const ARBITRUM_MESSAGE_TRANSMITTER: Address =
    address!("c30362313fbba5cf9163f0bb16a0e01f01a896ca");

/// <https://basescan.org/address/0xAD09780d193884d503182aD4588450C416D6F9D4>
pub const BASE_MESSAGE_TRANSMITTER: Address =
    address!("ad09780d193884d503182ad4588450c416d6f9d4");

/// <https://polygonscan.com/address/0xF3be9355363857F3e001be68856A2f96b4C39Ba9>
pub const POLYGON_MESSAGE_TRANSMITTER: Address =
    address!("F3be9355363857F3e001be68856A2f96b4C39Ba9");

/// Shared by Sepolia and Base Sepolia.
pub const TESTNET_MESSAGE_TRANSMITTER: Address =
    address!("7865fAfC2db2093669d92c0F33AeEF291086BEFD");

/// <https://sepolia.arbiscan.io/address/0xacf1ceef35caac005e15888ddb8a3515c41b4872>
pub const ARBITRUM_SEPOLIA_MESSAGE_TRANSMITTER: Address =
    address!("acf1ceef35caac005e15888ddb8a3515c41b4872");

// TokenMessenger

pub const ETHEREUM_TOKEN_MESSENGER: Address =
    address!("bd3fa81b58ba92a82136038b25adec7066af3155");

pub const AVALANCHE_TOKEN_MESSENGER: Address =
    address!("6b25532e1060ce10cc3b0a99e5683b91bfde6982");

pub const OPTIMISM_TOKEN_MESSENGER: Address =
    address!("2B4069517957735bE00ceE0fadAE88a26365528f");

pub const ARBITRUM_TOKEN_MESSENGER: Address =
    address!("19330d10D9Cc8751218eaf51E8885D058642E08A");

pub const BASE_TOKEN_MESSENGER: Address = address!("1682ae6375c4e4a97e4b583bc394c861a46d8962");

pub const POLYGON_TOKEN_MESSENGER: Address =
    address!("9daF8c91AEFAE50b9c0E69629D3F6Ca40cA3B3FE");

/// Shared by every v1 EVM testnet.
pub const TESTNET_TOKEN_MESSENGER: Address =
    address!("9f3B8679c73C2Fef8b59B4f3444d4e156fb70AA5");

// Native USDC

/// <https://developers.circle.com/stablecoins/usdc-on-main-networks>
pub const ETHEREUM_USDC: Address = address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48");
pub const AVALANCHE_USDC: Address = address!("B97EF9Ef8734C71904D8002F8b6Bc66Dd9c48a6E");
pub const OPTIMISM_USDC: Address = address!("0b2C639c533813f4Aa9D7837CAf62653d097Ff85");
pub const ARBITRUM_USDC: Address = address!("af88d065e77c8cC2239327C5EDb3A432268e5831");
pub const BASE_USDC: Address = address!("833589fCD6eDb6E08f4c7C32D4f71b54bdA02913");
pub const POLYGON_USDC: Address = address!("3c499c542cEF5E3811e1192ce70d8cC03d5c3359");

/// <https://developers.circle.com/stablecoins/usdc-on-test-networks>
pub const SEPOLIA_USDC: Address = address!("1c7D4B196Cb0C7B01d743Fbc6116a902379C7238");
pub const ARBITRUM_SEPOLIA_USDC: Address = address!("75faf114eafb1BDbe2F0316DF893fd58CE46AA4d");
pub const BASE_SEPOLIA_USDC: Address = address!("036CbD53842c5426634e7929541eC2318f3dCF7e");

// Solana (same program ids on mainnet-beta and devnet)

/// <https://developers.circle.com/stablecoins/solana-programs>
pub const SOLANA_TOKEN_MESSENGER_MINTER: &str = "CCTPiPYPc6AsJuwueEnWgSgucamXDZwBd53dQ11YiKX3";
pub const SOLANA_MESSAGE_TRANSMITTER: &str = "CCTPmbSD7gX1bxKPAmg77w8oFzNFpaQiQUWD43TKaecd";

pub const SOLANA_USDC_MINT: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";
pub const SOLANA_DEVNET_USDC_MINT: &str = "4zMMC9srt5Ri5X14GAgXhaHii3GnPAEERYPJgZJDncDU";
