//! Chain registry for CCTP v1 routes
//!
//! A [`Chain`] is either an EVM network (named by [`NamedChain`]) or the
//! Solana cluster. Everything chain-specific the bridge needs lives here:
//! CCTP domain, USDC token, contract addresses, average attestation latency
//! and the recipient address format.

pub mod addresses;

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use alloy_chains::NamedChain;
use alloy_primitives::Address;
use serde::{Serialize, Serializer};

pub use addresses::*;

use crate::error::{BridgeError, Result};
use crate::protocol::DomainId;

/// Base58 alphabet: no `0`, `O`, `I` or `l`.
const BASE58_ALPHABET: &str = "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// Execution environment family of a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainFamily {
    Evm,
    /// Solana virtual machine
    Svm,
}

/// A chain that can appear on either side of a route.
///
/// # Example
///
/// ```rust
/// use usdc_bridge::{Chain, ChainFamily, DomainId};
/// use alloy_chains::NamedChain;
///
/// let arbitrum = Chain::Evm(NamedChain::Arbitrum);
/// assert_eq!(arbitrum.family(), ChainFamily::Evm);
/// assert_eq!(arbitrum.domain_id().unwrap(), DomainId::Arbitrum);
///
/// let solana: Chain = "solana".parse().unwrap();
/// assert_eq!(solana.family(), ChainFamily::Svm);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Chain {
    Evm(NamedChain),
    Solana,
    SolanaDevnet,
}

impl Chain {
    pub const fn family(&self) -> ChainFamily {
        match self {
            Self::Evm(_) => ChainFamily::Evm,
            Self::Solana | Self::SolanaDevnet => ChainFamily::Svm,
        }
    }

    /// The EVM chain, if this is one.
    pub const fn as_evm(&self) -> Option<NamedChain> {
        match self {
            Self::Evm(chain) => Some(*chain),
            _ => None,
        }
    }

    pub fn is_testnet(&self) -> bool {
        use NamedChain::*;

        match self {
            Self::Evm(chain) => matches!(chain, Sepolia | ArbitrumSepolia | BaseSepolia),
            Self::Solana => false,
            Self::SolanaDevnet => true,
        }
    }

    /// CCTP domain; testnets share their mainnet's domain.
    pub fn domain_id(&self) -> Result<DomainId> {
        use NamedChain::*;

        let domain = match self {
            Self::Evm(Mainnet | Sepolia) => DomainId::Ethereum,
            Self::Evm(Avalanche) => DomainId::Avalanche,
            Self::Evm(Optimism) => DomainId::Optimism,
            Self::Evm(Arbitrum | ArbitrumSepolia) => DomainId::Arbitrum,
            Self::Evm(Base | BaseSepolia) => DomainId::Base,
            Self::Evm(Polygon) => DomainId::Polygon,
            Self::Solana | Self::SolanaDevnet => DomainId::Solana,
            Self::Evm(_) => return Err(self.unsupported()),
        };
        Ok(domain)
    }

    /// Native USDC token contract on an EVM chain.
    pub fn usdc_address(&self) -> Result<Address> {
        use NamedChain::*;

        match self.as_evm() {
            Some(Mainnet) => Ok(ETHEREUM_USDC),
            Some(Avalanche) => Ok(AVALANCHE_USDC),
            Some(Optimism) => Ok(OPTIMISM_USDC),
            Some(Arbitrum) => Ok(ARBITRUM_USDC),
            Some(Base) => Ok(BASE_USDC),
            Some(Polygon) => Ok(POLYGON_USDC),
            Some(Sepolia) => Ok(SEPOLIA_USDC),
            Some(ArbitrumSepolia) => Ok(ARBITRUM_SEPOLIA_USDC),
            Some(BaseSepolia) => Ok(BASE_SEPOLIA_USDC),
            _ => Err(self.unsupported()),
        }
    }

    /// USDC mint on a Solana cluster.
    pub fn usdc_mint(&self) -> Result<&'static str> {
        match self {
            Self::Solana => Ok(SOLANA_USDC_MINT),
            Self::SolanaDevnet => Ok(SOLANA_DEVNET_USDC_MINT),
            Self::Evm(_) => Err(self.unsupported()),
        }
    }

    /// The `TokenMessenger` contract that burns USDC on this chain.
    pub fn token_messenger_address(&self) -> Result<Address> {
        use NamedChain::*;

        match self.as_evm() {
            Some(Mainnet) => Ok(ETHEREUM_TOKEN_MESSENGER),
            Some(Avalanche) => Ok(AVALANCHE_TOKEN_MESSENGER),
            Some(Optimism) => Ok(OPTIMISM_TOKEN_MESSENGER),
            Some(Arbitrum) => Ok(ARBITRUM_TOKEN_MESSENGER),
            Some(Base) => Ok(BASE_TOKEN_MESSENGER),
            Some(Polygon) => Ok(POLYGON_TOKEN_MESSENGER),
            Some(Sepolia | ArbitrumSepolia | BaseSepolia) => Ok(TESTNET_TOKEN_MESSENGER),
            _ => Err(self.unsupported()),
        }
    }

    /// The `MessageTransmitter` contract that emits and receives messages.
    pub fn message_transmitter_address(&self) -> Result<Address> {
        use NamedChain::*;

        match self.as_evm() {
            Some(Mainnet) => Ok(ETHEREUM_MESSAGE_TRANSMITTER),
            Some(Avalanche) => Ok(AVALANCHE_MESSAGE_TRANSMITTER),
            Some(Optimism) => Ok(OPTIMISM_MESSAGE_TRANSMITTER),
            Some(Arbitrum) => Ok(ARBITRUM_MESSAGE_TRANSMITTER),
            Some(Base) => Ok(BASE_MESSAGE_TRANSMITTER),
            Some(Polygon) => Ok(POLYGON_MESSAGE_TRANSMITTER),
            Some(Sepolia | BaseSepolia) => Ok(TESTNET_MESSAGE_TRANSMITTER),
            Some(ArbitrumSepolia) => Ok(ARBITRUM_SEPOLIA_MESSAGE_TRANSMITTER),
            _ => Err(self.unsupported()),
        }
    }

    /// Average time from burn to attestation, per
    /// <https://developers.circle.com/stablecoins/required-block-confirmations>.
    pub fn confirmation_average_time(&self) -> Result<Duration> {
        use NamedChain::*;

        let secs = match self {
            Self::Evm(Mainnet | Arbitrum | Base | Optimism) => 19 * 60,
            Self::Evm(Avalanche) => 20,
            Self::Evm(Polygon) => 8 * 60,
            Self::Evm(Sepolia) => 60,
            Self::Evm(ArbitrumSepolia | BaseSepolia) => 20,
            Self::Solana | Self::SolanaDevnet => 25,
            Self::Evm(_) => return Err(self.unsupported()),
        };
        Ok(Duration::from_secs(secs))
    }

    /// Checks that `address` is a well-formed account for this chain's family.
    ///
    /// EVM accounts are `0x` followed by 40 hex digits. Solana accounts are
    /// 32 to 44 base58 characters.
    pub fn validate_address(&self, address: &str) -> Result<()> {
        let valid = match self.family() {
            ChainFamily::Evm => {
                address.starts_with("0x")
                    && address.len() == 42
                    && Address::from_str(address).is_ok()
            }
            ChainFamily::Svm => {
                (32..=44).contains(&address.len())
                    && address.chars().all(|c| BASE58_ALPHABET.contains(c))
            }
        };

        if valid {
            Ok(())
        } else {
            Err(BridgeError::InvalidParams(format!(
                "invalid {} address: {address}",
                self
            )))
        }
    }

    fn unsupported(&self) -> BridgeError {
        BridgeError::UnsupportedChain(self.to_string())
    }
}

impl From<NamedChain> for Chain {
    fn from(chain: NamedChain) -> Self {
        Self::Evm(chain)
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Evm(chain) => write!(f, "{chain}"),
            Self::Solana => f.write_str("solana"),
            Self::SolanaDevnet => f.write_str("solana-devnet"),
        }
    }
}

impl FromStr for Chain {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "solana" => Ok(Self::Solana),
            "solana-devnet" => Ok(Self::SolanaDevnet),
            other => NamedChain::from_str(other)
                .map(Self::Evm)
                .map_err(|_| BridgeError::UnsupportedChain(s.to_string())),
        }
    }
}

impl Serialize for Chain {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
