use async_trait::async_trait;

use super::params::BridgeParams;
use super::result::{BridgeResult, Estimate};
use crate::chain::Chain;
use crate::error::Result;
use crate::health::ProtocolHealth;

/// Capability contract shared by every bridging mechanism.
///
/// An orchestrator holds several protocols as `Arc<dyn BridgeProtocol>`,
/// asks each whether it [`supports`](BridgeProtocol::supports) a route,
/// compares [`estimate`](BridgeProtocol::estimate)s and
/// [`health`](BridgeProtocol::health), and runs the chosen one. When a result
/// comes back with `suggest_fallback`, it can try the next protocol.
///
/// # Dynamic Dispatch
///
/// This trait is object-safe:
///
/// ```rust
/// use std::sync::Arc;
/// use usdc_bridge::{BridgeProtocol, Chain, ManualFallbackProtocol};
/// use alloy_chains::NamedChain;
///
/// let protocols: Vec<Arc<dyn BridgeProtocol>> =
///     vec![Arc::new(ManualFallbackProtocol::default())];
///
/// let route = (Chain::Solana, Chain::Evm(NamedChain::Base));
/// let usable: Vec<_> = protocols
///     .iter()
///     .filter(|p| p.supports(route.0, route.1) && p.health().is_healthy)
///     .collect();
/// assert_eq!(usable.len(), 1);
/// ```
///
/// # Contract
///
/// - `supports` is a pure membership check with no I/O.
/// - `validate` runs before any state change and fails synchronously.
/// - `bridge` is the only state-mutating call. Validation failures are
///   returned as `Err`; every failure after validation is reported as an
///   unsuccessful [`BridgeResult`] with its error code and fallback hint.
///   A caller can safely retry after a failure that happened before the
///   source-chain burn.
#[async_trait]
pub trait BridgeProtocol: Send + Sync {
    /// Stable protocol identifier, e.g. `"cctp"`.
    fn name(&self) -> &str;

    /// Whether this protocol can move funds from `source` to `destination`.
    fn supports(&self, source: Chain, destination: Chain) -> bool;

    /// Non-binding fee and time for the transfer.
    async fn estimate(&self, params: &BridgeParams) -> Result<Estimate>;

    /// Checks route support, recipient format and amount.
    fn validate(&self, params: &BridgeParams) -> Result<()>;

    /// Executes the transfer.
    async fn bridge(&self, params: &BridgeParams) -> Result<BridgeResult>;

    /// Current health snapshot.
    fn health(&self) -> ProtocolHealth;
}
