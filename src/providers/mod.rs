//! Production implementations of the bridge capability traits.
//!
//! These adapters talk to real chains, the attestation service and the
//! Tokio timer. Tests substitute the fakes in [`crate::testing`].

mod alloy;
mod iris;
mod tokio_clock;

pub use self::alloy::{AlloyEvmWallet, DEFAULT_CONFIRMATION_TIMEOUT};
pub use self::iris::IrisAttestationProvider;
pub use self::tokio_clock::TokioClock;
