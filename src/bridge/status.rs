//! Progress notifications for a running transfer.

use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;
use tracing::trace;

/// Pipeline stage reported to the status observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BridgeStage {
    Approve,
    ApproveConfirmed,
    Burning,
    BurnConfirmed,
    WaitingAttestation,
    AttestationReceived,
    Minting,
    Complete,
    ManualActionRequired,
    Failed,
}

impl BridgeStage {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::ApproveConfirmed => "approve_confirmed",
            Self::Burning => "burning",
            Self::BurnConfirmed => "burn_confirmed",
            Self::WaitingAttestation => "waiting_attestation",
            Self::AttestationReceived => "attestation_received",
            Self::Minting => "minting",
            Self::Complete => "complete",
            Self::ManualActionRequired => "manual_action_required",
            Self::Failed => "failed",
        }
    }
}

/// One progress notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    pub stage: BridgeStage,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
}

/// Fire-and-forget sender around the caller's optional channel.
///
/// A dropped receiver is not an error: the transfer keeps going.
#[derive(Debug, Clone, Default)]
pub(crate) struct StatusReporter {
    tx: Option<UnboundedSender<StatusUpdate>>,
}

impl StatusReporter {
    pub(crate) fn new(tx: Option<UnboundedSender<StatusUpdate>>) -> Self {
        Self { tx }
    }

    pub(crate) fn report(&self, stage: BridgeStage, message: impl Into<String>) {
        self.send(stage, message.into(), None);
    }

    pub(crate) fn report_tx(&self, stage: BridgeStage, message: impl Into<String>, tx_hash: &str) {
        self.send(stage, message.into(), Some(tx_hash.to_string()));
    }

    fn send(&self, stage: BridgeStage, message: String, tx_hash: Option<String>) {
        let Some(tx) = &self.tx else {
            return;
        };
        trace!(stage = stage.as_str(), event = "status_update_sent");
        let _ = tx.send(StatusUpdate {
            stage,
            message,
            tx_hash,
        });
    }
}
