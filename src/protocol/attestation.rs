use alloy_primitives::{hex::FromHex, Bytes};
use serde::{Deserialize, Serialize};

/// Length of one ECDSA signature (r, s, v) inside an attestation.
pub const SIGNATURE_LENGTH: usize = 65;

/// Record returned by `GET /attestations/{messageHash}`.
///
/// The attestation field is kept as the raw string the authority sent. The
/// authority is known to return `"PENDING"` instead of null while a message
/// is in flight, so the payload is only interpreted through
/// [`AttestationResponse::signature`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttestationResponse {
    pub status: AttestationStatus,
    #[serde(default)]
    pub attestation: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Represents the status of the attestation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttestationStatus {
    Complete,
    Pending,
    PendingConfirmations,
    Failed,
    #[serde(other)]
    Unknown,
}

impl AttestationResponse {
    pub fn pending() -> Self {
        Self {
            status: AttestationStatus::Pending,
            attestation: None,
            error: None,
        }
    }

    pub fn complete(attestation: impl Into<String>) -> Self {
        Self {
            status: AttestationStatus::Complete,
            attestation: Some(attestation.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: AttestationStatus::Failed,
            attestation: None,
            error: Some(error.into()),
        }
    }

    /// The attestation bytes, if the payload is a syntactically valid
    /// signature blob.
    pub fn signature(&self) -> Option<Bytes> {
        self.attestation.as_deref().and_then(parse_signature)
    }

    /// Whether this record finishes polling with a usable attestation.
    pub fn is_complete(&self) -> bool {
        self.status == AttestationStatus::Complete && self.signature().is_some()
    }
}

/// Parses a hex attestation (with or without `0x`) made of one or more
/// 65-byte signatures. Placeholders such as `"PENDING"`, empty strings and
/// truncated blobs are rejected.
pub fn parse_signature(raw: &str) -> Option<Bytes> {
    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("pending") {
        return None;
    }

    let bytes = Bytes::from_hex(raw).ok()?;
    if bytes.is_empty() || bytes.len() % SIGNATURE_LENGTH != 0 {
        return None;
    }
    Some(bytes)
}
