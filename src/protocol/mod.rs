//! CCTP v1 protocol types
//!
//! Wire-level pieces shared by every transfer path: domain identifiers, the
//! burn message and the attestation record.

mod attestation;
mod domain_id;
mod message;

pub use attestation::{parse_signature, AttestationResponse, AttestationStatus, SIGNATURE_LENGTH};
pub use domain_id::{DomainId, InvalidDomainId};
pub use message::{BurnMessage, CctpMessage, MessageHeader, PROGRAM_DATA_PREFIX};

