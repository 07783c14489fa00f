//! Signed payload shapes and channel id derivation.
//!
//! Field names are the wire contract; serde sees them exactly as
//! declared and the canonical encoding (sorted keys) makes declaration
//! order irrelevant.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::ProofError;

/// Open request payload for a signature-scheme channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureOpenPayload {
    pub client_public_key_der_b64: String,
    pub vendor_public_key_der_b64: String,
    pub amount: u64,
}

/// Open request payload carrying a PayWord commitment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaywordOpenPayload {
    pub client_public_key_der_b64: String,
    pub vendor_public_key_der_b64: String,
    pub amount: u64,
    pub payword_root_b64: String,
    pub payword_unit_value: u64,
    pub payword_max_k: u64,
    pub payword_hash_alg: String,
}

/// Open request payload carrying a PayTree commitment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaytreeOpenPayload {
    pub client_public_key_der_b64: String,
    pub vendor_public_key_der_b64: String,
    pub amount: u64,
    pub paytree_root_b64: String,
    pub paytree_unit_value: u64,
    pub paytree_max_i: u64,
    pub paytree_hash_alg: String,
}

/// The signed claim of a signature-scheme payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentPayload {
    pub channel_id: String,
    pub cumulative_owed_amount: u64,
}

/// The hash algorithm tag accepted in open payloads.
pub const HASH_ALG_SHA256: &str = "sha256";

/// Derive a channel id from the signed open payload plus a per-channel
/// random salt. The salt makes two byte-identical opens distinct.
pub fn derive_channel_id(payload_bytes: &[u8], salt: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"picopay-channel-v1");
    hasher.update(payload_bytes);
    hasher.update(salt);
    hex::encode(hasher.finalize())
}

/// Fresh 16-byte channel salt.
pub fn random_salt() -> [u8; 16] {
    rand::random()
}

/// Reject a zero amount or malformed commitment parameters before any
/// state is touched.
pub fn check_positive(name: &str, value: u64) -> Result<(), ProofError> {
    if value == 0 {
        return Err(ProofError::MalformedProof(format!(
            "{name} must be positive"
        )));
    }
    Ok(())
}
