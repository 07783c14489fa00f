//! Scheme dispatch: commitments, proofs and the uniform verifier.
//!
//! A channel and its proofs are tagged variants over the three schemes;
//! nothing here is extensible beyond them. `verify` is the single entry
//! point both services use, so a proof accepted by the vendor verifies
//! identically when the issuer re-checks it at settlement.

use serde::{Deserialize, Serialize};

use crate::canonical::b64_decode;
use crate::error::ProofError;
use crate::payload::PaymentPayload;
use crate::{keys, paytree, payword, Hash};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    Signature,
    Payword,
    Paytree,
}

impl std::fmt::Display for Scheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Scheme::Signature => "signature",
            Scheme::Payword => "payword",
            Scheme::Paytree => "paytree",
        };
        f.write_str(name)
    }
}

/// The commitment fixed at open time. The signature scheme commits to
/// nothing beyond the client key already on the channel record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scheme", rename_all = "lowercase")]
pub enum Commitment {
    Signature,
    Payword {
        root_b64: String,
        unit_value: u64,
        max_k: u64,
    },
    Paytree {
        root_b64: String,
        unit_value: u64,
        max_i: u64,
    },
}

impl Commitment {
    pub fn scheme(&self) -> Scheme {
        match self {
            Commitment::Signature => Scheme::Signature,
            Commitment::Payword { .. } => Scheme::Payword,
            Commitment::Paytree { .. } => Scheme::Paytree,
        }
    }

    /// Upper bound for the scheme's payment index: the locked amount
    /// for signature channels, the chain/tree length otherwise.
    pub fn max_index(&self, amount: u64) -> u64 {
        match self {
            Commitment::Signature => amount,
            Commitment::Payword { max_k, .. } => *max_k,
            Commitment::Paytree { max_i, .. } => *max_i,
        }
    }

    /// Cumulative owed amount implied by a payment index. `None` on
    /// u64 overflow.
    pub fn owed_at(&self, index: u64) -> Option<u64> {
        match self {
            Commitment::Signature => Some(index),
            Commitment::Payword { unit_value, .. } | Commitment::Paytree { unit_value, .. } => {
                index.checked_mul(*unit_value)
            }
        }
    }
}

/// Wire shape of a proof, as submitted to the vendor and relayed to the
/// issuer at settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scheme", rename_all = "lowercase")]
pub enum ProofDto {
    Signature {
        payload_b64: String,
        signature_b64: String,
    },
    Payword {
        k: u64,
        token_b64: String,
    },
    Paytree {
        i: u64,
        leaf_b64: String,
        siblings_b64: Vec<String>,
    },
}

impl ProofDto {
    pub fn scheme(&self) -> Scheme {
        match self {
            ProofDto::Signature { .. } => Scheme::Signature,
            ProofDto::Payword { .. } => Scheme::Payword,
            ProofDto::Paytree { .. } => Scheme::Paytree,
        }
    }
}

fn decode_hash(b64: &str) -> Result<Hash, ProofError> {
    let bytes = b64_decode(b64)?;
    bytes
        .try_into()
        .map_err(|_| ProofError::MalformedProof("expected a 32-byte hash".into()))
}

/// Verify `proof` against a channel's commitment.
///
/// Returns the proven cumulative owed amount. The caller supplies the
/// channel id and client key from its own channel record, never from
/// the proof, which is what binds a proof to its channel.
pub fn verify(
    channel_id: &str,
    client_public_key_der_b64: &str,
    commitment: &Commitment,
    proof: &ProofDto,
) -> Result<u64, ProofError> {
    match (commitment, proof) {
        (
            Commitment::Signature,
            ProofDto::Signature {
                payload_b64,
                signature_b64,
            },
        ) => {
            let bytes = b64_decode(payload_b64)?;
            keys::verify_signature(client_public_key_der_b64, &bytes, signature_b64)?;
            let payload: PaymentPayload =
                serde_json::from_slice(&bytes).map_err(ProofError::encoding)?;
            if payload.channel_id != channel_id {
                return Err(ProofError::InvalidSignature);
            }
            if payload.cumulative_owed_amount == 0 {
                return Err(ProofError::NonPositiveIndex);
            }
            Ok(payload.cumulative_owed_amount)
        }
        (
            Commitment::Payword {
                root_b64,
                unit_value,
                max_k,
            },
            ProofDto::Payword { k, token_b64 },
        ) => {
            let root = decode_hash(root_b64)?;
            let token = decode_hash(token_b64)?;
            payword::verify_token(&root, *max_k, *unit_value, *k, &token)
        }
        (
            Commitment::Paytree {
                root_b64,
                unit_value,
                max_i,
            },
            ProofDto::Paytree {
                i,
                leaf_b64,
                siblings_b64,
            },
        ) => {
            let root = decode_hash(root_b64)?;
            let leaf = b64_decode(leaf_b64)?;
            let siblings = siblings_b64
                .iter()
                .map(|s| decode_hash(s))
                .collect::<Result<Vec<_>, _>>()?;
            paytree::verify_proof(&root, *max_i, *unit_value, *i, &leaf, &siblings)
        }
        (commitment, proof) => Err(ProofError::MalformedProof(format!(
            "{} proof submitted to a {} channel",
            proof.scheme(),
            commitment.scheme()
        ))),
    }
}
