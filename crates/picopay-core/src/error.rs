//! Proof verification errors.

use thiserror::Error;

/// Everything a verifier can reject. Cryptographic failures carry no
/// detail on purpose: the caller learns that the proof is bad, not why.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProofError {
    #[error("invalid signature")]
    InvalidSignature,

    #[error("invalid payword token")]
    InvalidPaywordToken,

    #[error("invalid paytree proof")]
    InvalidPaytreeProof,

    #[error("declared public key does not match the signed payload")]
    MismatchedPublicKey,

    #[error("payment index must be positive")]
    NonPositiveIndex,

    #[error("payment index {index} exceeds maximum {max}")]
    IndexOutOfRange { index: u64, max: u64 },

    #[error("malformed proof: {0}")]
    MalformedProof(String),

    #[error("malformed encoding: {0}")]
    Encoding(String),
}

impl ProofError {
    pub(crate) fn encoding(err: impl std::fmt::Display) -> Self {
        ProofError::Encoding(err.to_string())
    }
}
