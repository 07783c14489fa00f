//! Proof core for picopay payment channels.
//!
//! Pure functions only: commitment construction, proof verification and
//! the canonical byte encodings both services sign and check. No I/O,
//! no async. The issuer and vendor embed this crate and must always
//! agree on its outputs, so everything here is deterministic.
//!
//! Three schemes share the channel lifecycle but not the proof shape:
//! - `signature`: a fresh ECDSA P-256 signature per payment
//! - `payword`: a SHA-256 hash chain, the k-th payment reveals the
//!   k-th pre-image
//! - `paytree`: a SHA-256 Merkle tree, the i-th payment reveals leaf i
//!   with its authentication path

pub mod canonical;
pub mod error;
pub mod keys;
pub mod payload;
pub mod paytree;
pub mod payword;
pub mod proof;

pub use canonical::{b64_decode, b64_encode, canonical_json, Envelope};
pub use error::ProofError;
pub use keys::KeyPair;
pub use payload::{
    derive_channel_id, random_salt, PaymentPayload, PaytreeOpenPayload, PaywordOpenPayload,
    SignatureOpenPayload,
};
pub use proof::{verify, Commitment, ProofDto, Scheme};

/// Raw SHA-256 output; the only hash width in the protocol.
pub type Hash = [u8; 32];
