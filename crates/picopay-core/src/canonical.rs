//! Canonical byte encodings and the signed envelope.
//!
//! Every payload that gets signed or hashed has exactly one byte
//! encoding: compact JSON with lexicographically sorted object keys.
//! serde_json's map type is BTreeMap-backed, so routing a value through
//! `serde_json::Value` sorts the keys; compact separators are the
//! default. Both services and the client must produce identical bytes
//! for identical payloads or every signature check would fail.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ProofError;
use crate::keys::{self, KeyPair};

/// Base64 (standard alphabet, padded) over opaque bytes.
pub fn b64_encode(bytes: &[u8]) -> String {
    BASE64.encode(bytes)
}

pub fn b64_decode(text: &str) -> Result<Vec<u8>, ProofError> {
    BASE64.decode(text).map_err(ProofError::encoding)
}

/// Serialize `payload` to its canonical byte encoding.
pub fn canonical_json<T: Serialize>(payload: &T) -> Result<Vec<u8>, ProofError> {
    let value = serde_json::to_value(payload).map_err(ProofError::encoding)?;
    serde_json::to_vec(&value).map_err(ProofError::encoding)
}

/// A signed payload: canonical bytes plus a detached P-256 signature,
/// both base64-wrapped for transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub payload_b64: String,
    pub signature_b64: String,
}

impl Envelope {
    /// Canonically encode `payload` and sign it with `keys`.
    pub fn seal<T: Serialize>(keys: &KeyPair, payload: &T) -> Result<Self, ProofError> {
        let bytes = canonical_json(payload)?;
        Ok(Self {
            payload_b64: b64_encode(&bytes),
            signature_b64: keys.sign_b64(&bytes),
        })
    }

    pub fn payload_bytes(&self) -> Result<Vec<u8>, ProofError> {
        b64_decode(&self.payload_b64)
    }

    /// Verify the signature under `signer_der_b64` and deserialize the
    /// payload. Nothing is returned unless the signature holds.
    pub fn open<T: DeserializeOwned>(&self, signer_der_b64: &str) -> Result<T, ProofError> {
        let bytes = self.payload_bytes()?;
        keys::verify_signature(signer_der_b64, &bytes, &self.signature_b64)?;
        serde_json::from_slice(&bytes).map_err(ProofError::encoding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct Sample {
        zebra: u64,
        apple: String,
    }

    #[test]
    fn canonical_json_sorts_keys() {
        let sample = Sample {
            zebra: 7,
            apple: "a".into(),
        };
        let bytes = canonical_json(&sample).unwrap();
        assert_eq!(bytes, br#"{"apple":"a","zebra":7}"#);
    }

    #[test]
    fn canonical_json_is_stable() {
        let sample = Sample {
            zebra: 42,
            apple: "x".into(),
        };
        assert_eq!(
            canonical_json(&sample).unwrap(),
            canonical_json(&sample).unwrap()
        );
    }

    #[test]
    fn envelope_round_trip() {
        let keys = KeyPair::generate();
        let sample = Sample {
            zebra: 1,
            apple: "pie".into(),
        };

        let envelope = Envelope::seal(&keys, &sample).unwrap();
        let opened: Sample = envelope.open(keys.public_key_der_b64()).unwrap();
        assert_eq!(opened, sample);
    }

    #[test]
    fn envelope_rejects_foreign_signer() {
        let keys = KeyPair::generate();
        let other = KeyPair::generate();
        let envelope = Envelope::seal(
            &keys,
            &Sample {
                zebra: 1,
                apple: "pie".into(),
            },
        )
        .unwrap();

        let result: Result<Sample, _> = envelope.open(other.public_key_der_b64());
        assert_eq!(result, Err(ProofError::InvalidSignature));
    }

    #[test]
    fn envelope_rejects_tampered_payload() {
        let keys = KeyPair::generate();
        let mut envelope = Envelope::seal(
            &keys,
            &Sample {
                zebra: 1,
                apple: "pie".into(),
            },
        )
        .unwrap();

        let mut bytes = envelope.payload_bytes().unwrap();
        bytes[2] ^= 1;
        envelope.payload_b64 = b64_encode(&bytes);

        let result: Result<Sample, _> = envelope.open(keys.public_key_der_b64());
        assert_eq!(result, Err(ProofError::InvalidSignature));
    }
}
