//! P-256 key handling.
//!
//! Public keys travel as base64 of the DER SubjectPublicKeyInfo
//! encoding; signatures as base64 of the DER-encoded ECDSA signature.
//! SHA-256 is the message digest throughout.

use p256::ecdsa::signature::{Signer, Verifier};
use p256::ecdsa::{Signature, SigningKey, VerifyingKey};
use p256::pkcs8::{DecodePublicKey, EncodePublicKey};
use rand::rngs::OsRng;

use crate::canonical::{b64_decode, b64_encode};
use crate::error::ProofError;

/// An ECDSA P-256 key pair with its public half pre-encoded for the wire.
#[derive(Clone)]
pub struct KeyPair {
    signing: SigningKey,
    public_der_b64: String,
}

impl KeyPair {
    /// Generate a fresh key pair from the OS RNG.
    pub fn generate() -> Self {
        let signing = SigningKey::random(&mut OsRng);
        let public_der_b64 = encode_verifying_key(signing.verifying_key());
        Self {
            signing,
            public_der_b64,
        }
    }

    /// Base64 of the DER SPKI public key, the account identity.
    pub fn public_key_der_b64(&self) -> &str {
        &self.public_der_b64
    }

    /// Sign `message`, returning the DER signature bytes.
    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        let signature: Signature = self.signing.sign(message);
        signature.to_der().as_bytes().to_vec()
    }

    /// Sign `message`, returning the signature base64-encoded.
    pub fn sign_b64(&self, message: &[u8]) -> String {
        b64_encode(&self.sign(message))
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_der_b64", &self.public_der_b64)
            .finish_non_exhaustive()
    }
}

pub fn encode_verifying_key(key: &VerifyingKey) -> String {
    // DER encoding of a valid P-256 point cannot fail
    let der = key
        .to_public_key_der()
        .expect("SPKI encoding of a P-256 key");
    b64_encode(der.as_bytes())
}

pub fn decode_verifying_key(der_b64: &str) -> Result<VerifyingKey, ProofError> {
    let der = b64_decode(der_b64)?;
    VerifyingKey::from_public_key_der(&der).map_err(ProofError::encoding)
}

/// Verify an ECDSA P-256/SHA-256 signature over `message`.
///
/// Any decoding problem in the key or signature collapses into
/// `InvalidSignature`: a proof that cannot be parsed proves nothing.
pub fn verify_signature(
    key_der_b64: &str,
    message: &[u8],
    signature_b64: &str,
) -> Result<(), ProofError> {
    let key = decode_verifying_key(key_der_b64)?;
    let raw = b64_decode(signature_b64).map_err(|_| ProofError::InvalidSignature)?;
    let signature = Signature::from_der(&raw).map_err(|_| ProofError::InvalidSignature)?;
    key.verify(message, &signature)
        .map_err(|_| ProofError::InvalidSignature)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_and_verify_round_trip() {
        let keys = KeyPair::generate();
        let message = b"picopay test message";
        let signature = keys.sign_b64(message);

        assert!(verify_signature(keys.public_key_der_b64(), message, &signature).is_ok());
    }

    #[test]
    fn wrong_message_rejected() {
        let keys = KeyPair::generate();
        let signature = keys.sign_b64(b"original");

        let result = verify_signature(keys.public_key_der_b64(), b"tampered", &signature);
        assert_eq!(result, Err(ProofError::InvalidSignature));
    }

    #[test]
    fn wrong_key_rejected() {
        let keys = KeyPair::generate();
        let other = KeyPair::generate();
        let signature = keys.sign_b64(b"message");

        let result = verify_signature(other.public_key_der_b64(), b"message", &signature);
        assert_eq!(result, Err(ProofError::InvalidSignature));
    }

    #[test]
    fn flipped_signature_bit_rejected() {
        let keys = KeyPair::generate();
        let mut raw = keys.sign(b"message");
        raw[10] ^= 1;

        let result = verify_signature(keys.public_key_der_b64(), b"message", &b64_encode(&raw));
        assert_eq!(result, Err(ProofError::InvalidSignature));
    }

    #[test]
    fn public_key_decodes_back() {
        let keys = KeyPair::generate();
        assert!(decode_verifying_key(keys.public_key_der_b64()).is_ok());
    }

    #[test]
    fn garbage_key_rejected() {
        assert!(decode_verifying_key("bm90IGEga2V5").is_err());
    }
}
