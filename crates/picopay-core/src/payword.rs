//! PayWord hash chains.
//!
//! The client picks a secret seed `s` and commits to `R = H^max_k(s)`.
//! The k-th token is `t_k = H^(max_k - k)(s)`; anyone holding `R` can
//! check `H^k(t_k) == R` with k raw SHA-256 applications. Each step
//! hashes the previous 32-byte output directly, so client, vendor and
//! issuer always walk the same chain.

use sha2::{Digest, Sha256};

use crate::error::ProofError;
use crate::Hash;

fn hash_step(input: &Hash) -> Hash {
    Sha256::digest(input).into()
}

/// Apply H to `start` `count` times.
pub fn hash_chain(start: &Hash, count: u64) -> Hash {
    let mut acc = *start;
    for _ in 0..count {
        acc = hash_step(&acc);
    }
    acc
}

/// Commitment root for a seed and chain length.
pub fn chain_root(seed: &Hash, max_k: u64) -> Hash {
    hash_chain(seed, max_k)
}

/// Verify the k-th token against the channel commitment.
///
/// Returns the proven cumulative owed amount `k * unit_value`.
pub fn verify_token(
    root: &Hash,
    max_k: u64,
    unit_value: u64,
    k: u64,
    token: &Hash,
) -> Result<u64, ProofError> {
    if k == 0 {
        return Err(ProofError::NonPositiveIndex);
    }
    if k > max_k {
        return Err(ProofError::IndexOutOfRange { index: k, max: max_k });
    }
    if hash_chain(token, k) != *root {
        return Err(ProofError::InvalidPaywordToken);
    }
    k.checked_mul(unit_value)
        .ok_or_else(|| ProofError::MalformedProof("owed amount overflows u64".into()))
}

/// Client-side chain with optional pebble checkpoints.
///
/// Token generation hashes forward from the nearest checkpoint at or
/// below the target distance, so worst-case work per token is the
/// largest gap between pebbles (the whole chain when `pebble_count`
/// is 0). Pebbles never leave the client; the protocol only ever sees
/// the root and opened tokens.
pub struct PaywordChain {
    seed: Hash,
    max_k: u64,
    root: Hash,
    /// (distance from seed, chain value) checkpoints, ascending.
    pebbles: Vec<(u64, Hash)>,
}

impl PaywordChain {
    /// Build a chain from a fresh random seed.
    pub fn generate(max_k: u64, pebble_count: usize) -> Result<Self, ProofError> {
        if max_k == 0 {
            return Err(ProofError::MalformedProof("max_k must be positive".into()));
        }
        Ok(Self::from_seed(rand::random(), max_k, pebble_count))
    }

    /// Build a chain from a known seed, walking it once and dropping
    /// checkpoints at even intervals.
    pub fn from_seed(seed: Hash, max_k: u64, pebble_count: usize) -> Self {
        let interval = if pebble_count == 0 {
            0
        } else {
            (max_k / pebble_count as u64).max(1)
        };

        let mut pebbles = Vec::new();
        let mut acc = seed;
        for step in 1..=max_k {
            acc = hash_step(&acc);
            if interval != 0 && step % interval == 0 && step != max_k {
                pebbles.push((step, acc));
            }
        }

        Self {
            seed,
            max_k,
            root: acc,
            pebbles,
        }
    }

    pub fn max_k(&self) -> u64 {
        self.max_k
    }

    pub fn root(&self) -> Hash {
        self.root
    }

    pub fn root_b64(&self) -> String {
        crate::canonical::b64_encode(&self.root)
    }

    /// The k-th token, `H^(max_k - k)(seed)`.
    pub fn token(&self, k: u64) -> Result<Hash, ProofError> {
        if k == 0 {
            return Err(ProofError::NonPositiveIndex);
        }
        if k > self.max_k {
            return Err(ProofError::IndexOutOfRange {
                index: k,
                max: self.max_k,
            });
        }

        let distance = self.max_k - k;
        let mut done = 0u64;
        let mut acc = self.seed;
        for &(step, value) in &self.pebbles {
            if step <= distance {
                done = step;
                acc = value;
            } else {
                break;
            }
        }
        Ok(hash_chain(&acc, distance - done))
    }

    pub fn token_b64(&self, k: u64) -> Result<String, ProofError> {
        Ok(crate::canonical::b64_encode(&self.token(k)?))
    }
}
