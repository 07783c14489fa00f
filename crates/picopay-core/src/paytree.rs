//! PayTree Merkle trees.
//!
//! The client picks `max_i` random leaves, builds a balanced binary
//! SHA-256 tree over them and commits to the root. The i-th payment
//! opens leaf i together with its authentication path. Leaf indices
//! are 1-based on the wire; internally the path walks bits of `i - 1`,
//! LSB first (level 0 decides the leaf's side within its pair).
//!
//! The leaf-hash layer is padded to the next power of two by repeating
//! the last leaf hash, so every proof carries exactly
//! `ceil(log2(max_i))` siblings.

use sha2::{Digest, Sha256};

use crate::error::ProofError;
use crate::Hash;

pub fn hash_leaf(leaf: &[u8]) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(leaf);
    hasher.finalize().into()
}

pub fn hash_siblings(left: &Hash, right: &Hash) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(left);
    hasher.update(right);
    hasher.finalize().into()
}

/// Tree depth for a leaf count: `ceil(log2(max_i))`.
pub fn depth_for(max_i: u64) -> u32 {
    if max_i <= 1 {
        0
    } else {
        64 - (max_i - 1).leading_zeros()
    }
}

/// Verify an opened leaf against the channel commitment.
///
/// Returns the proven cumulative owed amount `i * unit_value`.
pub fn verify_proof(
    root: &Hash,
    max_i: u64,
    unit_value: u64,
    i: u64,
    leaf: &[u8],
    siblings: &[Hash],
) -> Result<u64, ProofError> {
    if i == 0 {
        return Err(ProofError::NonPositiveIndex);
    }
    if i > max_i {
        return Err(ProofError::IndexOutOfRange { index: i, max: max_i });
    }
    let depth = depth_for(max_i) as usize;
    if siblings.len() != depth {
        return Err(ProofError::MalformedProof(format!(
            "expected {} siblings, got {}",
            depth,
            siblings.len()
        )));
    }

    let mut acc = hash_leaf(leaf);
    let mut position = i - 1;
    for sibling in siblings {
        acc = if position & 1 == 0 {
            hash_siblings(&acc, sibling)
        } else {
            hash_siblings(sibling, &acc)
        };
        position >>= 1;
    }

    if acc != *root {
        return Err(ProofError::InvalidPaytreeProof);
    }
    i.checked_mul(unit_value)
        .ok_or_else(|| ProofError::MalformedProof("owed amount overflows u64".into()))
}

/// Client-side tree: the secret leaves plus every hash layer, kept so
/// proofs for any index are a straight walk up the layers.
pub struct Paytree {
    max_i: u64,
    leaves: Vec<Vec<u8>>,
    /// layers[0] is the padded leaf-hash layer; the last layer is the root.
    layers: Vec<Vec<Hash>>,
}

impl Paytree {
    /// Build a tree over `max_i` fresh random 32-byte leaves.
    pub fn generate(max_i: u64) -> Result<Self, ProofError> {
        if max_i == 0 {
            return Err(ProofError::MalformedProof("max_i must be positive".into()));
        }
        let leaves = (0..max_i)
            .map(|_| {
                let leaf: [u8; 32] = rand::random();
                leaf.to_vec()
            })
            .collect();
        Self::from_leaves(leaves)
    }

    /// Build a tree over caller-supplied leaves.
    pub fn from_leaves(leaves: Vec<Vec<u8>>) -> Result<Self, ProofError> {
        if leaves.is_empty() {
            return Err(ProofError::MalformedProof("max_i must be positive".into()));
        }
        let max_i = leaves.len() as u64;
        let width = 1usize << depth_for(max_i);

        let mut level: Vec<Hash> = leaves.iter().map(|leaf| hash_leaf(leaf)).collect();
        let last = level[level.len() - 1];
        level.resize(width, last);

        let mut layers = vec![level.clone()];
        let mut current = level;
        while current.len() > 1 {
            let next: Vec<Hash> = current
                .chunks_exact(2)
                .map(|pair| hash_siblings(&pair[0], &pair[1]))
                .collect();
            layers.push(next.clone());
            current = next;
        }

        Ok(Self {
            max_i,
            leaves,
            layers,
        })
    }

    pub fn max_i(&self) -> u64 {
        self.max_i
    }

    pub fn root(&self) -> Hash {
        self.layers
            .last()
            .and_then(|layer| layer.first())
            .copied()
            .unwrap_or([0u8; 32])
    }

    pub fn root_b64(&self) -> String {
        crate::canonical::b64_encode(&self.root())
    }

    /// Open leaf `i`: the raw leaf plus its sibling path, bottom level
    /// first.
    pub fn proof(&self, i: u64) -> Result<(Vec<u8>, Vec<Hash>), ProofError> {
        if i == 0 {
            return Err(ProofError::NonPositiveIndex);
        }
        if i > self.max_i {
            return Err(ProofError::IndexOutOfRange {
                index: i,
                max: self.max_i,
            });
        }

        let mut index = (i - 1) as usize;
        let mut siblings = Vec::new();
        for layer in &self.layers[..self.layers.len() - 1] {
            let sibling_index = if index % 2 == 0 { index + 1 } else { index - 1 };
            siblings.push(layer[sibling_index]);
            index /= 2;
        }

        Ok((self.leaves[(i - 1) as usize].clone(), siblings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn fixed_leaves(n: u64) -> Vec<Vec<u8>> {
        (0..n).map(|j| vec![j as u8; 32]).collect()
    }

    #[test]
    fn every_leaf_verifies_against_root() {
        let tree = Paytree::from_leaves(fixed_leaves(8)).unwrap();
        let root = tree.root();

        for i in 1..=8 {
            let (leaf, siblings) = tree.proof(i).unwrap();
            assert_eq!(verify_proof(&root, 8, 10, i, &leaf, &siblings), Ok(i * 10));
        }
    }

    #[test]
    fn non_power_of_two_leaf_counts_verify() {
        for n in [1u64, 3, 5, 6, 7, 9, 100] {
            let tree = Paytree::from_leaves(fixed_leaves(n)).unwrap();
            let root = tree.root();
            for i in 1..=n {
                let (leaf, siblings) = tree.proof(i).unwrap();
                assert_eq!(siblings.len(), depth_for(n) as usize);
                assert!(verify_proof(&root, n, 1, i, &leaf, &siblings).is_ok());
            }
        }
    }

    #[test]
    fn zero_index_rejected() {
        let tree = Paytree::from_leaves(fixed_leaves(4)).unwrap();
        let (leaf, siblings) = tree.proof(1).unwrap();

        assert_eq!(
            verify_proof(&tree.root(), 4, 1, 0, &leaf, &siblings),
            Err(ProofError::NonPositiveIndex)
        );
        assert_eq!(tree.proof(0), Err(ProofError::NonPositiveIndex));
    }

    #[test]
    fn index_above_max_rejected() {
        let tree = Paytree::from_leaves(fixed_leaves(4)).unwrap();
        let (leaf, siblings) = tree.proof(4).unwrap();

        assert_eq!(
            verify_proof(&tree.root(), 4, 1, 5, &leaf, &siblings),
            Err(ProofError::IndexOutOfRange { index: 5, max: 4 })
        );
    }

    #[test]
    fn wrong_sibling_count_is_malformed() {
        let tree = Paytree::from_leaves(fixed_leaves(8)).unwrap();
        let (leaf, mut siblings) = tree.proof(2).unwrap();
        siblings.pop();

        assert!(matches!(
            verify_proof(&tree.root(), 8, 1, 2, &leaf, &siblings),
            Err(ProofError::MalformedProof(_))
        ));
    }

    #[test]
    fn foreign_leaf_rejected() {
        let tree_a = Paytree::from_leaves(fixed_leaves(8)).unwrap();
        let tree_b = Paytree::generate(8).unwrap();
        let (leaf, siblings) = tree_b.proof(3).unwrap();

        assert_eq!(
            verify_proof(&tree_a.root(), 8, 1, 3, &leaf, &siblings),
            Err(ProofError::InvalidPaytreeProof)
        );
    }

    #[test]
    fn proof_for_wrong_index_rejected() {
        let tree = Paytree::from_leaves(fixed_leaves(8)).unwrap();
        let (leaf, siblings) = tree.proof(3).unwrap();

        assert_eq!(
            verify_proof(&tree.root(), 8, 1, 4, &leaf, &siblings),
            Err(ProofError::InvalidPaytreeProof)
        );
    }

    #[test]
    fn zero_max_i_refused() {
        assert!(Paytree::generate(0).is_err());
        assert!(Paytree::from_leaves(vec![]).is_err());
    }

    #[test]
    fn depth_matches_ceil_log2() {
        assert_eq!(depth_for(1), 0);
        assert_eq!(depth_for(2), 1);
        assert_eq!(depth_for(3), 2);
        assert_eq!(depth_for(4), 2);
        assert_eq!(depth_for(5), 3);
        assert_eq!(depth_for(100), 7);
    }

    proptest! {
        // verify(root, i, leaf_i, siblings_i) holds for any tree size
        // and any 1 <= i <= max_i
        #[test]
        fn open_then_verify(n in 1u64..33) {
            let tree = Paytree::generate(n).unwrap();
            let root = tree.root();
            for i in 1..=n {
                let (leaf, siblings) = tree.proof(i).unwrap();
                prop_assert_eq!(verify_proof(&root, n, 2, i, &leaf, &siblings), Ok(i * 2));
            }
        }
    }
}
