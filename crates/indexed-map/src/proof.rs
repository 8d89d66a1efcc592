//! Merkle paths out of the indexed map.

use ark_ff::PrimeField;
use zk_gadgets::FieldHasher;

/// Sibling hashes from a leaf up to (but excluding) the root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MerklePath<F: PrimeField> {
    /// Sibling hash at each level, leaf level first
    siblings: Vec<F>,
    /// Whether the path node is the right child at each level
    is_right: Vec<bool>,
}

impl<F: PrimeField> MerklePath<F> {
    pub fn new(siblings: Vec<F>, is_right: Vec<bool>) -> Self {
        debug_assert_eq!(siblings.len(), is_right.len());
        Self { siblings, is_right }
    }

    pub fn siblings(&self) -> &[F] {
        &self.siblings
    }

    pub fn is_right(&self) -> &[bool] {
        &self.is_right
    }

    pub fn depth(&self) -> usize {
        self.siblings.len()
    }

    /// Leaf index encoded by the direction bits.
    pub fn index(&self) -> u64 {
        self.is_right
            .iter()
            .rev()
            .fold(0, |acc, &right| (acc << 1) | u64::from(right))
    }

    /// Fold `leaf_hash` up the path.
    pub fn compute_root<H: FieldHasher<F>>(&self, hasher: &H, leaf_hash: F) -> F {
        self.siblings
            .iter()
            .zip(&self.is_right)
            .fold(leaf_hash, |current, (sibling, &right)| {
                if right {
                    hasher.hash(&[*sibling, current])
                } else {
                    hasher.hash(&[current, *sibling])
                }
            })
    }

    pub fn verify<H: FieldHasher<F>>(&self, hasher: &H, root: F, leaf_hash: F) -> bool {
        self.compute_root(hasher, leaf_hash) == root
    }
}
