//! Node storage for the indexed map.
//!
//! Only populated nodes are stored. An absent node is the root of an empty
//! subtree, whose hash depends only on its level and comes from
//! [`EmptyHashes`].

use std::collections::HashMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use ark_bn254::Fr;
use ark_ff::PrimeField;
use zk_gadgets::{FieldHasher, PoseidonHasher};

/// Default tree height.
pub const DEFAULT_HEIGHT: usize = 32;
/// Largest supported tree height; leaf indices must fit in a `u64`.
pub const MAX_HEIGHT: usize = 64;
/// Smallest supported tree height.
pub const MIN_HEIGHT: usize = 2;

/// Hashes of empty subtrees, per level.
///
/// `empty(0) = 0` and `empty(l) = H(empty(l-1), empty(l-1))`. Levels are
/// computed on first use and never change afterwards, so one table can be
/// shared by every map using the same hasher.
pub struct EmptyHashes<F: PrimeField, H: FieldHasher<F>> {
    hasher: H,
    table: RwLock<Vec<F>>,
}

impl<F: PrimeField, H: FieldHasher<F>> EmptyHashes<F, H> {
    pub fn new(hasher: H) -> Self {
        Self {
            hasher,
            table: RwLock::new(vec![F::zero()]),
        }
    }

    pub fn hasher(&self) -> &H {
        &self.hasher
    }

    /// Hash of an empty subtree whose root sits at `level`.
    pub fn get(&self, level: usize) -> F {
        {
            let table = self.table.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(h) = table.get(level) {
                return *h;
            }
        }

        let mut table = self.table.write().unwrap_or_else(PoisonError::into_inner);
        while table.len() <= level {
            let prev = table[table.len() - 1];
            table.push(self.hasher.hash(&[prev, prev]));
        }
        table[level]
    }
}

/// Empty-subtree table for Poseidon over BN254, shared process-wide.
pub fn poseidon_empty_hashes() -> Arc<EmptyHashes<Fr, PoseidonHasher<Fr>>> {
    static TABLE: OnceLock<Arc<EmptyHashes<Fr, PoseidonHasher<Fr>>>> = OnceLock::new();
    TABLE
        .get_or_init(|| Arc::new(EmptyHashes::new(PoseidonHasher::default())))
        .clone()
}

/// Sparse `(level, index) -> hash` arena.
#[derive(Clone, Debug)]
pub struct NodeCache<F> {
    levels: Vec<HashMap<u64, F>>,
}

impl<F: Copy> NodeCache<F> {
    pub fn new(height: usize) -> Self {
        Self {
            levels: (0..height).map(|_| HashMap::new()).collect(),
        }
    }

    pub fn get(&self, level: usize, index: u64) -> Option<F> {
        self.levels.get(level)?.get(&index).copied()
    }

    pub fn insert(&mut self, level: usize, index: u64, hash: F) {
        self.levels[level].insert(index, hash);
    }

    /// Number of populated nodes at `level`.
    pub fn populated(&self, level: usize) -> usize {
        self.levels.get(level).map_or(0, HashMap::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_ff::Zero;

    #[test]
    fn test_empty_hashes_chain() {
        let empty = poseidon_empty_hashes();
        let hasher = PoseidonHasher::<Fr>::default();

        assert!(empty.get(0).is_zero());
        for level in 1..6 {
            let prev = empty.get(level - 1);
            assert_eq!(empty.get(level), hasher.hash(&[prev, prev]));
        }
    }

    #[test]
    fn test_empty_hashes_extend_out_of_order() {
        let a = EmptyHashes::<Fr, _>::new(PoseidonHasher::default());
        let b = EmptyHashes::<Fr, _>::new(PoseidonHasher::default());

        let high = a.get(10);
        for level in 0..=10 {
            b.get(level);
        }
        assert_eq!(high, b.get(10));
    }

    #[test]
    fn test_shared_table_is_one_instance() {
        assert!(Arc::ptr_eq(&poseidon_empty_hashes(), &poseidon_empty_hashes()));
    }

    #[test]
    fn test_node_cache_sparse() {
        let mut cache = NodeCache::new(3);
        assert_eq!(cache.get(1, 0), None::<u64>);

        cache.insert(1, 0, 42);
        assert_eq!(cache.get(1, 0), Some(42));
        assert_eq!(cache.populated(1), 1);
        assert_eq!(cache.get(5, 0), None);
    }
}
