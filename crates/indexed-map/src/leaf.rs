//! Leaves of the indexed map.
//!
//! Each leaf is a node of a singly linked list sorted by key. The tail points
//! at `(next_key, next_index) = (0, 0)`.

use std::cmp::Ordering;

use ark_ff::PrimeField;
use zk_gadgets::FieldHasher;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Leaf<F: PrimeField> {
    pub key: F,
    pub value: F,
    pub next_key: F,
    pub next_index: u64,
}

impl<F: PrimeField> Leaf<F> {
    /// A leaf with no successor.
    pub fn tail(key: F, value: F) -> Self {
        Self {
            key,
            value,
            next_key: F::zero(),
            next_index: 0,
        }
    }

    pub fn is_tail(&self) -> bool {
        self.next_key.is_zero() && self.next_index == 0
    }

    /// `H(key, value, next_key, next_index)`
    pub fn hash<H: FieldHasher<F>>(&self, hasher: &H) -> F {
        hasher.hash(&[self.key, self.value, self.next_key, F::from(self.next_index)])
    }

    /// Whether `key` belongs strictly between this leaf and its successor.
    pub fn brackets(&self, key: &F) -> bool {
        cmp_keys(&self.key, key) == Ordering::Less
            && (self.is_tail() || cmp_keys(key, &self.next_key) == Ordering::Less)
    }
}

/// Order keys by their canonical integer representation.
pub fn cmp_keys<F: PrimeField>(a: &F, b: &F) -> Ordering {
    a.into_bigint().cmp(&b.into_bigint())
}
