//! Indexed Merkle map.
//!
//! Leaves are appended in insertion order and linked into a list sorted by
//! key, so a key's absence is witnessed by the leaf that brackets it (its low
//! node). Every leaf write recomputes the hashes on its path and then the root.
//!
//! ```text
//! level h-1            root
//!                     /    \
//!   ...            ...      ...
//! level 0    leaf 0  leaf 1  ...  leaf 2^(h-1) - 1
//! ```

use std::sync::Arc;

use ark_bn254::Fr;
use ark_ff::PrimeField;
use zk_gadgets::{FieldHasher, PoseidonHasher};

use crate::cache::{poseidon_empty_hashes, EmptyHashes, NodeCache, MAX_HEIGHT, MIN_HEIGHT};
use crate::error::MapError;
use crate::leaf::Leaf;
use crate::proof::MerklePath;
use crate::search::bisect_unique;

/// Everything needed to prove a key is stored: where, what, and the path.
#[derive(Clone, Debug)]
pub struct MembershipWitness<F: PrimeField> {
    pub index: u64,
    pub leaf: Leaf<F>,
    pub path: MerklePath<F>,
}

/// Authenticated key-value map whose leaves form a sorted linked list.
pub struct IndexedMerkleMap<F: PrimeField, H: FieldHasher<F>> {
    height: usize,
    /// Leaf slots by index; `None` once removed. Indices are never reused.
    leaves: Vec<Option<Leaf<F>>>,
    /// Indices of live leaves, ordered by key
    sorted: Vec<u64>,
    nodes: NodeCache<F>,
    empty: Arc<EmptyHashes<F, H>>,
    root: F,
}

impl IndexedMerkleMap<Fr, PoseidonHasher<Fr>> {
    /// A Poseidon map over BN254 sharing the process-wide empty-subtree table.
    pub fn new(height: usize) -> Result<Self, MapError> {
        Self::with_empty_hashes(height, poseidon_empty_hashes())
    }
}

impl<F: PrimeField, H: FieldHasher<F>> IndexedMerkleMap<F, H> {
    pub fn with_empty_hashes(height: usize, empty: Arc<EmptyHashes<F, H>>) -> Result<Self, MapError> {
        if !(MIN_HEIGHT..=MAX_HEIGHT).contains(&height) {
            return Err(MapError::InvalidHeight(height));
        }
        let root = empty.get(height - 1);
        Ok(Self {
            height,
            leaves: Vec::new(),
            sorted: Vec::new(),
            nodes: NodeCache::new(height),
            empty,
            root,
        })
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of leaf slots, `2^(height-1)`.
    pub fn capacity(&self) -> u64 {
        1u64 << (self.height - 1)
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.sorted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sorted.is_empty()
    }

    /// Number of leaf slots allocated so far, including removed ones.
    pub fn slots_used(&self) -> u64 {
        self.leaves.len() as u64
    }

    pub fn root(&self) -> F {
        self.root
    }

    pub fn hasher(&self) -> &H {
        self.empty.hasher()
    }

    /// Hash of an empty subtree at `level`.
    pub fn empty(&self, level: usize) -> F {
        self.empty.get(level)
    }

    /// Live leaf at `index`.
    pub fn leaf(&self, index: u64) -> Option<&Leaf<F>> {
        self.leaves.get(usize::try_from(index).ok()?)?.as_ref()
    }

    /// Live leaves in key order, with their indices.
    pub fn iter(&self) -> impl Iterator<Item = (u64, &Leaf<F>)> + '_ {
        self.sorted
            .iter()
            .filter_map(|&i| self.leaf(i).map(|leaf| (i, leaf)))
    }

    pub fn get(&self, key: &F) -> Option<F> {
        match self.find(key) {
            (Some(pos), true) => self.leaf(self.sorted[pos]).map(|leaf| leaf.value),
            _ => None,
        }
    }

    pub fn contains(&self, key: &F) -> bool {
        self.find(key).1
    }

    /// The leaf with the greatest key `<= key`, with its index.
    pub fn low_node(&self, key: &F) -> Option<(u64, &Leaf<F>)> {
        let pos = self.find(key).0?;
        let index = self.sorted[pos];
        self.leaf(index).map(|leaf| (index, leaf))
    }

    /// Insert a new key, returning the index of its leaf.
    pub fn insert(&mut self, key: F, value: F) -> Result<u64, MapError> {
        let (pos, found) = self.find(&key);
        if found {
            return Err(MapError::KeyExists);
        }
        let capacity = self.capacity();
        let index = self.slots_used();
        if index >= capacity {
            return Err(MapError::Full { capacity });
        }

        let leaf = match pos {
            Some(pos) => {
                let low_index = self.sorted[pos];
                let mut low = self.live_leaf(low_index)?;
                if !low.brackets(&key) {
                    return Err(MapError::InvalidLowNode);
                }
                let leaf = Leaf {
                    key,
                    value,
                    next_key: low.next_key,
                    next_index: low.next_index,
                };
                low.next_key = key;
                low.next_index = index;
                self.write_leaf(low_index, low)?;
                self.sorted.insert(pos + 1, index);
                leaf
            }
            // no stored key is smaller: the new leaf becomes the head
            None => {
                let leaf = match self.sorted.first() {
                    Some(&head_index) => Leaf {
                        key,
                        value,
                        next_key: self.live_leaf(head_index)?.key,
                        next_index: head_index,
                    },
                    None => Leaf::tail(key, value),
                };
                self.sorted.insert(0, index);
                leaf
            }
        };

        self.leaves.push(None);
        self.write_leaf(index, leaf)?;

        tracing::debug!(index, root = %self.root, "indexed map insert");
        Ok(index)
    }

    /// Replace the value of a stored key, returning the previous value.
    pub fn update(&mut self, key: F, value: F) -> Result<F, MapError> {
        let index = match self.find(&key) {
            (Some(pos), true) => self.sorted[pos],
            _ => return Err(MapError::KeyNotFound),
        };
        let mut leaf = self.live_leaf(index)?;
        let previous = leaf.value;
        leaf.value = value;
        self.write_leaf(index, leaf)?;

        tracing::debug!(index, root = %self.root, "indexed map update");
        Ok(previous)
    }

    /// Insert or update, returning the previous value if the key was stored.
    pub fn set(&mut self, key: F, value: F) -> Result<Option<F>, MapError> {
        if self.contains(&key) {
            self.update(key, value).map(Some)
        } else {
            self.insert(key, value).map(|_| None)
        }
    }

    /// Remove a stored key, returning its value.
    ///
    /// The leaf slot stays allocated and its hash is cleared to `empty(0)`.
    pub fn remove(&mut self, key: &F) -> Result<F, MapError> {
        let pos = match self.find(key) {
            (Some(pos), true) => pos,
            _ => return Err(MapError::KeyNotFound),
        };
        let index = self.sorted[pos];
        let removed = self.live_leaf(index)?;

        if pos > 0 {
            let prev_index = self.sorted[pos - 1];
            let mut prev = self.live_leaf(prev_index)?;
            prev.next_key = removed.next_key;
            prev.next_index = removed.next_index;
            self.write_leaf(prev_index, prev)?;
        }

        self.sorted.remove(pos);
        if let Some(slot) = self.slot_mut(index) {
            *slot = None;
        }
        let cleared = self.empty(0);
        self.set_leaf_node(index, cleared)?;

        tracing::debug!(index, root = %self.root, "indexed map remove");
        Ok(removed.value)
    }

    /// Hash of the node at `(level, index)`.
    ///
    /// An absent node is an empty subtree unless `non_empty` says it must
    /// have been written, in which case the cache is corrupt.
    pub fn get_node(&self, level: usize, index: u64, non_empty: bool) -> Result<F, MapError> {
        match self.nodes.get(level, index) {
            Some(hash) => Ok(hash),
            None if non_empty => Err(MapError::InvariantViolation { level, index }),
            None => Ok(self.empty(level)),
        }
    }

    /// Write a leaf hash and recompute every ancestor and the root.
    ///
    /// Only allocated slots (`index < slots_used()`) can be written, so the
    /// node cache never holds a leaf the map has not handed out.
    pub fn set_leaf_node(&mut self, index: u64, leaf_hash: F) -> Result<(), MapError> {
        let capacity = self.capacity();
        if index >= capacity {
            return Err(MapError::IndexOutOfRange { index, capacity });
        }
        if index >= self.slots_used() {
            return Err(MapError::UnallocatedSlot { index });
        }

        self.nodes.insert(0, index, leaf_hash);

        let mut child = index;
        for level in 1..self.height {
            let is_left = child % 2 == 0;
            let parent = child / 2;
            let left = self.get_node(level - 1, 2 * parent, is_left)?;
            let right = self.get_node(level - 1, 2 * parent + 1, !is_left)?;
            let hash = self.hasher().hash(&[left, right]);
            self.nodes.insert(level, parent, hash);
            child = parent;
        }

        self.root = self.get_node(self.height - 1, 0, true)?;
        Ok(())
    }

    /// Sibling hashes of the leaf at `index`, leaf level first.
    pub fn path(&self, index: u64) -> Result<MerklePath<F>, MapError> {
        let capacity = self.capacity();
        if index >= capacity {
            return Err(MapError::IndexOutOfRange { index, capacity });
        }

        let mut siblings = Vec::with_capacity(self.height - 1);
        let mut is_right = Vec::with_capacity(self.height - 1);
        let mut current = index;
        for level in 0..self.height - 1 {
            siblings.push(self.get_node(level, current ^ 1, false)?);
            is_right.push(current % 2 == 1);
            current /= 2;
        }
        Ok(MerklePath::new(siblings, is_right))
    }

    pub fn membership_witness(&self, key: &F) -> Result<MembershipWitness<F>, MapError> {
        let index = match self.find(key) {
            (Some(pos), true) => self.sorted[pos],
            _ => return Err(MapError::KeyNotFound),
        };
        Ok(MembershipWitness {
            index,
            leaf: self.live_leaf(index)?,
            path: self.path(index)?,
        })
    }

    /// Low-node witness for a key that is not stored.
    pub fn non_membership_witness(&self, key: &F) -> Result<MembershipWitness<F>, MapError> {
        match self.find(key) {
            (_, true) => Err(MapError::KeyExists),
            (None, false) => Err(MapError::InvalidLowNode),
            (Some(pos), false) => {
                let index = self.sorted[pos];
                Ok(MembershipWitness {
                    index,
                    leaf: self.live_leaf(index)?,
                    path: self.path(index)?,
                })
            }
        }
    }

    fn find(&self, key: &F) -> (Option<usize>, bool) {
        let target = key.into_bigint();
        bisect_unique(&target, self.sorted.len(), |i| {
            self.leaf(self.sorted[i])
                .map(|leaf| leaf.key.into_bigint())
                .unwrap_or_default()
        })
    }

    fn live_leaf(&self, index: u64) -> Result<Leaf<F>, MapError> {
        self.leaf(index)
            .copied()
            .ok_or(MapError::InvariantViolation { level: 0, index })
    }

    fn write_leaf(&mut self, index: u64, leaf: Leaf<F>) -> Result<(), MapError> {
        let hash = leaf.hash(self.hasher());
        let slot = self
            .slot_mut(index)
            .ok_or(MapError::InvariantViolation { level: 0, index })?;
        *slot = Some(leaf);
        self.set_leaf_node(index, hash)
    }

    fn slot_mut(&mut self, index: u64) -> Option<&mut Option<Leaf<F>>> {
        self.leaves.get_mut(usize::try_from(index).ok()?)
    }
}
