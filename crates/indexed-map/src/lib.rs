//! Indexed Merkle map.
//!
//! An authenticated key-value map whose leaves form a linked list sorted by
//! key. A stored key is proven by its leaf's Merkle path; an absent key by the
//! path of its low node, the leaf whose key and successor bracket it.
//!
//! This crate provides:
//! - [`IndexedMerkleMap`]: insert / update / set / get / remove with the root
//!   kept current after every write
//! - [`MerklePath`] and membership witnesses out of the map
//! - In-circuit gadgets verifying a leaf against a root

pub mod cache;
pub mod error;
pub mod gadgets;
pub mod leaf;
pub mod map;
pub mod proof;
pub mod search;

pub use cache::{poseidon_empty_hashes, EmptyHashes, NodeCache, DEFAULT_HEIGHT};
pub use error::MapError;
pub use gadgets::{
    compute_root_from_path, verify_and_update_value, verify_membership, LeafVar, MerklePathVar,
};
pub use leaf::Leaf;
pub use map::{IndexedMerkleMap, MembershipWitness};
pub use proof::MerklePath;
pub use search::bisect_unique;

/// Poseidon map over BN254.
pub type PoseidonMap = IndexedMerkleMap<ark_bn254::Fr, zk_gadgets::PoseidonHasher<ark_bn254::Fr>>;
