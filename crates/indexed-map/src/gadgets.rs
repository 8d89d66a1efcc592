//! In-circuit verification gadgets for the indexed map.
//!
//! These authenticate a leaf against a root using the Poseidon hash the
//! native map is built with.

use ark_crypto_primitives::sponge::Absorb;
use ark_ff::PrimeField;
use ark_r1cs_std::{boolean::Boolean, fields::fp::FpVar, prelude::*};
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};
use zk_gadgets::PoseidonGadget;

use crate::leaf::Leaf;
use crate::proof::MerklePath;

/// Circuit variable representation of a leaf.
#[derive(Clone)]
pub struct LeafVar<F: PrimeField> {
    pub key: FpVar<F>,
    pub value: FpVar<F>,
    pub next_key: FpVar<F>,
    pub next_index: FpVar<F>,
}

impl<F: PrimeField + Absorb> LeafVar<F> {
    /// Allocate a leaf as witness variables.
    pub fn new_witness(cs: ConstraintSystemRef<F>, leaf: Option<&Leaf<F>>) -> Result<Self, SynthesisError> {
        let field = |get: fn(&Leaf<F>) -> F| {
            FpVar::new_witness(cs.clone(), || {
                leaf.map(get).ok_or(SynthesisError::AssignmentMissing)
            })
        };
        Ok(Self {
            key: field(|l| l.key)?,
            value: field(|l| l.value)?,
            next_key: field(|l| l.next_key)?,
            next_index: field(|l| F::from(l.next_index))?,
        })
    }

    /// `H(key, value, next_key, next_index)` in-circuit.
    pub fn hash(
        &self,
        cs: ConstraintSystemRef<F>,
        poseidon: &PoseidonGadget<F>,
    ) -> Result<FpVar<F>, SynthesisError> {
        poseidon.hash(
            cs,
            &[
                self.key.clone(),
                self.value.clone(),
                self.next_key.clone(),
                self.next_index.clone(),
            ],
        )
    }
}

/// Circuit variable representation of a Merkle path.
#[derive(Clone)]
pub struct MerklePathVar<F: PrimeField> {
    /// Sibling hashes as circuit variables
    siblings: Vec<FpVar<F>>,
    /// Direction booleans as circuit variables
    is_right: Vec<Boolean<F>>,
}

impl<F: PrimeField> MerklePathVar<F> {
    /// Allocate a path of `depth` levels as witness variables.
    ///
    /// `path` may be `None` during setup; only its depth matters then.
    pub fn new_witness(
        cs: ConstraintSystemRef<F>,
        depth: usize,
        path: Option<&MerklePath<F>>,
    ) -> Result<Self, SynthesisError> {
        let siblings = (0..depth)
            .map(|i| {
                FpVar::new_witness(cs.clone(), || {
                    path.and_then(|p| p.siblings().get(i).copied())
                        .ok_or(SynthesisError::AssignmentMissing)
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let is_right = (0..depth)
            .map(|i| {
                Boolean::new_witness(cs.clone(), || {
                    path.and_then(|p| p.is_right().get(i).copied())
                        .ok_or(SynthesisError::AssignmentMissing)
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { siblings, is_right })
    }

    pub fn siblings(&self) -> &[FpVar<F>] {
        &self.siblings
    }

    pub fn is_right(&self) -> &[Boolean<F>] {
        &self.is_right
    }

    pub fn depth(&self) -> usize {
        self.siblings.len()
    }

    /// Leaf index encoded by the direction bits.
    pub fn index(&self) -> Result<FpVar<F>, SynthesisError> {
        Boolean::le_bits_to_fp_var(&self.is_right)
    }
}

/// Compute the root hash from a leaf hash and Merkle path in-circuit.
pub fn compute_root_from_path<F: PrimeField + Absorb>(
    cs: ConstraintSystemRef<F>,
    poseidon: &PoseidonGadget<F>,
    leaf_hash: &FpVar<F>,
    path: &MerklePathVar<F>,
) -> Result<FpVar<F>, SynthesisError> {
    let mut current = leaf_hash.clone();

    for (sibling, is_right) in path.siblings.iter().zip(&path.is_right) {
        // If is_right: H(sibling, current), else H(current, sibling)
        let left = is_right.select(sibling, &current)?;
        let right = is_right.select(&current, sibling)?;

        current = poseidon.hash(cs.clone(), &[left, right])?;
    }

    Ok(current)
}

/// Verify that `leaf` is stored under `expected_root`.
pub fn verify_membership<F: PrimeField + Absorb>(
    cs: ConstraintSystemRef<F>,
    poseidon: &PoseidonGadget<F>,
    expected_root: &FpVar<F>,
    leaf: &LeafVar<F>,
    path: &MerklePathVar<F>,
) -> Result<(), SynthesisError> {
    let leaf_hash = leaf.hash(cs.clone(), poseidon)?;
    let computed_root = compute_root_from_path(cs, poseidon, &leaf_hash, path)?;
    computed_root.enforce_equal(expected_root)
}

/// Verify `leaf` under `old_root` and return the root after its value is
/// replaced by `new_value`.
pub fn verify_and_update_value<F: PrimeField + Absorb>(
    cs: ConstraintSystemRef<F>,
    poseidon: &PoseidonGadget<F>,
    old_root: &FpVar<F>,
    leaf: &LeafVar<F>,
    new_value: &FpVar<F>,
    path: &MerklePathVar<F>,
) -> Result<FpVar<F>, SynthesisError> {
    verify_membership(cs.clone(), poseidon, old_root, leaf, path)?;

    let updated = LeafVar {
        value: new_value.clone(),
        ..leaf.clone()
    };
    let new_leaf_hash = updated.hash(cs.clone(), poseidon)?;
    compute_root_from_path(cs, poseidon, &new_leaf_hash, path)
}
