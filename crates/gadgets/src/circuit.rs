//! RangeCheckCircuit: bounds a handful of private values with every range-check gadget.

use ark_ff::PrimeField;
use ark_r1cs_std::{alloc::AllocVar, fields::fp::FpVar};
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError};

use crate::gates::R1csRangeGates;
use crate::range_check::{compact_multi_range_check, multi_range_check, range_check64};

/// Circuit that proves:
/// "a < 2^64, x, y, z < 2^88, and packed = x' + 2^88·y' with x', y', z' < 2^88"
///
/// Public inputs:
/// - packed: two 88-bit values packed into one field element
///
/// Private witnesses:
/// - a: a 64-bit value
/// - xyz: three 88-bit values
/// - z_prime: the value checked alongside the packed pair
#[derive(Clone, Default)]
pub struct RangeCheckCircuit<F: PrimeField> {
    /// Private: 64-bit value
    pub a: Option<F>,
    /// Private: three 88-bit values
    pub xyz: Option<[F; 3]>,
    /// Private: third value of the compact check
    pub z_prime: Option<F>,

    /// Public: packed pair
    pub packed: Option<F>,
}

impl<F: PrimeField> RangeCheckCircuit<F> {
    /// Create a new circuit instance for proving.
    pub fn new(a: F, xyz: [F; 3], packed: F, z_prime: F) -> Self {
        Self {
            a: Some(a),
            xyz: Some(xyz),
            z_prime: Some(z_prime),
            packed: Some(packed),
        }
    }

    /// Create an empty circuit for setup (constraint generation only).
    pub fn empty() -> Self {
        Self::default()
    }
}

impl<F: PrimeField> ConstraintSynthesizer<F> for RangeCheckCircuit<F> {
    fn generate_constraints(self, cs: ConstraintSystemRef<F>) -> Result<(), SynthesisError> {
        // 1. Allocate private witnesses
        let a = FpVar::new_witness(cs.clone(), || self.a.ok_or(SynthesisError::AssignmentMissing))?;
        let xyz = (0..3)
            .map(|i| {
                FpVar::new_witness(cs.clone(), || {
                    self.xyz.map(|v| v[i]).ok_or(SynthesisError::AssignmentMissing)
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let z_prime = FpVar::new_witness(cs.clone(), || {
            self.z_prime.ok_or(SynthesisError::AssignmentMissing)
        })?;

        // 2. Allocate public inputs
        let packed = FpVar::new_input(cs.clone(), || {
            self.packed.ok_or(SynthesisError::AssignmentMissing)
        })?;

        // 3. Range checks, all sharing one gate log
        let mut gates = R1csRangeGates::new(cs);
        let _limbs = range_check64(&mut gates, &a)?;
        multi_range_check(&mut gates, [&xyz[0], &xyz[1], &xyz[2]])?;
        let _split = compact_multi_range_check(&mut gates, &packed, &z_prime)?;

        Ok(())
    }
}
