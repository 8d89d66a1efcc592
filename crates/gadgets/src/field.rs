//! Field values and witness introduction.
//!
//! A field value in a circuit is an [`FpVar`]: either `FpVar::Constant`, whose
//! integer is known while the circuit is being built, or `FpVar::Var`, a handle
//! that only receives a concrete value when the witness is generated. Gadgets
//! match on the two variants explicitly.
//!
//! Witness introduction is split in two phases. The constraint shape is built
//! from the `ConstraintSystemRef` alone, while the values of new variables come
//! from a compute closure that [`exists`] only evaluates when the constraint
//! system is in proving mode.

use ark_ff::PrimeField;
use ark_r1cs_std::{alloc::AllocVar, fields::fp::FpVar, prelude::*};
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};
use num_bigint::BigUint;

/// Canonical unsigned integer of a field element.
pub fn to_biguint<F: PrimeField>(f: &F) -> BigUint {
    f.into_bigint().into()
}

/// Concrete integer behind a field value.
///
/// Constants always have one; variables only while generating the witness.
pub fn value_biguint<F: PrimeField>(x: &FpVar<F>) -> Result<BigUint, SynthesisError> {
    Ok(to_biguint(&x.value()?))
}

/// Introduce `N` new, unconstrained witness variables.
///
/// `compute` returns the concrete integers seeding them. It runs at most once,
/// and never while the constraint system is only collecting the circuit shape,
/// so it may freely read the values of already-known variables.
pub fn exists<F, const N: usize>(
    cs: ConstraintSystemRef<F>,
    compute: impl FnOnce() -> Result<[BigUint; N], SynthesisError>,
) -> Result<[FpVar<F>; N], SynthesisError>
where
    F: PrimeField,
{
    let values = if cs.is_in_setup_mode() {
        None
    } else {
        Some(compute()?)
    };

    let mut vars: [FpVar<F>; N] = std::array::from_fn(|_| FpVar::zero());
    for (i, var) in vars.iter_mut().enumerate() {
        *var = FpVar::new_witness(cs.clone(), || {
            values
                .as_ref()
                .map(|v| F::from(v[i].clone()))
                .ok_or(SynthesisError::AssignmentMissing)
        })?;
    }
    Ok(vars)
}
