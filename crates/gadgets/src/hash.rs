//! Poseidon hashing over field elements.
//!
//! [`FieldHasher`] is the hash seam consumed by authenticated structures; the
//! shipped implementation is a Poseidon sponge, with [`PoseidonGadget`]
//! computing the same function in-circuit.

use ark_crypto_primitives::sponge::{
    constraints::CryptographicSpongeVar,
    poseidon::{
        constraints::PoseidonSpongeVar, find_poseidon_ark_and_mds, PoseidonConfig, PoseidonSponge,
    },
    Absorb, CryptographicSponge,
};
use ark_ff::PrimeField;
use ark_r1cs_std::fields::fp::FpVar;
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};

/// Sponge rate
pub const POSEIDON_RATE: usize = 2;
/// Full rounds
pub const POSEIDON_FULL_ROUNDS: usize = 8;
/// Partial rounds
pub const POSEIDON_PARTIAL_ROUNDS: usize = 57;
/// S-box exponent
pub const POSEIDON_ALPHA: u64 = 5;

/// A pure function from a sequence of field elements to one field element.
pub trait FieldHasher<F>: Send + Sync {
    fn hash(&self, inputs: &[F]) -> F;
}

/// Generate Poseidon configuration for a prime field.
///
/// Rate 2, capacity 1, 8 full and 57 partial rounds, x^5 S-box. Round
/// constants and the MDS matrix come from the Grain LFSR.
pub fn poseidon_config<F: PrimeField>() -> PoseidonConfig<F> {
    let (ark, mds) = find_poseidon_ark_and_mds::<F>(
        F::MODULUS_BIT_SIZE as u64,
        POSEIDON_RATE,
        POSEIDON_FULL_ROUNDS as u64,
        POSEIDON_PARTIAL_ROUNDS as u64,
        0,
    );

    PoseidonConfig::new(
        POSEIDON_FULL_ROUNDS,
        POSEIDON_PARTIAL_ROUNDS,
        POSEIDON_ALPHA,
        mds,
        ark,
        POSEIDON_RATE,
        1, // capacity
    )
}

/// Native Poseidon hasher.
#[derive(Clone)]
pub struct PoseidonHasher<F: PrimeField> {
    config: PoseidonConfig<F>,
}

impl<F: PrimeField> PoseidonHasher<F> {
    pub fn new(config: PoseidonConfig<F>) -> Self {
        Self { config }
    }
}

impl<F: PrimeField> Default for PoseidonHasher<F> {
    fn default() -> Self {
        Self::new(poseidon_config())
    }
}

impl<F: PrimeField + Absorb> FieldHasher<F> for PoseidonHasher<F> {
    fn hash(&self, inputs: &[F]) -> F {
        let inputs = inputs.to_vec();
        let mut sponge = PoseidonSponge::new(&self.config);
        sponge.absorb(&inputs);
        sponge.squeeze_field_elements(1)[0]
    }
}

/// Poseidon gadget for in-circuit hashing.
pub struct PoseidonGadget<F: PrimeField> {
    config: PoseidonConfig<F>,
}

impl<F: PrimeField + Absorb> PoseidonGadget<F> {
    pub fn new(config: PoseidonConfig<F>) -> Self {
        Self { config }
    }

    /// Compute Poseidon hash in-circuit.
    pub fn hash(
        &self,
        cs: ConstraintSystemRef<F>,
        inputs: &[FpVar<F>],
    ) -> Result<FpVar<F>, SynthesisError> {
        let mut sponge = PoseidonSpongeVar::new(cs, &self.config);
        sponge.absorb(&inputs)?;
        let output = sponge.squeeze_field_elements(1)?;
        Ok(output[0].clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bn254::Fr;
    use ark_r1cs_std::alloc::AllocVar;
    use ark_r1cs_std::eq::EqGadget;
    use ark_relations::r1cs::ConstraintSystem;

    #[test]
    fn test_hash_deterministic() {
        let hasher = PoseidonHasher::<Fr>::default();
        let inputs = [Fr::from(1u64), Fr::from(2u64)];

        assert_eq!(hasher.hash(&inputs), hasher.hash(&inputs));
    }

    #[test]
    fn test_hash_input_order_matters() {
        let hasher = PoseidonHasher::<Fr>::default();

        let a = hasher.hash(&[Fr::from(1u64), Fr::from(2u64)]);
        let b = hasher.hash(&[Fr::from(2u64), Fr::from(1u64)]);

        assert_ne!(a, b);
    }

    #[test]
    fn test_in_circuit_hash_matches_native() {
        let config = poseidon_config::<Fr>();
        let inputs = [Fr::from(7u64), Fr::from(11u64), Fr::from(0u64), Fr::from(3u64)];

        // Compute out-of-circuit
        let expected = PoseidonHasher::new(config.clone()).hash(&inputs);

        // Compute in-circuit
        let cs = ConstraintSystem::<Fr>::new_ref();
        let gadget = PoseidonGadget::new(config);
        let input_vars: Vec<FpVar<Fr>> = inputs
            .iter()
            .map(|f| FpVar::new_witness(cs.clone(), || Ok(*f)).unwrap())
            .collect();

        let computed = gadget.hash(cs.clone(), &input_vars).unwrap();

        // Verify they match
        let expected_var = FpVar::new_input(cs.clone(), || Ok(expected)).unwrap();
        computed.enforce_equal(&expected_var).unwrap();

        assert!(cs.is_satisfied().unwrap());
    }
}
