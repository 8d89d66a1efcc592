//! Errors raised while building gadget constraints.

use ark_relations::r1cs::SynthesisError;
use num_bigint::BigUint;
use thiserror::Error;

/// Errors during gadget construction
#[derive(Error, Debug)]
pub enum GadgetError {
    /// A constant input does not fit its declared bit-width.
    #[error("range check: expected field to fit in {bits} bits, got {}", format_values(.values))]
    RangeViolation { bits: u32, values: Vec<BigUint> },
    #[error(transparent)]
    Synthesis(#[from] SynthesisError),
}

fn format_values(values: &[BigUint]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl GadgetError {
    pub(crate) fn range(bits: u32, values: impl IntoIterator<Item = BigUint>) -> Self {
        Self::RangeViolation {
            bits,
            values: values.into_iter().collect(),
        }
    }
}

/// Lets gadgets run inside `ConstraintSynthesizer::generate_constraints`.
impl From<GadgetError> for SynthesisError {
    fn from(err: GadgetError) -> Self {
        match err {
            GadgetError::Synthesis(e) => e,
            GadgetError::RangeViolation { .. } => SynthesisError::Unsatisfiable,
        }
    }
}
