//! Provable gadgets for arkworks R1CS circuits.
//!
//! This crate provides:
//! - `range_check64`: prove a value fits in 64 bits with a single packed gate
//! - `multi_range_check`: prove three values fit in 88 bits each
//! - `compact_multi_range_check`: the same, with two of the values packed into one field element
//! - Poseidon hashing, natively and in-circuit
//!
//! Range checks are built on two custom gates (`RangeCheck0`, `RangeCheck1`)
//! reached through the [`RangeCheckGates`] trait. [`R1csRangeGates`] realises
//! them on an arkworks constraint system.

pub mod bits;
pub mod circuit;
pub mod error;
pub mod field;
pub mod gates;
pub mod hash;
pub mod range_check;


pub use bits::bit_slice;
pub use circuit::RangeCheckCircuit;
pub use error::GadgetError;
pub use field::{exists, to_biguint};
pub use gates::{GateKind, R1csRangeGates, RangeCheckGates};
pub use hash::{poseidon_config, FieldHasher, PoseidonGadget, PoseidonHasher};
pub use range_check::{compact_multi_range_check, multi_range_check, range_check64};

use ark_bn254::Fr;

/// Common type aliases
pub type ConstraintF = Fr;
