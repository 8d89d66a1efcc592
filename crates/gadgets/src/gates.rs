//! Range-check custom gates.
//!
//! Two fixed-shape gates carry every range check in this crate:
//!
//! ```text
//! RangeCheck0 (1 row), value v0 < 2^88:
//!
//!   v0 | p0  p1  | p2  p3  p4  p5  | c0  c1  c2  c3  c4  c5  c6  c7
//!      | 76  64  | 52  40  28  16  | 14  12  10  8   6   4   2   0     <- bit offset
//!      | copy    | lookup (12-bit) | crumb (2-bit)
//!
//! RangeCheck1 (2 rows), value v2 < 2^88, auxiliary v12:
//!
//!   Curr: v2  v12 | c86 | p74 p62 p50 p38 | c36 c34 c32 c30 c28 c26 c24 c22
//!   Next:         | c20 c18 c16 | x76 x64 y76 y64 | c14 c12 c10 c8 c6 c4 c2 c0
//! ```
//!
//! The two highest limbs of a `RangeCheck0` row (`copy`) are not looked up in
//! that row. They are copied into the `Next` row of a following `RangeCheck1`,
//! where the four lookup cells finish the range proof of two earlier values.
//!
//! `RangeCheck0` has a compact flag. A compact row holds the low half `x` of a
//! packed pair; the `RangeCheck1` directly after it then enforces
//! `v12 = x + 2^88 * v2`. After a non-compact row `RangeCheck1` enforces
//! `v12 = 0`.

use ark_ff::{BigInteger, PrimeField};
use ark_r1cs_std::{fields::fp::FpVar, prelude::*};
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};
use num_bigint::BigUint;
use num_traits::One;

use crate::field::to_biguint;

/// Width of a lookup limb.
pub const LIMB_BITS: usize = 12;

/// Bit offsets of the six 12-bit limbs of a `RangeCheck0` row, highest first.
const RC0_LIMB_SHIFTS: [u32; 6] = [76, 64, 52, 40, 28, 16];
/// Bit offsets of the eight crumbs of a `RangeCheck0` row, highest first.
const RC0_CRUMB_SHIFTS: [u32; 8] = [14, 12, 10, 8, 6, 4, 2, 0];

/// Bit offsets of the 13 cells of the `Curr` row of `RangeCheck1`.
const RC1_CURR_SHIFTS: [u32; 13] = [86, 74, 62, 50, 38, 36, 34, 32, 30, 28, 26, 24, 22];
/// Cells of the `Curr` row that are 12-bit lookups; every other cell is a crumb.
const RC1_CURR_LOOKUPS: std::ops::Range<usize> = 1..5;
/// Bit offsets of the crumbs of the `Next` row of `RangeCheck1`, in cell order.
const RC1_NEXT_CRUMB_SHIFTS: [(usize, u32); 11] = [
    (0, 20),
    (1, 18),
    (2, 16),
    (7, 14),
    (8, 12),
    (9, 10),
    (10, 8),
    (11, 6),
    (12, 4),
    (13, 2),
    (14, 0),
];
/// Cells of the `Next` row holding deferred limbs of earlier `RangeCheck0` rows.
const RC1_NEXT_LOOKUPS: std::ops::Range<usize> = 3..7;

/// Offset of the high half of a compact pair.
const COMPACT_SHIFT: u32 = 88;

/// A gate appended to the circuit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GateKind {
    RangeCheck0 { compact: bool },
    RangeCheck1,
}

impl GateKind {
    /// Number of rows the gate occupies.
    pub fn rows(&self) -> usize {
        match self {
            GateKind::RangeCheck0 { .. } => 1,
            GateKind::RangeCheck1 => 2,
        }
    }
}

/// Emitters for the range-check custom gates.
///
/// Every call appends exactly one gate. Inputs may be constants or variables;
/// a gate over constants only checks them immediately.
pub trait RangeCheckGates<F: PrimeField> {
    /// Constraint system new witnesses are allocated in.
    fn cs(&self) -> ConstraintSystemRef<F>;

    /// `v0 = Σ limbs[i]·2^(76−12i) + Σ crumbs[j]·2^(14−2j)`, with crumbs in
    /// `[0, 4)` and `limbs[2..]` in `[0, 2^12)`.
    fn range_check0(
        &mut self,
        v0: &FpVar<F>,
        limbs: &[FpVar<F>; 6],
        crumbs: &[FpVar<F>; 8],
        compact: bool,
    ) -> Result<(), SynthesisError>;

    /// Decomposition of `v2` over `curr` and the crumbs of `next`, lookups on
    /// the four deferred limbs in `next[3..7]`, and the packing relation on `v12`.
    fn range_check1(
        &mut self,
        v2: &FpVar<F>,
        v12: &FpVar<F>,
        curr: &[FpVar<F>; 13],
        next: &[FpVar<F>; 15],
    ) -> Result<(), SynthesisError>;
}

/// `RangeCheck0`/`RangeCheck1` realised as R1CS constraints.
///
/// Crumbs are bounded by `c·(c−1)·(c−2)·(c−3) = 0`, lookups by a 12-bit
/// boolean decomposition. The emitted gates are logged in order so callers can
/// inspect the row layout.
pub struct R1csRangeGates<F: PrimeField> {
    cs: ConstraintSystemRef<F>,
    gates: Vec<GateKind>,
    /// Value of the previous row when it was a compact `RangeCheck0`.
    compact_low: Option<FpVar<F>>,
}

impl<F: PrimeField> R1csRangeGates<F> {
    pub fn new(cs: ConstraintSystemRef<F>) -> Self {
        Self {
            cs,
            gates: Vec::new(),
            compact_low: None,
        }
    }

    /// Gates emitted so far, in order.
    pub fn gates(&self) -> &[GateKind] {
        &self.gates
    }

    /// Total number of rows used by the emitted gates.
    pub fn num_rows(&self) -> usize {
        self.gates.iter().map(GateKind::rows).sum()
    }

    fn push(&mut self, gate: GateKind) {
        tracing::trace!(row = self.num_rows(), ?gate, "emit range-check gate");
        self.gates.push(gate);
    }
}

impl<F: PrimeField> RangeCheckGates<F> for R1csRangeGates<F> {
    fn cs(&self) -> ConstraintSystemRef<F> {
        self.cs.clone()
    }

    fn range_check0(
        &mut self,
        v0: &FpVar<F>,
        limbs: &[FpVar<F>; 6],
        crumbs: &[FpVar<F>; 8],
        compact: bool,
    ) -> Result<(), SynthesisError> {
        for crumb in crumbs {
            enforce_crumb(crumb)?;
        }
        // limbs[0] and limbs[1] are copy cells, looked up by a later RangeCheck1
        for limb in &limbs[2..] {
            enforce_lookup12(limb)?;
        }

        let terms = limbs
            .iter()
            .zip(RC0_LIMB_SHIFTS)
            .chain(crumbs.iter().zip(RC0_CRUMB_SHIFTS));
        weighted_sum(terms).enforce_equal(v0)?;

        self.compact_low = compact.then(|| v0.clone());
        self.push(GateKind::RangeCheck0 { compact });
        Ok(())
    }

    fn range_check1(
        &mut self,
        v2: &FpVar<F>,
        v12: &FpVar<F>,
        curr: &[FpVar<F>; 13],
        next: &[FpVar<F>; 15],
    ) -> Result<(), SynthesisError> {
        for (i, cell) in curr.iter().enumerate() {
            if RC1_CURR_LOOKUPS.contains(&i) {
                enforce_lookup12(cell)?;
            } else {
                enforce_crumb(cell)?;
            }
        }
        for &(i, _) in &RC1_NEXT_CRUMB_SHIFTS {
            enforce_crumb(&next[i])?;
        }
        for deferred in &next[RC1_NEXT_LOOKUPS] {
            enforce_lookup12(deferred)?;
        }

        let terms = curr.iter().zip(RC1_CURR_SHIFTS).chain(
            RC1_NEXT_CRUMB_SHIFTS
                .iter()
                .map(move |&(i, shift)| (&next[i], shift)),
        );
        weighted_sum(terms).enforce_equal(v2)?;

        match self.compact_low.take() {
            Some(low) => {
                let packed = low + v2 * pow2::<F>(COMPACT_SHIFT);
                packed.enforce_equal(v12)?;
            }
            None => v12.enforce_equal(&FpVar::zero())?,
        }

        self.push(GateKind::RangeCheck1);
        Ok(())
    }
}

/// `2^k` as a field element.
pub(crate) fn pow2<F: PrimeField>(k: u32) -> F {
    F::from(BigUint::one() << k)
}

fn weighted_sum<'a, F: PrimeField>(
    terms: impl Iterator<Item = (&'a FpVar<F>, u32)>,
) -> FpVar<F> {
    terms.fold(FpVar::zero(), |acc, (cell, shift)| {
        acc + cell * pow2::<F>(shift)
    })
}

/// `c ∈ {0, 1, 2, 3}`
fn enforce_crumb<F: PrimeField>(c: &FpVar<F>) -> Result<(), SynthesisError> {
    let low = c * (c - F::one());
    let high = (c - F::from(2u64)) * (c - F::from(3u64));
    (low * high).enforce_equal(&FpVar::zero())
}

/// `limb ∈ [0, 2^12)`
///
/// Stands in for a table lookup: allocate only the 12 bits we need and
/// reconstruct the limb from them.
fn enforce_lookup12<F: PrimeField>(limb: &FpVar<F>) -> Result<(), SynthesisError> {
    match limb {
        FpVar::Constant(c) => {
            if to_biguint(c).bits() > LIMB_BITS as u64 {
                return Err(SynthesisError::Unsatisfiable);
            }
            Ok(())
        }
        FpVar::Var(_) => {
            let cs = limb.cs();
            let bits = (0..LIMB_BITS)
                .map(|i| {
                    Boolean::new_witness(cs.clone(), || {
                        Ok(limb.value()?.into_bigint().get_bit(i))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            Boolean::le_bits_to_fp_var(&bits)?.enforce_equal(limb)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bn254::Fr;
    use ark_r1cs_std::alloc::AllocVar;
    use ark_relations::r1cs::ConstraintSystem;

    fn witness(cs: &ConstraintSystemRef<Fr>, v: u64) -> FpVar<Fr> {
        FpVar::new_witness(cs.clone(), || Ok(Fr::from(v))).unwrap()
    }

    #[test]
    fn test_crumb_valid_and_invalid() {
        for v in 0..4u64 {
            let cs = ConstraintSystem::<Fr>::new_ref();
            enforce_crumb(&witness(&cs, v)).unwrap();
            assert!(cs.is_satisfied().unwrap(), "crumb {} rejected", v);
        }

        let cs = ConstraintSystem::<Fr>::new_ref();
        enforce_crumb(&witness(&cs, 4)).unwrap();
        assert!(!cs.is_satisfied().unwrap());
    }

    #[test]
    fn test_lookup12_bounds() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        enforce_lookup12(&witness(&cs, 4095)).unwrap();
        assert!(cs.is_satisfied().unwrap());

        let cs = ConstraintSystem::<Fr>::new_ref();
        enforce_lookup12(&witness(&cs, 4096)).unwrap();
        assert!(!cs.is_satisfied().unwrap());

        assert!(enforce_lookup12(&FpVar::constant(Fr::from(4096u64))).is_err());
        assert!(enforce_lookup12(&FpVar::constant(Fr::from(7u64))).is_ok());
    }

    #[test]
    fn test_range_check0_row() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let mut gates = R1csRangeGates::new(cs.clone());

        // v0 = 5·2^16 + 3·2^0
        let v0 = witness(&cs, (5 << 16) + 3);
        let zero = FpVar::zero();
        let limbs = [
            zero.clone(),
            zero.clone(),
            zero.clone(),
            zero.clone(),
            zero.clone(),
            witness(&cs, 5),
        ];
        let mut crumbs: [FpVar<Fr>; 8] = std::array::from_fn(|_| FpVar::zero());
        crumbs[7] = witness(&cs, 3);

        gates.range_check0(&v0, &limbs, &crumbs, false).unwrap();

        assert!(cs.is_satisfied().unwrap());
        assert_eq!(gates.gates(), &[GateKind::RangeCheck0 { compact: false }]);
        assert_eq!(gates.num_rows(), 1);
    }

    #[test]
    fn test_range_check0_wrong_decomposition() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let mut gates = R1csRangeGates::new(cs.clone());

        let v0 = witness(&cs, 100);
        let limbs: [FpVar<Fr>; 6] = std::array::from_fn(|_| FpVar::zero());
        let crumbs: [FpVar<Fr>; 8] = std::array::from_fn(|_| witness(&cs, 1));

        gates.range_check0(&v0, &limbs, &crumbs, false).unwrap();

        assert!(!cs.is_satisfied().unwrap());
    }

    #[test]
    fn test_range_check1_requires_zero_v12_without_compact_row() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let mut gates = R1csRangeGates::new(cs.clone());

        let v2 = witness(&cs, 2);
        let v12 = witness(&cs, 1);
        let curr: [FpVar<Fr>; 13] = std::array::from_fn(|_| FpVar::zero());
        let mut next: [FpVar<Fr>; 15] = std::array::from_fn(|_| FpVar::zero());
        next[14] = witness(&cs, 2);

        gates.range_check1(&v2, &v12, &curr, &next).unwrap();

        assert!(!cs.is_satisfied().unwrap());
        assert_eq!(gates.num_rows(), 2);
    }
}
