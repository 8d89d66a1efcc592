//! Range check gadgets built on the `RangeCheck0`/`RangeCheck1` gates.
//!
//! Without range checks a field value can wrap around the modulus and look like
//! any integer. These gadgets bound values to 64 or 88 bits by decomposing them
//! into 12-bit limbs and 2-bit crumbs and binding the decomposition with a
//! single gate per value.
//!
//! Three 88-bit values share one `RangeCheck1`: each of the first two leaves
//! its two top limbs unchecked in its `RangeCheck0` row, and the `RangeCheck1`
//! that decomposes the third value looks those four limbs up in its second row.

use ark_ff::PrimeField;
use ark_r1cs_std::{fields::fp::FpVar, prelude::*};
use num_bigint::BigUint;

use crate::bits::bit_slice;
use crate::error::GadgetError;
use crate::field::{exists, to_biguint, value_biguint};
use crate::gates::RangeCheckGates;

/// Bound enforced by [`range_check64`]
pub const BITS_64: u32 = 64;
/// Bound enforced on each value by [`multi_range_check`]
pub const LIMB_BITS_88: u32 = 88;
/// Bound on the packed input of [`compact_multi_range_check`]
pub const PACKED_BITS: u32 = 2 * LIMB_BITS_88;

const CRUMBS_0_16: [u64; 8] = [0, 2, 4, 6, 8, 10, 12, 14];

/// The two top 12-bit limbs (bits 64-76 and 76-88) of an 88-bit value whose
/// lookups are still owed by a `RangeCheck1`.
#[derive(Clone, Debug)]
pub struct HighLimbs<F: PrimeField> {
    pub l64: FpVar<F>,
    pub l76: FpVar<F>,
}

/// Enforce `x ∈ [0, 2^64)`.
///
/// Returns the 12-bit limbs of bits 16-64 in descending order
/// `[x52, x40, x28, x16]`, so callers can reuse them.
pub fn range_check64<F, G>(gates: &mut G, x: &FpVar<F>) -> Result<[FpVar<F>; 4], GadgetError>
where
    F: PrimeField,
    G: RangeCheckGates<F>,
{
    match x {
        FpVar::Constant(c) => {
            let xx = to_biguint(c);
            if xx.bits() > u64::from(BITS_64) {
                return Err(GadgetError::range(BITS_64, [xx]));
            }
            Ok([52, 40, 28, 16].map(|start| FpVar::constant(F::from(bit_slice(&xx, start, 12)))))
        }
        FpVar::Var(_) => {
            let cs = gates.cs();

            let [x0, x2, x4, x6, x8, x10, x12, x14] = exists(cs.clone(), || {
                let xx = value_biguint(x)?;
                Ok(CRUMBS_0_16.map(|i| bit_slice(&xx, i, 2)))
            })?;
            let [x16, x28, x40, x52] = exists(cs, || {
                let xx = value_biguint(x)?;
                Ok([16, 28, 40, 52].map(|i| bit_slice(&xx, i, 12)))
            })?;

            // the two top limb slots are unused for 64-bit values
            let zero = FpVar::zero();
            gates.range_check0(
                x,
                &[zero.clone(), zero, x52.clone(), x40.clone(), x28.clone(), x16.clone()],
                &[x14, x12, x10, x8, x6, x4, x2, x0],
                false,
            )?;

            Ok([x52, x40, x28, x16])
        }
    }
}

/// Enforce `x, y, z ∈ [0, 2^88)`.
pub fn multi_range_check<F, G>(gates: &mut G, values: [&FpVar<F>; 3]) -> Result<(), GadgetError>
where
    F: PrimeField,
    G: RangeCheckGates<F>,
{
    let [x, y, z] = values;
    if let (FpVar::Constant(x), FpVar::Constant(y), FpVar::Constant(z)) = (x, y, z) {
        let ints = [x, y, z].map(|c| to_biguint(c));
        if ints.iter().any(|v| v.bits() > u64::from(LIMB_BITS_88)) {
            return Err(GadgetError::range(LIMB_BITS_88, ints));
        }
        return Ok(());
    }

    let x_high = range_check0_helper(gates, x, false)?;
    let y_high = range_check0_helper(gates, y, false)?;
    range_check1_helper(gates, &x_high, &y_high, z, &FpVar::zero())
}

/// Enforce `xy < 2^176` and `z < 2^88`, where `xy = x + 2^88·y` packs two
/// 88-bit values.
///
/// Returns `[x, y, z]`. The packing relation is proven by the same
/// `RangeCheck1` that bounds `y`.
pub fn compact_multi_range_check<F, G>(
    gates: &mut G,
    xy: &FpVar<F>,
    z: &FpVar<F>,
) -> Result<[FpVar<F>; 3], GadgetError>
where
    F: PrimeField,
    G: RangeCheckGates<F>,
{
    if let (FpVar::Constant(packed), FpVar::Constant(zc)) = (xy, z) {
        let packed = to_biguint(packed);
        if packed.bits() > u64::from(PACKED_BITS) {
            return Err(GadgetError::range(PACKED_BITS, [packed]));
        }
        let zz = to_biguint(zc);
        if zz.bits() > u64::from(LIMB_BITS_88) {
            return Err(GadgetError::range(LIMB_BITS_88, [zz]));
        }
        let x = bit_slice(&packed, 0, u64::from(LIMB_BITS_88));
        let y: BigUint = packed >> LIMB_BITS_88;
        return Ok([
            FpVar::constant(F::from(x)),
            FpVar::constant(F::from(y)),
            z.clone(),
        ]);
    }

    let [x, y] = exists(gates.cs(), || {
        let packed = value_biguint(xy)?;
        let low = bit_slice(&packed, 0, u64::from(LIMB_BITS_88));
        Ok([low, packed >> LIMB_BITS_88])
    })?;

    let z_high = range_check0_helper(gates, z, false)?;
    let x_high = range_check0_helper(gates, &x, true)?;
    range_check1_helper(gates, &z_high, &x_high, &y, xy)?;

    Ok([x, y, z.clone()])
}

/// Decompose `x` into 8 crumbs (bits 0-16) and 6 limbs (bits 16-88) bound by
/// one `RangeCheck0`.
///
/// The returned top limbs are not yet range checked; pass them to
/// [`range_check1_helper`].
pub fn range_check0_helper<F, G>(
    gates: &mut G,
    x: &FpVar<F>,
    compact: bool,
) -> Result<HighLimbs<F>, GadgetError>
where
    F: PrimeField,
    G: RangeCheckGates<F>,
{
    let cs = gates.cs();

    let [x0, x2, x4, x6, x8, x10, x12, x14] = exists(cs.clone(), || {
        let xx = value_biguint(x)?;
        Ok(CRUMBS_0_16.map(|i| bit_slice(&xx, i, 2)))
    })?;
    let [x16, x28, x40, x52, x64, x76] = exists(cs, || {
        let xx = value_biguint(x)?;
        Ok([16, 28, 40, 52, 64, 76].map(|i| bit_slice(&xx, i, 12)))
    })?;

    gates.range_check0(
        x,
        &[x76.clone(), x64.clone(), x52, x40, x28, x16],
        &[x14, x12, x10, x8, x6, x4, x2, x0],
        compact,
    )?;

    Ok(HighLimbs { l64: x64, l76: x76 })
}

/// Range check `z` over 88 bits and finish the deferred limbs of `x` and `y`,
/// all in one `RangeCheck1`.
///
/// `yz` is bound by the packing relation of the gate: it must equal
/// `low + 2^88·z` when the previous row was a compact `RangeCheck0` over `low`,
/// and zero otherwise.
pub fn range_check1_helper<F, G>(
    gates: &mut G,
    x: &HighLimbs<F>,
    y: &HighLimbs<F>,
    z: &FpVar<F>,
    yz: &FpVar<F>,
) -> Result<(), GadgetError>
where
    F: PrimeField,
    G: RangeCheckGates<F>,
{
    let cs = gates.cs();

    let [z22, z24, z26, z28, z30, z32, z34, z36, z38, z50, z62, z74, z86] =
        exists(cs.clone(), || {
            let zz = value_biguint(z)?;
            Ok([
                (22, 2),
                (24, 2),
                (26, 2),
                (28, 2),
                (30, 2),
                (32, 2),
                (34, 2),
                (36, 2),
                (38, 12),
                (50, 12),
                (62, 12),
                (74, 12),
                (86, 2),
            ]
            .map(|(start, len)| bit_slice(&zz, start, len)))
        })?;
    let [z0, z2, z4, z6, z8, z10, z12, z14, z16, z18, z20] = exists(cs, || {
        let zz = value_biguint(z)?;
        Ok([0, 2, 4, 6, 8, 10, 12, 14, 16, 18, 20].map(|i| bit_slice(&zz, i, 2)))
    })?;

    gates.range_check1(
        z,
        yz,
        &[z86, z74, z62, z50, z38, z36, z34, z32, z30, z28, z26, z24, z22],
        &[
            z20,
            z18,
            z16,
            x.l76.clone(),
            x.l64.clone(),
            y.l76.clone(),
            y.l64.clone(),
            z14,
            z12,
            z10,
            z8,
            z6,
            z4,
            z2,
            z0,
        ],
    )?;
    Ok(())
}
