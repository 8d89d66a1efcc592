//! Integer bit extraction used by every limb decomposition.

use num_bigint::BigUint;
use num_traits::One;

/// Return the `length`-bit unsigned integer starting at bit `start` of `x`.
///
/// Bits above the significant range of `x` read as zero, so any
/// `(start, length)` pair is valid.
pub fn bit_slice(x: &BigUint, start: u64, length: u64) -> BigUint {
    let mask = (BigUint::one() << length) - BigUint::one();
    (x >> start) & mask
}
