//! Low-node search.

/// Binary search over a strictly increasing sequence of length `len`, read
/// through `get`.
///
/// Returns the greatest index whose value is `<= target` (`None` when every
/// value is larger, or the sequence is empty) and whether that value equals
/// `target`.
pub fn bisect_unique<T, G>(target: &T, len: usize, get: G) -> (Option<usize>, bool)
where
    T: Ord,
    G: Fn(usize) -> T,
{
    if len == 0 || get(0) > *target {
        return (None, false);
    }

    let (mut lo, mut hi) = (0, len - 1);
    while lo < hi {
        // ceiling midpoint so `lo = mid` always makes progress
        let mid = lo + (hi - lo + 1) / 2;
        if get(mid) <= *target {
            lo = mid;
        } else {
            hi = mid - 1;
        }
    }

    (Some(lo), get(lo) == *target)
}
