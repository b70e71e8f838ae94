//! Evenly spread selection over a snapshot sequence.
//!
//! Overview plots show a handful of snapshots spread across the whole run.
//! [`spread_indices`] picks `num` indices `ceil(i * len / num)` for
//! `i = 0..num`; the first index is always 0.

/// Indices of `num` evenly spread elements of a sequence of length `len`.
///
/// `num` is clamped to `len`, so every returned index is valid and the
/// indices are strictly increasing.
pub fn spread_indices(len: usize, num: usize) -> Vec<usize> {
    let num = num.min(len);
    (0..num)
        .filter_map(|i| i.checked_mul(len)?.checked_add(num.checked_sub(1)?)?.checked_div(num))
        .collect()
}

/// References to `num` evenly spread elements of `sequence`.
pub fn take_spread<T>(sequence: &[T], num: usize) -> Vec<&T> {
    spread_indices(sequence.len(), num)
        .into_iter()
        .filter_map(|i| sequence.get(i))
        .collect()
}
