//! Reduction with a caller-supplied identity and associative combine function.

/// Fold `records` into a single value.
///
/// Each element is lifted with `value` and folded left to right, starting from `identity`.
/// For chunked execution `combine` must be associative and `identity` must be its neutral
/// element; otherwise parallel and sequential results differ.
pub fn reduce<T, A, V, C>(records: &[T], identity: A, mut value: V, mut combine: C) -> A
where
    V: FnMut(&T) -> A,
    C: FnMut(A, A) -> A,
{
    records
        .iter()
        .fold(identity, |acc, record| combine(acc, value(record)))
}

/// Merge per-chunk reductions, left to right in chunk order.
///
/// With no partials (empty input) this returns `identity`.
pub fn merge_reduced<A, C>(identity: A, partials: impl IntoIterator<Item = A>, combine: C) -> A
where
    C: FnMut(A, A) -> A,
{
    partials.into_iter().fold(identity, combine)
}
