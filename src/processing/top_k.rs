//! Distributed top-K selection.
//!
//! Every chunk emits its full local top-K (`min(k, chunk len)` candidates, each tagged with its
//! original index). The merge re-sorts the union of all candidates and keeps the first `k`.
//! Candidates are never dropped before the final merge. Ties under the comparator are broken by
//! original index ascending, which makes the result independent of chunking.

use std::cmp::Ordering;

/// A top-K candidate tagged with its position in the original sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate<T> {
    /// Original index of `item`.
    pub index: usize,
    /// The candidate element.
    pub item: T,
}

fn order_candidates<T, C>(compare: &mut C, a: &Candidate<T>, b: &Candidate<T>) -> Ordering
where
    C: FnMut(&T, &T) -> Ordering,
{
    compare(&a.item, &b.item).then_with(|| a.index.cmp(&b.index))
}

fn select_first_k<T, C>(mut candidates: Vec<Candidate<T>>, k: usize, compare: &mut C) -> Vec<Candidate<T>>
where
    C: FnMut(&T, &T) -> Ordering,
{
    if k == 0 {
        return Vec::new();
    }
    if candidates.len() > k {
        candidates.select_nth_unstable_by(k - 1, |a, b| order_candidates(compare, a, b));
        candidates.truncate(k);
    }
    candidates.sort_by(|a, b| order_candidates(compare, a, b));
    candidates
}

/// Chunk-local top-K.
///
/// `offset` is the original index of `records[0]`. Elements ordered first by `compare` are
/// ranked highest, so pass a reversed comparator for "largest first".
pub fn top_k_candidates<T, C>(records: &[T], offset: usize, k: usize, mut compare: C) -> Vec<Candidate<T>>
where
    T: Clone,
    C: FnMut(&T, &T) -> Ordering,
{
    if k == 0 {
        return Vec::new();
    }
    // Select on references so only the surviving candidates are cloned.
    let mut refs: Vec<Candidate<&T>> = records
        .iter()
        .enumerate()
        .map(|(i, item)| Candidate {
            index: offset + i,
            item,
        })
        .collect();
    let mut compare_refs = |a: &&T, b: &&T| compare(a, b);
    refs = select_first_k(refs, k, &mut compare_refs);
    refs.into_iter()
        .map(|c| Candidate {
            index: c.index,
            item: c.item.clone(),
        })
        .collect()
}

/// Merge chunk-local candidates into the global top-K.
pub fn merge_top_k<T, C>(partials: impl IntoIterator<Item = Vec<Candidate<T>>>, k: usize, mut compare: C) -> Vec<T>
where
    C: FnMut(&T, &T) -> Ordering,
{
    let union: Vec<Candidate<T>> = partials.into_iter().flatten().collect();
    select_first_k(union, k, &mut compare)
        .into_iter()
        .map(|c| c.item)
        .collect()
}

/// Sequential top-K: sort by `compare` (ties by position) and keep the first `k`.
pub fn top_k<T, C>(records: &[T], k: usize, mut compare: C) -> Vec<T>
where
    T: Clone,
    C: FnMut(&T, &T) -> Ordering,
{
    let candidates = top_k_candidates(records, 0, k, &mut compare);
    candidates.into_iter().map(|c| c.item).collect()
}
