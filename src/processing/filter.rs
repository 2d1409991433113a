//! Record filtering.

/// Returns the elements of `records` for which `predicate` returns `true`, in input order.
///
/// This is both the per-chunk computation and the sequential reference; partial outputs are
/// merged with [`super::concat_partials`].
pub fn filter<T, F>(records: &[T], mut predicate: F) -> Vec<T>
where
    T: Clone,
    F: FnMut(&T) -> bool,
{
    records.iter().filter(|r| predicate(r)).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::filter;
    use crate::processing::concat_partials;
    use crate::types::Record;

    fn sample_records() -> Vec<Record> {
        vec![
            Record::new(1, "a", "north", 10.0),
            Record::new(2, "b", "south", 60.0),
            Record::new(3, "c", "north", 75.0),
        ]
    }

    #[test]
    fn filter_by_numeric_predicate() {
        let records = sample_records();
        let out = filter(&records, |r| r.value > 50.0);

        assert_eq!(out.len(), 2);
        assert_eq!(out.iter().map(|r| r.id).collect::<Vec<_>>(), vec![2, 3]);
        // Original unchanged
        assert_eq!(records.len(), 3);
    }

    #[test]
    fn filter_can_return_empty() {
        let records = sample_records();
        assert!(filter(&records, |_| false).is_empty());
        assert!(filter::<Record, _>(&[], |_| true).is_empty());
    }

    #[test]
    fn chunked_filter_concatenates_in_chunk_order() {
        let records = sample_records();
        let partials = vec![
            filter(&records[..1], |r| r.category == "north"),
            filter(&records[1..], |r| r.category == "north"),
        ];
        let merged = concat_partials(partials);
        assert_eq!(merged, filter(&records, |r| r.category == "north"));
    }
}
