//! Property-based tests: parallel execution equals sequential execution.
//!
//! Values are integer-valued floats so that sums are exact whatever the chunking.

use std::cmp::Ordering;
use std::sync::Arc;

use proptest::prelude::*;
use rust_parallel_pipeline::execution::{split, ExecutionEngine, Operation, PipelineConfig, PipelineOutput};
use rust_parallel_pipeline::processing::AggregateKind;
use rust_parallel_pipeline::types::Record;

const CATEGORIES: [&str; 4] = ["alpha", "beta", "gamma", "delta"];

fn arbitrary_records() -> impl Strategy<Value = Vec<Record>> {
    prop::collection::vec((0..CATEGORIES.len(), -1_000i32..1_000), 0..120).prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (category, value))| {
                let id = i as i64 + 1;
                Record::new(id, format!("record_{id}"), CATEGORIES[category], f64::from(value))
            })
            .collect()
    })
}

fn by_value_desc(a: &Record, b: &Record) -> Ordering {
    b.value.total_cmp(&a.value)
}

fn operations(k: usize) -> Vec<Operation> {
    vec![
        Operation::filter(|r| r.value >= 0.0),
        Operation::map(|r| Record::new(r.id, r.label.clone(), r.category.clone(), r.value * 2.0)),
        Operation::reduce(0.0, |a, b| a + b),
        Operation::reduce(f64::NEG_INFINITY, f64::max),
        Operation::group_aggregate(|r| r.category.clone(), AggregateKind::Count),
        Operation::group_aggregate(|r| r.category.clone(), AggregateKind::Sum),
        Operation::group_aggregate(|r| r.category.clone(), AggregateKind::Mean),
        Operation::group_aggregate(|r| r.category.clone(), AggregateKind::Min),
        Operation::group_aggregate(|r| r.category.clone(), AggregateKind::Max),
        Operation::partition(|r| r.category == "alpha"),
        Operation::top_k(k, by_value_desc),
        Operation::any_match(|r| r.value > 990.0),
        Operation::all_match(|r| r.value > -990.0),
        Operation::none_match(|r| r.value == 0.0),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Every deterministic operation gives the same answer in both modes, for any parallelism.
    #[test]
    fn parallel_equals_sequential(
        rows in arbitrary_records(),
        parallelism in 1usize..16,
        k in 0usize..150,
    ) {
        let records: Arc<[Record]> = rows.into();
        let engine = ExecutionEngine::with_parallelism(4).unwrap();
        let sequential = PipelineConfig::sequential();
        let parallel = PipelineConfig::parallel().with_parallelism(parallelism);

        for operation in operations(k) {
            let kind = operation.kind();
            let expected = engine.run(&records, operation.clone(), &sequential).unwrap();
            let actual = engine.run(&records, operation, &parallel).unwrap();
            prop_assert_eq!(actual, expected, "operation {} with parallelism {}", kind, parallelism);
        }
    }

    /// Statistics agree on every field; min/max fail the same way on empty input.
    #[test]
    fn statistics_agree(rows in arbitrary_records(), parallelism in 1usize..16) {
        let records: Arc<[Record]> = rows.into();
        let engine = ExecutionEngine::with_parallelism(3).unwrap();

        let seq = engine
            .run(&records, Operation::statistics(|r| r.value), &PipelineConfig::sequential())
            .unwrap();
        let par = engine
            .run(&records, Operation::statistics(|r| r.value), &PipelineConfig::parallel().with_parallelism(parallelism))
            .unwrap();
        let (seq, par) = (seq.as_statistics().unwrap(), par.as_statistics().unwrap());

        prop_assert_eq!(par.count(), seq.count());
        prop_assert_eq!(par.sum(), seq.sum());
        prop_assert_eq!(par.mean(), seq.mean());
        prop_assert_eq!(par.min().ok(), seq.min().ok());
        prop_assert_eq!(par.max().ok(), seq.max().ok());
        if seq.count() > 0 {
            prop_assert_eq!(par.mean(), seq.sum() / seq.count() as f64);
        }
    }

    /// Top-K equals sort-then-limit with ties broken by original position.
    #[test]
    fn top_k_is_stable_sort_then_limit(
        rows in arbitrary_records(),
        parallelism in 1usize..16,
        k in 0usize..150,
    ) {
        let mut sorted = rows.clone();
        sorted.sort_by(by_value_desc);
        sorted.truncate(k);

        let records: Arc<[Record]> = rows.into();
        let engine = ExecutionEngine::with_parallelism(4).unwrap();
        let out = engine
            .run(&records, Operation::top_k(k, by_value_desc), &PipelineConfig::parallel().with_parallelism(parallelism))
            .unwrap();
        prop_assert_eq!(out, PipelineOutput::Records(sorted));
    }

    /// Chunks partition the input exactly, in order, with sizes differing by at most one.
    #[test]
    fn chunks_partition_the_input(len in 0usize..500, parallelism in 1usize..64) {
        let chunks = split(len, parallelism).unwrap();
        prop_assert!(chunks.len() <= parallelism);
        prop_assert_eq!(chunks.iter().map(|c| c.len()).sum::<usize>(), len);
        for pair in chunks.windows(2) {
            prop_assert_eq!(pair[0].end, pair[1].start);
            prop_assert!(pair[0].len().abs_diff(pair[1].len()) <= 1);
        }
        prop_assert!(chunks.iter().all(|c| !c.is_empty()));
    }
}
