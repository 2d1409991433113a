use std::collections::BTreeMap;
use std::sync::Arc;

use rust_parallel_pipeline::execution::{
    split, ExecutionEngine, Operation, PipelineConfig, PipelineOutput, WorkerPool,
};
use rust_parallel_pipeline::processing::{AggregateKind, Statistics};
use rust_parallel_pipeline::types::{Chunk, Record, Value};
use rust_parallel_pipeline::PipelineError;

fn seven_records() -> Arc<[Record]> {
    (1..=7)
        .map(|i| Record::new(i, format!("record_{i}"), if i <= 4 { "low" } else { "high" }, i as f64))
        .collect()
}

fn engine(parallelism: usize) -> ExecutionEngine {
    ExecutionEngine::with_parallelism(parallelism).unwrap()
}

#[test]
fn seven_values_three_chunks() {
    assert_eq!(
        split(7, 3).unwrap(),
        vec![Chunk::new(0, 0, 3), Chunk::new(1, 3, 5), Chunk::new(2, 5, 7)]
    );

    let engine = engine(3);
    let records = seven_records();
    let config = PipelineConfig::parallel().with_parallelism(3);

    let sum = engine
        .run(&records, Operation::reduce(0.0, |a, b| a + b), &config)
        .unwrap();
    assert_eq!(sum.as_scalar(), Some(28.0));

    let top = engine
        .run(&records, Operation::top_k(2, |a, b| b.value.total_cmp(&a.value)), &config)
        .unwrap()
        .into_records()
        .unwrap();
    assert_eq!(top.iter().map(|r| r.id).collect::<Vec<_>>(), vec![7, 6]);

    let metrics = engine.metrics().snapshot();
    assert_eq!(metrics.chunks_started, 3);
    assert_eq!(metrics.rows_processed, 7);
}

#[test]
fn empty_input_statistics() {
    let engine = engine(4);
    let records: Arc<[Record]> = Arc::from(Vec::new());

    for config in [PipelineConfig::sequential(), PipelineConfig::parallel()] {
        let out = engine
            .run(&records, Operation::statistics(|r| r.value), &config)
            .unwrap();
        let stats = out.as_statistics().unwrap();
        assert_eq!(stats.count(), 0);
        assert_eq!(stats.sum(), 0.0);
        assert_eq!(stats.mean(), 0.0);
        assert!(matches!(stats.min(), Err(PipelineError::EmptyAggregate { .. })));
        assert!(matches!(stats.max(), Err(PipelineError::EmptyAggregate { .. })));
    }
}

#[test]
fn empty_input_identities() {
    let engine = engine(2);
    let records: Arc<[Record]> = Arc::from(Vec::new());
    let config = PipelineConfig::parallel();

    let product = engine
        .run(&records, Operation::reduce(1.0, |a, b| a * b), &config)
        .unwrap();
    assert_eq!(product, PipelineOutput::Scalar(1.0));

    assert_eq!(engine.run(&records, Operation::any_match(|_| true), &config).unwrap(), PipelineOutput::Bool(false));
    assert_eq!(engine.run(&records, Operation::all_match(|_| false), &config).unwrap(), PipelineOutput::Bool(true));
    assert_eq!(engine.run(&records, Operation::none_match(|_| true), &config).unwrap(), PipelineOutput::Bool(true));

    let groups = engine
        .run(&records, Operation::group_aggregate(|r| r.category.clone(), AggregateKind::Sum), &config)
        .unwrap();
    assert_eq!(groups, PipelineOutput::Groups(BTreeMap::new()));
}

#[test]
fn zero_parallelism_is_invalid_configuration() {
    assert!(matches!(
        WorkerPool::new(0),
        Err(PipelineError::InvalidConfiguration { .. })
    ));
    assert!(matches!(split(5, 0), Err(PipelineError::InvalidConfiguration { .. })));

    let engine = engine(2);
    let config = PipelineConfig::parallel().with_parallelism(0);
    assert!(matches!(
        engine.run(&seven_records(), Operation::statistics(|r| r.value), &config),
        Err(PipelineError::InvalidConfiguration { .. })
    ));
}

#[test]
fn group_mean_is_weighted_not_average_of_averages() {
    // Chunks [1,2,3] [4,5] [6,7]: averaging per-chunk means would give low=3.0, high=5.75.
    let engine = engine(3);
    let config = PipelineConfig::parallel().with_parallelism(3);
    let groups = engine
        .run(&seven_records(), Operation::group_aggregate(|r| r.category.clone(), AggregateKind::Mean), &config)
        .unwrap()
        .into_groups()
        .unwrap();

    assert_eq!(groups["low"], Value::Float64(2.5));
    assert_eq!(groups["high"], Value::Float64(6.0));

    let counts = engine
        .run(&seven_records(), Operation::group_aggregate(|r| r.category.clone(), AggregateKind::Count), &config)
        .unwrap()
        .into_groups()
        .unwrap();
    assert_eq!(counts["low"], Value::Int64(4));
    assert_eq!(counts["high"], Value::Int64(3));
}

#[test]
fn partition_keeps_original_order_on_both_sides() {
    let engine = engine(3);
    let parts = engine
        .run(&seven_records(), Operation::partition(|r| r.id % 2 == 0), &PipelineConfig::parallel())
        .unwrap()
        .into_partitions()
        .unwrap();

    assert_eq!(parts.matching.iter().map(|r| r.id).collect::<Vec<_>>(), vec![2, 4, 6]);
    assert_eq!(parts.rest.iter().map(|r| r.id).collect::<Vec<_>>(), vec![1, 3, 5, 7]);
}

#[test]
fn top_k_ties_keep_original_position() {
    let records: Arc<[Record]> = [(1, 5.0), (2, 9.0), (3, 5.0), (4, 9.0), (5, 5.0)]
        .into_iter()
        .map(|(id, v)| Record::new(id, format!("record_{id}"), "c", v))
        .collect();
    let engine = engine(3);
    let config = PipelineConfig::parallel().with_parallelism(3);

    let top = engine
        .top_k(&records, 3, |a: &Record, b: &Record| b.value.total_cmp(&a.value), &config)
        .unwrap();
    assert_eq!(top.iter().map(|r| r.id).collect::<Vec<_>>(), vec![2, 4, 1]);

    let all = engine
        .top_k(&records, 10, |a: &Record, b: &Record| a.value.total_cmp(&b.value), &config)
        .unwrap();
    assert_eq!(all.iter().map(|r| r.id).collect::<Vec<_>>(), vec![1, 3, 5, 2, 4]);

    assert!(engine.top_k(&records, 0, |a: &Record, b: &Record| a.value.total_cmp(&b.value), &config).unwrap().is_empty());
}

#[test]
fn statistics_match_a_single_pass() {
    let engine = engine(3);
    let parallel = engine
        .statistics(&seven_records(), |r: &Record| r.value, &PipelineConfig::parallel())
        .unwrap();

    let mut expected = Statistics::new();
    for v in 1..=7 {
        expected.accept(v as f64);
    }
    assert_eq!(parallel.count(), expected.count());
    assert_eq!(parallel.sum(), 28.0);
    assert_eq!(parallel.mean(), 4.0);
    assert_eq!(parallel.min().unwrap(), 1.0);
    assert_eq!(parallel.max().unwrap(), 7.0);
}

#[test]
fn shutdown_after_work_rejects_new_runs() {
    let pool = Arc::new(WorkerPool::new(2).unwrap());
    let engine = ExecutionEngine::new(Arc::clone(&pool));
    let config = PipelineConfig::parallel();

    engine
        .run(&seven_records(), Operation::filter(|r| r.value > 3.0), &config)
        .unwrap();
    pool.shutdown().unwrap();

    assert!(matches!(
        engine.run(&seven_records(), Operation::filter(|r| r.value > 3.0), &config),
        Err(PipelineError::PoolClosed)
    ));
    // Sequential runs never touch the pool.
    assert!(engine
        .run(&seven_records(), Operation::filter(|r| r.value > 3.0), &PipelineConfig::sequential())
        .is_ok());
}
