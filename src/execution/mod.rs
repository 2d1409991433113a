//! Execution engine for running record pipelines sequentially or in parallel.
//!
//! This module sits "above" [`crate::processing`] and provides:
//!
//! - Chunked execution of every operation on a shared [`WorkerPool`]
//! - Deterministic, chunk-ordered merging of partial results
//! - Short-circuiting for any / all / none match
//! - Real-time metrics + observer hooks for monitoring
//!
//! Sequential mode runs the same kernel over the whole input as a single chunk on the calling
//! thread, so both modes share one code path up to the merge.

mod cancel;
mod chunker;
mod observer;
mod operation;
mod pool;
mod tracker;

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt::Display;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, PipelineResult, TaskError};
use crate::processing::{
    check_chunk, concat_partials, filter, finish_groups, group_statistics, map, merge_groups,
    merge_partitions, merge_reduced, merge_statistics, merge_top_k, merge_verdicts, partition,
    reduce, statistics, top_k_candidates, try_map, AggregateKind, ChunkOutcome, ChunkVerdict,
    MatchKind, Partitioned, Statistics,
};
use crate::types::{Chunk, Record, Value};

pub use cancel::CancellationToken;
pub use chunker::split;
pub use observer::{
    ExecutionEvent, ExecutionMetrics, ExecutionMetricsSnapshot, ExecutionObserver, TracingObserver,
};
pub use operation::{
    Combine, Operation, OperationKind, PipelineOutput, RecordComparator, RecordKey, RecordPredicate,
    RecordTransform, RecordValue,
};
pub use pool::{default_parallelism, Settled, TaskHandle, WorkerPool};

use pool::guarded;

/// Where a pipeline call runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// On the calling thread, as a single chunk.
    Sequential,
    /// Split into chunks and run on the engine's worker pool.
    #[default]
    Parallel,
}

/// Per-call configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub mode: ExecutionMode,
    /// Target number of chunks. If `None`, uses the pool's parallelism.
    pub parallelism: Option<usize>,
}

impl PipelineConfig {
    pub fn sequential() -> Self {
        Self {
            mode: ExecutionMode::Sequential,
            parallelism: None,
        }
    }

    pub fn parallel() -> Self {
        Self {
            mode: ExecutionMode::Parallel,
            parallelism: None,
        }
    }

    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = Some(parallelism);
        self
    }

    /// Parse a configuration from JSON, e.g. `{"mode": "parallel", "parallelism": 4}`.
    ///
    /// Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> PipelineResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| PipelineError::invalid_config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject an explicit parallelism of zero, whatever the mode.
    pub fn validate(&self) -> PipelineResult<()> {
        if self.parallelism == Some(0) {
            return Err(PipelineError::invalid_config("parallelism must be >= 1"));
        }
        Ok(())
    }
}

/// Observer and metrics handles shared with every chunk task of a run.
#[derive(Clone)]
struct Hooks {
    observer: Option<Arc<dyn ExecutionObserver>>,
    metrics: Arc<ExecutionMetrics>,
}

impl Hooks {
    fn emit(&self, event: ExecutionEvent) {
        if let Some(obs) = &self.observer {
            obs.on_event(&event);
        }
    }

    fn chunk_started(&self, chunk: Chunk) {
        self.metrics.on_chunk_start();
        self.emit(ExecutionEvent::ChunkStarted {
            chunk: chunk.index,
            start_row: chunk.start,
            row_count: chunk.len(),
        });
    }

    fn chunk_ended(&self, chunk: Chunk, rows: usize, completed: bool) {
        self.metrics.on_chunk_end(rows, completed);
        self.emit(if completed {
            ExecutionEvent::ChunkFinished {
                chunk: chunk.index,
                rows_processed: rows,
            }
        } else {
            ExecutionEvent::ChunkCancelled {
                chunk: chunk.index,
                rows_processed: rows,
            }
        });
    }

    fn chunk_failed(&self, chunk: Chunk, error: &TaskError) {
        self.metrics.on_chunk_failed();
        self.emit(ExecutionEvent::ChunkFailed {
            chunk: chunk.index,
            error: error.to_string(),
        });
    }

    fn chunk_skipped(&self, chunk: Chunk) {
        self.metrics.on_chunk_skipped();
        self.emit(ExecutionEvent::ChunkCancelled {
            chunk: chunk.index,
            rows_processed: 0,
        });
    }
}

/// Run `kernel` over one chunk of `records`, reporting to `hooks`.
fn run_chunk<T, P, K>(hooks: &Hooks, records: &[T], chunk: Chunk, kernel: &K) -> Result<P, TaskError>
where
    K: Fn(&[T], Chunk) -> Result<P, TaskError>,
{
    hooks.chunk_started(chunk);
    match guarded(|| kernel(&records[chunk.range()], chunk)) {
        Ok(partial) => {
            hooks.chunk_ended(chunk, chunk.len(), true);
            Ok(partial)
        }
        Err(err) => {
            hooks.chunk_failed(chunk, &err);
            Err(err)
        }
    }
}

/// Evaluate a predicate check over one chunk unless the run is already decided.
fn run_check<T, F>(
    hooks: &Hooks,
    records: &[T],
    chunk: Chunk,
    kind: MatchKind,
    predicate: &F,
    token: &CancellationToken,
) -> Result<ChunkVerdict, TaskError>
where
    F: Fn(&T) -> bool,
{
    if token.is_cancelled() {
        hooks.chunk_skipped(chunk);
        return Ok(ChunkVerdict {
            outcome: ChunkOutcome::Cancelled,
            examined: 0,
        });
    }
    hooks.chunk_started(chunk);
    match guarded(|| Ok(check_chunk(&records[chunk.range()], kind, predicate, token))) {
        Ok(verdict) => {
            let completed = verdict.outcome != ChunkOutcome::Cancelled;
            hooks.chunk_ended(chunk, verdict.examined, completed);
            Ok(verdict)
        }
        Err(err) => {
            hooks.chunk_failed(chunk, &err);
            Err(err)
        }
    }
}

/// Runs record pipelines on a shared [`WorkerPool`].
///
/// The engine is cheap to share; independent calls may run concurrently on the same pool.
/// Metrics describe the most recent run started on this engine.
pub struct ExecutionEngine {
    pool: Arc<WorkerPool>,
    hooks: Hooks,
}

impl ExecutionEngine {
    /// Create an engine that submits chunk tasks to `pool`.
    pub fn new(pool: Arc<WorkerPool>) -> Self {
        Self {
            pool,
            hooks: Hooks {
                observer: None,
                metrics: Arc::new(ExecutionMetrics::new()),
            },
        }
    }

    /// Create an engine with a fresh pool of `parallelism` threads.
    pub fn with_parallelism(parallelism: usize) -> PipelineResult<Self> {
        Ok(Self::new(Arc::new(WorkerPool::new(parallelism)?)))
    }

    /// Attach an observer for execution events (metrics/logging).
    pub fn with_observer(mut self, observer: Arc<dyn ExecutionObserver>) -> Self {
        self.hooks.observer = Some(observer);
        self
    }

    /// Get a handle to real-time execution metrics.
    pub fn metrics(&self) -> Arc<ExecutionMetrics> {
        Arc::clone(&self.hooks.metrics)
    }

    pub fn pool(&self) -> &Arc<WorkerPool> {
        &self.pool
    }

    /// Run one [`Operation`] over `records`.
    ///
    /// Reduce, group-aggregate and statistics operate on `record.value` unless the operation
    /// carries its own extractor.
    pub fn run(
        &self,
        records: &Arc<[Record]>,
        operation: Operation,
        config: &PipelineConfig,
    ) -> PipelineResult<PipelineOutput> {
        match operation {
            Operation::Filter(predicate) => self
                .filter(records, move |r| predicate(r), config)
                .map(PipelineOutput::Records),
            Operation::Map(transform) => self
                .map(records, move |r| transform(r), config)
                .map(PipelineOutput::Records),
            Operation::Reduce { identity, combine } => self
                .reduce(records, identity, |r: &Record| r.value, move |a, b| combine(a, b), config)
                .map(PipelineOutput::Scalar),
            Operation::GroupAggregate { key, kind } => self
                .group_aggregate(records, move |r| key(r), |r: &Record| r.value, kind, config)
                .map(PipelineOutput::Groups),
            Operation::Partition(predicate) => self
                .partition(records, move |r| predicate(r), config)
                .map(PipelineOutput::Partitions),
            Operation::TopK { comparator, k } => self
                .top_k(records, k, move |a, b| comparator(a, b), config)
                .map(PipelineOutput::Records),
            Operation::Statistics(value) => self
                .statistics(records, move |r| value(r), config)
                .map(PipelineOutput::Statistics),
            Operation::AnyMatch(predicate) => self
                .any_match(records, move |r| predicate(r), config)
                .map(PipelineOutput::Bool),
            Operation::AllMatch(predicate) => self
                .all_match(records, move |r| predicate(r), config)
                .map(PipelineOutput::Bool),
            Operation::NoneMatch(predicate) => self
                .none_match(records, move |r| predicate(r), config)
                .map(PipelineOutput::Bool),
        }
    }

    /// Keep the elements satisfying `predicate`, in original order.
    pub fn filter<T, F>(&self, records: &Arc<[T]>, predicate: F, config: &PipelineConfig) -> PipelineResult<Vec<T>>
    where
        T: Clone + Send + Sync + 'static,
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.instrumented(OperationKind::Filter, config, records.len(), || {
            let partials = self.dispatch(records, config, move |chunk, _| Ok(filter(chunk, &predicate)))?;
            Ok(concat_partials(partials))
        })
    }

    /// Transform every element, preserving order.
    pub fn map<T, U, F>(&self, records: &Arc<[T]>, mapper: F, config: &PipelineConfig) -> PipelineResult<Vec<U>>
    where
        T: Send + Sync + 'static,
        U: Send + 'static,
        F: Fn(&T) -> U + Send + Sync + 'static,
    {
        self.instrumented(OperationKind::Map, config, records.len(), || {
            let partials = self.dispatch(records, config, move |chunk, _| Ok(map(chunk, &mapper)))?;
            Ok(concat_partials(partials))
        })
    }

    /// Fallible map. The first failure by chunk order fails the call with
    /// [`PipelineError::TaskFailure`].
    pub fn try_map<T, U, E, F>(&self, records: &Arc<[T]>, mapper: F, config: &PipelineConfig) -> PipelineResult<Vec<U>>
    where
        T: Send + Sync + 'static,
        U: Send + 'static,
        E: Display,
        F: Fn(&T) -> Result<U, E> + Send + Sync + 'static,
    {
        self.instrumented(OperationKind::TryMap, config, records.len(), || {
            let partials =
                self.dispatch(records, config, move |chunk, meta| try_map(chunk, meta.start, &mapper))?;
            Ok(concat_partials(partials))
        })
    }

    /// Fold every element with an associative `combine`; `identity` must be neutral for it.
    ///
    /// Chunk results are combined left to right in chunk order. Empty input yields `identity`.
    pub fn reduce<T, A, V, C>(
        &self,
        records: &Arc<[T]>,
        identity: A,
        value: V,
        combine: C,
        config: &PipelineConfig,
    ) -> PipelineResult<A>
    where
        T: Send + Sync + 'static,
        A: Clone + Send + Sync + 'static,
        V: Fn(&T) -> A + Send + Sync + 'static,
        C: Fn(A, A) -> A + Send + Sync + 'static,
    {
        self.instrumented(OperationKind::Reduce, config, records.len(), || {
            let combine = Arc::new(combine);
            let chunk_combine = Arc::clone(&combine);
            let chunk_identity = identity.clone();
            let partials = self.dispatch(records, config, move |chunk, _| {
                Ok(reduce(chunk, chunk_identity.clone(), &value, |a, b| chunk_combine(a, b)))
            })?;
            Ok(merge_reduced(identity, partials, |a, b| combine(a, b)))
        })
    }

    /// Group by `key` and summarize `value` per group.
    pub fn group_by<T, K, KF, VF>(
        &self,
        records: &Arc<[T]>,
        key: KF,
        value: VF,
        config: &PipelineConfig,
    ) -> PipelineResult<BTreeMap<K, Statistics>>
    where
        T: Send + Sync + 'static,
        K: Ord + Send + 'static,
        KF: Fn(&T) -> K + Send + Sync + 'static,
        VF: Fn(&T) -> f64 + Send + Sync + 'static,
    {
        self.instrumented(OperationKind::GroupAggregate, config, records.len(), || {
            self.group_partials(records, key, value, config).map(merge_groups)
        })
    }

    /// Group by `key` and reduce each group's `value` to `kind`.
    ///
    /// Min and max over a group are never empty, since every group has at least one member.
    pub fn group_aggregate<T, K, KF, VF>(
        &self,
        records: &Arc<[T]>,
        key: KF,
        value: VF,
        kind: AggregateKind,
        config: &PipelineConfig,
    ) -> PipelineResult<BTreeMap<K, Value>>
    where
        T: Send + Sync + 'static,
        K: Ord + Send + 'static,
        KF: Fn(&T) -> K + Send + Sync + 'static,
        VF: Fn(&T) -> f64 + Send + Sync + 'static,
    {
        self.instrumented(OperationKind::GroupAggregate, config, records.len(), || {
            let partials = self.group_partials(records, key, value, config)?;
            finish_groups(merge_groups(partials), kind)
        })
    }

    fn group_partials<T, K, KF, VF>(
        &self,
        records: &Arc<[T]>,
        key: KF,
        value: VF,
        config: &PipelineConfig,
    ) -> PipelineResult<Vec<BTreeMap<K, Statistics>>>
    where
        T: Send + Sync + 'static,
        K: Ord + Send + 'static,
        KF: Fn(&T) -> K + Send + Sync + 'static,
        VF: Fn(&T) -> f64 + Send + Sync + 'static,
    {
        self.dispatch(records, config, move |chunk, _| Ok(group_statistics(chunk, &key, &value)))
    }

    /// Split into (matching, rest), each in original order.
    pub fn partition<T, F>(
        &self,
        records: &Arc<[T]>,
        predicate: F,
        config: &PipelineConfig,
    ) -> PipelineResult<Partitioned<T>>
    where
        T: Clone + Send + Sync + 'static,
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.instrumented(OperationKind::Partition, config, records.len(), || {
            let partials = self.dispatch(records, config, move |chunk, _| Ok(partition(chunk, &predicate)))?;
            Ok(merge_partitions(partials))
        })
    }

    /// The first `k` elements under `comparator`; equal elements keep their original order.
    ///
    /// Returns everything, sorted, when `k` exceeds the input length.
    pub fn top_k<T, C>(&self, records: &Arc<[T]>, k: usize, comparator: C, config: &PipelineConfig) -> PipelineResult<Vec<T>>
    where
        T: Clone + Send + Sync + 'static,
        C: Fn(&T, &T) -> Ordering + Send + Sync + 'static,
    {
        self.instrumented(OperationKind::TopK, config, records.len(), || {
            let comparator = Arc::new(comparator);
            let chunk_comparator = Arc::clone(&comparator);
            let partials = self.dispatch(records, config, move |chunk, meta| {
                Ok(top_k_candidates(chunk, meta.start, k, |a, b| chunk_comparator(a, b)))
            })?;
            Ok(merge_top_k(partials, k, |a, b| comparator(a, b)))
        })
    }

    /// Count, sum, min, max and mean of `value` over every element.
    pub fn statistics<T, V>(&self, records: &Arc<[T]>, value: V, config: &PipelineConfig) -> PipelineResult<Statistics>
    where
        T: Send + Sync + 'static,
        V: Fn(&T) -> f64 + Send + Sync + 'static,
    {
        self.instrumented(OperationKind::Statistics, config, records.len(), || {
            let partials = self.dispatch(records, config, move |chunk, _| Ok(statistics(chunk, &value)))?;
            Ok(merge_statistics(partials))
        })
    }

    /// `true` if some element satisfies `predicate`; `false` for empty input.
    pub fn any_match<T, F>(&self, records: &Arc<[T]>, predicate: F, config: &PipelineConfig) -> PipelineResult<bool>
    where
        T: Send + Sync + 'static,
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.check(records, MatchKind::Any, predicate, config)
    }

    /// `true` if every element satisfies `predicate`; `true` for empty input.
    pub fn all_match<T, F>(&self, records: &Arc<[T]>, predicate: F, config: &PipelineConfig) -> PipelineResult<bool>
    where
        T: Send + Sync + 'static,
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.check(records, MatchKind::All, predicate, config)
    }

    /// `true` if no element satisfies `predicate`; `true` for empty input.
    pub fn none_match<T, F>(&self, records: &Arc<[T]>, predicate: F, config: &PipelineConfig) -> PipelineResult<bool>
    where
        T: Send + Sync + 'static,
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.check(records, MatchKind::None, predicate, config)
    }

    fn check<T, F>(&self, records: &Arc<[T]>, kind: MatchKind, predicate: F, config: &PipelineConfig) -> PipelineResult<bool>
    where
        T: Send + Sync + 'static,
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        let operation = match kind {
            MatchKind::Any => OperationKind::AnyMatch,
            MatchKind::All => OperationKind::AllMatch,
            MatchKind::None => OperationKind::NoneMatch,
        };
        self.instrumented(operation, config, records.len(), || match config.mode {
            ExecutionMode::Sequential => {
                let chunk = Chunk::new(0, 0, records.len());
                let verdict = run_check(&self.hooks, records, chunk, kind, &predicate, &CancellationToken::new())
                    .map_err(|e| e.into_failure(0))?;
                Ok(merge_verdicts(kind, [verdict]))
            }
            ExecutionMode::Parallel => {
                let chunks = split(records.len(), self.parallelism_for(config))?;
                let predicate = Arc::new(predicate);
                let token = CancellationToken::new();
                let mut handles = Vec::with_capacity(chunks.len());
                for chunk in chunks {
                    let records = Arc::clone(records);
                    let predicate = Arc::clone(&predicate);
                    let token = token.clone();
                    let hooks = self.hooks.clone();
                    handles.push(
                        self.pool
                            .submit(move || run_check(&hooks, &records, chunk, kind, &*predicate, &token))?,
                    );
                }
                match self.pool.await_until(handles, ChunkVerdict::is_decisive)? {
                    Settled::Decided(partial) => {
                        self.hooks
                            .emit(ExecutionEvent::ShortCircuited { chunk: partial.chunk });
                        Ok(kind.decided())
                    }
                    Settled::Completed(verdicts) => Ok(merge_verdicts(kind, verdicts)),
                }
            }
        })
    }

    /// Run `kernel` per chunk and collect the partial results in chunk order.
    fn dispatch<T, P, K>(&self, records: &Arc<[T]>, config: &PipelineConfig, kernel: K) -> PipelineResult<Vec<P>>
    where
        T: Send + Sync + 'static,
        P: Send + 'static,
        K: Fn(&[T], Chunk) -> Result<P, TaskError> + Send + Sync + 'static,
    {
        match config.mode {
            ExecutionMode::Sequential => {
                let chunk = Chunk::new(0, 0, records.len());
                let partial = run_chunk(&self.hooks, records, chunk, &kernel).map_err(|e| e.into_failure(0))?;
                Ok(vec![partial])
            }
            ExecutionMode::Parallel => {
                let chunks = split(records.len(), self.parallelism_for(config))?;
                let kernel = Arc::new(kernel);
                let mut handles = Vec::with_capacity(chunks.len());
                for chunk in chunks {
                    let records = Arc::clone(records);
                    let kernel = Arc::clone(&kernel);
                    let hooks = self.hooks.clone();
                    handles.push(
                        self.pool
                            .submit(move || run_chunk(&hooks, &records, chunk, &*kernel))?,
                    );
                }
                self.pool.await_all(handles)
            }
        }
    }

    fn parallelism_for(&self, config: &PipelineConfig) -> usize {
        config.parallelism.unwrap_or_else(|| self.pool.parallelism())
    }

    fn instrumented<R>(
        &self,
        operation: OperationKind,
        config: &PipelineConfig,
        records: usize,
        body: impl FnOnce() -> PipelineResult<R>,
    ) -> PipelineResult<R> {
        let start = Instant::now();
        self.hooks.metrics.begin_run();
        self.hooks.emit(ExecutionEvent::RunStarted {
            operation,
            mode: config.mode,
            records,
        });

        let out = config.validate().and_then(|()| body());

        self.hooks.metrics.end_run(start.elapsed());
        match &out {
            Ok(_) => self.hooks.emit(ExecutionEvent::RunFinished {
                operation,
                elapsed: start.elapsed(),
                metrics: self.hooks.metrics.snapshot(),
            }),
            Err(err) => self.hooks.emit(ExecutionEvent::RunFailed {
                operation,
                error: err.to_string(),
            }),
        }
        out
    }
}
