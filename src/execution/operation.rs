//! The closed set of record operations accepted by [`super::ExecutionEngine::run`], and the
//! merged output they produce.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::processing::{AggregateKind, Partitioned, Statistics};
use crate::types::{Record, Value};

/// Shared record predicate.
pub type RecordPredicate = Arc<dyn Fn(&Record) -> bool + Send + Sync>;
/// Shared record-to-record transform.
pub type RecordTransform = Arc<dyn Fn(&Record) -> Record + Send + Sync>;
/// Shared record comparator; records ordered first rank highest.
pub type RecordComparator = Arc<dyn Fn(&Record, &Record) -> Ordering + Send + Sync>;
/// Shared grouping-key extractor.
pub type RecordKey = Arc<dyn Fn(&Record) -> String + Send + Sync>;
/// Shared numeric-value extractor.
pub type RecordValue = Arc<dyn Fn(&Record) -> f64 + Send + Sync>;
/// Shared associative combine over numeric values.
pub type Combine = Arc<dyn Fn(f64, f64) -> f64 + Send + Sync>;

/// Operation kinds, used in events and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Filter,
    Map,
    TryMap,
    Reduce,
    GroupAggregate,
    Partition,
    TopK,
    Statistics,
    AnyMatch,
    AllMatch,
    NoneMatch,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OperationKind::Filter => "filter",
            OperationKind::Map => "map",
            OperationKind::TryMap => "try_map",
            OperationKind::Reduce => "reduce",
            OperationKind::GroupAggregate => "group_aggregate",
            OperationKind::Partition => "partition",
            OperationKind::TopK => "top_k",
            OperationKind::Statistics => "statistics",
            OperationKind::AnyMatch => "any_match",
            OperationKind::AllMatch => "all_match",
            OperationKind::NoneMatch => "none_match",
        };
        f.write_str(name)
    }
}

/// A record operation together with its parameters.
#[derive(Clone)]
pub enum Operation {
    /// Keep records satisfying the predicate.
    Filter(RecordPredicate),
    /// Transform every record.
    Map(RecordTransform),
    /// Fold `record.value` from `identity` with an associative `combine`.
    Reduce { identity: f64, combine: Combine },
    /// Group by `key` and report `kind` of `record.value` per group.
    GroupAggregate { key: RecordKey, kind: AggregateKind },
    /// Split into (matching, rest).
    Partition(RecordPredicate),
    /// The first `k` records under `comparator` (ties by original position).
    TopK { comparator: RecordComparator, k: usize },
    /// Count, sum, min, max and mean of the extracted value.
    Statistics(RecordValue),
    AnyMatch(RecordPredicate),
    AllMatch(RecordPredicate),
    NoneMatch(RecordPredicate),
}

impl Operation {
    pub fn filter(predicate: impl Fn(&Record) -> bool + Send + Sync + 'static) -> Self {
        Operation::Filter(Arc::new(predicate))
    }

    pub fn map(transform: impl Fn(&Record) -> Record + Send + Sync + 'static) -> Self {
        Operation::Map(Arc::new(transform))
    }

    pub fn reduce(identity: f64, combine: impl Fn(f64, f64) -> f64 + Send + Sync + 'static) -> Self {
        Operation::Reduce {
            identity,
            combine: Arc::new(combine),
        }
    }

    pub fn group_aggregate(key: impl Fn(&Record) -> String + Send + Sync + 'static, kind: AggregateKind) -> Self {
        Operation::GroupAggregate {
            key: Arc::new(key),
            kind,
        }
    }

    pub fn partition(predicate: impl Fn(&Record) -> bool + Send + Sync + 'static) -> Self {
        Operation::Partition(Arc::new(predicate))
    }

    pub fn top_k(k: usize, comparator: impl Fn(&Record, &Record) -> Ordering + Send + Sync + 'static) -> Self {
        Operation::TopK {
            comparator: Arc::new(comparator),
            k,
        }
    }

    pub fn statistics(value: impl Fn(&Record) -> f64 + Send + Sync + 'static) -> Self {
        Operation::Statistics(Arc::new(value))
    }

    pub fn any_match(predicate: impl Fn(&Record) -> bool + Send + Sync + 'static) -> Self {
        Operation::AnyMatch(Arc::new(predicate))
    }

    pub fn all_match(predicate: impl Fn(&Record) -> bool + Send + Sync + 'static) -> Self {
        Operation::AllMatch(Arc::new(predicate))
    }

    pub fn none_match(predicate: impl Fn(&Record) -> bool + Send + Sync + 'static) -> Self {
        Operation::NoneMatch(Arc::new(predicate))
    }

    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::Filter(_) => OperationKind::Filter,
            Operation::Map(_) => OperationKind::Map,
            Operation::Reduce { .. } => OperationKind::Reduce,
            Operation::GroupAggregate { .. } => OperationKind::GroupAggregate,
            Operation::Partition(_) => OperationKind::Partition,
            Operation::TopK { .. } => OperationKind::TopK,
            Operation::Statistics(_) => OperationKind::Statistics,
            Operation::AnyMatch(_) => OperationKind::AnyMatch,
            Operation::AllMatch(_) => OperationKind::AllMatch,
            Operation::NoneMatch(_) => OperationKind::NoneMatch,
        }
    }
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("Operation");
        d.field("kind", &self.kind());
        match self {
            Operation::Reduce { identity, .. } => d.field("identity", identity),
            Operation::GroupAggregate { kind, .. } => d.field("aggregate", kind),
            Operation::TopK { k, .. } => d.field("k", k),
            _ => &mut d,
        };
        d.finish()
    }
}

/// The merged result of [`super::ExecutionEngine::run`].
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineOutput {
    /// Filter, map and top-k.
    Records(Vec<Record>),
    /// Reduce.
    Scalar(f64),
    /// Group aggregate, ordered by key.
    Groups(BTreeMap<String, Value>),
    /// Partition.
    Partitions(Partitioned<Record>),
    /// Statistics.
    Statistics(Statistics),
    /// Any / all / none match.
    Bool(bool),
}

impl PipelineOutput {
    pub fn into_records(self) -> Option<Vec<Record>> {
        match self {
            PipelineOutput::Records(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            PipelineOutput::Scalar(v) => Some(*v),
            _ => None,
        }
    }

    pub fn into_groups(self) -> Option<BTreeMap<String, Value>> {
        match self {
            PipelineOutput::Groups(g) => Some(g),
            _ => None,
        }
    }

    pub fn into_partitions(self) -> Option<Partitioned<Record>> {
        match self {
            PipelineOutput::Partitions(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_statistics(&self) -> Option<&Statistics> {
        match self {
            PipelineOutput::Statistics(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PipelineOutput::Bool(b) => Some(*b),
            _ => None,
        }
    }
}
