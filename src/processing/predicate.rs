//! Short-circuiting predicate checks (any / all / none match).

use serde::{Deserialize, Serialize};

use crate::execution::CancellationToken;

/// Which predicate check to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// `true` if at least one element satisfies the predicate.
    Any,
    /// `true` if every element satisfies the predicate.
    All,
    /// `true` if no element satisfies the predicate.
    None,
}

impl MatchKind {
    /// Predicate outcome that settles the whole check.
    fn trigger(self) -> bool {
        match self {
            MatchKind::Any | MatchKind::None => true,
            MatchKind::All => false,
        }
    }

    /// Answer once a decisive element has been seen.
    pub fn decided(self) -> bool {
        match self {
            MatchKind::Any => true,
            MatchKind::All | MatchKind::None => false,
        }
    }

    /// Answer when no decisive element exists (including empty input).
    pub fn undecided(self) -> bool {
        !self.decided()
    }
}

/// How a chunk's predicate evaluation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkOutcome {
    /// A decisive element was found; the overall answer is known.
    Decisive,
    /// Every element was evaluated without finding a decisive one.
    Exhausted,
    /// Another chunk settled the answer first; evaluation stopped early.
    Cancelled,
}

/// Per-chunk result of a predicate check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkVerdict {
    pub outcome: ChunkOutcome,
    /// Number of elements the predicate was evaluated on.
    pub examined: usize,
}

impl ChunkVerdict {
    pub fn is_decisive(&self) -> bool {
        self.outcome == ChunkOutcome::Decisive
    }
}

/// Evaluate `predicate` over one chunk, stopping at the first decisive element.
///
/// The cancellation token is checked before every element. Finding a decisive element cancels
/// the token so sibling chunks can stop.
pub fn check_chunk<T, F>(records: &[T], kind: MatchKind, mut predicate: F, cancel: &CancellationToken) -> ChunkVerdict
where
    F: FnMut(&T) -> bool,
{
    let trigger = kind.trigger();
    for (i, record) in records.iter().enumerate() {
        if cancel.is_cancelled() {
            return ChunkVerdict {
                outcome: ChunkOutcome::Cancelled,
                examined: i,
            };
        }
        if predicate(record) == trigger {
            cancel.cancel();
            return ChunkVerdict {
                outcome: ChunkOutcome::Decisive,
                examined: i + 1,
            };
        }
    }
    ChunkVerdict {
        outcome: ChunkOutcome::Exhausted,
        examined: records.len(),
    }
}

/// Combine chunk verdicts into the final answer.
pub fn merge_verdicts(kind: MatchKind, verdicts: impl IntoIterator<Item = ChunkVerdict>) -> bool {
    if verdicts.into_iter().any(|v| v.is_decisive()) {
        kind.decided()
    } else {
        kind.undecided()
    }
}

/// Sequential `any_match`.
pub fn any_match<T, F: FnMut(&T) -> bool>(records: &[T], predicate: F) -> bool {
    merge_verdicts(
        MatchKind::Any,
        [check_chunk(records, MatchKind::Any, predicate, &CancellationToken::new())],
    )
}

/// Sequential `all_match`.
pub fn all_match<T, F: FnMut(&T) -> bool>(records: &[T], predicate: F) -> bool {
    merge_verdicts(
        MatchKind::All,
        [check_chunk(records, MatchKind::All, predicate, &CancellationToken::new())],
    )
}

/// Sequential `none_match`.
pub fn none_match<T, F: FnMut(&T) -> bool>(records: &[T], predicate: F) -> bool {
    merge_verdicts(
        MatchKind::None,
        [check_chunk(records, MatchKind::None, predicate, &CancellationToken::new())],
    )
}
