//! Overall-best selection across a completed result table.

use crate::table::CompletedTable;
use pitlane_types::{ParallelSummary, WorkerResult};

/// Selects the best result of a parallel run.
pub struct ResultAggregator;

impl ResultAggregator {
    /// The entry with the minimum best time; the lowest worker id wins ties.
    pub fn best_overall(entries: &[WorkerResult]) -> Option<&WorkerResult> {
        entries.iter().min_by_key(|r| (r.best_time, r.worker_id))
    }

    /// Build the summary payload. `None` for an empty table.
    pub fn summarize(table: CompletedTable) -> Option<ParallelSummary> {
        let best_overall = Self::best_overall(table.entries())?.clone();
        Some(ParallelSummary {
            best_per_worker: table.into_entries(),
            best_overall,
        })
    }
}
