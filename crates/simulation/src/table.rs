//! Fixed-size result table shared by the workers of a parallel run.
//!
//! Writers go through a single lock and each worker id may be written once.
//! Reading requires the join barrier: [`SharedResultTable::into_completed`]
//! only succeeds once every worker has released its handle on the table, so
//! no reader can observe a table that is still being written.

use parking_lot::Mutex;
use pitlane_types::{WorkerId, WorkerResult};
use std::sync::Arc;
use thiserror::Error;

/// Errors from writing or completing the table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    #[error("Worker {worker} is outside a table of {size} workers")]
    UnknownWorker { worker: WorkerId, size: usize },

    #[error("Worker {0} already recorded its result")]
    AlreadyRecorded(WorkerId),

    #[error("Worker {0} finished without recording a result")]
    Missing(WorkerId),

    #[error("Table read while {0} writers still hold it")]
    WritersOutstanding(usize),
}

/// Worker id → finalized result, one slot per worker.
#[derive(Debug)]
pub struct SharedResultTable {
    slots: Mutex<Vec<Option<WorkerResult>>>,
}

impl SharedResultTable {
    /// Create a table with one empty slot per worker.
    pub fn new(workers: usize) -> Self {
        Self {
            slots: Mutex::new(vec![None; workers]),
        }
    }

    /// Record a worker's finalized result.
    ///
    /// The write happens under the table lock and is all-or-nothing; a
    /// second write for the same worker is rejected.
    pub fn record(&self, result: WorkerResult) -> Result<(), TableError> {
        let mut slots = self.slots.lock();
        let size = slots.len();
        let slot = slots
            .get_mut(result.worker_id.index())
            .filter(|_| result.worker_id.0 >= 1)
            .ok_or(TableError::UnknownWorker {
                worker: result.worker_id,
                size,
            })?;

        if slot.is_some() {
            return Err(TableError::AlreadyRecorded(result.worker_id));
        }
        *slot = Some(result);
        Ok(())
    }

    /// Take the completed view after the join barrier.
    ///
    /// Fails if any worker still holds the table or any slot is empty.
    pub fn into_completed(table: Arc<Self>) -> Result<CompletedTable, TableError> {
        let table = Arc::try_unwrap(table)
            .map_err(|shared| TableError::WritersOutstanding(Arc::strong_count(&shared) - 1))?;

        let entries = table
            .slots
            .into_inner()
            .into_iter()
            .enumerate()
            .map(|(index, slot)| slot.ok_or(TableError::Missing(WorkerId::from_index(index))))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(CompletedTable { entries })
    }
}

/// Read-only view of a fully written table, ordered by worker id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedTable {
    entries: Vec<WorkerResult>,
}

impl CompletedTable {
    pub fn entries(&self) -> &[WorkerResult] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<WorkerResult> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pitlane_types::LapTime;

    fn result(worker: u32, hundredths: u32) -> WorkerResult {
        WorkerResult {
            worker_id: WorkerId(worker),
            best_time: LapTime::from_hundredths(hundredths),
            trial_count: 3,
        }
    }

    #[test]
    fn test_record_and_complete() {
        let table = Arc::new(SharedResultTable::new(2));
        table.record(result(2, 8100)).unwrap();
        table.record(result(1, 8000)).unwrap();

        let completed = SharedResultTable::into_completed(table).unwrap();
        assert_eq!(completed.len(), 2);
        assert_eq!(completed.entries()[0].worker_id, WorkerId(1));
        assert_eq!(completed.entries()[1].worker_id, WorkerId(2));
    }

    #[test]
    fn test_second_write_is_rejected() {
        let table = SharedResultTable::new(1);
        table.record(result(1, 8000)).unwrap();
        assert_eq!(
            table.record(result(1, 7600)),
            Err(TableError::AlreadyRecorded(WorkerId(1)))
        );
    }

    #[test]
    fn test_out_of_range_worker_is_rejected() {
        let table = SharedResultTable::new(2);
        assert!(matches!(
            table.record(result(3, 8000)),
            Err(TableError::UnknownWorker { size: 2, .. })
        ));
        assert!(matches!(
            table.record(result(0, 8000)),
            Err(TableError::UnknownWorker { .. })
        ));
    }

    #[test]
    fn test_read_before_barrier_fails() {
        let table = Arc::new(SharedResultTable::new(1));
        let writer = Arc::clone(&table);
        writer.record(result(1, 8000)).unwrap();

        assert_eq!(
            SharedResultTable::into_completed(table),
            Err(TableError::WritersOutstanding(1))
        );
    }

    #[test]
    fn test_missing_slot_fails() {
        let table = Arc::new(SharedResultTable::new(2));
        table.record(result(1, 8000)).unwrap();
        assert_eq!(
            SharedResultTable::into_completed(table),
            Err(TableError::Missing(WorkerId(2)))
        );
    }

    #[test]
    fn test_concurrent_writers() {
        let table = Arc::new(SharedResultTable::new(16));
        let handles: Vec<_> = (1..=16)
            .map(|worker| {
                let table = Arc::clone(&table);
                std::thread::spawn(move || table.record(result(worker, 7500 + worker)))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap().unwrap();
        }

        let completed = SharedResultTable::into_completed(table).unwrap();
        for (index, entry) in completed.entries().iter().enumerate() {
            assert_eq!(entry.worker_id, WorkerId::from_index(index));
            assert_eq!(entry.best_time.hundredths(), 7501 + index as u32);
        }
    }
}
