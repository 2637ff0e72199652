//! Structured payloads carried by `summary` records.

use crate::event::Topic;
use crate::identifiers::{StageId, WorkerId};
use crate::lap_time::LapTime;
use serde::{Deserialize, Serialize};

/// Finalized result of one worker in a parallel run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerResult {
    pub worker_id: WorkerId,
    /// Minimum over the worker's own trials.
    pub best_time: LapTime,
    pub trial_count: u32,
}

/// Payload of a finished parallel run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParallelSummary {
    /// One entry per worker, ordered by worker id.
    pub best_per_worker: Vec<WorkerResult>,
    /// The entry with the minimum best time; lowest worker id on ties.
    pub best_overall: WorkerResult,
}

/// Total time of one ring lap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LapRecord {
    pub lap: u32,
    pub time: LapTime,
}

/// Best time a single stage produced over the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectorRecord {
    pub sector: StageId,
    pub lap: u32,
    pub time: LapTime,
}

/// Payload of a finished ring run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RingSummary {
    pub sectors: u32,
    pub laps: u32,
    /// Lap totals in lap order.
    pub lap_times: Vec<LapRecord>,
    /// The lap with the smallest total; earliest lap on ties.
    pub fastest_lap: LapRecord,
    /// One entry per stage, in stage order.
    pub best_sectors: Vec<SectorRecord>,
}

/// Summary payload of either simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Summary {
    Ring(RingSummary),
    Parallel(ParallelSummary),
}

impl Summary {
    /// The simulation this summary describes.
    pub fn topic(&self) -> Topic {
        match self {
            Summary::Ring(_) => Topic::Ring,
            Summary::Parallel(_) => Topic::Parallel,
        }
    }

    pub fn as_ring(&self) -> Option<&RingSummary> {
        match self {
            Summary::Ring(summary) => Some(summary),
            Summary::Parallel(_) => None,
        }
    }

    pub fn as_parallel(&self) -> Option<&ParallelSummary> {
        match self {
            Summary::Parallel(summary) => Some(summary),
            Summary::Ring(_) => None,
        }
    }
}
