//! Core types shared by every Pitlane crate.
//!
//! Nothing in here performs I/O or spawns tasks. These are the values that
//! flow between the simulators, the event sink and the transport layer.

mod config;
mod event;
mod identifiers;
mod lap_time;
mod summary;

pub use config::{ConfigError, RunConfig, MAX_REPETITIONS, MAX_UNITS};
pub use event::{EventKind, EventRecord, Topic};
pub use identifiers::{RunId, StageId, WorkerId};
pub use lap_time::{LapTime, SECTOR_TIME_RANGE, TRIAL_TIME_RANGE};
pub use summary::{LapRecord, ParallelSummary, RingSummary, SectorRecord, Summary, WorkerResult};
