//! Pitlane simulations.
//!
//! Two didactic concurrency simulations that stream their progress into an
//! [`EventSink`](pitlane_core::EventSink):
//!
//! - [`RingSimulator`]: message passing. K stage tasks are joined in a cycle
//!   by single-slot conduits and relay one token lap after lap.
//! - [`ParallelWorkerSimulator`]: shared memory. N worker tasks run their
//!   trials independently and each writes its result once into a
//!   [`SharedResultTable`]; the [`ResultAggregator`] reads it after the join
//!   barrier.
//!
//! # Ring topology
//!
//! ```text
//!             ┌────────────── coordinator ◄──────────────┐
//!             │ token(lap)                    token(lap) │
//!             ▼                                          │
//!         stage 1 ──► stage 2 ──► ... ──► stage K ───────┘
//! ```
//!
//! Every task of a run watches the run's cancellation token; a cancelled run
//! emits nothing further.

mod aggregate;
mod context;
mod parallel;
mod ring;
mod table;

pub use aggregate::ResultAggregator;
pub use parallel::ParallelWorkerSimulator;
pub use ring::RingSimulator;
pub use table::{CompletedTable, SharedResultTable, TableError};
