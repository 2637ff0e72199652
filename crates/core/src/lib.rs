//! Core plumbing shared by the Pitlane simulators.
//!
//! # Architecture
//!
//! ```text
//!  stage / worker tasks ──submit──┐
//!  stage / worker tasks ──submit──┼──► EventSink ══(bounded mpsc)══► EventStream ──► transport
//!  dispatcher diagnostics ─submit─┘
//! ```
//!
//! Producers hold clones of [`EventSink`]; exactly one consumer owns the
//! [`EventStream`]. Simulated time goes through a [`Pacer`] and simulated
//! randomness through a [`TimingSource`], both bundled in a [`SimEnv`] so
//! tests can swap in instant pacing and scripted durations.

mod config;
mod env;
mod outcome;
mod pacer;
mod sink;
mod timing;

pub use config::PacingConfig;
pub use env::SimEnv;
pub use outcome::RunOutcome;
pub use pacer::{InstantPacer, Pacer, TokioPacer};
pub use sink::{event_channel, EventSink, EventStream, SinkError, DEFAULT_SINK_CAPACITY};
pub use timing::{EntropyTiming, SeededTiming, TimingSource, TimingStream};

/// Cancellation signal shared by every task of a run.
pub use tokio_util::sync::CancellationToken;
