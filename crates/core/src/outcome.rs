//! How a simulation run ended.

use std::fmt;

/// Terminal state of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunOutcome {
    /// All laps or trials ran; summary and `done` were emitted.
    Completed,
    /// The unit count was rejected; an error log and `done` were emitted.
    InvalidConfiguration,
    /// The run observed its cancellation signal and stopped emitting.
    Cancelled,
    /// The consumer went away; the run stopped at its next submit.
    SinkClosed,
    /// A task of the run panicked or broke an invariant; an error log and
    /// `done` were emitted if the sink still accepted them.
    Failed,
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunOutcome::Completed => "completed",
            RunOutcome::InvalidConfiguration => "invalid configuration",
            RunOutcome::Cancelled => "cancelled",
            RunOutcome::SinkClosed => "sink closed",
            RunOutcome::Failed => "failed",
        };
        f.write_str(s)
    }
}
