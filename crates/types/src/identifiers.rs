//! Domain-specific identifier types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Position of a stage in the ring (1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StageId(pub u32);

impl StageId {
    /// The stage that receives the token first on every lap.
    pub const FIRST: Self = StageId(1);

    /// Zero-based slot for indexing fixed-size tables.
    pub fn index(self) -> usize {
        self.0.saturating_sub(1) as usize
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Worker identity in a parallel run (1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkerId(pub u32);

impl WorkerId {
    /// Zero-based slot for indexing fixed-size tables.
    pub fn index(self) -> usize {
        self.0.saturating_sub(1) as usize
    }

    /// Build the id for a zero-based slot.
    pub fn from_index(index: usize) -> Self {
        WorkerId(index as u32 + 1)
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of one simulation run started by a dispatcher.
///
/// Unique per dispatcher only; two connections may both own a `RunId(1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub u64);

impl RunId {
    /// Get the next run id.
    pub fn next(self) -> Self {
        RunId(self.0 + 1)
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Run({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_index_round_trip() {
        assert_eq!(WorkerId(1).index(), 0);
        assert_eq!(WorkerId::from_index(3), WorkerId(4));
        assert_eq!(StageId::FIRST.index(), 0);
    }

    #[test]
    fn test_run_id_next() {
        assert_eq!(RunId(0).next(), RunId(1));
        assert_eq!(RunId(7).to_string(), "Run(7)");
    }
}
