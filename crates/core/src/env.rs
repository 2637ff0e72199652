//! Injected environment of a simulation run.

use crate::config::PacingConfig;
use crate::pacer::{InstantPacer, Pacer, TokioPacer};
use crate::timing::{EntropyTiming, SeededTiming, TimingSource};
use std::sync::Arc;

/// Time and randomness providers plus pacing, shared by every run a
/// dispatcher starts. Cloning is cheap.
#[derive(Debug, Clone)]
pub struct SimEnv {
    /// Waits out simulated work; real sleeps or nothing at all.
    pub pacer: Arc<dyn Pacer>,
    /// Hands each stage or worker its own stream of durations.
    pub timing: Arc<dyn TimingSource>,
    /// How long a sector or trial takes in paced time.
    pub pacing: PacingConfig,
}

impl SimEnv {
    /// Build an environment from explicit providers.
    pub fn new(pacer: Arc<dyn Pacer>, timing: Arc<dyn TimingSource>) -> Self {
        Self {
            pacer,
            timing,
            pacing: PacingConfig::default(),
        }
    }

    /// Real-time pacing with fresh randomness for every run.
    pub fn realtime() -> Self {
        Self::new(Arc::new(TokioPacer), Arc::new(EntropyTiming))
    }

    /// Real-time pacing with reproducible durations.
    pub fn seeded(seed: u64) -> Self {
        Self::new(Arc::new(TokioPacer), Arc::new(SeededTiming::new(seed)))
    }

    /// No pacing and reproducible durations. Runs finish as fast as the
    /// consumer drains them.
    pub fn instant(seed: u64) -> Self {
        Self::new(Arc::new(InstantPacer), Arc::new(SeededTiming::new(seed)))
    }

    /// Replace the pacing configuration.
    pub fn with_pacing(mut self, pacing: PacingConfig) -> Self {
        self.pacing = pacing;
        self
    }

    /// Replace the timing source.
    pub fn with_timing(mut self, timing: Arc<dyn TimingSource>) -> Self {
        self.timing = timing;
        self
    }

    /// Replace the pacer.
    pub fn with_pacer(mut self, pacer: Arc<dyn Pacer>) -> Self {
        self.pacer = pacer;
        self
    }
}

impl Default for SimEnv {
    fn default() -> Self {
        Self::realtime()
    }
}
