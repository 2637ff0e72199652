//! Pacing configuration.

use std::time::Duration;

/// Real-time pauses inserted between simulated steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacingConfig {
    /// Transit time of the token between two ring stages.
    pub sector_delay: Duration,

    /// Time a parallel worker spends on one trial.
    pub trial_delay: Duration,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            sector_delay: Duration::from_millis(300),
            trial_delay: Duration::from_millis(200),
        }
    }
}

impl PacingConfig {
    /// Set the ring sector delay.
    pub fn with_sector_delay(mut self, delay: Duration) -> Self {
        self.sector_delay = delay;
        self
    }

    /// Set the parallel trial delay.
    pub fn with_trial_delay(mut self, delay: Duration) -> Self {
        self.trial_delay = delay;
        self
    }
}
