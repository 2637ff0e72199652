//! Run configuration, validated once at run start.

use thiserror::Error;

/// Errors from validating a run configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The unit count (sectors or workers) was below one.
    #[error("{unit} must be >= 1 (got {got})")]
    InvalidUnitCount {
        /// Human name of the unit ("sectors", "cars").
        unit: &'static str,
        /// The rejected value.
        got: i64,
    },

    /// A count exceeds the largest run a simulator accepts.
    #[error("{field} must be <= {max} (got {got})")]
    TooLarge {
        /// Name of the offending field.
        field: &'static str,
        /// The largest accepted value.
        max: u32,
        /// The rejected value.
        got: i64,
    },
}

/// Most stages or workers a single run may spawn.
pub const MAX_UNITS: u32 = 1_000;

/// Most laps or trials per worker a single run may ask for.
pub const MAX_REPETITIONS: u32 = 100_000;

fn bounded(field: &'static str, value: i64, max: u32) -> Result<u32, ConfigError> {
    u32::try_from(value)
        .ok()
        .filter(|value| *value <= max)
        .ok_or(ConfigError::TooLarge {
            field,
            max,
            got: value,
        })
}

/// Immutable parameters of one run.
///
/// `units` is the number of ring stages or parallel workers, `repetitions`
/// the number of laps (ring) or trials per worker (parallel).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunConfig {
    units: u32,
    repetitions: u32,
}

impl RunConfig {
    /// Validate raw, decoded counts.
    ///
    /// A unit count below one is an error. A repetition count below one is
    /// silently raised to one, matching the behaviour observers already rely
    /// on. Counts above [`MAX_UNITS`] or [`MAX_REPETITIONS`] are rejected.
    /// `unit` names the unit kind in error messages.
    pub fn validate(unit: &'static str, units: i64, repetitions: i64) -> Result<Self, ConfigError> {
        if units < 1 {
            return Err(ConfigError::InvalidUnitCount { unit, got: units });
        }
        let units = bounded(unit, units, MAX_UNITS)?;
        let repetitions = bounded("laps", repetitions.max(1), MAX_REPETITIONS)?;

        Ok(Self { units, repetitions })
    }

    /// Number of stages or workers.
    pub fn units(&self) -> u32 {
        self.units
    }

    /// Number of laps or trials.
    pub fn repetitions(&self) -> u32 {
        self.repetitions
    }
}
