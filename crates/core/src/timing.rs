//! Sources of simulated durations.
//!
//! Each stage or worker draws from its own [`TimingStream`], forked from a
//! shared [`TimingSource`] by (topic, unit). Per-unit streams keep a seeded
//! run reproducible no matter how the scheduler interleaves the units.

use pitlane_types::{LapTime, Topic};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::fmt::Debug;
use std::ops::RangeInclusive;

/// Provider trait for simulated durations.
pub trait TimingSource: Debug + Send + Sync {
    /// Fork the private stream of one unit (1-based stage or worker id).
    fn stream(&self, topic: Topic, unit: u32) -> Box<dyn TimingStream>;
}

/// A private sequence of durations owned by one unit.
pub trait TimingStream: Send {
    /// Draw a duration uniformly from `range` (hundredths, inclusive).
    fn draw(&mut self, range: &RangeInclusive<u32>) -> LapTime;
}

struct ChaChaStream(ChaCha8Rng);

impl TimingStream for ChaChaStream {
    fn draw(&mut self, range: &RangeInclusive<u32>) -> LapTime {
        LapTime::from_hundredths(self.0.gen_range(range.clone()))
    }
}

/// Deterministic durations: the same seed yields the same per-unit streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeededTiming {
    seed: u64,
}

impl SeededTiming {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    fn stream_id(topic: Topic, unit: u32) -> u64 {
        let tag: u64 = match topic {
            Topic::Ring => 1,
            Topic::Parallel => 2,
        };
        (tag << 32) | u64::from(unit)
    }
}

impl TimingSource for SeededTiming {
    fn stream(&self, topic: Topic, unit: u32) -> Box<dyn TimingStream> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        rng.set_stream(Self::stream_id(topic, unit));
        Box::new(ChaChaStream(rng))
    }
}

/// Fresh OS entropy for every stream.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntropyTiming;

impl TimingSource for EntropyTiming {
    fn stream(&self, _topic: Topic, _unit: u32) -> Box<dyn TimingStream> {
        Box::new(ChaChaStream(ChaCha8Rng::from_entropy()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pitlane_types::{SECTOR_TIME_RANGE, TRIAL_TIME_RANGE};

    fn draws(source: &dyn TimingSource, topic: Topic, unit: u32, n: usize) -> Vec<LapTime> {
        let mut stream = source.stream(topic, unit);
        (0..n).map(|_| stream.draw(&TRIAL_TIME_RANGE)).collect()
    }

    #[test]
    fn test_seeded_streams_are_reproducible() {
        let a = SeededTiming::new(42);
        let b = SeededTiming::new(42);
        assert_eq!(draws(&a, Topic::Parallel, 3, 16), draws(&b, Topic::Parallel, 3, 16));
    }

    #[test]
    fn test_units_get_independent_streams() {
        let source = SeededTiming::new(42);
        assert_ne!(
            draws(&source, Topic::Parallel, 1, 16),
            draws(&source, Topic::Parallel, 2, 16)
        );
        assert_ne!(
            draws(&source, Topic::Parallel, 1, 16),
            draws(&source, Topic::Ring, 1, 16)
        );
    }

    #[test]
    fn test_draws_stay_in_range() {
        let source = SeededTiming::new(7);
        let mut stream = source.stream(Topic::Ring, 1);
        for _ in 0..10_000 {
            assert!(stream.draw(&SECTOR_TIME_RANGE).within(&SECTOR_TIME_RANGE));
        }

        let mut stream = EntropyTiming.stream(Topic::Parallel, 1);
        for _ in 0..10_000 {
            assert!(stream.draw(&TRIAL_TIME_RANGE).within(&TRIAL_TIME_RANGE));
        }
    }
}
