//! Scripted timing source.

use parking_lot::Mutex;
use pitlane_core::{TimingSource, TimingStream};
use pitlane_types::{LapTime, Topic};
use std::collections::HashMap;
use std::ops::RangeInclusive;
use std::sync::Arc;

/// Replays scripted durations (in hundredths) for each (topic, unit).
///
/// A unit's script repeats once exhausted. Units without a script draw the
/// lower bound of the requested range. Every fork of a unit's stream is
/// recorded so tests can check how many streams a run opened.
#[derive(Debug, Default)]
pub struct ScriptedTiming {
    scripts: HashMap<(Topic, u32), Vec<u32>>,
    forks: Mutex<Vec<(Topic, u32)>>,
}

impl ScriptedTiming {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the durations of one unit.
    pub fn with_script(mut self, topic: Topic, unit: u32, hundredths: Vec<u32>) -> Self {
        self.scripts.insert((topic, unit), hundredths);
        self
    }

    /// Streams forked so far, in fork order.
    pub fn forks(&self) -> Vec<(Topic, u32)> {
        self.forks.lock().clone()
    }

    /// Wrap into the shared form a `SimEnv` expects.
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

impl TimingSource for ScriptedTiming {
    fn stream(&self, topic: Topic, unit: u32) -> Box<dyn TimingStream> {
        self.forks.lock().push((topic, unit));
        Box::new(ScriptedStream {
            script: self.scripts.get(&(topic, unit)).cloned().unwrap_or_default(),
            next: 0,
        })
    }
}

struct ScriptedStream {
    script: Vec<u32>,
    next: usize,
}

impl TimingStream for ScriptedStream {
    fn draw(&mut self, range: &RangeInclusive<u32>) -> LapTime {
        if self.script.is_empty() {
            return LapTime::from_hundredths(*range.start());
        }
        let value = self.script[self.next % self.script.len()];
        self.next += 1;
        LapTime::from_hundredths(value)
    }
}
