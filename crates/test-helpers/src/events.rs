//! Helpers for collecting and inspecting emitted records.

use pitlane_core::{EventStream, SimEnv, TimingSource};
use pitlane_types::{EventKind, EventRecord, Summary};
use std::sync::Arc;

/// An environment with no pacing and the given timing source.
pub fn instant_env(timing: Arc<dyn TimingSource>) -> SimEnv {
    SimEnv::instant(0).with_timing(timing)
}

/// Drain `stream` until end-of-stream.
///
/// All producers must have been dropped (or the stream closed), otherwise
/// this waits forever.
pub async fn collect_events(stream: &mut EventStream) -> Vec<EventRecord> {
    let mut events = Vec::new();
    while let Some(event) = stream.next_event().await {
        events.push(event);
    }
    events
}

/// Texts of all records that carry one, in order.
pub fn texts(events: &[EventRecord]) -> Vec<&str> {
    events.iter().filter_map(|e| e.text()).collect()
}

/// Number of `log` records whose text starts with `prefix`.
pub fn count_prefixed(events: &[EventRecord], prefix: &str) -> usize {
    events
        .iter()
        .filter(|e| e.is_log_starting_with(prefix))
        .count()
}

/// All `done` records, in order.
pub fn done_records(events: &[EventRecord]) -> Vec<&EventRecord> {
    events
        .iter()
        .filter(|e| e.kind() == EventKind::Done)
        .collect()
}

/// Payloads of all `summary` records, in order.
pub fn summaries(events: &[EventRecord]) -> Vec<&Summary> {
    events.iter().filter_map(|e| e.payload()).collect()
}
