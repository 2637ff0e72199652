//! Event records streamed from the simulators to the observer.

use crate::summary::Summary;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of an event record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// A human-readable progress line.
    Log,
    /// Structured results of a finished run.
    Summary,
    /// Terminal marker; nothing follows it for the same run.
    Done,
}

/// Which simulation a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Topic {
    /// Message-passing ring simulation.
    Ring,
    /// Shared-memory parallel worker simulation.
    Parallel,
}

impl Topic {
    /// Wire name of the topic.
    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::Ring => "ring",
            Topic::Parallel => "parallel",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An immutable event record.
///
/// Wire form: `{"type": "log", "topic": "ring", "text": "...", "payload": {...}}`
/// with absent optional fields omitted. `topic` is absent only for untargeted
/// diagnostics, `payload` is present only on summaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    #[serde(rename = "type")]
    kind: EventKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    topic: Option<Topic>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    payload: Option<Summary>,
}

impl EventRecord {
    /// A progress line for one simulation.
    pub fn log(topic: Topic, text: impl Into<String>) -> Self {
        Self {
            kind: EventKind::Log,
            topic: Some(topic),
            text: Some(text.into()),
            payload: None,
        }
    }

    /// A diagnostic line that belongs to no simulation.
    pub fn untargeted(text: impl Into<String>) -> Self {
        Self {
            kind: EventKind::Log,
            topic: None,
            text: Some(text.into()),
            payload: None,
        }
    }

    /// The results of a finished run; the topic follows the payload.
    pub fn summary(summary: Summary) -> Self {
        Self {
            kind: EventKind::Summary,
            topic: Some(summary.topic()),
            text: None,
            payload: Some(summary),
        }
    }

    /// Terminal marker of a run.
    pub fn done(topic: Topic, text: impl Into<String>) -> Self {
        Self {
            kind: EventKind::Done,
            topic: Some(topic),
            text: Some(text.into()),
            payload: None,
        }
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn topic(&self) -> Option<Topic> {
        self.topic
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn payload(&self) -> Option<&Summary> {
        self.payload.as_ref()
    }

    /// Whether this is a `log` record whose text starts with `prefix`.
    pub fn is_log_starting_with(&self, prefix: &str) -> bool {
        self.kind == EventKind::Log && self.text().is_some_and(|t| t.starts_with(prefix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summary::{ParallelSummary, WorkerResult};
    use crate::{LapTime, WorkerId};

    #[test]
    fn test_log_wire_form() {
        let record = EventRecord::log(Topic::Ring, "sector 1 time 12.00 (lap 1)");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "type": "log",
                "topic": "ring",
                "text": "sector 1 time 12.00 (lap 1)"
            })
        );
    }

    #[test]
    fn test_untargeted_omits_topic() {
        let json = serde_json::to_string(&EventRecord::untargeted("unrecognized command: x")).unwrap();
        assert!(!json.contains("topic"));
        assert!(json.contains("\"type\":\"log\""));
    }

    #[test]
    fn test_summary_takes_topic_from_payload() {
        let result = WorkerResult {
            worker_id: WorkerId(1),
            best_time: LapTime::from_hundredths(8000),
            trial_count: 2,
        };
        let record = EventRecord::summary(Summary::Parallel(ParallelSummary {
            best_per_worker: vec![result.clone()],
            best_overall: result,
        }));
        assert_eq!(record.kind(), EventKind::Summary);
        assert_eq!(record.topic(), Some(Topic::Parallel));
        assert!(record.text().is_none());

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["payload"]["best_overall"]["best_time"], 80.0);
        assert_eq!(json["payload"]["best_overall"]["worker_id"], 1);
    }

    #[test]
    fn test_done_round_trips() {
        let record = EventRecord::done(Topic::Parallel, "parallel run finished");
        let json = serde_json::to_string(&record).unwrap();
        let back: EventRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
