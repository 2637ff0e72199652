//! Inbound commands.
//!
//! The wire form is a loosely-typed JSON object:
//!
//! ```json
//! {"action": "start-ring", "sectors": 5, "laps": 3}
//! {"action": "start-parallel", "cars": 4, "laps": 5}
//! {"action": "stop", "topic": "ring"}
//! ```
//!
//! Absent or non-numeric count fields take their defaults and fractional
//! counts are truncated towards zero. Anything that cannot be read as a known
//! action becomes [`Command::Unknown`].

use pitlane_types::Topic;
use serde_json::{Map, Value};

pub const DEFAULT_RING_SECTORS: i64 = 5;
pub const DEFAULT_RING_LAPS: i64 = 3;
pub const DEFAULT_PARALLEL_CARS: i64 = 4;
pub const DEFAULT_PARALLEL_LAPS: i64 = 5;

/// A decoded inbound command.
///
/// Counts are kept signed and unvalidated; the simulators own the
/// validation policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    StartRing { sectors: i64, laps: i64 },
    StartParallel { cars: i64, laps: i64 },
    /// Cancel outstanding runs, only those of `topic` if given.
    Stop { topic: Option<Topic> },
    /// Unrecognized action. Empty when the payload had no readable action.
    Unknown { action: String },
}

impl Command {
    /// Decode one inbound text frame.
    pub fn decode(text: &str) -> Self {
        match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(fields)) => Self::from_fields(&fields),
            _ => Command::Unknown {
                action: String::new(),
            },
        }
    }

    fn from_fields(fields: &Map<String, Value>) -> Self {
        let action = fields.get("action").and_then(Value::as_str).unwrap_or("");

        match action {
            "start-ring" | "start_ring" | "start_mpi" => Command::StartRing {
                sectors: count_field(fields, "sectors", DEFAULT_RING_SECTORS),
                laps: count_field(fields, "laps", DEFAULT_RING_LAPS),
            },
            "start-parallel" | "start_parallel" | "start_openmp" => Command::StartParallel {
                cars: count_field(fields, "cars", DEFAULT_PARALLEL_CARS),
                laps: count_field(fields, "laps", DEFAULT_PARALLEL_LAPS),
            },
            "stop" => Command::Stop {
                topic: fields
                    .get("topic")
                    .and_then(|topic| serde_json::from_value(topic.clone()).ok()),
            },
            other => Command::Unknown {
                action: other.to_string(),
            },
        }
    }

    /// Topic of the run this command starts, if any.
    pub fn topic(&self) -> Option<Topic> {
        match self {
            Command::StartRing { .. } => Some(Topic::Ring),
            Command::StartParallel { .. } => Some(Topic::Parallel),
            Command::Stop { .. } | Command::Unknown { .. } => None,
        }
    }
}

/// Read an integer count, truncating floats and defaulting anything else.
fn count_field(fields: &Map<String, Value>, name: &str, default: i64) -> i64 {
    match fields.get(name) {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .unwrap_or(default),
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_ring_with_fields() {
        assert_eq!(
            Command::decode(r#"{"action":"start-ring","sectors":7,"laps":2}"#),
            Command::StartRing {
                sectors: 7,
                laps: 2
            }
        );
    }

    #[test]
    fn test_defaults_when_absent() {
        assert_eq!(
            Command::decode(r#"{"action":"start-ring"}"#),
            Command::StartRing {
                sectors: DEFAULT_RING_SECTORS,
                laps: DEFAULT_RING_LAPS
            }
        );
        assert_eq!(
            Command::decode(r#"{"action":"start-parallel"}"#),
            Command::StartParallel {
                cars: DEFAULT_PARALLEL_CARS,
                laps: DEFAULT_PARALLEL_LAPS
            }
        );
    }

    #[test]
    fn test_non_numeric_fields_default() {
        assert_eq!(
            Command::decode(r#"{"action":"start-parallel","cars":"six","laps":null}"#),
            Command::StartParallel { cars: 4, laps: 5 }
        );
        assert_eq!(
            Command::decode(r#"{"action":"start-ring","sectors":[3],"laps":{"n":1}}"#),
            Command::StartRing { sectors: 5, laps: 3 }
        );
    }

    #[test]
    fn test_floats_truncate() {
        assert_eq!(
            Command::decode(r#"{"action":"start-parallel","cars":2.9,"laps":-1.5}"#),
            Command::StartParallel { cars: 2, laps: -1 }
        );
    }

    #[test]
    fn test_out_of_range_counts_pass_through() {
        assert_eq!(
            Command::decode(r#"{"action":"start-ring","sectors":0,"laps":-4}"#),
            Command::StartRing {
                sectors: 0,
                laps: -4
            }
        );
    }

    #[test]
    fn test_aliases() {
        for action in ["start-ring", "start_ring", "start_mpi"] {
            let text = format!(r#"{{"action":"{action}"}}"#);
            assert_eq!(Command::decode(&text).topic(), Some(Topic::Ring));
        }
        for action in ["start-parallel", "start_parallel", "start_openmp"] {
            let text = format!(r#"{{"action":"{action}"}}"#);
            assert_eq!(Command::decode(&text).topic(), Some(Topic::Parallel));
        }
    }

    #[test]
    fn test_stop() {
        assert_eq!(
            Command::decode(r#"{"action":"stop"}"#),
            Command::Stop { topic: None }
        );
        assert_eq!(
            Command::decode(r#"{"action":"stop","topic":"parallel"}"#),
            Command::Stop {
                topic: Some(Topic::Parallel)
            }
        );
        assert_eq!(
            Command::decode(r#"{"action":"stop","topic":"pit"}"#),
            Command::Stop { topic: None }
        );
    }

    #[test]
    fn test_unknown_and_malformed() {
        assert_eq!(
            Command::decode(r#"{"action":"warp"}"#),
            Command::Unknown {
                action: "warp".into()
            }
        );
        assert_eq!(
            Command::decode("not json"),
            Command::Unknown {
                action: String::new()
            }
        );
        assert_eq!(
            Command::decode("[1,2,3]"),
            Command::Unknown {
                action: String::new()
            }
        );
        assert_eq!(
            Command::decode(r#"{"sectors":3}"#),
            Command::Unknown {
                action: String::new()
            }
        );
    }
}
