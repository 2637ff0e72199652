//! Test helpers shared across Pitlane crates.
//!
//! - [`ScriptedTiming`]: a timing source that replays fixed durations per unit
//! - [`collect_events`] and friends: drain an event stream and slice it up

mod events;
mod timing;

pub use events::{collect_events, count_prefixed, done_records, instant_env, summaries, texts};
pub use timing::ScriptedTiming;
