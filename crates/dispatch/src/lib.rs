//! Command dispatch for Pitlane.
//!
//! Inbound commands are decoded once at the boundary into [`Command`]. The
//! [`CommandDispatcher`] of a connection starts each simulation run as an
//! independent task, tracks it through a [`RunHandle`] and cancels
//! outstanding runs on `stop` or when the connection goes away.

mod command;
mod dispatcher;
mod handle;

pub use command::{
    Command, DEFAULT_PARALLEL_CARS, DEFAULT_PARALLEL_LAPS, DEFAULT_RING_LAPS, DEFAULT_RING_SECTORS,
};
pub use dispatcher::{CommandDispatcher, DispatchError};
pub use handle::RunHandle;
