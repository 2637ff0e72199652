//! Pacing of simulated work in real time.
//!
//! The simulators pause between steps so a human watching the stream can
//! follow along. Pauses go through [`Pacer`] so tests run instantly.

use async_trait::async_trait;
use std::fmt::Debug;
use std::time::Duration;

/// Provider trait for pauses between simulated steps.
///
/// Pauses are blocking-but-yielding: the calling task is suspended, never
/// busy-waits. Callers race the pause against their cancellation token.
#[async_trait]
pub trait Pacer: Debug + Send + Sync {
    /// Suspend the calling task for `duration` of paced time.
    async fn pause(&self, duration: Duration);
}

/// Real pacing on tokio's timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioPacer;

#[async_trait]
impl Pacer for TokioPacer {
    async fn pause(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// No pacing: yields to the scheduler and returns immediately.
#[derive(Debug, Clone, Copy, Default)]
pub struct InstantPacer;

#[async_trait]
impl Pacer for InstantPacer {
    async fn pause(&self, _duration: Duration) {
        tokio::task::yield_now().await;
    }
}
