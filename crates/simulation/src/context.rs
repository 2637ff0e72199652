//! Cancellation-aware emission and pacing shared by every task of a run.

use pitlane_core::{CancellationToken, EventSink, Pacer, RunOutcome, SinkError};
use pitlane_types::{ConfigError, EventRecord, Topic};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Why a task stopped before finishing its work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Halt {
    Cancelled,
    SinkClosed,
    Failed(String),
}

impl Halt {
    /// Combine the halts of several tasks. The most informative reason wins;
    /// cancellation is usually a consequence of another task halting.
    pub(crate) fn merge(current: Option<Halt>, next: Halt) -> Halt {
        match (current, next) {
            (Some(Halt::Failed(reason)), _) | (_, Halt::Failed(reason)) => Halt::Failed(reason),
            (Some(Halt::SinkClosed), _) | (_, Halt::SinkClosed) => Halt::SinkClosed,
            _ => Halt::Cancelled,
        }
    }
}

impl From<SinkError> for Halt {
    fn from(_: SinkError) -> Self {
        Halt::SinkClosed
    }
}

/// Sink, pacer and cancellation token of one run (or one of its tasks).
#[derive(Debug, Clone)]
pub(crate) struct RunContext {
    topic: Topic,
    sink: EventSink,
    pacer: Arc<dyn Pacer>,
    cancel: CancellationToken,
}

impl RunContext {
    pub(crate) fn new(
        topic: Topic,
        sink: EventSink,
        pacer: Arc<dyn Pacer>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            topic,
            sink,
            pacer,
            cancel,
        }
    }

    /// A context for child tasks, cancelled with this one or on its own.
    pub(crate) fn child(&self) -> Self {
        Self {
            cancel: self.cancel.child_token(),
            ..self.clone()
        }
    }

    pub(crate) fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Submit a record unless the run has been cancelled.
    ///
    /// Waits under backpressure, but never past cancellation.
    pub(crate) async fn emit(&self, record: EventRecord) -> Result<(), Halt> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(Halt::Cancelled),
            result = self.sink.submit(record) => result.map_err(Halt::from),
        }
    }

    /// Submit a `log` record on this run's topic.
    pub(crate) async fn log(&self, text: String) -> Result<(), Halt> {
        self.emit(EventRecord::log(self.topic, text)).await
    }

    /// Pause for `duration` of paced time unless cancelled first.
    pub(crate) async fn pause(&self, duration: Duration) -> Result<(), Halt> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(Halt::Cancelled),
            _ = self.pacer.pause(duration) => Ok(()),
        }
    }

    /// Report a rejected configuration: one error log, then `done`.
    pub(crate) async fn reject(&self, err: ConfigError) -> RunOutcome {
        warn!(topic = %self.topic, error = %err, "Rejecting run configuration");
        let reported = async {
            self.log(format!("error: {err}")).await?;
            self.emit(EventRecord::done(
                self.topic,
                format!("{} run rejected", self.topic),
            ))
            .await
        };
        match reported.await {
            Ok(()) => RunOutcome::InvalidConfiguration,
            Err(halt) => self.outcome_of(halt).await,
        }
    }

    /// Map a halt to the run outcome, reporting failures to the observer.
    ///
    /// Cancelled and sink-closed runs stay silent; a failed run still gets
    /// an error log and a `done` record if the sink accepts them.
    pub(crate) async fn outcome_of(&self, halt: Halt) -> RunOutcome {
        match halt {
            Halt::Cancelled => {
                debug!(topic = %self.topic, "Run cancelled");
                RunOutcome::Cancelled
            }
            Halt::SinkClosed => {
                debug!(topic = %self.topic, "Event sink closed, abandoning run");
                RunOutcome::SinkClosed
            }
            Halt::Failed(reason) => {
                tracing::error!(topic = %self.topic, %reason, "Run failed");
                let _ = self.log(format!("internal error: {reason}")).await;
                let _ = self
                    .emit(EventRecord::done(self.topic, format!("{} run failed", self.topic)))
                    .await;
                RunOutcome::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pitlane_core::{event_channel, InstantPacer};

    fn context(capacity: usize) -> (RunContext, pitlane_core::EventStream) {
        let (sink, stream) = event_channel(capacity);
        let ctx = RunContext::new(
            Topic::Ring,
            sink,
            Arc::new(InstantPacer),
            CancellationToken::new(),
        );
        (ctx, stream)
    }

    #[test]
    fn test_merge_prefers_informative_halts() {
        assert_eq!(Halt::merge(None, Halt::Cancelled), Halt::Cancelled);
        assert_eq!(
            Halt::merge(Some(Halt::Cancelled), Halt::SinkClosed),
            Halt::SinkClosed
        );
        assert_eq!(
            Halt::merge(Some(Halt::SinkClosed), Halt::Cancelled),
            Halt::SinkClosed
        );
        assert_eq!(
            Halt::merge(Some(Halt::SinkClosed), Halt::Failed("boom".into())),
            Halt::Failed("boom".into())
        );
    }

    #[tokio::test]
    async fn test_emit_after_cancel_sends_nothing() {
        let (ctx, mut stream) = context(4);
        ctx.cancel_token().cancel();

        assert_eq!(ctx.log("late".into()).await, Err(Halt::Cancelled));
        drop(ctx);
        assert!(stream.next_event().await.is_none());
    }

    #[tokio::test]
    async fn test_cancel_releases_blocked_emit() {
        let (ctx, _stream) = context(1);
        ctx.log("fills the slot".into()).await.unwrap();

        let blocked = tokio::spawn({
            let ctx = ctx.clone();
            async move { ctx.log("waits for capacity".into()).await }
        });
        tokio::task::yield_now().await;
        ctx.cancel_token().cancel();

        assert_eq!(blocked.await.unwrap(), Err(Halt::Cancelled));
    }

    #[tokio::test]
    async fn test_child_is_cancelled_with_parent() {
        let (ctx, _stream) = context(1);
        let child = ctx.child();
        ctx.cancel_token().cancel();
        assert!(child.cancel_token().is_cancelled());
    }

    #[tokio::test]
    async fn test_closed_sink_halts() {
        let (ctx, mut stream) = context(1);
        stream.close();
        assert_eq!(ctx.log("nobody listens".into()).await, Err(Halt::SinkClosed));
    }
}
