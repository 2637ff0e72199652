//! Handle to one outstanding simulation run.

use pitlane_core::{CancellationToken, RunOutcome};
use pitlane_types::{RunId, Topic};
use tokio::task::JoinHandle;
use tracing::error;

/// A run started by a dispatcher: its identity, its cancellation token and
/// the task that will report its outcome.
#[derive(Debug)]
pub struct RunHandle {
    id: RunId,
    topic: Topic,
    cancel: CancellationToken,
    task: JoinHandle<RunOutcome>,
}

impl RunHandle {
    pub(crate) fn new(
        id: RunId,
        topic: Topic,
        cancel: CancellationToken,
        task: JoinHandle<RunOutcome>,
    ) -> Self {
        Self {
            id,
            topic,
            cancel,
            task,
        }
    }

    pub fn id(&self) -> RunId {
        self.id
    }

    pub fn topic(&self) -> Topic {
        self.topic
    }

    /// Signal the run to stop. Its tasks unwind at their next suspension
    /// point and emit nothing further.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the run to end.
    pub async fn join(self) -> RunOutcome {
        match self.task.await {
            Ok(outcome) => outcome,
            Err(err) if err.is_cancelled() => RunOutcome::Cancelled,
            Err(err) => {
                error!(run = %self.id, topic = %self.topic, error = %err, "Run task panicked");
                RunOutcome::Failed
            }
        }
    }
}
