//! Per-connection command dispatcher.

use crate::command::Command;
use crate::handle::RunHandle;
use pitlane_core::{CancellationToken, EventSink, RunOutcome, SimEnv, SinkError};
use pitlane_simulation::{ParallelWorkerSimulator, RingSimulator};
use pitlane_types::{EventRecord, RunId, Topic};
use thiserror::Error;
use tracing::{debug, info, info_span, Instrument};

/// Errors from dispatching a command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// The connection's event stream is gone; nothing can be reported.
    #[error(transparent)]
    Sink(#[from] SinkError),
}

/// Starts, tracks and cancels the simulation runs of one connection.
///
/// Every run gets a child of the dispatcher's cancellation token, so
/// cancelling the dispatcher (or dropping it) cancels every outstanding run.
pub struct CommandDispatcher {
    sink: EventSink,
    env: SimEnv,
    cancel: CancellationToken,
    runs: Vec<RunHandle>,
    next_id: RunId,
}

impl CommandDispatcher {
    pub fn new(sink: EventSink, env: SimEnv) -> Self {
        Self {
            sink,
            env,
            cancel: CancellationToken::new(),
            runs: Vec::new(),
            next_id: RunId(1),
        }
    }

    /// Tie this dispatcher's runs to an outer shutdown signal.
    pub fn with_shutdown(mut self, shutdown: &CancellationToken) -> Self {
        self.cancel = shutdown.child_token();
        self
    }

    /// Decode and dispatch one inbound text frame.
    pub async fn dispatch_text(&mut self, text: &str) -> Result<Option<RunId>, DispatchError> {
        self.dispatch(Command::decode(text)).await
    }

    /// Act on a command. Returns the id of the run it started, if any.
    pub async fn dispatch(&mut self, command: Command) -> Result<Option<RunId>, DispatchError> {
        self.reap();

        match command {
            Command::StartRing { sectors, laps } => {
                let simulator = RingSimulator::new(self.env.clone());
                let sink = self.sink.clone();
                Ok(Some(self.start(Topic::Ring, move |cancel| async move {
                    simulator.run(sectors, laps, sink, cancel).await
                })?))
            }
            Command::StartParallel { cars, laps } => {
                let simulator = ParallelWorkerSimulator::new(self.env.clone());
                let sink = self.sink.clone();
                Ok(Some(self.start(Topic::Parallel, move |cancel| async move {
                    simulator.run(cars, laps, sink, cancel).await
                })?))
            }
            Command::Stop { topic } => {
                let stopped = self.stop(topic).await;
                let text = match topic {
                    Some(topic) => format!("stopped {stopped} {topic} runs"),
                    None => format!("stopped {stopped} runs"),
                };
                self.sink.submit(EventRecord::untargeted(text)).await?;
                Ok(None)
            }
            Command::Unknown { action } => {
                debug!(%action, "Unrecognized command");
                let text = if action.is_empty() {
                    "unrecognized command".to_string()
                } else {
                    format!("unrecognized command: {action}")
                };
                self.sink.submit(EventRecord::untargeted(text)).await?;
                Ok(None)
            }
        }
    }

    fn start<F, Fut>(&mut self, topic: Topic, run: F) -> Result<RunId, DispatchError>
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: std::future::Future<Output = RunOutcome> + Send + 'static,
    {
        if self.sink.is_closed() {
            return Err(SinkError::Closed.into());
        }

        let id = self.next_id;
        self.next_id = id.next();
        let cancel = self.cancel.child_token();

        info!(run = %id, %topic, "Starting run");
        let span = info_span!("run", run = %id, %topic);
        let future = run(cancel.clone());
        let task = tokio::spawn(
            async move {
                let outcome = future.await;
                debug!(%outcome, "Run ended");
                outcome
            }
            .instrument(span),
        );

        self.runs.push(RunHandle::new(id, topic, cancel, task));
        Ok(id)
    }

    /// Cancel outstanding runs (of `topic`, or all) and wait for them.
    ///
    /// Returns how many runs were still outstanding.
    pub async fn stop(&mut self, topic: Option<Topic>) -> usize {
        let (stopping, keep): (Vec<_>, Vec<_>) = std::mem::take(&mut self.runs)
            .into_iter()
            .partition(|run| topic.map_or(true, |t| run.topic() == t));
        self.runs = keep;

        let mut stopped = 0;
        for run in stopping {
            if run.is_finished() {
                continue;
            }
            run.cancel();
            let id = run.id();
            let outcome = run.join().await;
            debug!(run = %id, %outcome, "Run stopped");
            stopped += 1;
        }
        stopped
    }

    /// Cancel every outstanding run and wait for all of them to unwind.
    pub async fn shutdown(&mut self) -> Vec<(RunId, RunOutcome)> {
        self.cancel.cancel();
        let mut outcomes = Vec::with_capacity(self.runs.len());
        for run in self.runs.drain(..) {
            let id = run.id();
            outcomes.push((id, run.join().await));
        }
        info!(runs = outcomes.len(), "Dispatcher shut down");
        outcomes
    }

    /// Runs that have not finished yet.
    pub fn outstanding(&self) -> usize {
        self.runs.iter().filter(|run| !run.is_finished()).count()
    }

    fn reap(&mut self) {
        self.runs.retain(|run| !run.is_finished());
    }
}

impl Drop for CommandDispatcher {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
