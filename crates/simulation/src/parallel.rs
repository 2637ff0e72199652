//! Parallel worker simulation.
//!
//! N workers run concurrently and interleave freely. Each keeps its running
//! best private, writes it once into the [`SharedResultTable`] when its
//! trials are done, and the aggregate is only read after every worker has
//! joined.

use crate::aggregate::ResultAggregator;
use crate::context::{Halt, RunContext};
use crate::table::SharedResultTable;
use pitlane_core::{CancellationToken, EventSink, RunOutcome, SimEnv, TimingStream};
use pitlane_types::{
    EventRecord, LapTime, RunConfig, Summary, Topic, WorkerId, WorkerResult, TRIAL_TIME_RANGE,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{debug, info, instrument};

/// Runs N independent workers and aggregates their best trials.
#[derive(Debug, Clone)]
pub struct ParallelWorkerSimulator {
    env: SimEnv,
}

impl ParallelWorkerSimulator {
    pub fn new(env: SimEnv) -> Self {
        Self { env }
    }

    /// Run `workers` workers with `trials` trials each.
    ///
    /// `workers < 1` is reported as an error log plus `done` without spawning
    /// anything; `trials < 1` runs one trial. Emits a start record, the trial
    /// records of all workers in arrival order, one summary and one `done`.
    #[instrument(skip(self, sink, cancel))]
    pub async fn run(
        &self,
        workers: i64,
        trials: i64,
        sink: EventSink,
        cancel: CancellationToken,
    ) -> RunOutcome {
        let ctx = RunContext::new(Topic::Parallel, sink, Arc::clone(&self.env.pacer), cancel);

        let config = match RunConfig::validate("cars", workers, trials) {
            Ok(config) => config,
            Err(err) => return ctx.reject(err).await,
        };
        if trials < 1 {
            debug!(trials, "Coercing trial count to 1");
        }

        match self.run_validated(&ctx, config).await {
            Ok(()) => RunOutcome::Completed,
            Err(halt) => ctx.outcome_of(halt).await,
        }
    }

    async fn run_validated(&self, ctx: &RunContext, config: RunConfig) -> Result<(), Halt> {
        let workers = config.units();
        let trials = config.repetitions();

        info!(workers, trials, "Starting parallel run");
        ctx.log(format!(
            "parallel run: {workers} workers, {trials} trials each"
        ))
        .await?;

        let table = Arc::new(SharedResultTable::new(workers as usize));
        let worker_ctx = ctx.child();
        let mut tasks = JoinSet::new();

        for index in 0..workers as usize {
            let id = WorkerId::from_index(index);
            let worker = Worker {
                id,
                trials,
                delay: self.env.pacing.trial_delay,
                timing: self.env.timing.stream(Topic::Parallel, id.0),
                table: Arc::clone(&table),
                ctx: worker_ctx.clone(),
            };
            tasks.spawn(worker.run());
        }

        // Join barrier: every worker finishes (or halts) before the table is read.
        let mut halt = None;
        while let Some(joined) = tasks.join_next().await {
            let worker_halt = match joined {
                Ok(Ok(())) => continue,
                Ok(Err(halt)) => halt,
                Err(err) if err.is_panic() => Halt::Failed(format!("worker panicked: {err}")),
                Err(_) => Halt::Cancelled,
            };
            // One worker halting stops the rest.
            worker_ctx.cancel_token().cancel();
            halt = Some(Halt::merge(halt, worker_halt));
        }
        if let Some(halt) = halt {
            return Err(halt);
        }

        let completed = SharedResultTable::into_completed(table)
            .map_err(|err| Halt::Failed(err.to_string()))?;
        let summary = ResultAggregator::summarize(completed)
            .ok_or_else(|| Halt::Failed("no worker results".to_string()))?;

        info!(
            best_worker = %summary.best_overall.worker_id,
            best_time = %summary.best_overall.best_time,
            "Parallel run finished"
        );

        ctx.emit(EventRecord::summary(Summary::Parallel(summary))).await?;
        ctx.emit(EventRecord::done(Topic::Parallel, "parallel run finished"))
            .await
    }
}

/// One worker task. Owns its timing stream and its running best.
struct Worker {
    id: WorkerId,
    trials: u32,
    delay: Duration,
    timing: Box<dyn TimingStream>,
    table: Arc<SharedResultTable>,
    ctx: RunContext,
}

impl Worker {
    async fn run(mut self) -> Result<(), Halt> {
        let mut best: Option<LapTime> = None;

        for trial in 1..=self.trials {
            let time = self.timing.draw(&TRIAL_TIME_RANGE);
            self.ctx.pause(self.delay).await?;
            self.ctx
                .log(format!("worker {} trial {trial}: {time}", self.id))
                .await?;

            if best.map_or(true, |current| time < current) {
                best = Some(time);
                self.ctx
                    .log(format!("worker {} new best: {time}", self.id))
                    .await?;
            }
        }

        let best_time =
            best.ok_or_else(|| Halt::Failed(format!("worker {} ran no trials", self.id)))?;
        self.table
            .record(WorkerResult {
                worker_id: self.id,
                best_time,
                trial_count: self.trials,
            })
            .map_err(|err| Halt::Failed(err.to_string()))?;

        debug!(worker = %self.id, %best_time, "Worker recorded result");
        Ok(())
    }
}
