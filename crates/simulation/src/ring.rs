//! Ring relay simulation.
//!
//! K stage tasks are linked by single-slot conduits into a cycle that closes
//! through the coordinator. The coordinator injects the token at stage 1 once
//! per lap and waits for it to come home from stage K before starting the
//! next lap, so exactly one token is in flight and stages are visited in
//! strictly increasing order.
//!
//! Shutdown is structural: once the last lap is home the coordinator drops
//! the entry conduit, each stage sees its inbound conduit close, reports its
//! best sector and drops its outbound conduit in turn.

use crate::context::{Halt, RunContext};
use pitlane_core::{CancellationToken, EventSink, RunOutcome, SimEnv, TimingStream};
use pitlane_types::{
    EventRecord, LapRecord, LapTime, RingSummary, RunConfig, SectorRecord, StageId, Summary,
    Topic, SECTOR_TIME_RANGE,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, trace};

/// The unit of work circulating the ring. Moved from stage to stage, never
/// copied.
#[derive(Debug)]
struct Token {
    lap: u32,
    /// Last stage that processed the token.
    sector: StageId,
    /// Sum of the sector times of the current lap.
    elapsed: LapTime,
}

/// Drives a ring of stages that relay one token lap after lap.
#[derive(Debug, Clone)]
pub struct RingSimulator {
    env: SimEnv,
}

impl RingSimulator {
    pub fn new(env: SimEnv) -> Self {
        Self { env }
    }

    /// Run a ring of `sectors` stages for `laps` laps.
    ///
    /// `sectors < 1` is reported as an error log plus `done` and no stage is
    /// created; `laps < 1` runs one lap. Emits a start record, one record per
    /// stage visit, one summary and one `done`.
    #[instrument(skip(self, sink, cancel))]
    pub async fn run(
        &self,
        sectors: i64,
        laps: i64,
        sink: EventSink,
        cancel: CancellationToken,
    ) -> RunOutcome {
        let ctx = RunContext::new(Topic::Ring, sink, Arc::clone(&self.env.pacer), cancel);

        let config = match RunConfig::validate("sectors", sectors, laps) {
            Ok(config) => config,
            Err(err) => return ctx.reject(err).await,
        };
        if laps < 1 {
            debug!(laps, "Coercing lap count to 1");
        }

        match self.run_validated(&ctx, config).await {
            Ok(()) => RunOutcome::Completed,
            Err(halt) => ctx.outcome_of(halt).await,
        }
    }

    async fn run_validated(&self, ctx: &RunContext, config: RunConfig) -> Result<(), Halt> {
        let sectors = config.units();
        let laps = config.repetitions();

        info!(sectors, laps, "Starting ring run");
        ctx.log(format!("ring run: {sectors} sectors, {laps} laps"))
            .await?;

        let ring_ctx = ctx.child();
        let (entry, mut home, stages) = self.build_ring(&ring_ctx, sectors);

        let relayed = relay_laps(&ring_ctx, entry, &mut home, sectors, laps).await;
        if relayed.is_err() {
            ring_ctx.cancel_token().cancel();
        }
        let joined = join_stages(stages).await;

        let (lap_times, best_sectors) = match (relayed, joined) {
            (Ok(lap_times), Ok(best_sectors)) => (lap_times, best_sectors),
            (Err(halt), Err(stage_halt)) => return Err(Halt::merge(Some(halt), stage_halt)),
            (Err(halt), Ok(_)) | (Ok(_), Err(halt)) => return Err(halt),
        };

        let fastest_lap = lap_times
            .iter()
            .min_by_key(|record| (record.time, record.lap))
            .copied()
            .ok_or_else(|| Halt::Failed("ring finished without laps".to_string()))?;

        info!(
            fastest_lap = fastest_lap.lap,
            time = %fastest_lap.time,
            "Ring run finished"
        );

        let summary = RingSummary {
            sectors,
            laps,
            lap_times,
            fastest_lap,
            best_sectors,
        };
        ctx.emit(EventRecord::summary(Summary::Ring(summary))).await?;
        ctx.emit(EventRecord::done(Topic::Ring, "ring run finished"))
            .await
    }

    /// Spawn the stages and wire them into a cycle.
    ///
    /// Returns the conduit into stage 1, the conduit out of stage K and the
    /// stage handles in stage order.
    fn build_ring(
        &self,
        ctx: &RunContext,
        sectors: u32,
    ) -> (
        mpsc::Sender<Token>,
        mpsc::Receiver<Token>,
        Vec<JoinHandle<Result<SectorRecord, Halt>>>,
    ) {
        let (entry, mut inbound) = mpsc::channel::<Token>(1);
        let mut stages = Vec::new();

        for sector in 1..=sectors {
            let (outbound, next_inbound) = mpsc::channel::<Token>(1);
            let id = StageId(sector);
            let stage = Stage {
                id,
                delay: self.env.pacing.sector_delay,
                timing: self.env.timing.stream(Topic::Ring, sector),
                inbound,
                outbound,
                ctx: ctx.clone(),
            };
            stages.push(tokio::spawn(stage.run()));
            inbound = next_inbound;
        }

        (entry, inbound, stages)
    }
}

/// Inject one token per lap and wait for it to come home.
async fn relay_laps(
    ctx: &RunContext,
    entry: mpsc::Sender<Token>,
    home: &mut mpsc::Receiver<Token>,
    sectors: u32,
    laps: u32,
) -> Result<Vec<LapRecord>, Halt> {
    let last = StageId(sectors);
    let mut lap_times = Vec::new();

    for lap in 1..=laps {
        debug!(lap, "Lap started");
        let token = Token {
            lap,
            sector: last,
            elapsed: LapTime::ZERO,
        };
        tokio::select! {
            biased;
            _ = ctx.cancel_token().cancelled() => return Err(Halt::Cancelled),
            sent = entry.send(token) => sent.map_err(|_| Halt::Cancelled)?,
        }

        let token = tokio::select! {
            biased;
            _ = ctx.cancel_token().cancelled() => return Err(Halt::Cancelled),
            // A closed home conduit means a stage stopped early; the stage
            // results say why.
            token = home.recv() => token.ok_or(Halt::Cancelled)?,
        };

        if token.lap != lap || token.sector != last {
            return Err(Halt::Failed(format!(
                "token came home as lap {} from sector {}, expected lap {lap} from sector {last}",
                token.lap, token.sector
            )));
        }
        debug!(lap, time = %token.elapsed, "Lap completed");
        lap_times.push(LapRecord {
            lap,
            time: token.elapsed,
        });
    }

    // Closing the entry conduit shuts the ring down stage by stage.
    drop(entry);
    Ok(lap_times)
}

/// Join every stage in stage order and collect their best sectors.
async fn join_stages(
    stages: Vec<JoinHandle<Result<SectorRecord, Halt>>>,
) -> Result<Vec<SectorRecord>, Halt> {
    let mut best_sectors = Vec::with_capacity(stages.len());
    let mut halt = None;

    for (index, stage) in stages.into_iter().enumerate() {
        let stage_halt = match stage.await {
            Ok(Ok(record)) => {
                best_sectors.push(record);
                continue;
            }
            Ok(Err(halt)) => halt,
            Err(err) if err.is_panic() => {
                Halt::Failed(format!("stage {} panicked: {err}", index + 1))
            }
            Err(_) => Halt::Cancelled,
        };
        halt = Some(Halt::merge(halt, stage_halt));
    }

    match halt {
        Some(halt) => Err(halt),
        None => Ok(best_sectors),
    }
}

/// One position in the ring.
struct Stage {
    id: StageId,
    delay: Duration,
    timing: Box<dyn TimingStream>,
    inbound: mpsc::Receiver<Token>,
    outbound: mpsc::Sender<Token>,
    ctx: RunContext,
}

impl Stage {
    /// Process tokens until the inbound conduit closes, then report the best
    /// sector this stage produced.
    async fn run(mut self) -> Result<SectorRecord, Halt> {
        let mut best: Option<SectorRecord> = None;

        loop {
            let mut token = tokio::select! {
                biased;
                _ = self.ctx.cancel_token().cancelled() => return Err(Halt::Cancelled),
                token = self.inbound.recv() => match token {
                    Some(token) => token,
                    None => break,
                },
            };

            let time = self.timing.draw(&SECTOR_TIME_RANGE);
            self.ctx.pause(self.delay).await?;
            self.ctx
                .log(format!("sector {} time {time} (lap {})", self.id, token.lap))
                .await?;
            trace!(stage = %self.id, lap = token.lap, %time, "Sector done");

            if best.map_or(true, |current| time < current.time) {
                best = Some(SectorRecord {
                    sector: self.id,
                    lap: token.lap,
                    time,
                });
            }
            token.sector = self.id;
            token.elapsed = token.elapsed + time;

            tokio::select! {
                biased;
                _ = self.ctx.cancel_token().cancelled() => return Err(Halt::Cancelled),
                // The next stage only goes away when the ring is halting.
                sent = self.outbound.send(token) => sent.map_err(|_| Halt::Cancelled)?,
            }
        }

        // Every lap visits every stage, so an inbound conduit that closes
        // before the first token means an upstream stage halted.
        best.ok_or(Halt::Cancelled)
    }
}
