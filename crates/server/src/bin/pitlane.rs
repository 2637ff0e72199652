//! Pitlane CLI
//!
//! Serves the observer page, or runs a single simulation locally and prints
//! its events as JSON lines.
//!
//! ```text
//! pitlane serve --config pitlane.toml --bind 127.0.0.1:8080
//! pitlane ring --sectors 5 --laps 3 --seed 42
//! pitlane parallel --cars 4 --laps 5 --instant
//! ```

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use pitlane_core::{event_channel, CancellationToken, InstantPacer, RunOutcome, SimEnv};
use pitlane_dispatch::{
    DEFAULT_PARALLEL_CARS, DEFAULT_PARALLEL_LAPS, DEFAULT_RING_LAPS, DEFAULT_RING_SECTORS,
};
use pitlane_server::ServerConfig;
use pitlane_simulation::{ParallelWorkerSimulator, RingSimulator};
use std::io::Write;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pitlane")]
#[command(about = "Ring relay and parallel worker simulations, streamed live")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the observer page and the WebSocket endpoint
    Serve {
        /// Path to configuration file (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Address to listen on (overrides config)
        #[arg(long)]
        bind: Option<SocketAddr>,

        /// Event conduit capacity per connection (overrides config)
        #[arg(long)]
        sink_capacity: Option<usize>,

        /// Transit time per ring sector, e.g. "300ms" (overrides config)
        #[arg(long)]
        sector_delay: Option<humantime::Duration>,

        /// Time per parallel trial, e.g. "200ms" (overrides config)
        #[arg(long)]
        trial_delay: Option<humantime::Duration>,

        /// Seed for reproducible durations (overrides config)
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Run one ring simulation and print its events
    Ring {
        /// Number of stages in the ring
        #[arg(long, default_value_t = DEFAULT_RING_SECTORS, allow_negative_numbers = true)]
        sectors: i64,

        /// Number of laps
        #[arg(long, default_value_t = DEFAULT_RING_LAPS, allow_negative_numbers = true)]
        laps: i64,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Run one parallel worker simulation and print its events
    Parallel {
        /// Number of workers
        #[arg(long, default_value_t = DEFAULT_PARALLEL_CARS, allow_negative_numbers = true)]
        cars: i64,

        /// Trials per worker
        #[arg(long, default_value_t = DEFAULT_PARALLEL_LAPS, allow_negative_numbers = true)]
        laps: i64,

        #[command(flatten)]
        run: RunArgs,
    },
}

#[derive(clap::Args)]
struct RunArgs {
    /// Seed for reproducible durations
    #[arg(long)]
    seed: Option<u64>,

    /// Skip real-time pacing
    #[arg(long)]
    instant: bool,

    /// Log filter for stderr (overrides RUST_LOG)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

impl RunArgs {
    fn sim_env(&self) -> SimEnv {
        match (self.seed, self.instant) {
            (Some(seed), true) => SimEnv::instant(seed),
            (Some(seed), false) => SimEnv::seeded(seed),
            (None, true) => SimEnv::realtime().with_pacer(Arc::new(InstantPacer)),
            (None, false) => SimEnv::realtime(),
        }
    }
}

fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Cancel `token` on Ctrl-C.
fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl-C, shutting down");
            token.cancel();
        }
    });
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            config,
            bind,
            sink_capacity,
            sector_delay,
            trial_delay,
            seed,
        } => {
            let mut server_config = match &config {
                Some(path) => ServerConfig::load(path)
                    .with_context(|| format!("loading {}", path.display()))?,
                None => ServerConfig::default(),
            };
            if let Some(bind) = bind {
                server_config = server_config.with_bind(bind);
            }
            if let Some(capacity) = sink_capacity {
                server_config = server_config.with_sink_capacity(capacity);
            }
            if let Some(delay) = sector_delay {
                server_config = server_config.with_sector_delay(*delay);
            }
            if let Some(delay) = trial_delay {
                server_config = server_config.with_trial_delay(*delay);
            }
            if let Some(seed) = seed {
                server_config = server_config.with_seed(seed);
            }

            init_tracing(&server_config.log_filter);

            let shutdown = CancellationToken::new();
            cancel_on_ctrl_c(shutdown.clone());
            pitlane_server::serve(&server_config, shutdown).await?;
        }

        Commands::Ring { sectors, laps, run } => {
            init_tracing(&run.log_level);
            let simulator = RingSimulator::new(run.sim_env());
            let outcome = run_local(|sink, cancel| async move {
                simulator.run(sectors, laps, sink, cancel).await
            })
            .await?;
            report(outcome)?;
        }

        Commands::Parallel { cars, laps, run } => {
            init_tracing(&run.log_level);
            let simulator = ParallelWorkerSimulator::new(run.sim_env());
            let outcome = run_local(|sink, cancel| async move {
                simulator.run(cars, laps, sink, cancel).await
            })
            .await?;
            report(outcome)?;
        }
    }

    Ok(())
}

/// Run one simulation and print every event as a JSON line on stdout.
async fn run_local<F, Fut>(start: F) -> Result<RunOutcome>
where
    F: FnOnce(pitlane_core::EventSink, CancellationToken) -> Fut,
    Fut: std::future::Future<Output = RunOutcome> + Send + 'static,
{
    let (sink, mut stream) = event_channel(pitlane_core::DEFAULT_SINK_CAPACITY);
    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(cancel.clone());

    let task = tokio::spawn(start(sink, cancel));

    let mut stdout = std::io::stdout().lock();
    while let Some(record) = stream.next_event().await {
        let line = serde_json::to_string(&record)?;
        writeln!(stdout, "{line}")?;
    }
    drop(stdout);

    Ok(task.await?)
}

fn report(outcome: RunOutcome) -> Result<()> {
    match outcome {
        RunOutcome::Completed => Ok(()),
        RunOutcome::Cancelled => {
            warn!("Run cancelled");
            Ok(())
        }
        other => bail!("run ended: {other}"),
    }
}
