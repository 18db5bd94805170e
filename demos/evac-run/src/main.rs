//! evac-run: command-line host for the tsim fleet simulator.
//!
//! Loads a scenario directory (`network.txt`, `edgecap.txt`, `demand.txt`,
//! optional `stopcap.txt`, `route.txt`, `fleet.txt`), picks a dispatch and a
//! vehicle strategy by name, runs the simulation, and writes the event log.
//!
//! ```text
//! evac-run --input demos/evac-run/data --dispatch demand-proportional --vehicle evacuation
//! RUST_LOG=tsim_sim=debug evac-run --input data --csv events.csv
//! ```

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tsim_core::{SimConfig, SimTime};
use tsim_network::{Fleet, InputFiles, Network, load_fleet, load_network};
use tsim_output::{CsvEventWriter, EventLogSink, Fanout, TextLogWriter};
use tsim_sim::{RunReport, SimBuilder, SimObserver, StopHandle};
use tsim_strategy::{DispatchKind, StrategyConfig, VehicleKind};

// ── Constants ─────────────────────────────────────────────────────────────────

/// Bound used when neither the flag nor the config file sets one.  Vehicles
/// on exhausted routes keep repeating by default, so a run needs an end.
const DEFAULT_UNTIL: f64 = 86_400.0;

/// Virtual time between progress lines.
const PROGRESS_EVERY: f64 = 3_600.0;

// ── Command line ──────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "evac-run")]
#[command(about = "Run a discrete-event fleet simulation and write its event log")]
struct Cli {
    /// Scenario directory holding the input text files.
    #[arg(short, long, default_value = "demos/evac-run/data")]
    input: PathBuf,

    /// Dispatch strategy: round-robin, demand-proportional.
    #[arg(short, long, default_value_t = DispatchKind::default())]
    dispatch: DispatchKind,

    /// Vehicle strategy: transit, evacuation.
    #[arg(short, long, default_value_t = VehicleKind::default())]
    vehicle: VehicleKind,

    /// Virtual-time bound; overrides the config file.
    #[arg(short, long)]
    until: Option<f64>,

    /// Rerouting seed; overrides the config file.
    #[arg(short, long)]
    seed: Option<u64>,

    /// JSON file with `sim` and `strategy` sections.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Text event log destination.
    #[arg(short, long, default_value = "event_log.txt")]
    log: PathBuf,

    /// Also write the event log as CSV.
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Also write the event log into an SQLite database.
    #[cfg(feature = "sqlite")]
    #[arg(long)]
    sqlite: Option<PathBuf>,

    /// Stop vehicles at their next trip boundary after this many wall-clock
    /// seconds.
    #[arg(long)]
    wall_limit: Option<u64>,
}

// ── Config file ───────────────────────────────────────────────────────────────

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct RunConfig {
    sim:      SimConfig,
    strategy: StrategyConfig,
}

fn load_config(path: Option<&Path>) -> Result<RunConfig> {
    let Some(path) = path else {
        return Ok(RunConfig::default());
    };
    let file = File::open(path).with_context(|| format!("opening config {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file)).with_context(|| format!("parsing config {}", path.display()))
}

// ── Progress observer ─────────────────────────────────────────────────────────

struct Progress {
    next:    f64,
    started: Instant,
}

impl Progress {
    fn new() -> Self {
        Self { next: PROGRESS_EVERY, started: Instant::now() }
    }
}

impl SimObserver for Progress {
    fn on_time_advance(&mut self, now: SimTime, network: &Network, fleet: &Fleet) {
        if now.0 < self.next {
            return;
        }
        let onboard: u64 = fleet.iter().map(|v| u64::from(v.onboard())).sum();
        info!(at = now.0, waiting = network.total_demand(), onboard, "progress");
        while self.next <= now.0 {
            self.next += PROGRESS_EVERY;
        }
    }

    fn on_sim_end(&mut self, report: &RunReport) {
        info!(wall_ms = self.started.elapsed().as_millis() as u64, steps = report.steps, "simulation finished");
    }
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let cli = Cli::parse();

    // 1. Configuration: file, then flag overrides.
    let RunConfig { sim: mut sim_config, strategy: mut strategy_config } = load_config(cli.config.as_deref())?;
    if let Some(seed) = cli.seed {
        strategy_config.seed = seed;
    }
    sim_config.until = cli.until.or(sim_config.until).or(Some(DEFAULT_UNTIL));

    // 2. Scenario inputs.
    let files = InputFiles::in_dir(&cli.input);
    let network = load_network(&files).with_context(|| format!("loading network from {}", cli.input.display()))?;
    let fleet = load_fleet(&files.fleet).with_context(|| format!("loading fleet from {}", files.fleet.display()))?;

    // 3. Strategies.
    let dispatch = cli.dispatch.build(&strategy_config)?;
    let factory = cli.vehicle.factory(&strategy_config)?;
    info!(dispatch = %cli.dispatch, vehicle = %cli.vehicle, "strategies selected");

    // 4. Event log writers.
    let mut writers = Fanout::new().with(
        TextLogWriter::create(&cli.log).with_context(|| format!("creating {}", cli.log.display()))?,
    );
    if let Some(path) = &cli.csv {
        writers = writers.with(CsvEventWriter::create(path).with_context(|| format!("creating {}", path.display()))?);
    }
    #[cfg(feature = "sqlite")]
    if let Some(path) = &cli.sqlite {
        writers = writers.with(
            tsim_output::SqliteEventWriter::new(path).with_context(|| format!("opening {}", path.display()))?,
        );
    }

    // 5. Optional wall-clock limit.
    let stop = StopHandle::new();
    if let Some(secs) = cli.wall_limit {
        let stop = stop.clone();
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_secs(secs));
            stop.request_stop();
        });
    }

    // 6. Build and run.
    let mut sim = SimBuilder::new(sim_config, network, fleet, dispatch, factory)
        .event_sink(EventLogSink::new(writers))
        .stop_handle(stop)
        .build()?;
    let report = sim.run(&mut Progress::new())?;

    let mut sink = sim.into_sink();
    sink.finish().context("writing the event log")?;

    // 7. Summary.
    println!("=== evac-run ===");
    println!("end time        {}", report.end_time);
    println!("truncated       {}", report.truncated);
    println!("events written  {}", sink.written());
    println!("demand          {} initial, {} remaining", report.initial_demand, report.remaining_demand);
    println!("passengers      {} drained, {} still on board", report.drained, report.onboard);
    println!("trips           {:?}", report.trips);
    println!("event log       {}", cli.log.display());
    Ok(())
}
