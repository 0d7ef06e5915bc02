//! duel — two factions harvesting from one shared resource pool.
//!
//! Blue and Red each run a hub with a ring of docking slots and a small crew
//! of agents.  Resources spawn on a timer inside a square field between the
//! hubs; whoever reserves a node first gets to harvest it.  At the end the
//! scoreboard shows each faction's store.
//!
//! ```text
//! duel --ticks 2400 --population 5 --output output/duel
//! RUST_LOG=debug duel --config duel.json --hubs hubs.csv
//! ```

use std::fs::File;
use std::io::{BufReader, Cursor};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use hv_core::{SimConfig, SimTime, Tick, Vec3};
use hv_motion::LinearMotionFactory;
use hv_output::{CsvWriter, SimOutputObserver};
use hv_sim::{load_hubs_csv, load_hubs_reader, AgentSnapshot, HubScore, SimBuilder, SimObserver, TickSummary};
use hv_spatial::OpenGround;

#[cfg(feature = "sqlite")]
use hv_output::SqliteWriter;

// ── Defaults ──────────────────────────────────────────────────────────────────

/// Half side of the walkable field.  Hubs and the spawn region sit inside it.
const FIELD_HALF_EXTENT: f32 = 14.0;

const HUBS_CSV: &str = "\
faction,x,z,slots,radius\n\
Blue,-10,0,8,1.5\n\
Red,10,0,8,1.5\n\
";

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "duel")]
#[command(about = "Two hubs compete for a shared, replenishing resource pool")]
struct Cli {
    /// JSON simulation config; missing fields take their defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Hub layout CSV (faction,x,z,slots,radius)
    #[arg(long)]
    hubs: Option<PathBuf>,

    /// Ticks to simulate (overrides the config)
    #[arg(long)]
    ticks: Option<u64>,

    /// Master RNG seed (overrides the config)
    #[arg(long)]
    seed: Option<u64>,

    /// Agents per hub, clamped to 1..=10
    #[arg(long)]
    population: Option<usize>,

    /// Seconds between resource spawns
    #[arg(long)]
    spawn_interval: Option<f32>,

    /// Agent travel speed in units per second
    #[arg(long)]
    speed: Option<f32>,

    /// Planning latency of the movement layer, in ticks
    #[arg(long, default_value = "2")]
    latency: u32,

    /// Include path corners in snapshots
    #[arg(long)]
    show_paths: bool,

    /// Output directory for CSV files
    #[arg(long, default_value = "output/duel")]
    output: PathBuf,

    /// Also write output.db (requires the `sqlite` feature)
    #[arg(long)]
    sqlite: bool,

    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(long, short)]
    verbose: bool,
}

// ── Observer ──────────────────────────────────────────────────────────────────

/// Fans out to the CSV writer (and the SQLite writer when enabled), keeps
/// run totals and logs the score at every snapshot.
struct DuelObserver {
    csv:        SimOutputObserver<CsvWriter>,
    #[cfg(feature = "sqlite")]
    db:         Option<SimOutputObserver<SqliteWriter>>,
    deliveries: u64,
    fallbacks:  u64,
    watchdog:   u64,
}

impl DuelObserver {
    fn new(csv: SimOutputObserver<CsvWriter>) -> Self {
        Self {
            csv,
            #[cfg(feature = "sqlite")]
            db: None,
            deliveries: 0,
            fallbacks:  0,
            watchdog:   0,
        }
    }

    fn each(&mut self, mut f: impl FnMut(&mut dyn SimObserver)) {
        f(&mut self.csv);
        #[cfg(feature = "sqlite")]
        if let Some(db) = &mut self.db {
            f(db);
        }
    }

    fn report_errors(&mut self) {
        if let Some(e) = self.csv.take_error() {
            warn!(error = %e, "CSV output error");
        }
        #[cfg(feature = "sqlite")]
        if let Some(e) = self.db.as_mut().and_then(|db| db.take_error()) {
            warn!(error = %e, "SQLite output error");
        }
    }
}

impl SimObserver for DuelObserver {
    fn on_tick_end(&mut self, summary: &TickSummary) {
        self.deliveries += summary.deliveries as u64;
        self.fallbacks += summary.slot_fallbacks as u64;
        self.watchdog += summary.watchdog_retargets as u64;
        self.each(|o| o.on_tick_end(summary));
    }

    fn on_snapshot(&mut self, tick: Tick, time: SimTime, agents: &[AgentSnapshot], hubs: &[HubScore]) {
        let score: Vec<String> = hubs.iter().map(|h| format!("{}={}", h.faction, h.store)).collect();
        info!(%tick, %time, score = %score.join(" "), "snapshot");
        self.each(|o| o.on_snapshot(tick, time, agents, hubs));
    }

    fn on_sim_end(&mut self, final_tick: Tick) {
        self.each(|o| o.on_sim_end(final_tick));
    }
}

// ── main ──────────────────────────────────────────────────────────────────────

fn load_config(path: Option<&Path>) -> Result<SimConfig> {
    let Some(path) = path else {
        return Ok(SimConfig::default());
    };
    let file = File::open(path).with_context(|| format!("opening config {}", path.display()))?;
    let config = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing config {}", path.display()))?;
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // 1. Config, with CLI overrides.
    let mut config = load_config(cli.config.as_deref())?;
    if let Some(ticks) = cli.ticks {
        config.total_ticks = ticks;
    }
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }

    // 2. Hubs.
    let hubs = match &cli.hubs {
        Some(path) => load_hubs_csv(path).with_context(|| format!("loading hubs {}", path.display()))?,
        None => load_hubs_reader(Cursor::new(HUBS_CSV))?,
    };
    info!(hubs = hubs.len(), ticks = config.total_ticks, seed = config.seed, "starting duel");

    // 3. Build sim.
    let field = OpenGround::centered(Vec3::ZERO, FIELD_HALF_EXTENT)?;
    let factory = LinearMotionFactory { latency_ticks: cli.latency, ..LinearMotionFactory::default() };
    let mut sim = SimBuilder::new(config, factory).hubs(hubs).surface(field).build()?;

    // 4. Tuning surface.
    if let Some(n) = cli.population {
        let applied = sim.set_population_per_hub(n);
        if applied != n {
            warn!(requested = n, applied, "population clamped");
        }
    }
    if let Some(secs) = cli.spawn_interval {
        sim.set_spawn_interval(secs);
    }
    if let Some(speed) = cli.speed {
        sim.set_agent_speed(speed)?;
    }
    sim.set_path_visualization(cli.show_paths);

    // 5. Output.
    std::fs::create_dir_all(&cli.output)
        .with_context(|| format!("creating {}", cli.output.display()))?;
    let mut obs = DuelObserver::new(SimOutputObserver::new(CsvWriter::new(&cli.output)?));
    if cli.sqlite {
        attach_sqlite(&mut obs, &cli.output)?;
    }

    // 6. Run.
    let t0 = Instant::now();
    sim.run(&mut obs)?;
    let elapsed = t0.elapsed();
    obs.report_errors();

    // 7. Scoreboard.
    println!();
    println!("Simulated {} in {:.3} s", sim.now(), elapsed.as_secs_f64());
    println!(
        "  deliveries: {}  slot fallbacks: {}  watchdog retargets: {}",
        obs.deliveries, obs.fallbacks, obs.watchdog
    );
    println!();
    println!("{:<6} {:<10} {:>8} {:>8}", "Hub", "Faction", "Store", "Agents");
    println!("{}", "-".repeat(35));
    for score in sim.scoreboard() {
        println!("{:<6} {:<10} {:>8} {:>8}", score.id.0, score.faction, score.store, score.agents);
    }
    Ok(())
}

#[cfg(feature = "sqlite")]
fn attach_sqlite(obs: &mut DuelObserver, dir: &Path) -> Result<()> {
    obs.db = Some(SimOutputObserver::new(SqliteWriter::new(dir)?));
    Ok(())
}

#[cfg(not(feature = "sqlite"))]
fn attach_sqlite(_obs: &mut DuelObserver, _dir: &Path) -> Result<()> {
    warn!("built without the `sqlite` feature; skipping output.db");
    Ok(())
}
