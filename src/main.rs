//! Maze runner entry point
//!
//! Headless driver: steps the level at a fixed frame rate and lets a decision
//! service steer the agent through the state/action bridge.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use clap::Parser;

use maze_runner::bridge::{DecisionService, HttpDecisionService, ResponseOrdering};
use maze_runner::policy::RandomPolicy;
use maze_runner::sim::{HazardCollisionPolicy, Level, Rules, SimEvent};
use maze_runner::{Bridge, PlayMode, Settings, SimulationWorld, tick};

#[derive(Parser, Debug)]
#[command(name = "maze-runner", about = "Tile maze with an external decision service")]
struct Cli {
    /// JSON settings file; missing fields take their defaults
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Write the effective settings to this path and exit
    #[arg(long)]
    write_settings: Option<PathBuf>,

    /// Frames to run; 0 runs until interrupted
    #[arg(long, default_value_t = 0)]
    frames: u64,

    /// Stop after this many goals
    #[arg(long)]
    wins: Option<u32>,

    /// human, replay or policy
    #[arg(long)]
    mode: Option<String>,

    /// Decision service root, e.g. http://localhost:5000
    #[arg(long)]
    base_url: Option<String>,

    /// Minimum milliseconds between state exports
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Per-request deadline in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Apply replies in arrival order instead of dropping stale ones
    #[arg(long)]
    last_write_wins: bool,

    /// Hazards kill the agent on contact
    #[arg(long)]
    kill_on_contact: bool,

    /// Seed for the offline random policy
    #[arg(long)]
    seed: Option<u64>,

    /// Step as fast as possible instead of pacing to the frame rate
    #[arg(long)]
    unpaced: bool,

    /// Run without exporting state
    #[arg(long)]
    no_bridge: bool,
}

/// Settings file first, then command-line overrides
fn build_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = match &cli.settings {
        Some(path) => Settings::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => Settings::default(),
    };

    if let Some(mode) = &cli.mode {
        match PlayMode::from_str(mode) {
            Some(mode) => settings.mode = mode,
            None => bail!("unknown mode {mode:?}; expected human, replay or policy"),
        }
    }
    if let Some(url) = &cli.base_url {
        settings.bridge.base_url = Some(url.clone());
    }
    if let Some(ms) = cli.interval_ms {
        settings.bridge.request_interval_ms = ms;
    }
    if let Some(ms) = cli.timeout_ms {
        settings.bridge.timeout_ms = ms;
    }
    if cli.last_write_wins {
        settings.bridge.ordering = ResponseOrdering::LastWriteWins;
    }
    if cli.kill_on_contact {
        settings.hazard_collision = HazardCollisionPolicy::KillOnContact;
    }
    if let Some(seed) = cli.seed {
        settings.seed = seed;
    }
    if cli.no_bridge {
        settings.bridge.enabled = false;
    }

    settings.validate().context("invalid settings")?;
    Ok(settings)
}

fn build_service(settings: &Settings) -> Result<Arc<dyn DecisionService>> {
    match &settings.bridge.base_url {
        Some(url) => {
            let service = HttpDecisionService::new(url, settings.bridge.timeout())
                .context("building HTTP client")?;
            log::info!("Decision service at {}", service.endpoint());
            Ok(Arc::new(service))
        }
        None => {
            log::info!("No service URL; using random policy (seed {})", settings.seed);
            Ok(Arc::new(RandomPolicy::new(settings.seed)))
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let settings = build_settings(&cli)?;

    if let Some(path) = &cli.write_settings {
        settings.save(path).with_context(|| format!("writing {}", path.display()))?;
        return Ok(());
    }

    let level = Level::level_one().context("building level one")?;
    let mut world = SimulationWorld::from_level(&level, Rules::from_settings(&settings));
    log::info!(
        "Level {}x{}, {} obstacles, {} hazards, mode {}",
        level.columns(),
        level.rows(),
        world.obstacles().len(),
        world.hazards.len(),
        settings.mode.as_str()
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("starting async runtime")?;

    let mut bridge = if settings.bridge.enabled {
        let service = build_service(&settings)?;
        Some(Bridge::new(service, runtime.handle().clone(), &settings.bridge))
    } else {
        None
    };

    let frame_interval = settings.frame_interval();
    let started = Instant::now();
    let mut next_frame = started;

    loop {
        if cli.frames > 0 && world.frame >= cli.frames {
            break;
        }
        if cli.wins.is_some_and(|wins| world.stats.wins >= wins) {
            break;
        }

        if let Some(bridge) = bridge.as_mut() {
            bridge.poll(&mut world);
            bridge.maybe_send(&world, Instant::now());
        }

        if let Some(SimEvent::Respawned { after_win }) = tick(&mut world) {
            log::debug!("Respawned at frame {} (after win: {after_win})", world.frame);
        }

        if !cli.unpaced {
            next_frame += frame_interval;
            let now = Instant::now();
            if next_frame > now {
                std::thread::sleep(next_frame - now);
            } else {
                // Fell behind; don't try to catch up in a burst
                next_frame = now;
            }
        }
    }

    // Let in-flight requests finish or time out before the runtime drops
    runtime.shutdown_timeout(Duration::from_millis(100));

    log::info!(
        "Finished {} frames in {:.1}s: {} wins, {} deaths, {} respawns",
        world.frame,
        started.elapsed().as_secs_f32(),
        world.stats.wins,
        world.stats.deaths,
        world.stats.respawns
    );
    Ok(())
}
