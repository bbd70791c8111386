use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use clap::Parser;
use greedy_actor::GreedyActor;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use random_actor::RandomActor;
use server::{Coordinator, Credentials, GameConfig, GameError, Recorder, UserDatabase};
use snakes::visualize_board;
use snakes_actor_utils::{spawn_actor, Actor};
use tracing::{info, warn};
use tracing_subscriber::filter::{LevelFilter, Targets};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
struct Args {
    /// Path to a game config JSON file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Path to a JSON file listing the players that may join
    #[arg(short, long)]
    users: Option<PathBuf>,

    /// A player, given as IDENTITY:SECRET, who joins through the user
    /// database and is steered by the food-seeking bot
    #[arg(long)]
    autopilot_player: Vec<String>,

    /// How many randomly moving snakes to add
    #[arg(long, default_value_t = 2)]
    npcs: usize,

    /// How many food-seeking snakes to add
    #[arg(long, default_value_t = 1)]
    greedy_npcs: usize,

    /// RNG seed
    #[arg(long)]
    seed: Option<u64>,

    /// Overrides the board size from the config
    #[arg(long)]
    grid_size: Option<u16>,

    /// Overrides the tick period from the config
    #[arg(long)]
    tick_period_ms: Option<u64>,

    /// Stop the game after this many seconds
    #[arg(long)]
    time_limit_secs: Option<u64>,

    /// Record every tick as JSON into this directory
    #[arg(short, long)]
    record_ticks_to_directory: Option<PathBuf>,

    /// A log level among "off", "error", "warn", "info", "debug", "trace"
    #[arg(short, long, default_value = "info")]
    log_level: LevelFilter,
}

fn parse_credentials(arg: &str) -> anyhow::Result<Credentials> {
    match arg.split_once(':') {
        Some((identity, secret)) if !identity.is_empty() => Ok(Credentials::new(identity, secret)),
        _ => anyhow::bail!("Expected IDENTITY:SECRET, got '{}'", arg),
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    initialize_logging(args.log_level);

    // Get a random seed
    let seed = args.seed.unwrap_or_else(rand::random);
    info!(seed);
    let mut rng = StdRng::seed_from_u64(seed);

    let mut config = match &args.config {
        Some(path) => GameConfig::load(path)?,
        None => GameConfig::default(),
    };
    if let Some(grid_size) = args.grid_size {
        config.grid_size = grid_size;
    }
    if let Some(tick_period_ms) = args.tick_period_ms {
        config.tick_period_ms = tick_period_ms;
    }
    config.validate()?;

    let users = match &args.users {
        Some(path) => UserDatabase::load(path)?,
        None => UserDatabase::default(),
    };
    let autopilots = args
        .autopilot_player
        .iter()
        .map(|arg| parse_credentials(arg))
        .collect::<anyhow::Result<Vec<Credentials>>>()?;
    if config.expected_players > autopilots.len() {
        anyhow::bail!(
            "Waiting for {} players, but only {} can join from the command line",
            config.expected_players,
            autopilots.len()
        );
    }

    let coordinator_rng = StdRng::seed_from_u64(rng.gen());
    let mut coordinator = Coordinator::new(config, Arc::new(users), coordinator_rng);
    if let Some(dir_path) = args.record_ticks_to_directory {
        coordinator = coordinator.with_recorder(Recorder::new(dir_path)?);
    }

    let mut actors: Vec<JoinHandle<anyhow::Result<()>>> = Vec::new();
    for num in 1..=args.npcs {
        let handle = coordinator.join_scripted(&format!("random-{}", num))?;
        let actor = RandomActor::new(StdRng::seed_from_u64(rng.gen()));
        actors.push(spawn_actor(actor, handle)?);
    }
    for num in 1..=args.greedy_npcs {
        let handle = coordinator.join_scripted(&format!("greedy-{}", num))?;
        let actor = GreedyActor::new(StdRng::seed_from_u64(rng.gen()));
        actors.push(spawn_actor(actor, handle)?);
    }
    // Players go through the registrar like any client joining a running game
    for credentials in autopilots {
        let registrar = coordinator.registrar();
        let mut actor = GreedyActor::new(StdRng::seed_from_u64(rng.gen()));
        let joiner = thread::Builder::new()
            .name(format!("player-{}", credentials.identity))
            .spawn(move || {
                let handle = registrar.join(&credentials)?;
                actor.run(handle)
            })?;
        actors.push(joiner);
    }

    if let Some(secs) = args.time_limit_secs {
        let shutdown = coordinator.shutdown_handle();
        thread::Builder::new()
            .name(String::from("time-limit"))
            .spawn(move || {
                thread::sleep(Duration::from_secs(secs));
                shutdown.request();
            })?;
    }

    let summary = match coordinator.run() {
        Ok(summary) => summary,
        Err(GameError::Interrupted) => {
            info!("Stopped at the time limit");
            coordinator.summary()
        }
        Err(err) => return Err(err.into()),
    };

    for actor in actors {
        match actor.join() {
            Ok(Ok(())) => {}
            Ok(Err(err)) => warn!(%err, "Actor stopped with an error"),
            Err(_) => warn!("Actor panicked"),
        }
    }

    let last_tick = summary.ticks.saturating_sub(1);
    println!("{}", visualize_board(&coordinator.board().snapshot(last_tick), None));
    println!("{}", summary);

    Ok(())
}

fn initialize_logging(level: LevelFilter) {
    let format = tracing_subscriber::fmt::format()
        .with_target(false)
        .compact();

    let filter = Targets::new().with_default(level);

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().event_format(format))
        .with(filter)
        .init();
}
