//! # Tilechase Headless Runner
//!
//! Loads or generates a level, drives a session at a fixed rate, optionally
//! replaying a command script, and prints text snapshots along the way.

use clap::Parser;
use log::{info, warn};
use std::path::PathBuf;
use tilechase::{
    config::TARGET_TPS, generate_layout, parse_script, render_ascii, ChaseError, ChaseResult,
    GameEvent, GenerationConfig, InputHandler, LevelLayout, LevelSession, SessionConfig,
};

/// Command line arguments for the tilechase runner.
#[derive(Parser, Debug)]
#[command(name = "tilechase")]
#[command(about = "Headless simulation of grid chase levels")]
#[command(version)]
struct Args {
    /// Random seed for generation, patrol choices and hazard speeds
    #[arg(short, long)]
    seed: Option<u64>,

    /// Text map to load instead of generating one
    #[arg(short, long)]
    map: Option<PathBuf>,

    /// JSON session settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Maximum ticks to simulate
    #[arg(short, long, default_value_t = 3000)]
    ticks: u64,

    /// Seconds per tick (defaults to the target tick rate)
    #[arg(long)]
    dt: Option<f32>,

    /// Command script, one command per tick (see `parse_script`)
    #[arg(long)]
    script: Option<String>,

    /// Size of the generated maze, e.g. 21x15
    #[arg(short, long, value_parser = parse_size)]
    generate: Option<(u32, u32)>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Print a snapshot every N ticks
    #[arg(long)]
    print_every: Option<u64>,

    /// Print the effective settings as JSON and exit
    #[arg(long)]
    dump_config: bool,
}

fn parse_size(text: &str) -> Result<(u32, u32), String> {
    let (width, height) = text
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{}'", text))?;
    let width = width
        .trim()
        .parse()
        .map_err(|e| format!("bad width '{}': {}", width, e))?;
    let height = height
        .trim()
        .parse()
        .map_err(|e| format!("bad height '{}': {}", height, e))?;
    Ok((width, height))
}

fn main() -> ChaseResult<()> {
    let args = Args::parse();

    env_logger::Builder::new()
        .parse_filters(&args.log_level)
        .format_target(false)
        .init();

    info!("Starting tilechase v{}", tilechase::VERSION);

    let config = match &args.config {
        Some(path) => SessionConfig::load(path)?,
        None => SessionConfig::default(),
    };
    if args.dump_config {
        println!("{}", config.to_json()?);
        return Ok(());
    }

    let seed = args.seed.unwrap_or(12345);
    let layout = load_layout(&args, seed)?;
    let session = LevelSession::from_layout(layout, config, seed)?;
    run(&args, session)
}

fn load_layout(args: &Args, seed: u64) -> ChaseResult<LevelLayout> {
    if let Some(path) = &args.map {
        info!("Loading map {}", path.display());
        return LevelLayout::load(path);
    }
    let mut generation = GenerationConfig::new(seed);
    if let Some((width, height)) = args.generate {
        generation = generation.with_size(width, height);
    }
    info!(
        "Generating {}x{} maze with seed {}",
        generation.width, generation.height, seed
    );
    generate_layout(&generation)
}

fn run(args: &Args, mut session: LevelSession) -> ChaseResult<()> {
    let dt = args.dt.unwrap_or(1.0 / TARGET_TPS as f32);
    if !(dt.is_finite() && dt > 0.0) {
        return Err(ChaseError::InvalidConfig(format!("dt must be > 0, got {}", dt)));
    }
    let commands = match &args.script {
        Some(script) => parse_script(script)?,
        None => Vec::new(),
    };
    let mut input = InputHandler::new();

    for tick in 0..args.ticks {
        if let Some(command) = commands.get(tick as usize) {
            match input.apply(*command, &mut session) {
                Ok(events) => report(tick, &events),
                Err(ChaseError::InvalidState(message)) => {
                    warn!("tick {}: ignoring {:?}: {}", tick, command, message)
                }
                Err(error) => return Err(error),
            }
        }

        let events = session.advance(dt);
        report(tick, &events);

        if let Some(every) = args.print_every.filter(|every| *every > 0) {
            if tick % every == 0 {
                println!("{}", render_ascii(&session));
            }
        }
        if session.is_over() {
            break;
        }
    }

    println!("{}", render_ascii(&session));
    println!("{}", serde_json::to_string_pretty(session.statistics())?);
    Ok(())
}

fn report(tick: u64, events: &[GameEvent]) {
    for event in events {
        match event {
            GameEvent::ChaseStarted { .. } | GameEvent::ChaseEnded { .. } => {
                log::debug!("tick {}: {:?}", tick, event)
            }
            _ => info!("tick {}: {:?}", tick, event),
        }
    }
}
