//! Repertoire trainer entry point
//!
//! Speaks UCI on stdin/stdout. Logs and trainer messages go to stderr.

use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use anyhow::{Context, Result};
use chess_engine::UciEngine;
use clap::{Parser, Subcommand};
use repertoire_trainer::core::{parse_duration, Settings, SystemClock, TrainerPaths};
use repertoire_trainer::protocol::UciSession;
use repertoire_trainer::repertoire::Scheduler;
use repertoire_trainer::trainer::{
    open_books, pending_counts, review_status_messages, StderrNotifier, Trainer,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Opening repertoire trainer with spaced repetition, served over UCI
#[derive(Parser)]
#[command(name = "repertoire-trainer")]
#[command(version, long_about = None)]
struct Cli {
    /// Trainer data directory
    #[arg(long, env = "REPERTOIRE_HOME", global = true)]
    home: Option<PathBuf>,

    /// Fallback engine binary (default: <home>/engine)
    #[arg(long, global = true)]
    engine: Option<PathBuf>,

    /// Time the fallback engine may spend per move, e.g. "1s" or "500ms"
    #[arg(long, value_parser = parse_duration, global = true)]
    movetime: Option<Duration>,

    /// Interval given to new or failed moves, e.g. "10m"
    #[arg(long, value_parser = parse_duration, global = true)]
    initial_interval: Option<Duration>,

    /// Interval multiplier after a correct, on-time answer
    #[arg(long, global = true)]
    growth_factor: Option<u32>,

    /// Upper bound for review intervals, e.g. "60days"
    #[arg(long, value_parser = parse_duration, global = true)]
    max_interval: Option<Duration>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Clone, Copy)]
enum Command {
    /// Run the UCI loop on stdin/stdout (default)
    Play,

    /// Print how many moves are due for review and exit
    Status,
}

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let home = match &cli.home {
        Some(home) => home.clone(),
        None => TrainerPaths::default_home()?,
    };
    let paths = TrainerPaths::new(home);
    paths
        .ensure_dirs()
        .context("Failed to create the trainer directories")?;

    let settings = apply_overrides(Settings::load(&paths.settings_file())?, &cli);
    let config = settings
        .review_config()
        .context("Invalid review settings")?;
    let scheduler = Scheduler::new(config, Rc::new(SystemClock));

    match cli.command.unwrap_or(Command::Play) {
        Command::Status => {
            let books = open_books(&paths, scheduler).context("Failed to open the repertoire")?;
            for message in review_status_messages(pending_counts(&books)) {
                println!("{message}");
            }
            Ok(())
        }
        Command::Play => {
            let engine_path = cli.engine.clone().unwrap_or_else(|| paths.engine());
            let engine = UciEngine::spawn(&engine_path, settings.engine_movetime)
                .with_context(|| format!("Cannot start the fallback engine {}", engine_path.display()))?;
            let trainer = Trainer::open(
                &paths,
                scheduler,
                Box::new(engine),
                Rc::new(StderrNotifier),
            )
            .context("Failed to open the repertoire")?;

            info!("[MAIN] Trainer ready, home {}", paths.home().display());
            let mut session = UciSession::new(trainer);
            let mut output = BufWriter::new(io::stdout().lock());
            session
                .run(io::stdin().lock(), &mut output)
                .context("UCI session failed")?;
            Ok(())
        }
    }
}

/// Command line values win over settings.json
fn apply_overrides(mut settings: Settings, cli: &Cli) -> Settings {
    if let Some(movetime) = cli.movetime {
        settings.engine_movetime = movetime;
    }
    if let Some(interval) = cli.initial_interval {
        settings.initial_interval = interval;
    }
    if let Some(factor) = cli.growth_factor {
        settings.growth_factor = factor;
    }
    if let Some(interval) = cli.max_interval {
        settings.max_interval = interval;
    }
    settings
}
