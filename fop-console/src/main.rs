//! fop-console - Operator console for one competition platform
//!
//! Reads officials' commands from stdin, feeds them to the platform's
//! field of play and prints every UI event as a JSON line on stdout.

mod commands;
mod roster;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use libfop::config::resolve_config_path;
use libfop::logging::{LogFormat, LoggingConfig};
use libfop::repository::memory::InMemoryAthleteRepository;
use libfop::{
    AthleteId, Config, FieldOfPlayRegistry, FopError, FopEventKind, Originator, PlatformHandle,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use crate::commands::{Command, HELP};
use crate::roster::Roster;

#[derive(Parser, Debug)]
#[command(name = "fop-console")]
#[command(version)]
#[command(about = "Operator console for a weightlifting competition platform")]
#[command(long_about = "\
fop-console - Operator console for a weightlifting competition platform

DESCRIPTION:
    fop-console runs the field of play of one platform: the lifting order,
    the attempt clock and the referee decision sequence. Officials' actions
    are typed as commands on stdin; every resulting display update is
    printed as one JSON object per line on stdout.

USAGE:
    # Run platform A with a roster
    fop-console --roster group-a.toml

    # Start the clock as soon as the athlete is announced
    fop-console --roster group-a.toml --auto-start

    # Scripted session
    printf 'resume\\nannounce\\nstart\\n' | fop-console --roster group-a.toml

COMMANDS:
    break [secs], resume, announce, start, stop, force <ms>, time-over,
    down, decision <v> <v> <v>, reset, weight <lot> <kg>, status, help, quit

CONFIGURATION:
    Configuration file: ~/.config/fop/config.toml (or $FOP_CONFIG)

    [timing]
    attempt_millis = 60000
    consecutive_attempt_millis = 120000
    default_break_millis = 600000

    [[platforms]]
    name = \"A\"
    start_time_automatically = false

EXIT CODES:
    0 - Clean shutdown
    1 - Runtime error
    2 - Configuration or roster error
    3 - Invalid input
")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Platform to drive (defaults to the first configured platform)
    #[arg(short, long)]
    platform: Option<String>,

    /// Roster file with the group to lift
    #[arg(short, long, value_name = "FILE")]
    roster: Option<PathBuf>,

    /// Start the clock automatically when the athlete is announced
    #[arg(long)]
    auto_start: bool,

    /// Log format: text, json or pretty
    #[arg(long, default_value = "text", env = "FOP_LOG_FORMAT")]
    log_format: LogFormat,

    /// Log level filter (overridden by RUST_LOG)
    #[arg(long, default_value = "info", env = "FOP_LOG_LEVEL")]
    log_level: String,

    /// Enable verbose logging to stderr
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    LoggingConfig::new(cli.log_format, cli.log_level.clone(), cli.verbose).init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        let code = e
            .downcast_ref::<FopError>()
            .map(FopError::exit_code)
            .unwrap_or(1);
        std::process::exit(code);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = load_config(cli.config.as_deref())?;
    let roster = match &cli.roster {
        Some(path) => Roster::load(path)?,
        None => Roster::default(),
    };

    let platform_name = match &cli.platform {
        Some(name) => name.clone(),
        None => config
            .platforms
            .first()
            .map(|p| p.name.clone())
            .context("no platform configured")?,
    };
    if cli.auto_start {
        if let Some(platform) = config.platforms.iter_mut().find(|p| p.name == platform_name) {
            platform.start_time_automatically = true;
        }
    }

    let repository = Arc::new(InMemoryAthleteRepository::with_roster(
        roster.athletes.iter().cloned(),
    ));
    let registry = FieldOfPlayRegistry::from_config(&config, repository)?;
    let platform = registry.get(&platform_name)?;

    let printer = tokio::spawn(print_ui_events(platform.subscribe_ui()));
    let lots: HashMap<u32, AthleteId> = roster
        .athletes
        .iter()
        .map(|a| (a.lot_number, a.id))
        .collect();

    info!(
        "platform {}: loading {} athletes",
        platform_name,
        roster.athletes.len()
    );
    platform.switch_group(roster.group, roster.athletes).await;

    read_commands(platform, &lots).await?;

    registry.shutdown().await;
    printer.await.context("display task failed")?;
    Ok(())
}

/// Explicit path, else the resolved default location, else built-in
/// defaults.
fn load_config(path: Option<&Path>) -> libfop::Result<Config> {
    if let Some(path) = path {
        return Config::load_from_path(path);
    }

    let path = resolve_config_path()?;
    if path.exists() {
        Config::load_from_path(&path)
    } else {
        info!("no configuration at {}, using defaults", path.display());
        Ok(Config::default_config())
    }
}

async fn read_commands(
    platform: &PlatformHandle,
    lots: &HashMap<u32, AthleteId>,
) -> anyhow::Result<()> {
    let origin = Originator::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.context("failed to read stdin")?,
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted, shutting down");
                break;
            }
        };
        let Some(line) = line else {
            break;
        };

        match commands::parse(&line) {
            Ok(None) => {}
            Ok(Some(Command::Quit)) => break,
            Ok(Some(command)) => execute(platform, lots, origin, command).await?,
            Err(e) => {
                warn!("{}", e);
                eprintln!("{}", e);
            }
        }
    }

    Ok(())
}

async fn execute(
    platform: &PlatformHandle,
    lots: &HashMap<u32, AthleteId>,
    origin: Originator,
    command: Command,
) -> anyhow::Result<()> {
    match command {
        Command::Fop(kind) => {
            platform.dispatch(origin, kind);
        }
        Command::Weight { lot, kg } => match lots.get(&lot) {
            Some(&athlete) => {
                platform.dispatch(
                    origin,
                    FopEventKind::WeightChange {
                        athlete,
                        weight: kg,
                    },
                );
            }
            None => eprintln!("no athlete with lot number {}", lot),
        },
        Command::Status => {
            let snapshot = platform.snapshot().await;
            println!("{}", serde_json::to_string(&snapshot)?);
        }
        Command::Help => eprintln!("{}", HELP),
        Command::Quit => {}
    }
    Ok(())
}

async fn print_ui_events(mut events: libfop::EventReceiver<libfop::UiEvent>) {
    loop {
        match events.recv().await {
            Ok(event) => match serde_json::to_string(&event) {
                Ok(line) => println!("{}", line),
                Err(e) => warn!("failed to serialize {} event: {}", event.kind.name(), e),
            },
            Err(RecvError::Lagged(skipped)) => {
                warn!("display lagged, {} events dropped", skipped);
            }
            Err(RecvError::Closed) => break,
        }
    }
}
