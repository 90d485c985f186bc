//! chess-overlay CLI: replay recorded marker detections through a session.

use std::path::PathBuf;

use chess_overlay::{run_replay, ReplayLog, SessionConfig};
use clap::{Args, Parser, Subcommand};
use log::{info, LevelFilter};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "chess-overlay")]
#[command(about = "Calibrate a chessboard from corner markers and track piece markers on it")]
#[command(version)]
struct Cli {
    /// Log level (off, error, warn, info, debug, trace). With the `tracing`
    /// feature, `RUST_LOG` takes precedence when set.
    #[arg(long, global = true, default_value = "warn")]
    log_level: LevelFilter,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a recorded detection log and report calibration and occupancy.
    Replay(ReplayArgs),

    /// Print the default session config as JSON.
    DefaultConfig {
        /// Write to this file instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Args)]
struct ReplayArgs {
    /// Recorded detections (JSON, `{"frames": [...]}`).
    #[arg(long)]
    input: PathBuf,

    /// Session config (JSON). Defaults apply to anything left out.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Path to write the replay report (JSON). Printed to stdout when omitted.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Print the final stable board instead of the JSON report.
    #[arg(long)]
    print_board: bool,

    /// Override the minimum interval between tracker updates (ms).
    #[arg(long)]
    min_update_interval_ms: Option<u64>,
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level)?;

    match cli.command {
        Commands::Replay(args) => run_replay_cmd(&args),
        Commands::DefaultConfig { out } => run_default_config(out),
    }
}

#[cfg(not(feature = "tracing"))]
fn init_logging(level: LevelFilter) -> CliResult<()> {
    chess_overlay::init_with_level(level)?;
    Ok(())
}

#[cfg(feature = "tracing")]
fn init_logging(level: LevelFilter) -> CliResult<()> {
    chess_overlay::init_tracing(false, level);
    Ok(())
}

// ── replay ─────────────────────────────────────────────────────────────

fn run_replay_cmd(args: &ReplayArgs) -> CliResult<()> {
    let mut config = match &args.config {
        Some(path) => SessionConfig::load_json(path)?,
        None => SessionConfig::default(),
    };
    if let Some(ms) = args.min_update_interval_ms {
        config.min_update_interval_ms = ms;
    }

    info!("Loading replay: {}", args.input.display());
    let log = ReplayLog::load_json(&args.input)?;
    let report = run_replay(&config, &log)?;

    if let Some(out) = &args.out {
        report.write_json(out)?;
        info!("Report written to {}", out.display());
    }

    if args.print_board {
        println!("{}", report.final_status);
        println!("{}", report.final_occupancy);
    } else if args.out.is_none() {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    Ok(())
}

// ── default-config ─────────────────────────────────────────────────────

fn run_default_config(out: Option<PathBuf>) -> CliResult<()> {
    let config = SessionConfig::default();
    match out {
        Some(path) => {
            config.write_json(&path)?;
            info!("Config written to {}", path.display());
        }
        None => println!("{}", serde_json::to_string_pretty(&config)?),
    }
    Ok(())
}
