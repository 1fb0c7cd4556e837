//! hexlib CLI - Command-line interface
//!
//! Commands:
//! - map: Build a map and describe it
//! - play: Run a headless game driven by random planners
//! - scenario: Extract a saved state from a scenario log

mod map_cmd;
mod play_cmd;
mod scenario_cmd;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hexlib")]
#[command(about = "Hex-grid board game engine")]
struct Cli {
    /// Log level when RUST_LOG is not set (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Seed for reproducible runs
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a map and print its size, districts and corners
    Map(map_cmd::MapArgs),
    /// Play a headless game
    Play(play_cmd::PlayArgs),
    /// Print one saved state from a scenario log
    Scenario(scenario_cmd::ScenarioArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    match cli.command {
        Commands::Map(args) => map_cmd::run(args),
        Commands::Play(args) => play_cmd::run(args, cli.seed),
        Commands::Scenario(args) => scenario_cmd::run(args),
    }
}
