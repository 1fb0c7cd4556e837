//! Scenario command - pull one saved state out of a scenario log
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: read_log(), report()

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use hexlib_core::scenario::extract_state;
use hexlib_core::{ScenarioLog, SetupElt};

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct ScenarioArgs {
    /// Scenario log written by `play --log`
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Turn to extract (default: list the turns in the log)
    #[arg(long)]
    pub turn: Option<i32>,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run scenario command
///
/// 1. Read the log
/// 2. Print the state saved at the requested turn, or list the turns
pub fn run(args: ScenarioArgs) -> Result<()> {
    let text = read_log(&args.file)?;
    match args.turn {
        Some(turn) => {
            let name = log_name(&args.file);
            let elt = extract_state(&name, &text, turn)
                .with_context(|| format!("Failed to extract turn {} from {}", turn, args.file.display()))?;
            report(&elt)
        }
        None => {
            let log = ScenarioLog::parse(&text)
                .with_context(|| format!("Failed to parse {}", args.file.display()))?;
            list_turns(&log);
            Ok(())
        }
    }
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

fn read_log(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read scenario log: {}", path.display()))
}

fn report(elt: &SetupElt) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(elt)?);
    Ok(())
}

fn list_turns(log: &ScenarioLog) {
    if let Some(start) = &log.start {
        println!("Start: {} ({} players)", start.aname, start.n.unwrap_or_default());
    }
    for state in &log.states {
        let turn = state.turn.map_or_else(|| "-".to_string(), |t| t.to_string());
        let pieces = state.placements.as_ref().map_or(0, Vec::len);
        println!("  turn {:>4}  {:>3} pieces  {}", turn, pieces, state.time.as_deref().unwrap_or(""));
    }
}

/// File name without directory or extension
fn log_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_name() {
        assert_eq!(log_name(Path::new("/tmp/log_10-19_14_05.json")), "log_10-19_14_05");
        assert_eq!(log_name(Path::new("game")), "game");
    }
}
