//! Integration tests for the hexlib command line
//!
//! Runs the built binary: map description, a logged headless game, and
//! extracting a state back out of that log.

use std::path::PathBuf;
use std::process::{Command, Output};

use hexlib_core::{ScenarioLog, SetupElt};

// ============================================================================
// TEST FIXTURES
// ============================================================================

fn hexlib(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_hexlib"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run hexlib")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn temp_log(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("hexlib_{}_{}.json", name, std::process::id()))
}

// ============================================================================
// MAP
// ============================================================================

#[test]
fn test_map_json() {
    let output = hexlib(&["map", "--nh", "2", "--mh", "2", "--json"]);
    assert!(output.status.success());
    let summary: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(summary["hexes"], 49);
    assert_eq!(summary["districts"].as_array().unwrap().len(), 7);
    assert_eq!(summary["corners"].as_array().unwrap().len(), 6);
}

#[test]
fn test_map_rect_text() {
    let output = hexlib(&["map", "--ns", "--rect", "4x5"]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("=== Map ==="));
    assert!(text.contains("Ns"));
}

#[test]
fn test_map_rejects_bad_rect() {
    let output = hexlib(&["map", "--rect", "four-by-five"]);
    assert!(!output.status.success());
}

// ============================================================================
// PLAY + SCENARIO
// ============================================================================

#[test]
fn test_play_writes_log_that_scenario_reads() {
    let log = temp_log("play");
    let log_arg = log.to_string_lossy().into_owned();
    let output = hexlib(&["play", "--turns", "4", "--seed", "3", "--log", &log_arg]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let text = stdout(&output);
    assert!(text.contains("=== Game Results ==="));
    assert!(text.contains("Moves:        4"));

    let scenario = ScenarioLog::read(&log).unwrap();
    assert_eq!(scenario.start.as_ref().and_then(|s| s.n), Some(2));
    // BeginTurn saves turns 0 through 4
    assert_eq!(scenario.states.len(), 5);
    let last = scenario.state_at(4).unwrap();
    assert_eq!(last.placements.as_ref().unwrap().len(), 4);

    let output = hexlib(&["scenario", &log_arg, "--turn", "2"]);
    assert!(output.status.success());
    let elt: SetupElt = serde_json::from_str(&stdout(&output)).unwrap();
    let stem = log.file_stem().unwrap().to_string_lossy().into_owned();
    assert_eq!(elt.aname, Some(format!("{}@2", stem)));
    assert_eq!(elt.turn, Some(2));
    assert_eq!(elt.placements.unwrap().len(), 2);

    let output = hexlib(&["scenario", &log_arg]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("turn    3"));

    let output = hexlib(&["scenario", &log_arg, "--turn", "99"]);
    assert!(!output.status.success());

    std::fs::remove_file(&log).ok();
}

#[test]
fn test_play_is_reproducible_with_seed() {
    let run = || stdout(&hexlib(&["play", "--turns", "6", "--seed", "42", "--players", "3"]));
    assert_eq!(run(), run());
}

#[test]
fn test_play_rejects_too_many_players() {
    let output = hexlib(&["play", "--players", "9"]);
    assert!(!output.status.success());
}
