//! Play command - run a headless game with random planners
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: load_params(), start_game(), play_turns(), report_results()
//! - Level 3: play_turn(), RandomPlanner
//! - Level 4: piece setup, RNG and formatting utilities

use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{Context, Result};
use clap::Args;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use hexlib_core::{
    DefaultRules, DragContext, DragInfo, GamePlay, GameSetup, HexId, LogWriter, Move, PhaseCodec, PieceKind,
    Planner, Session, TableParams, TileId,
};

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct PlayArgs {
    /// Number of turns to play
    #[arg(long, default_value = "10")]
    pub turns: usize,

    /// Number of players (overrides the params file)
    #[arg(long)]
    pub players: Option<usize>,

    /// Map tiles each player starts with
    #[arg(long, default_value = "3")]
    pub tiles: usize,

    /// Meeples in each player's dispenser
    #[arg(long, default_value = "2")]
    pub meeples: usize,

    /// Scenario log to write
    #[arg(long, value_name = "FILE")]
    pub log: Option<PathBuf>,

    /// Table params JSON file
    #[arg(long, value_name = "FILE")]
    pub params: Option<PathBuf>,
}

/// What happened in one game
#[derive(Clone, Debug)]
struct PlayResults {
    turns: usize,
    moves: Vec<(usize, Move)>,
    passes: usize,
    pieces_on_map: Vec<usize>,
    log_lines: Vec<String>,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run play command
///
/// This function reads like a table of contents:
/// 1. Load the table params
/// 2. Start the game (and its scenario log)
/// 3. Play the turns
/// 4. Report results
pub fn run(args: PlayArgs, seed: Option<u64>) -> Result<()> {
    let params = load_params(&args, seed)?;

    tracing::info!(
        "Starting game: {} players, nh={} mh={}, {} turns",
        params.num_players,
        params.n_hexes,
        params.m_hexes,
        args.turns
    );

    let mut session = start_game(&params, &args)?;
    let mut planner = RandomPlanner::new(create_rng(params.seed));
    let results = play_turns(&mut session, &mut planner, args.turns)?;

    if let Some(mut writer) = session.game_play.take_log_writer() {
        writer.close()?;
        println!("Scenario log: {}", writer.file_name());
    }
    report_results(&session.game_play, &results);

    Ok(())
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

/// Params from the file (else defaults) with command-line overrides
fn load_params(args: &PlayArgs, seed: Option<u64>) -> Result<TableParams> {
    let mut params = match &args.params {
        Some(path) => TableParams::load(path)?,
        None => TableParams::default().with_map(2, 2),
    };
    if let Some(players) = args.players {
        params = params.with_players(players);
    }
    if seed.is_some() {
        params = params.with_seed(seed);
    }
    params.validate().context("Invalid table params")?;
    Ok(params)
}

fn start_game(params: &TableParams, args: &PlayArgs) -> Result<Session> {
    let (tiles, meeples) = (args.tiles, args.meeples);
    let setup = GameSetup::new(params.clone(), Rc::new(DefaultRules))
        .with_codec(Rc::new(PhaseCodec))
        .with_pieces(move |gp| add_pieces(gp, tiles, meeples));

    let writer = match &args.log {
        Some(path) => Some(LogWriter::create(path)?),
        None => None,
    };
    let session = setup.startup(None, writer).context("Failed to start game")?;
    Ok(session)
}

/// Each turn: plan a move, play it through the drag protocol, end the turn.
fn play_turns(session: &mut Session, planner: &mut RandomPlanner, turns: usize) -> Result<PlayResults> {
    let mut moves = Vec::new();
    let mut passes = 0;

    for _ in 0..turns {
        let player = session.game_play.cur_player_index();
        match play_turn(session, planner)? {
            Some(mv) => moves.push((player, mv)),
            None => passes += 1,
        }
    }

    let gp = &session.game_play;
    let pieces_on_map = (0..gp.n_players())
        .map(|p| {
            gp.tiles()
                .iter()
                .filter(|t| t.player == Some(p) && is_on_map(gp, t.hex()))
                .count()
        })
        .collect();

    Ok(PlayResults {
        turns,
        moves,
        passes,
        pieces_on_map,
        log_lines: gp.text_log().lines().map(str::to_string).collect(),
    })
}

fn report_results(gp: &GamePlay, results: &PlayResults) {
    println!("\n=== Game Results ===");
    println!("Turns played: {}", results.turns);
    println!("Moves:        {}", results.moves.len());
    println!("Passes:       {}", results.passes);
    println!("Final turn:   {}", gp.turn_number());

    println!("\nPieces on map:");
    for (p, n) in results.pieces_on_map.iter().enumerate() {
        if let Ok(player) = gp.player(p) {
            println!("  {:<10} {}", player.name, n);
        }
    }

    println!("\nLast moves:");
    for (p, mv) in results.moves.iter().rev().take(5).rev() {
        println!("  P{} {} -> {}", p, format_tile(gp, mv.tile), gp.hex_map.hex(mv.hex).aname());
    }

    println!("\nTable log:");
    for line in &results.log_lines {
        println!("  {}", line);
    }
}

// ============================================================================
// LEVEL 3 - STEPS
// ============================================================================

fn play_turn(session: &mut Session, planner: &mut RandomPlanner) -> Result<Option<Move>> {
    let Session { game_play: gp, table } = session;
    let planned = planner.plan_move(gp);
    let mut played = None;
    if let Some(mv) = planned {
        if let Some(dropped) = table.drag_start_and_drop(gp, mv.tile, mv.hex, false)? {
            tracing::debug!("{:?} dropped on {:?}", dropped.tile, dropped.to);
            played = Some(mv);
        }
    }
    gp.done(&[])?;
    Ok(played)
}

/// Picks one of the current player's movable pieces and a legal hex for it,
/// uniformly at random.
pub struct RandomPlanner {
    rng: ChaCha8Rng,
}

impl RandomPlanner {
    pub fn new(rng: ChaCha8Rng) -> Self {
        Self { rng }
    }

    fn targets(gp: &GamePlay, tile: TileId) -> Vec<HexId> {
        let Ok(t) = gp.tile(tile) else {
            return Vec::new();
        };
        let rules = gp.rules();
        let ctx = DragContext::new(tile, t.hex(), DragInfo::first(false), None);
        gp.hex_map
            .hex_ary()
            .iter()
            .copied()
            .filter(|&h| Some(h) != t.hex() && rules.is_legal_target(gp, tile, h, &ctx))
            .collect()
    }
}

impl Planner for RandomPlanner {
    fn plan_move(&mut self, gp: &GamePlay) -> Option<Move> {
        let me = gp.cur_player_index();
        let mut pieces = movable_pieces(gp, me);
        pieces.shuffle(&mut self.rng);
        pieces.into_iter().find_map(|tile| {
            let hex = *Self::targets(gp, tile).choose(&mut self.rng)?;
            Some(Move { tile, hex })
        })
    }
}

// ============================================================================
// LEVEL 4 - UTILITIES
// ============================================================================

/// Map tiles for each player, plus a meeple dispenser per player on an
/// off-map hex.
fn add_pieces(gp: &mut GamePlay, tiles: usize, meeples: usize) -> hexlib_core::Result<()> {
    for player in 0..gp.n_players() {
        for _ in 0..tiles {
            gp.add_tile(PieceKind::MapTile, Some(player));
        }
        if meeples > 0 {
            let hex = gp.hex_map.add_aux_hex(&format!("MeepleSource-{}", player), -2, player as i32);
            let src = gp.add_source(PieceKind::Meeple, hex, Some(player));
            for _ in 0..meeples {
                gp.new_unit(src)?;
            }
            gp.next_unit(src, None)?;
        }
    }
    Ok(())
}

/// Own pieces that are not yet on the map: loose tiles and the unit showing
/// on a dispenser.
fn movable_pieces(gp: &GamePlay, player: usize) -> Vec<TileId> {
    gp.tiles()
        .iter()
        .filter(|t| t.player == Some(player))
        .filter(|t| match t.hex() {
            Some(h) => !gp.hex_map.hex(h).is_on_map() && Some(h) != gp.recycle_hex(),
            None => t.source().is_none(),
        })
        .map(|t| t.id())
        .collect()
}

fn is_on_map(gp: &GamePlay, hex: Option<HexId>) -> bool {
    hex.map_or(false, |h| gp.hex_map.hex(h).is_on_map())
}

fn format_tile(gp: &GamePlay, tile: TileId) -> String {
    gp.tile(tile).map_or_else(|_| format!("{:?}", tile), |t| t.aname().to_string())
}

/// Create RNG from seed or random
fn create_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(s) => ChaCha8Rng::seed_from_u64(s),
        None => ChaCha8Rng::from_entropy(),
    }
}
