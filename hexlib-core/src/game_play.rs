//! GamePlay: the turn orchestrator
//!
//! ## Ownership
//!
//! `GamePlay` owns everything a session needs: the map, the phase machine,
//! the players, every piece and dispenser, the undo/redo bookkeeping and
//! the game's `Rules`. Pieces and hexes refer to each other by id, and
//! every occupancy change goes through `move_to`, which keeps the two
//! sides consistent:
//!
//! - a piece is on at most one hex
//! - each hex slot (tile, meep) holds at most one piece
//! - a piece leaves its old slot before it takes a new one
//!
//! ## The move funnel
//!
//! Every committed move passes through `local_move_event`, which always
//! runs in the same order: consume or invalidate the redo queue, apply the
//! move, close the undo group, advance to the next player.

use std::collections::VecDeque;
use std::rc::Rc;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::error::{GameError, Result};
use crate::game_state::GameState;
use crate::hex::HexId;
use crate::hex_map::HexMap;
use crate::player::{Planner, Player};
use crate::rules::{rejected, Collision, DefaultRules, Rules};
use crate::scenario::{LogWriter, ScenarioParser, SetupElt};
use crate::text_log::TextLog;
use crate::tile::{PieceKind, Tile, TileId};
use crate::tile_source::TileSource;
use crate::undo::{UndoLog, UndoRec};

/// A piece and where it goes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Move {
    pub tile: TileId,
    pub hex: HexId,
}

/// Who supplies the next move
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveRequest {
    /// Replay the head of the redo queue
    Redo(Move),
    /// The current player's planner
    Robo,
    /// Wait for a drag and drop
    Gui,
}

pub struct GamePlay {
    pub hex_map: HexMap,
    pub game_state: GameState,
    pub(crate) players: Vec<Player>,
    pub(crate) tiles: Vec<Tile>,
    pub(crate) sources: Vec<TileSource>,
    recycle_hex: Option<HexId>,
    turn_number: i32,
    cur_player: usize,
    pre_game: bool,
    redo_moves: VecDeque<Move>,
    undo: UndoLog,
    text_log: TextLog,
    rules: Rc<dyn Rules>,
    log_writer: Option<LogWriter>,
    run_redo: bool,
    pub(crate) rng: ChaCha8Rng,
}

impl GamePlay {
    pub fn new(hex_map: HexMap, n_players: usize) -> Self {
        Self {
            hex_map,
            game_state: GameState::new(),
            players: (0..n_players).map(Player::new).collect(),
            tiles: Vec::new(),
            sources: Vec::new(),
            recycle_hex: None,
            turn_number: 0,
            cur_player: 0,
            pre_game: true,
            redo_moves: VecDeque::new(),
            undo: UndoLog::new(),
            text_log: TextLog::default(),
            rules: Rc::new(DefaultRules),
            log_writer: None,
            run_redo: false,
            rng: ChaCha8Rng::seed_from_u64(0),
        }
    }

    pub fn with_rules(mut self, rules: Rc<dyn Rules>) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = ChaCha8Rng::seed_from_u64(seed);
        self
    }

    pub fn with_text_log_lines(mut self, lines: usize) -> Self {
        self.text_log = TextLog::new(lines);
        self
    }

    pub fn with_log_writer(mut self, writer: LogWriter) -> Self {
        self.log_writer = Some(writer);
        self
    }

    /// Shared handle to the rules, safe to hold while mutating `self`.
    pub fn rules(&self) -> Rc<dyn Rules> {
        Rc::clone(&self.rules)
    }

    pub fn log_writer_mut(&mut self) -> Option<&mut LogWriter> {
        self.log_writer.as_mut()
    }

    pub fn take_log_writer(&mut self) -> Option<LogWriter> {
        self.log_writer.take()
    }

    // ========================================================================
    // PLAYERS
    // ========================================================================

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn n_players(&self) -> usize {
        self.players.len()
    }

    pub fn player(&self, index: usize) -> Result<&Player> {
        self.players.get(index).ok_or(GameError::NoPlayers)
    }

    pub fn player_mut(&mut self, index: usize) -> Result<&mut Player> {
        self.players.get_mut(index).ok_or(GameError::NoPlayers)
    }

    pub fn cur_player(&self) -> Option<&Player> {
        self.players.get(self.cur_player)
    }

    pub fn cur_player_index(&self) -> usize {
        self.cur_player
    }

    pub fn next_player_index(&self) -> usize {
        self.cur_player().map_or(0, |p| p.nth_player(1, self.players.len()))
    }

    pub fn turn_number(&self) -> i32 {
        self.turn_number
    }

    pub(crate) fn set_turn_number(&mut self, turn: i32) {
        self.turn_number = turn;
    }

    pub fn is_pre_game(&self) -> bool {
        self.pre_game
    }

    // ========================================================================
    // PIECES
    // ========================================================================

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn tile(&self, id: TileId) -> Result<&Tile> {
        self.tiles.get(id.index()).ok_or(GameError::NoSuchTile(id))
    }

    pub(crate) fn tile_mut(&mut self, id: TileId) -> Result<&mut Tile> {
        self.tiles.get_mut(id.index()).ok_or(GameError::NoSuchTile(id))
    }

    /// Register a new piece, off the table.
    pub fn add_tile(&mut self, kind: PieceKind, player: Option<usize>) -> TileId {
        let id = TileId(self.tiles.len() as u32);
        self.tiles.push(Tile::new(id, kind, player));
        id
    }

    pub fn set_home_hex(&mut self, tile: TileId, home: Option<HexId>) -> Result<()> {
        self.tile_mut(tile)?.home_hex = home;
        Ok(())
    }

    pub fn find_tile(&self, aname: &str) -> Option<TileId> {
        self.tiles.iter().find(|t| t.aname() == aname).map(Tile::id)
    }

    /// Mobile units owned by `player`
    pub fn meeples_of(&self, player: usize) -> Vec<TileId> {
        self.tiles
            .iter()
            .filter(|t| t.is_meep() && t.player == Some(player))
            .map(Tile::id)
            .collect()
    }

    /// `Tile-3@Hex@[1,2]`: name and current (else origin) hex
    pub fn tile_str(&self, id: TileId) -> String {
        let Ok(t) = self.tile(id) else {
            return format!("{:?}", id);
        };
        let at = t
            .hex
            .or(t.from_hex)
            .map_or_else(|| "?".to_string(), |h| self.hex_map.hex(h).aname().to_string());
        format!("{}@{}", t.aname(), at)
    }

    fn hex_name(&self, hex: Option<HexId>) -> String {
        hex.map_or_else(|| "-".to_string(), |h| self.hex_map.hex(h).aname().to_string())
    }

    fn on_map(&self, hex: Option<HexId>) -> bool {
        hex.map_or(false, |h| self.hex_map.hex(h).is_on_map())
    }

    pub fn recycle_hex(&self) -> Option<HexId> {
        self.recycle_hex
    }

    /// Create the off-map hex that pieces are dropped on to discard them.
    pub fn make_recycle_hex(&mut self, row: i32, col: i32) -> HexId {
        let id = self.hex_map.add_aux_hex("Recycle", row, col);
        self.recycle_hex = Some(id);
        id
    }

    // ========================================================================
    // LOGGING
    // ========================================================================

    pub fn text_log(&self) -> &TextLog {
        &self.text_log
    }

    pub fn log_text(&mut self, line: &str, from: &str) {
        self.text_log.log(line, from);
    }

    pub fn log_failure(&mut self, kind: &str, reqd: i32, avail: i32, to_hex: HexId) {
        let text = format!("{} required: {} > {}", kind, reqd, avail);
        tracing::info!("failToPayCost: {} {}", text, self.hex_map.hex(to_hex).aname());
        self.log_text(&text, "GamePlay.failToPayCost");
    }

    // ========================================================================
    // OCCUPANCY
    // ========================================================================

    /// Put `tile` on `to` (or lift it off the table with None), keeping the
    /// single-owner invariant. A mobile unit arriving on a map hex pushes any
    /// other unit there back to its start hex; any other double occupancy is
    /// resolved by `Rules::unit_collision`.
    pub fn move_to(&mut self, tile: TileId, to: Option<HexId>) -> Result<()> {
        self.move_to_depth(tile, to, 0)
    }

    fn move_to_depth(&mut self, id: TileId, to: Option<HexId>, depth: usize) -> Result<()> {
        let (is_meep, from, source) = {
            let t = self.tile(id)?;
            (t.is_meep(), t.hex, t.source())
        };
        if to == from {
            return Ok(());
        }
        if let Some(to) = to {
            self.clear_slot_for(id, to, is_meep, depth)?;
        }

        if let Some(from) = from {
            if self.hex_map.hex(from).unit(is_meep) == Some(id) {
                self.hex_map.hex_mut(from).set_unit_slot(is_meep, None);
            }
        }
        self.tile_mut(id)?.hex = to;
        if let Some(to) = to {
            self.hex_map.hex_mut(to).set_unit_slot(is_meep, Some(id));
            if let Some(src) = source {
                self.sources[src.index()].unqueue(id);
            }
            if is_meep {
                let t = self.tile(id)?;
                let moved = self.on_map(Some(to)) && self.on_map(t.from_hex) && Some(to) != t.start_hex;
                self.face_up(id, !moved)?;
            }
        }
        Ok(())
    }

    /// Make room for `id` in the slot of `to`.
    fn clear_slot_for(&mut self, id: TileId, to: HexId, is_meep: bool, depth: usize) -> Result<()> {
        let occupant = |gp: &Self| gp.hex_map.hex(to).unit(is_meep).filter(|&o| o != id);
        let Some(other) = occupant(self) else {
            return Ok(());
        };
        if is_meep && self.on_map(Some(to)) {
            self.un_move_depth(other, depth + 1)?;
        }
        let Some(other) = occupant(self) else {
            return Ok(());
        };
        let rules = self.rules();
        match rules.unit_collision(self, to, other, id) {
            Collision::ReturnToSource => match self.tile(other)?.source() {
                Some(src) => self.avail_unit(src, other, false),
                None => Err(rejected(to, other, id)),
            },
            Collision::SendHome => {
                let home = self.tile(other)?.home_hex.filter(|&h| h != to);
                self.move_to_depth(other, home, depth + 1)
            }
            Collision::Reject => Err(rejected(to, other, id)),
        }
    }

    /// Turn a unit face-up (ready to move) or face-down. Face-up on a hex
    /// records that hex as its start hex.
    pub fn face_up(&mut self, tile: TileId, up: bool) -> Result<()> {
        let t = self.tile_mut(tile)?;
        t.face_up = up;
        if up && t.hex.is_some() {
            t.start_hex = t.hex;
        }
        Ok(())
    }

    /// Return a mobile unit to where it started this turn, pushing back any
    /// unit standing there in turn.
    pub fn un_move(&mut self, meep: TileId) -> Result<()> {
        self.un_move_depth(meep, 0)
    }

    fn un_move_depth(&mut self, meep: TileId, depth: usize) -> Result<()> {
        if depth > self.tiles.len() {
            tracing::warn!("unMove: cycle of start hexes at {}", self.tile_str(meep));
            return Ok(());
        }
        let (hex, start) = {
            let t = self.tile(meep)?;
            (t.hex, t.start_hex)
        };
        if start.is_none() || hex == start {
            return Ok(());
        }
        self.move_to_depth(meep, start, depth)?;
        self.undo.add_undo_rec(UndoRec { tile: meep, from: hex, to: start });
        self.face_up(meep, true)
    }

    /// Un-move every unit of the current player that is on the map.
    pub fn un_move_all(&mut self) -> Result<()> {
        for meep in self.meeples_of(self.cur_player) {
            if self.on_map(self.tile(meep)?.hex) {
                self.un_move(meep)?;
            }
        }
        Ok(())
    }

    // ========================================================================
    // PLACEMENT
    // ========================================================================

    /// Move `tile` to `to` and record it for undo.
    pub fn place_either(&mut self, tile: TileId, to: Option<HexId>) -> Result<()> {
        let from = {
            let t = self.tile(tile)?;
            t.hex.or(t.from_hex)
        };
        self.move_to(tile, to)?;
        self.undo.add_undo_rec(UndoRec { tile, from, to });
        Ok(())
    }

    /// `place_either` with logging; a drop on the recycle hex recycles.
    pub fn place_either2(&mut self, tile: TileId, to: Option<HexId>) -> Result<()> {
        let from = {
            let t = self.tile_mut(tile)?;
            if t.hex.is_some() {
                t.from_hex = t.hex;
            }
            t.from_hex
        };
        if to != from {
            let line = format!("{} -> {}", self.tile_str(tile), self.hex_name(to));
            self.log_text(&line, "gamePlay.placeEither");
        }
        self.place_either(tile, to)?;
        if to.is_some() && to == self.recycle_hex {
            let from_name = from.map_or_else(|| "?".to_string(), |h| self.hex_map.hex(h).aname().to_string());
            let line = format!("Recycle {} from {}", self.tile_str(tile), from_name);
            self.log_text(&line, "gamePlay.placeEither");
            self.recycle_tile(tile)?;
        }
        Ok(())
    }

    /// What a piece does when dropped: by default, `place_either2`.
    pub fn place_tile(&mut self, tile: TileId, to: Option<HexId>) -> Result<()> {
        self.place_either2(tile, to)
    }

    /// Log the recycling and send the piece home. The verb is the kind's own,
    /// or "defeated" when an opponent's piece is taken off the map.
    pub fn recycle_tile(&mut self, tile: TileId) -> Result<()> {
        let t = self.tile(tile)?;
        let mut verb = t.recycle_verb();
        if self.on_map(t.from_hex) && t.player != Some(self.cur_player) {
            verb = "defeated";
        }
        let who = self.cur_player().map_or_else(|| "-".to_string(), |p| p.name.clone());
        let line = format!("{} {} {}", who, verb, self.tile_str(tile));
        self.log_text(&line, "Tile.logRecycle");
        self.send_home(tile)
    }

    /// Back to the dispenser, or else to the home hex (None: off the table).
    pub fn send_home(&mut self, tile: TileId) -> Result<()> {
        let t = self.tile(tile)?;
        match (t.source(), t.home_hex) {
            (Some(src), _) => self.avail_unit(src, tile, false),
            (None, home) => self.place_either(tile, home),
        }
    }

    // ========================================================================
    // TURNS
    // ========================================================================

    /// Advance to `turn`, or with None to the next turn number (running the
    /// `new_turn_number` hook). The current player becomes
    /// `turn mod n_players` and starts their turn.
    pub fn set_next_player(&mut self, turn: Option<i32>) -> Result<()> {
        if self.players.is_empty() {
            return Err(GameError::NoPlayers);
        }
        let turn = match turn {
            Some(turn) => turn,
            None => {
                let turn = self.turn_number + 1;
                let rules = self.rules();
                rules.new_turn_number(self, turn);
                turn
            }
        };
        self.turn_number = turn;
        self.pre_game = false;
        self.cur_player = turn.rem_euclid(self.players.len() as i32) as usize;
        self.new_turn(self.cur_player)?;

        let log_at = match &self.log_writer {
            Some(w) => format!("{}@{}", w.log_name(), turn),
            None => format!("log@{} **", turn),
        };
        let line = format!("&file={} {}", log_at, self.players[self.cur_player].name);
        self.log_text(&line, "GamePlay.setNextPlayer");
        Ok(())
    }

    /// Start of `player`'s turn: their units on the map turn face-up.
    fn new_turn(&mut self, player: usize) -> Result<()> {
        for meep in self.meeples_of(player) {
            if self.on_map(self.tile(meep)?.hex) {
                self.face_up(meep, true)?;
            }
        }
        Ok(())
    }

    /// Seal the turn's moves, then end the game or move to the next player.
    pub fn end_turn(&mut self) -> Result<()> {
        self.undo.close_undo(self.turn_number, self.cur_player);
        let rules = self.rules();
        if rules.is_end_of_game(self) {
            rules.end_game(self);
            Ok(())
        } else {
            self.set_next_player(None)
        }
    }

    /// The single funnel for committed moves.
    /// A move that fails leaves the redo queue as it was.
    pub fn local_move_event(&mut self, mv: Move) -> Result<()> {
        let rules = self.rules();
        rules.do_player_move(self, mv.tile, mv.hex)?;
        if let Some(redo) = self.redo_moves.pop_front() {
            if redo.hex != mv.hex {
                self.redo_moves.clear();
            }
        }
        self.undo.close_undo(self.turn_number, self.cur_player);
        self.set_next_player(None)?;
        tracing::debug!("localMoveEvent: now {:?}", self.cur_player().map(|p| &p.name));
        Ok(())
    }

    /// A local player has moved. Returns false: the move is handled here
    /// rather than sent anywhere.
    pub fn player_move_event(&mut self, mv: Move) -> Result<bool> {
        self.local_move_event(mv)?;
        Ok(false)
    }

    // ========================================================================
    // UNDO / REDO
    // ========================================================================

    pub fn undo_log(&self) -> &UndoLog {
        &self.undo
    }

    pub(crate) fn undo_mut(&mut self) -> &mut UndoLog {
        &mut self.undo
    }

    pub fn redo_moves(&self) -> &VecDeque<Move> {
        &self.redo_moves
    }

    pub fn push_redo(&mut self, mv: Move) {
        self.redo_moves.push_back(mv);
    }

    /// Revert the newest undo group. A sealed group also restores its turn
    /// and player, and its move goes to the front of the redo queue.
    ///
    /// If a record cannot be reverted, the ones already reverted are moved
    /// forward again and the group goes back on the log.
    pub fn undo_move(&mut self) -> Result<bool> {
        let Some((group, closed)) = self.undo.pop_undo() else {
            return Ok(false);
        };
        let was_enabled = self.undo.is_enabled();
        self.undo.set_enabled(false);
        let mut reverted = 0;
        let mut result = Ok(());
        for rec in group.recs.iter().rev() {
            if let Err(e) = self.move_to(rec.tile, rec.from) {
                result = Err(e);
                break;
            }
            reverted += 1;
        }
        if result.is_err() {
            let start = group.recs.len() - reverted;
            for rec in &group.recs[start..] {
                if let Err(e) = self.move_to(rec.tile, rec.to) {
                    tracing::warn!("undoMove: could not restore {:?}: {}", rec.tile, e);
                }
            }
        }
        self.undo.set_enabled(was_enabled);
        if let Err(e) = result {
            self.undo.restore(group, closed);
            return Err(e);
        }

        if closed {
            if let Some(rec) = group.recs.iter().find(|r| r.to.is_some()) {
                if let Some(hex) = rec.to {
                    self.redo_moves.push_front(Move { tile: rec.tile, hex });
                }
            }
            self.turn_number = group.turn;
            self.cur_player = group.player;
        }
        tracing::info!("undoMove: turn {} redo={}", self.turn_number, self.redo_moves.len());
        Ok(true)
    }

    /// Replay the head of the redo queue through the move funnel.
    pub fn redo_move(&mut self) -> Result<Option<Move>> {
        let Some(&mv) = self.redo_moves.front() else {
            return Ok(None);
        };
        self.local_move_event(mv)?;
        Ok(Some(mv))
    }

    pub fn set_run_redo(&mut self, run: bool) {
        self.run_redo = run;
    }

    /// Replaying redos; turns itself off once the queue is empty.
    pub fn run_redo(&mut self) -> bool {
        if self.redo_moves.is_empty() {
            self.run_redo = false;
        }
        self.run_redo
    }

    /// Decide where the current player's move comes from.
    pub fn make_move(&mut self) -> MoveRequest {
        if self.run_redo() {
            if let Some(&mv) = self.redo_moves.front() {
                return MoveRequest::Redo(mv);
            }
        }
        match self.cur_player() {
            Some(p) if p.use_robo => MoveRequest::Robo,
            _ => MoveRequest::Gui,
        }
    }

    /// Ask `planner` for a move and commit it.
    pub fn play_robo_move(&mut self, planner: &mut dyn Planner) -> Result<Option<Move>> {
        let Some(mv) = planner.plan_move(self) else {
            return Ok(None);
        };
        self.local_move_event(mv)?;
        Ok(Some(mv))
    }

    // ========================================================================
    // PERSISTENCE
    // ========================================================================

    /// Snapshot the game and append it to the scenario log, if any.
    pub fn save_game(&mut self) -> Result<SetupElt> {
        let elt = ScenarioParser::save_state(self);
        if let Some(writer) = self.log_writer.as_mut() {
            writer.write_state(&elt)?;
        }
        Ok(elt)
    }
}
