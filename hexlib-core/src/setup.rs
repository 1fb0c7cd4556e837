//! GameSetup: from parameters to a running game
//!
//! Startup order matters and lives here so callers cannot get it wrong:
//!
//! 1. validate the params, build the map
//! 2. create the players, the recycle hex and the game's pieces
//! 3. open the scenario log with its start record
//! 4. apply the scenario, if any
//! 5. set the first player and start the phase machine

use std::rc::Rc;

use serde_json::Value;

use crate::drag::Table;
use crate::error::Result;
use crate::game_play::GamePlay;
use crate::game_state::StateCodec;
use crate::hex_map::{HexMap, MapLayout};
use crate::params::TableParams;
use crate::rules::Rules;
use crate::scenario::{LogWriter, ScenarioParser, SetupElt, StartElt};
use crate::view::Headless;

/// Where the recycle hex sits, off the map
pub const RECYCLE_RC: (i32, i32) = (-1, -3);

type PieceFn = Box<dyn Fn(&mut GamePlay) -> Result<()>>;

/// A started game and the table that drags its pieces
pub struct Session {
    pub game_play: GamePlay,
    pub table: Table,
}

pub struct GameSetup {
    pub params: TableParams,
    rules: Rc<dyn Rules>,
    codec: Option<Rc<dyn StateCodec>>,
    pieces: Option<PieceFn>,
}

impl GameSetup {
    pub fn new(params: TableParams, rules: Rc<dyn Rules>) -> Self {
        Self { params, rules, codec: None, pieces: None }
    }

    pub fn with_codec(mut self, codec: Rc<dyn StateCodec>) -> Self {
        self.codec = Some(codec);
        self
    }

    /// Create the game's pieces on every startup, before any scenario is
    /// applied (placements refer to pieces by name).
    pub fn with_pieces<F>(mut self, pieces: F) -> Self
    where
        F: Fn(&mut GamePlay) -> Result<()> + 'static,
    {
        self.pieces = Some(Box::new(pieces));
        self
    }

    /// Build and start a game, optionally from a saved record.
    pub fn startup(&self, scenario: Option<&SetupElt>, log_writer: Option<LogWriter>) -> Result<Session> {
        let params = &self.params;
        params.validate()?;

        let mut map = HexMap::new(params.topo(), params.hex_rad);
        map.make_layout(MapLayout::MetaHexRings { nh: params.n_hexes, mh: params.m_hexes });
        let mut gp = GamePlay::new(map, params.num_players)
            .with_rules(Rc::clone(&self.rules))
            .with_text_log_lines(params.text_log_lines);
        if let Some(seed) = params.seed {
            gp = gp.with_seed(seed);
        }
        if let Some(codec) = &self.codec {
            gp.game_state.set_codec(Rc::clone(codec));
        }
        gp.make_recycle_hex(RECYCLE_RC.0, RECYCLE_RC.1);
        if let Some(pieces) = &self.pieces {
            pieces(&mut gp)?;
        }

        let turn = scenario.and_then(|s| s.turn).unwrap_or(0);
        if let Some(mut writer) = log_writer {
            let start = StartElt {
                aname: writer.log_name().to_string(),
                n: Some(params.num_players),
                turn: Some(turn),
                scene: scenario.and_then(|s| s.aname.clone()),
                ..StartElt::default()
            };
            writer.write_start(&start)?;
            gp = gp.with_log_writer(writer);
        }
        if let Some(scenario) = scenario {
            ScenarioParser::parse_scenario(&mut gp, scenario)?;
        }

        tracing::info!(
            "startup: nh={} mh={} players={} turn={} hexes={}",
            params.n_hexes,
            params.m_hexes,
            params.num_players,
            turn,
            gp.hex_map.len()
        );
        gp.set_next_player(Some(turn))?;
        gp.start()?;
        Ok(Session { game_play: gp, table: Table::new(Box::new(Headless::default())) })
    }

    /// Rebuild from a saved record, taking the map shape from it when the
    /// record carries one.
    pub fn restart(&mut self, state: &SetupElt, log_writer: Option<LogWriter>) -> Result<Session> {
        let get_usize = |key: &str| state.extra.get(key).and_then(Value::as_u64).map(|n| n as usize);
        if let Some(nh) = get_usize("n_hexes") {
            self.params.n_hexes = nh;
        }
        if let Some(mh) = get_usize("m_hexes") {
            self.params.m_hexes = mh;
        }
        if let Some(rad) = state.extra.get("hex_rad").and_then(Value::as_f64) {
            self.params.hex_rad = rad;
        }
        tracing::info!("restart: {}", state.aname.as_deref().unwrap_or("-"));
        self.startup(Some(state), log_writer)
    }

    /// The game's record plus the map shape `restart` needs.
    pub fn save_state(&self, gp: &GamePlay) -> SetupElt {
        let mut elt = ScenarioParser::save_state(gp);
        elt.extra.insert("n_hexes".to_string(), Value::from(self.params.n_hexes));
        elt.extra.insert("m_hexes".to_string(), Value::from(self.params.m_hexes));
        elt.extra.insert("hex_rad".to_string(), Value::from(self.params.hex_rad));
        elt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game_state::PhaseCodec;
    use crate::hex_map::ft_hexes;
    use crate::rules::DefaultRules;
    use crate::scenario::{MemoryLog, ScenarioLog};
    use crate::tile::PieceKind;

    fn setup(nh: usize, mh: usize) -> GameSetup {
        let params = TableParams::default().with_map(nh, mh);
        GameSetup::new(params, Rc::new(DefaultRules))
            .with_codec(Rc::new(PhaseCodec))
            .with_pieces(|gp| {
                for player in 0..gp.n_players() {
                    gp.add_tile(PieceKind::MapTile, Some(player));
                }
                Ok(())
            })
    }

    #[test]
    fn test_startup_waits_for_a_move() {
        let session = setup(1, 2).startup(None, None).unwrap();
        let gp = &session.game_play;
        assert_eq!(gp.hex_map.len(), ft_hexes(2));
        assert!(gp.is_phase("Move"));
        assert_eq!(gp.turn_number(), 0);
        assert_eq!(gp.cur_player_index(), 0);
        assert!(gp.recycle_hex().is_some());
        assert_eq!(gp.tiles().len(), 2);
        assert!(!session.table.is_dragging());
    }

    #[test]
    fn test_startup_rejects_bad_params() {
        let mut bad = setup(1, 2);
        bad.params.num_players = 0;
        assert!(bad.startup(None, None).is_err());
    }

    #[test]
    fn test_startup_writes_start_record() {
        let buf = MemoryLog::default();
        let writer = LogWriter::new("log_x.json", Box::new(buf.clone())).unwrap();
        setup(1, 2).startup(None, Some(writer)).unwrap();
        let log = ScenarioLog::parse(&buf.contents()).unwrap();
        let start = log.start.unwrap();
        assert_eq!(start.aname, "log_x");
        assert_eq!(start.n, Some(2));
        // BeginTurn saved the game
        assert_eq!(log.states.len(), 1);
        assert_eq!(log.states[0].turn, Some(0));
    }

    #[test]
    fn test_restart_from_saved_state() {
        let mut gs = setup(1, 2);
        let mut session = gs.startup(None, None).unwrap();
        let hex = session.game_play.hex_map.get(3, 3).unwrap().id();
        let tile = session.game_play.find_tile("Tile-1").unwrap();
        session.game_play.move_to(tile, Some(hex)).unwrap();
        session.game_play.set_next_player(Some(5)).unwrap();
        let mut state = gs.save_state(&session.game_play);
        state.extra.insert("m_hexes".to_string(), Value::from(3));
        state.placements = Some(Vec::new());

        let restarted = gs.restart(&state, None).unwrap();
        let gp = &restarted.game_play;
        assert_eq!(gs.params.m_hexes, 3);
        assert_eq!(gp.hex_map.len(), ft_hexes(3));
        assert_eq!(gp.turn_number(), 5);
        assert_eq!(gp.cur_player_index(), 1);
        assert!(gp.is_phase("Move"));
    }
}
