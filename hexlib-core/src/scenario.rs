//! Scenario records and the scenario log
//!
//! A `SetupElt` is one save point: turn, coins, where every piece stands
//! and the phase-specific `gameState`. A running game appends one per turn
//! to a log that is a JSON array:
//!
//! ```text
//! [
//! {
//!   "start": {"Aname":"log_10-19_14_05","n":2,"turn":0}
//! },
//! {
//!   "coins": [0,0],
//!   "turn": 1,
//!   ...
//! }
//! ]
//! ```
//!
//! The reader accepts a log whose writer never closed it.

use std::cell::RefCell;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::rc::Rc;

use anyhow::Context;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{GameError, Result};
use crate::game_play::GamePlay;
use crate::hex::{HexId, IHex};
use crate::tile::TileId;

// ============================================================================
// RECORDS
// ============================================================================

/// Where one piece stands
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub tile: String,
    pub hex: IHex,
}

/// One save point of a game
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SetupElt {
    #[serde(rename = "Aname", default, skip_serializing_if = "Option::is_none")]
    pub aname: Option<String>,
    /// Present on saved games: place everything from the record
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turn: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coins: Option<Vec<i32>>,
    #[serde(rename = "gameState", default, skip_serializing_if = "Option::is_none")]
    pub game_state: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placements: Option<Vec<Placement>>,
    /// Game-specific fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SetupElt {
    pub fn named(aname: &str) -> Self {
        Self { aname: Some(aname.to_string()), ..Self::default() }
    }
}

/// Initial conditions, the first record of a log
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartElt {
    #[serde(rename = "Aname")]
    pub aname: String,
    /// Number of players
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turn: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scene: Option<String>,
}

/// Local time as written into records
pub fn stime() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f").to_string()
}

// ============================================================================
// PARSER
// ============================================================================

pub struct ScenarioParser;

impl ScenarioParser {
    /// Recreate the game described by `setup`. A record with a turn is a
    /// saved game: the map is cleared and every piece placed from it.
    pub fn parse_scenario(gp: &mut GamePlay, setup: &SetupElt) -> Result<()> {
        tracing::info!("parseScenario: {}", setup.aname.as_deref().unwrap_or("-"));
        let was_enabled = gp.undo_log().is_enabled();
        gp.undo_mut().set_enabled(false);
        let result = Self::apply(gp, setup);
        gp.undo_mut().set_enabled(was_enabled);
        result
    }

    /// Resolve and check the whole record first, so a bad element leaves
    /// `gp` as it was.
    fn apply(gp: &mut GamePlay, setup: &SetupElt) -> Result<()> {
        let placements = Self::resolve_placements(gp, setup)?;
        if let Some(coins) = &setup.coins {
            if coins.len() > gp.n_players() {
                return Err(GameError::Scenario(format!(
                    "coins for {} players, table has {}",
                    coins.len(),
                    gp.n_players()
                )));
            }
        }
        if let Some(state) = &setup.game_state {
            gp.game_state.parse_state(state)?;
        }

        if let Some(turn) = setup.turn {
            gp.set_turn_number(turn);
            gp.log_text(&format!("turn = {}", turn), "parseScenario");
            let on_map: Vec<_> = gp
                .tiles()
                .iter()
                .filter(|t| t.hex().map_or(false, |h| gp.hex_map.hex(h).is_on_map()))
                .map(|t| t.id())
                .collect();
            for tile in on_map {
                gp.send_home(tile)?;
            }
        }
        for (index, &coins) in setup.coins.iter().flatten().enumerate() {
            gp.player_mut(index)?.coins = coins;
        }
        for (tile, hex) in placements {
            gp.move_to(tile, Some(hex))?;
        }
        Ok(())
    }

    /// Tile and hex for every placement. Two pieces may not claim the same
    /// slot of one hex.
    fn resolve_placements(gp: &GamePlay, setup: &SetupElt) -> Result<Vec<(TileId, HexId)>> {
        let mut slots = FxHashSet::default();
        let mut resolved = Vec::new();
        for placement in setup.placements.iter().flatten() {
            let tile = gp
                .find_tile(&placement.tile)
                .ok_or_else(|| GameError::Scenario(format!("no tile named {}", placement.tile)))?;
            let hex = Self::find_hex(gp, &placement.hex)?;
            if !slots.insert((hex, gp.tile(tile)?.is_meep())) {
                return Err(GameError::Scenario(format!(
                    "{} placed on {} which is already taken",
                    placement.tile, placement.hex.aname
                )));
            }
            resolved.push((tile, hex));
        }
        Ok(resolved)
    }

    fn find_hex(gp: &GamePlay, ihex: &IHex) -> Result<HexId> {
        let map = &gp.hex_map;
        let found = if ihex.row >= 0 {
            map.get(ihex.row, ihex.col).map(|h| h.id())
        } else {
            map.aux_hexes().iter().copied().find(|&h| map.hex(h).aname() == ihex.aname)
        };
        found.ok_or(GameError::NoSuchHex { row: ihex.row, col: ihex.col })
    }

    /// Snapshot `gp` as a record. The time is stamped when it is written.
    pub fn save_state(gp: &GamePlay) -> SetupElt {
        let placements = gp
            .tiles()
            .iter()
            .filter_map(|t| {
                let hex = gp.hex_map.hex(t.hex()?);
                hex.is_on_map().then(|| Placement { tile: t.aname().to_string(), hex: hex.ihex() })
            })
            .collect();
        SetupElt {
            turn: Some(gp.turn_number().max(0)),
            coins: Some(gp.players().iter().map(|p| p.coins).collect()),
            game_state: Some(gp.game_state.save_state()),
            placements: Some(placements),
            ..SetupElt::default()
        }
    }
}

// ============================================================================
// WRITER
// ============================================================================

/// Appends records to a scenario log, one key per line.
pub struct LogWriter {
    file_name: String,
    out: Box<dyn Write>,
    n_records: usize,
    closed: bool,
}

impl std::fmt::Debug for LogWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogWriter")
            .field("file_name", &self.file_name)
            .field("n_records", &self.n_records)
            .field("closed", &self.closed)
            .finish()
    }
}

impl LogWriter {
    pub fn new(file_name: &str, mut out: Box<dyn Write>) -> Result<Self> {
        out.write_all(b"[\n")?;
        Ok(Self { file_name: file_name.to_string(), out, n_records: 0, closed: false })
    }

    pub fn create(path: &Path) -> anyhow::Result<Self> {
        let file = File::create(path).with_context(|| format!("creating scenario log {}", path.display()))?;
        let name = path.to_string_lossy();
        Ok(Self::new(&name, Box::new(BufWriter::new(file)))?)
    }

    /// `log_MM-DD_HH_MM.json` for now
    pub fn default_file_name() -> String {
        format!("log_{}.json", chrono::Local::now().format("%m-%d_%H_%M"))
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// File name without directory or extension
    pub fn log_name(&self) -> &str {
        Path::new(&self.file_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.file_name)
    }

    pub fn n_records(&self) -> usize {
        self.n_records
    }

    pub fn write_start(&mut self, start: &StartElt) -> Result<()> {
        let mut start = start.clone();
        start.time.get_or_insert_with(stime);
        let mut record = Map::new();
        record.insert("start".to_string(), serde_json::to_value(&start)?);
        self.write_record(&record)
    }

    pub fn write_state(&mut self, elt: &SetupElt) -> Result<()> {
        let mut elt = elt.clone();
        elt.time = Some(stime());
        match serde_json::to_value(&elt)? {
            Value::Object(record) => self.write_record(&record),
            other => Err(GameError::Scenario(format!("record is not an object: {}", other))),
        }
    }

    fn write_record(&mut self, record: &Map<String, Value>) -> Result<()> {
        if self.closed {
            return Err(GameError::Scenario(format!("{} is closed", self.file_name)));
        }
        let mut text = String::from(if self.n_records > 0 { ",\n{" } else { "{" });
        let last = record.len().saturating_sub(1);
        for (i, (key, value)) in record.iter().enumerate() {
            let sep = if i < last { "," } else { "" };
            text.push_str(&format!("\n  {}: {}{}", serde_json::to_string(key)?, serde_json::to_string(value)?, sep));
        }
        text.push_str("\n}");
        self.out.write_all(text.as_bytes())?;
        self.out.flush()?;
        self.n_records += 1;
        Ok(())
    }

    /// Terminate the array. Later writes fail.
    pub fn close(&mut self) -> Result<()> {
        if !self.closed {
            self.out.write_all(b"\n]\n")?;
            self.out.flush()?;
            self.closed = true;
        }
        Ok(())
    }
}

/// An in-memory log target; clones share the buffer.
#[derive(Clone, Debug, Default)]
pub struct MemoryLog(Rc<RefCell<Vec<u8>>>);

impl MemoryLog {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for MemoryLog {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

// ============================================================================
// READER
// ============================================================================

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScenarioLog {
    pub start: Option<StartElt>,
    pub states: Vec<SetupElt>,
}

impl ScenarioLog {
    pub fn parse(text: &str) -> Result<Self> {
        let body = text.trim();
        let body = body.strip_suffix(']').unwrap_or(body).trim_end();
        let body = body.strip_suffix(',').unwrap_or(body);
        let values: Vec<Value> = serde_json::from_str(&format!("{}]", body))?;

        let mut log = Self::default();
        for value in values {
            match value.get("start") {
                Some(start) => log.start = Some(serde_json::from_value(start.clone())?),
                None => log.states.push(serde_json::from_value(value)?),
            }
        }
        Ok(log)
    }

    pub fn read(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading scenario log {}", path.display()))?;
        let log = Self::parse(&text).with_context(|| format!("parsing scenario log {}", path.display()))?;
        tracing::debug!("read {} states from {}", log.states.len(), path.display());
        Ok(log)
    }

    /// The last record saved at `turn`
    pub fn state_at(&self, turn: i32) -> Option<&SetupElt> {
        self.states.iter().rev().find(|s| s.turn == Some(turn))
    }
}

/// Pull the record for `turn` out of log text, named `{file_name}@{turn}`.
pub fn extract_state(file_name: &str, text: &str, turn: i32) -> Result<SetupElt> {
    let log = ScenarioLog::parse(text)?;
    let mut elt = log
        .state_at(turn)
        .cloned()
        .ok_or_else(|| GameError::Scenario(format!("{} has no state for turn {}", file_name, turn)))?;
    elt.aname = Some(format!("{}@{}", file_name, turn));
    Ok(elt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game_state::PhaseCodec;
    use crate::hex_map::HexMap;
    use crate::tile::{PieceKind, TileId};
    use crate::topo::Topo;

    fn game() -> GamePlay {
        let mut map = HexMap::new(Topo::Ew, 1.0);
        map.make_all_districts(1, 2);
        let mut gp = GamePlay::new(map, 2);
        gp.make_recycle_hex(-1, -3);
        gp.game_state.set_codec(Rc::new(PhaseCodec));
        gp.add_tile(PieceKind::MapTile, None);
        gp.add_tile(PieceKind::MapTile, Some(1));
        gp.add_tile(PieceKind::Meeple, Some(0));
        gp
    }

    fn hex(gp: &GamePlay, row: i32, col: i32) -> HexId {
        gp.hex_map.get(row, col).unwrap().id()
    }

    #[test]
    fn test_save_state_lists_on_map_pieces() {
        let mut gp = game();
        let recycle = gp.recycle_hex().unwrap();
        gp.move_to(TileId(0), Some(hex(&gp, 3, 3))).unwrap();
        gp.move_to(TileId(1), Some(recycle)).unwrap();
        gp.set_next_player(Some(-2)).unwrap();

        let elt = ScenarioParser::save_state(&gp);
        assert_eq!(elt.turn, Some(0));
        assert_eq!(elt.coins, Some(vec![0, 0]));
        assert_eq!(elt.time, None);
        let placements = elt.placements.unwrap();
        assert_eq!(placements.len(), 1);
        assert_eq!(placements[0].tile, "Tile-0");
        assert_eq!(placements[0].hex.aname, "Hex@[3,3]");
    }

    #[test]
    fn test_save_parse_save_is_idempotent() {
        let mut gp = game();
        gp.move_to(TileId(0), Some(hex(&gp, 3, 3))).unwrap();
        gp.move_to(TileId(2), Some(hex(&gp, 2, 4))).unwrap();
        gp.player_mut(1).unwrap().coins = 4;
        gp.set_next_player(Some(3)).unwrap();
        gp.game_state.scratch.insert("actions".to_string(), Value::from(2));
        let saved = ScenarioParser::save_state(&gp);

        let mut fresh = game();
        fresh.move_to(TileId(1), Some(hex(&fresh, 4, 4))).unwrap();
        ScenarioParser::parse_scenario(&mut fresh, &saved).unwrap();
        assert_eq!(fresh.turn_number(), 3);
        assert_eq!(fresh.tile(TileId(1)).unwrap().hex(), None);
        assert_eq!(fresh.player(1).unwrap().coins, 4);
        assert!(fresh.undo_log().open_recs().is_empty());
        assert_eq!(fresh.text_log().last(), Some("turn = 3"));
        assert_eq!(ScenarioParser::save_state(&fresh), saved);
    }

    #[test]
    fn test_unknown_tile_is_a_scenario_error() {
        let mut gp = game();
        let mut elt = SetupElt::named("bad");
        elt.placements = Some(vec![Placement {
            tile: "Tile-99".to_string(),
            hex: IHex { aname: "Hex@[3,3]".to_string(), row: 3, col: 3 },
        }]);
        let err = ScenarioParser::parse_scenario(&mut gp, &elt).unwrap_err();
        assert!(matches!(err, GameError::Scenario(_)));
        assert!(gp.undo_log().is_enabled());
    }

    #[test]
    fn test_bad_record_changes_nothing() {
        let mut gp = game();
        let a = hex(&gp, 3, 3);
        gp.move_to(TileId(1), Some(a)).unwrap();
        gp.set_next_player(Some(1)).unwrap();

        let mut elt = SetupElt::named("bad");
        elt.turn = Some(5);
        elt.coins = Some(vec![3, 3]);
        elt.placements = Some(vec![
            Placement { tile: "Tile-0".to_string(), hex: IHex { aname: "Hex@[2,3]".to_string(), row: 2, col: 3 } },
            Placement { tile: "Tile-1".to_string(), hex: IHex { aname: "Hex@[9,9]".to_string(), row: 9, col: 9 } },
        ]);
        let err = ScenarioParser::parse_scenario(&mut gp, &elt).unwrap_err();
        assert!(matches!(err, GameError::NoSuchHex { row: 9, col: 9 }));
        assert_eq!(gp.turn_number(), 1);
        assert_eq!(gp.player(0).unwrap().coins, 0);
        assert_eq!(gp.tile(TileId(0)).unwrap().hex(), None);
        assert_eq!(gp.tile(TileId(1)).unwrap().hex(), Some(a));

        // two tiles on one hex
        elt.placements = Some(vec![
            Placement { tile: "Tile-0".to_string(), hex: IHex { aname: "Hex@[2,3]".to_string(), row: 2, col: 3 } },
            Placement { tile: "Tile-1".to_string(), hex: IHex { aname: "Hex@[2,3]".to_string(), row: 2, col: 3 } },
        ]);
        assert!(matches!(ScenarioParser::parse_scenario(&mut gp, &elt), Err(GameError::Scenario(_))));
        assert_eq!(gp.tile(TileId(1)).unwrap().hex(), Some(a));

        // unknown saved phase
        elt.placements = None;
        elt.game_state = Some(vec![Value::from("NoSuchPhase")]);
        assert!(matches!(ScenarioParser::parse_scenario(&mut gp, &elt), Err(GameError::Scenario(_))));
        assert_eq!(gp.turn_number(), 1);
        assert_eq!(gp.tile(TileId(1)).unwrap().hex(), Some(a));
    }

    #[test]
    fn test_placement_on_aux_hex() {
        let mut gp = game();
        let mut elt = SetupElt::default();
        elt.placements = Some(vec![Placement {
            tile: "Tile-0".to_string(),
            hex: IHex { aname: "Recycle".to_string(), row: -1, col: -3 },
        }]);
        ScenarioParser::parse_scenario(&mut gp, &elt).unwrap();
        assert_eq!(gp.tile(TileId(0)).unwrap().hex(), gp.recycle_hex());
    }

    #[test]
    fn test_record_json_names() {
        let mut elt = SetupElt::named("game@2");
        elt.turn = Some(2);
        elt.game_state = Some(vec![Value::from("Move")]);
        elt.extra.insert("n_hexes".to_string(), Value::from(1));
        let json = serde_json::to_value(&elt).unwrap();
        assert_eq!(json["Aname"], "game@2");
        assert_eq!(json["gameState"][0], "Move");
        assert_eq!(json["n_hexes"], 1);
        assert!(json.get("coins").is_none());

        let back: SetupElt = serde_json::from_value(json).unwrap();
        assert_eq!(back, elt);
    }

    #[test]
    fn test_writer_output_reads_back() {
        let buf = MemoryLog::default();
        let mut writer = LogWriter::new("logs/log_10-19.json", Box::new(buf.clone())).unwrap();
        assert_eq!(writer.log_name(), "log_10-19");
        writer
            .write_start(&StartElt { aname: "log_10-19".to_string(), n: Some(2), ..StartElt::default() })
            .unwrap();
        let mut elt = SetupElt::default();
        for turn in 0..3 {
            elt.turn = Some(turn);
            writer.write_state(&elt).unwrap();
        }
        assert_eq!(writer.n_records(), 4);

        // unterminated log
        let text = buf.contents();
        assert!(text.starts_with("[\n{\n  \"start\": "));
        assert!(text.contains("\n  \"turn\": 1\n}"));
        let log = ScenarioLog::parse(&text).unwrap();
        assert_eq!(log.start.as_ref().map(|s| s.n), Some(Some(2)));
        assert_eq!(log.states.len(), 3);
        assert!(log.states.iter().all(|s| s.time.is_some()));

        writer.close().unwrap();
        assert!(buf.contents().ends_with("}\n]\n"));
        assert_eq!(ScenarioLog::parse(&buf.contents()).unwrap(), log);
        assert!(writer.write_state(&elt).is_err());
    }

    #[test]
    fn test_trailing_comma_and_empty_log() {
        let log = ScenarioLog::parse("[\n{\"turn\": 4},\n").unwrap();
        assert_eq!(log.states[0].turn, Some(4));
        assert_eq!(ScenarioLog::parse("[\n").unwrap(), ScenarioLog::default());
    }

    #[test]
    fn test_extract_state() {
        let text = r#"[{"start":{"Aname":"x"}},{"turn":1,"coins":[1]},{"turn":2},{"turn":1,"coins":[5]}]"#;
        let elt = extract_state("log_a", text, 1).unwrap();
        assert_eq!(elt.aname.as_deref(), Some("log_a@1"));
        assert_eq!(elt.coins, Some(vec![5]));
        assert!(matches!(extract_state("log_a", text, 7), Err(GameError::Scenario(_))));
    }

    #[test]
    fn test_save_game_writes_to_log() {
        let buf = MemoryLog::default();
        let writer = LogWriter::new("game.json", Box::new(buf.clone())).unwrap();
        let mut gp = game().with_log_writer(writer);
        gp.set_next_player(Some(0)).unwrap();
        assert_eq!(gp.text_log().last(), Some("&file=game@0 P0:red"));
        gp.start().unwrap();
        let log = ScenarioLog::parse(&buf.contents()).unwrap();
        assert_eq!(log.states.len(), 1);
        assert_eq!(log.states[0].game_state.as_ref().unwrap()[0], "BeginTurn");
    }
}
