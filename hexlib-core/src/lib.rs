//! hexlib Core - hex-grid board game engine
//!
//! This crate provides the game-independent core of a hex board game:
//! - Hex topology (EW / NS offset grids) and the linked hex graph
//! - Map construction from rings of districts, with district colouring
//! - Pieces (map tiles, meeples, tokens), dispensers and hex occupancy
//! - A named-phase state machine and turn orchestration with undo/redo
//! - The drag-and-drop move protocol with legality marking
//! - Scenario records and the scenario log
//!
//! Games plug in through the `Rules` trait and, for phase data, `StateCodec`.

pub mod topo;
pub mod hex;
pub mod hex_map;
pub mod error;
pub mod tile;
pub mod tile_source;
pub mod player;
pub mod undo;
pub mod text_log;
pub mod rules;
pub mod game_state;
pub mod game_play;
pub mod drag;
pub mod view;
pub mod scenario;
pub mod params;
pub mod setup;

// Re-exports for convenient access
pub use topo::{EwDir, HexDir, NsDir, RowCol, Topo};
pub use hex::{Hex, HexId, HexRef, IHex};
pub use hex_map::{ft_hexes, HexMap, MapLayout};
pub use error::{ErrorClass, GameError, Result};
pub use tile::{PieceKind, Tile, TileId};
pub use tile_source::{SourceId, TileSource};
pub use player::{Planner, Player};
pub use undo::{UndoLog, UndoRec};
pub use text_log::TextLog;
pub use rules::{Collision, DefaultRules, Rules};
pub use game_state::{GameState, Phase, PhaseCodec, Purge, StateCodec, Transition};
pub use game_play::{GamePlay, Move, MoveRequest};
pub use drag::{DragContext, DragInfo, DragStatus, Dropped, Table};
pub use view::{Headless, MapView};
pub use scenario::{LogWriter, ScenarioLog, ScenarioParser, SetupElt, StartElt};
pub use params::TableParams;
pub use setup::{GameSetup, Session};
