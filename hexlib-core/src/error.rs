//! Error types for the core
//!
//! Every variant is classified: a `Bug` means the game built on top of the
//! core is wired incorrectly (unknown phase, overlapping drags); `Expected`
//! covers conditions a running game must be prepared to handle.

use crate::hex::HexId;
use crate::tile::TileId;

/// Whether an error indicates a wiring bug or an expected runtime condition
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorClass {
    Bug,
    Expected,
}

#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error("unknown phase: {0}")]
    UnknownPhase(String),

    #[error("phase machine has not been started")]
    NotStarted,

    #[error("a drag is already in progress")]
    DragInProgress,

    #[error("no drag in progress")]
    NotDragging,

    #[error("no such tile: {0:?}")]
    NoSuchTile(TileId),

    #[error("no hex at [{row},{col}]")]
    NoSuchHex { row: i32, col: i32 },

    #[error("game has no players")]
    NoPlayers,

    #[error("{hex:?} already holds {occupant:?}, cannot also take {incoming:?}")]
    OccupancyCollision {
        hex: HexId,
        occupant: TileId,
        incoming: TileId,
    },

    #[error("invalid params: {0}")]
    InvalidParams(String),

    #[error("bad scenario: {0}")]
    Scenario(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl GameError {
    pub fn class(&self) -> ErrorClass {
        match self {
            GameError::UnknownPhase(_)
            | GameError::NotStarted
            | GameError::DragInProgress
            | GameError::NotDragging
            | GameError::NoSuchTile(_)
            | GameError::NoSuchHex { .. }
            | GameError::NoPlayers => ErrorClass::Bug,
            GameError::OccupancyCollision { .. }
            | GameError::InvalidParams(_)
            | GameError::Scenario(_)
            | GameError::Json(_)
            | GameError::Io(_) => ErrorClass::Expected,
        }
    }

    pub fn is_bug(&self) -> bool {
        self.class() == ErrorClass::Bug
    }
}

pub type Result<T, E = GameError> = std::result::Result<T, E>;
