//! Game pieces
//!
//! All pieces share one struct; what differs between a stationary map tile,
//! a mobile unit and a token is captured by `PieceKind`, and game-specific
//! behavior plugs in through `Rules`.

use serde::{Deserialize, Serialize};

use crate::hex::HexId;
use crate::tile_source::SourceId;

/// Index of a piece in its game's registry
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileId(pub(crate) u32);

impl TileId {
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PieceKind {
    /// Stationary; occupies a hex's tile slot
    MapTile,
    /// Mobile unit; occupies a hex's meep slot, turns face-down once moved
    Meeple,
    /// Small marker; occupies the tile slot
    Token,
}

impl PieceKind {
    /// Meeples use the meep slot, everything else the tile slot.
    pub fn is_meep(self) -> bool {
        self == PieceKind::Meeple
    }

    /// Verb used when a piece of this kind goes to the recycle bin
    pub fn recycle_verb(self) -> &'static str {
        match self {
            PieceKind::MapTile => "demolished",
            PieceKind::Meeple => "dismissed",
            PieceKind::Token => "recycled",
        }
    }

    pub fn class_name(self) -> &'static str {
        match self {
            PieceKind::MapTile => "Tile",
            PieceKind::Meeple => "Meeple",
            PieceKind::Token => "Token",
        }
    }
}

#[derive(Clone, Debug)]
pub struct Tile {
    id: TileId,
    aname: String,
    kind: PieceKind,
    /// Owning player index
    pub player: Option<usize>,
    /// Where `send_home` puts the piece
    pub home_hex: Option<HexId>,
    pub(crate) hex: Option<HexId>,
    pub(crate) from_hex: Option<HexId>,
    pub(crate) start_hex: Option<HexId>,
    pub(crate) face_up: bool,
    pub(crate) source: Option<SourceId>,
}

impl Tile {
    pub(crate) fn new(id: TileId, kind: PieceKind, player: Option<usize>) -> Self {
        Self {
            id,
            aname: format!("{}-{}", kind.class_name(), id.index()),
            kind,
            player,
            home_hex: None,
            hex: None,
            from_hex: None,
            start_hex: None,
            face_up: true,
            source: None,
        }
    }

    pub fn id(&self) -> TileId {
        self.id
    }

    pub fn aname(&self) -> &str {
        &self.aname
    }

    pub fn kind(&self) -> PieceKind {
        self.kind
    }

    pub fn is_meep(&self) -> bool {
        self.kind.is_meep()
    }

    pub fn recycle_verb(&self) -> &'static str {
        self.kind.recycle_verb()
    }

    /// The hex this piece sits on; None while lifted or off the table
    pub fn hex(&self) -> Option<HexId> {
        self.hex
    }

    /// Origin of the current (or last) move
    pub fn from_hex(&self) -> Option<HexId> {
        self.from_hex
    }

    /// Where a mobile unit stood at the start of its owner's turn
    pub fn start_hex(&self) -> Option<HexId> {
        self.start_hex
    }

    pub fn is_face_up(&self) -> bool {
        self.face_up
    }

    pub fn source(&self) -> Option<SourceId> {
        self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_and_verbs() {
        let tile = Tile::new(TileId(3), PieceKind::MapTile, Some(0));
        assert_eq!(tile.aname(), "Tile-3");
        assert_eq!(tile.recycle_verb(), "demolished");
        assert!(!tile.is_meep());

        let meep = Tile::new(TileId(4), PieceKind::Meeple, None);
        assert_eq!(meep.aname(), "Meeple-4");
        assert_eq!(meep.recycle_verb(), "dismissed");
        assert!(meep.is_meep());
        assert!(meep.is_face_up());

        assert_eq!(PieceKind::Token.recycle_verb(), "recycled");
    }
}
