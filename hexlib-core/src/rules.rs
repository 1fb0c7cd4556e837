//! Rules: the seam where a game plugs its behavior into the core
//!
//! Every hook has a default that implements the generic board-game
//! behavior; a game overrides only what it changes. Hooks receive the
//! `GamePlay` explicitly and, during a drag, the `DragContext`.

use crate::drag::DragContext;
use crate::error::{GameError, Result};
use crate::game_play::GamePlay;
use crate::hex::HexId;
use crate::tile::TileId;

/// How to resolve a unit arriving on an occupied slot
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Collision {
    /// Put the occupant back into its dispenser
    ReturnToSource,
    /// Send the occupant to its home hex
    SendHome,
    /// Refuse the move
    Reject,
}

pub trait Rules {
    /// Reason the current player may not pick up `tile`, or None if they may.
    fn cant_be_moved_by(&self, gp: &GamePlay, tile: TileId, ctx: &DragContext) -> Option<String> {
        let owner = gp.tile(tile).ok().and_then(|t| t.player);
        match owner {
            _ if ctx.last_shift => None,
            None => None,
            Some(p) if p == gp.cur_player_index() => None,
            Some(_) => Some("Not your Tile".to_string()),
        }
    }

    fn is_dragable(&self, _gp: &GamePlay, _tile: TileId) -> bool {
        true
    }

    /// Whether `tile` may be dropped on `hex` in this drag.
    fn is_legal_target(&self, gp: &GamePlay, tile: TileId, hex: HexId, ctx: &DragContext) -> bool {
        let Ok(t) = gp.tile(tile) else {
            return false;
        };
        let to = gp.hex_map.hex(hex);
        if t.is_meep() {
            if to.meep().is_some() || !to.is_on_map() {
                return false;
            }
            return ctx.last_shift || t.is_face_up();
        }
        if to.tile().is_some() {
            return false;
        }
        if let Some(meep) = to.meep() {
            let meep_owner = gp.tile(meep).ok().and_then(|m| m.player);
            if meep_owner != Some(gp.cur_player_index()) {
                return false;
            }
        }
        let from_on_map = ctx.from_hex.map_or(false, |h| gp.hex_map.hex(h).is_on_map());
        !(from_on_map && !ctx.last_shift)
    }

    /// Whether `tile` may be dropped on the recycle hex.
    fn is_legal_recycle(&self, gp: &GamePlay, tile: TileId, _ctx: &DragContext) -> bool {
        match gp.tile(tile) {
            Ok(t) if t.is_meep() => t.player == Some(gp.cur_player_index()),
            Ok(_) => true,
            Err(_) => false,
        }
    }

    /// Called after the drag context is built, before legality marking.
    fn drag_start(&self, _gp: &mut GamePlay, _tile: TileId, _ctx: &DragContext) {}

    /// Shift or ctrl changed mid-drag.
    fn drag_shift(&self, _gp: &mut GamePlay, _tile: TileId, _shift: bool, _ctx: &DragContext) {}

    /// Every pointer move of a drag, after the target is updated.
    fn drag_func(&self, _gp: &mut GamePlay, _tile: TileId, _hex: Option<HexId>, _ctx: &DragContext) {}

    /// Nothing is legal; return true to keep dragging anyway.
    /// The default keeps going only if the recycle hex is a legal target.
    fn no_legal_target(&self, gp: &GamePlay, _tile: TileId, _ctx: &DragContext) -> bool {
        gp.recycle_hex().map_or(false, |h| gp.hex_map.hex(h).is_legal())
    }

    /// Commit the drop of `tile` on `hex` (which may be where it came from).
    /// The default places it, then refills a dispenser left empty.
    fn drop_func(&self, gp: &mut GamePlay, tile: TileId, hex: HexId, ctx: &DragContext) -> Result<()> {
        gp.place_tile(tile, Some(hex))?;
        let source = gp.tile(tile)?.source();
        if let Some(src) = source {
            let src_hex = gp.source(src)?.hex();
            if ctx.from_hex == Some(src_hex) && hex != src_hex && gp.source_hex_unit(src)?.is_none() {
                gp.next_unit(src, None)?;
            }
        }
        Ok(())
    }

    /// `incoming` is arriving on `hex`, whose slot already holds `occupant`.
    /// The default only resolves a unit dropped back on its own dispenser
    /// while a later unit from that dispenser sits there.
    fn unit_collision(&self, gp: &GamePlay, hex: HexId, occupant: TileId, incoming: TileId) -> Collision {
        let source_hex = |t: TileId| {
            gp.tile(t)
                .ok()
                .and_then(|t| t.source())
                .and_then(|s| gp.source(s).ok())
                .map(|s| s.hex())
        };
        if source_hex(occupant) == Some(hex) && source_hex(incoming) == Some(hex) {
            Collision::ReturnToSource
        } else {
            Collision::Reject
        }
    }

    fn is_end_of_game(&self, _gp: &GamePlay) -> bool {
        false
    }

    /// The turn counter is about to advance to `turn`.
    fn new_turn_number(&self, _gp: &mut GamePlay, _turn: i32) {}

    /// Apply a committed move to the game. The default places the piece if
    /// it is not already there.
    fn do_player_move(&self, gp: &mut GamePlay, tile: TileId, hex: HexId) -> Result<()> {
        if gp.tile(tile)?.hex() != Some(hex) {
            gp.place_either(tile, Some(hex))?;
        }
        Ok(())
    }

    fn end_game(&self, gp: &mut GamePlay) {
        tracing::info!("endGame: Game Over at turn {}", gp.turn_number());
    }
}

/// The generic rules with no game-specific overrides
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultRules;

impl Rules for DefaultRules {}

/// Turn a collision verdict for `hex` into a result for the mover.
pub(crate) fn rejected(hex: HexId, occupant: TileId, incoming: TileId) -> GameError {
    tracing::warn!("unitCollision: {:?} holds {:?}, rejecting {:?}", hex, occupant, incoming);
    GameError::OccupancyCollision { hex, occupant, incoming }
}
