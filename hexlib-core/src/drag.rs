//! Drag and drop: the protocol between pointer-driven dragging and the game
//!
//! ## Lifecycle
//!
//! ```text
//! idle --first move--> dragging --drop--> idle
//!            |             |
//!            |             +--stop_dragging (back to origin)--> idle
//!            +--refused (not movable / nothing legal)--> idle
//! ```
//!
//! Starting a drag builds a `DragContext`, asks the rules whether the
//! current player may move the piece, marks every legal target hex and
//! lifts the piece off its hex. Each later pointer move retargets: a legal
//! hex under the pointer becomes the target, anything else snaps back to
//! the origin. The drop hands the target to `Rules::drop_func` and clears
//! the marks. Only one drag can be in flight.

use crate::error::{GameError, Result};
use crate::game_play::GamePlay;
use crate::hex::HexId;
use crate::tile::TileId;
use crate::view::MapView;

/// Pointer state for one drag event
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DragInfo {
    /// First event of this drag
    pub first: bool,
    pub shift: bool,
    pub ctrl: bool,
}

impl DragInfo {
    pub fn first(shift: bool) -> Self {
        Self { first: true, shift, ctrl: false }
    }

    pub fn moving(shift: bool) -> Self {
        Self { first: false, shift, ctrl: false }
    }
}

/// Transient record of the drag in progress. Hooks reach the phase machine
/// through the `GamePlay` they are handed; the context keeps only the name
/// of the phase the drag started in.
#[derive(Clone, Debug, PartialEq)]
pub struct DragContext {
    pub tile: TileId,
    /// Where the piece was picked up
    pub from_hex: Option<HexId>,
    /// Last legal hex under the pointer, else `from_hex`
    pub target_hex: Option<HexId>,
    pub last_shift: bool,
    pub last_ctrl: bool,
    pub info: DragInfo,
    pub n_legal: usize,
    /// Phase the game was in when the drag started
    pub phase: Option<String>,
}

impl DragContext {
    pub fn new(tile: TileId, from_hex: Option<HexId>, info: DragInfo, phase: Option<String>) -> Self {
        Self {
            tile,
            from_hex,
            target_hex: from_hex,
            last_shift: info.shift,
            last_ctrl: info.ctrl,
            info,
            n_legal: 0,
            phase,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum DragStatus {
    Started { n_legal: usize },
    /// The drag did not start; the piece is where it was
    Refused(String),
    Dragging { target: Option<HexId> },
}

/// Outcome of a drop
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Dropped {
    pub tile: TileId,
    pub from: Option<HexId>,
    /// Where the piece ended up after the rules ran
    pub to: Option<HexId>,
}

pub struct Table {
    drag_context: Option<DragContext>,
    /// Extra hexes, beyond the map, considered as drop targets
    pub new_hexes: Vec<HexId>,
    view: Box<dyn MapView>,
}

impl Table {
    pub fn new(view: Box<dyn MapView>) -> Self {
        Self { drag_context: None, new_hexes: Vec::new(), view }
    }

    pub fn view(&self) -> &dyn MapView {
        self.view.as_ref()
    }

    pub fn drag_context(&self) -> Option<&DragContext> {
        self.drag_context.as_ref()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_context.is_some()
    }

    /// Pointer moved while dragging `tile` over `hex_under`. The first
    /// event of a drag starts it.
    pub fn drag_func(
        &mut self,
        gp: &mut GamePlay,
        tile: TileId,
        hex_under: Option<HexId>,
        info: DragInfo,
    ) -> Result<DragStatus> {
        if info.first {
            if self.drag_context.is_some() {
                tracing::error!("dragFunc: drag already in progress, refusing {}", gp.tile_str(tile));
                return Err(GameError::DragInProgress);
            }
            return self.drag_start(gp, tile, info);
        }
        let ctx = match self.drag_context.as_mut() {
            Some(ctx) if ctx.tile == tile => ctx,
            _ => return Err(GameError::NotDragging),
        };
        ctx.info = info;
        let rules = gp.rules();
        if info.shift != ctx.last_shift || info.ctrl != ctx.last_ctrl {
            ctx.last_shift = info.shift;
            ctx.last_ctrl = info.ctrl;
            rules.drag_shift(gp, tile, info.shift, ctx);
        }
        let legal = hex_under.filter(|&h| gp.hex_map.hex(h).is_legal());
        ctx.target_hex = legal.or(ctx.from_hex);
        self.view.show_mark(&mut gp.hex_map, legal);
        rules.drag_func(gp, tile, hex_under, ctx);
        Ok(DragStatus::Dragging { target: ctx.target_hex })
    }

    /// Drag to the hex the view finds under (x, y).
    pub fn drag_to_point(&mut self, gp: &mut GamePlay, x: f64, y: f64, shift: bool) -> Result<DragStatus> {
        let tile = self.drag_context.as_ref().ok_or(GameError::NotDragging)?.tile;
        let hex = self.view.hex_under_point(&gp.hex_map, x, y);
        self.drag_func(gp, tile, hex, DragInfo::moving(shift))
    }

    fn drag_start(&mut self, gp: &mut GamePlay, tile: TileId, info: DragInfo) -> Result<DragStatus> {
        let from_hex = gp.tile(tile)?.hex();
        let phase = gp.game_state.state_name().map(str::to_string);
        let mut ctx = DragContext::new(tile, from_hex, info, phase);
        let rules = gp.rules();

        if !rules.is_dragable(gp, tile) {
            return Ok(DragStatus::Refused("not dragable".to_string()));
        }
        if let Some(reason) = rules.cant_be_moved_by(gp, tile, &ctx) {
            let line = format!("{}: {}", reason, gp.tile_str(tile));
            gp.log_text(&line, "Table.dragStart");
            return Ok(DragStatus::Refused(reason));
        }
        gp.tile_mut(tile)?.from_hex = from_hex;
        rules.drag_start(gp, tile, &ctx);
        ctx.n_legal = self.mark_legal(gp, &ctx);
        self.view.show_legal(&gp.hex_map);
        gp.move_to(tile, None)?;
        tracing::info!("dragStart: {} nLegal={}", gp.tile_str(tile), ctx.n_legal);

        if ctx.n_legal == 0 && !rules.no_legal_target(gp, tile, &ctx) {
            gp.move_to(tile, from_hex)?;
            gp.hex_map.clear_legal();
            self.view.show_legal(&gp.hex_map);
            tracing::info!("dragStart: no legal target for {}", gp.tile_str(tile));
            return Ok(DragStatus::Refused("no legal target".to_string()));
        }
        let n_legal = ctx.n_legal;
        self.drag_context = Some(ctx);
        Ok(DragStatus::Started { n_legal })
    }

    /// Clear all marks, then mark every hex `tile` may land on. The recycle
    /// hex is marked by its own predicate and not counted.
    pub fn mark_legal(&self, gp: &mut GamePlay, ctx: &DragContext) -> usize {
        gp.hex_map.clear_legal();
        let rules = gp.rules();
        let recycle = gp.recycle_hex();
        let candidates: Vec<HexId> = self
            .new_hexes
            .iter()
            .chain(gp.hex_map.hex_ary())
            .copied()
            .collect();
        let mut n_legal = 0;
        for hex in candidates {
            if Some(hex) == ctx.from_hex || Some(hex) == recycle || gp.hex_map.hex(hex).is_legal() {
                continue;
            }
            if rules.is_legal_target(gp, ctx.tile, hex, ctx) {
                gp.hex_map.set_legal(hex, true);
                n_legal += 1;
            }
        }
        if let Some(recycle) = recycle {
            if rules.is_legal_recycle(gp, ctx.tile, ctx) {
                gp.hex_map.set_legal(recycle, true);
            }
        }
        n_legal
    }

    /// Drop the piece on the current target (or its origin).
    pub fn drop_func(&mut self, gp: &mut GamePlay) -> Result<Dropped> {
        let ctx = self.drag_context.take().ok_or(GameError::NotDragging)?;
        let target = ctx.target_hex.or(ctx.from_hex);
        let rules = gp.rules();
        let result = match target {
            Some(hex) => rules.drop_func(gp, ctx.tile, hex, &ctx),
            None => Ok(()),
        };
        gp.hex_map.clear_legal();
        self.view.show_mark(&mut gp.hex_map, None);
        self.view.update(&gp.hex_map);
        if let Err(e) = result {
            tracing::warn!("dropFunc: {} ({}), back to origin", gp.tile_str(ctx.tile), e);
            if gp.tile(ctx.tile)?.hex().is_none() {
                gp.move_to(ctx.tile, ctx.from_hex)?;
            }
            return Err(e);
        }
        let to = gp.tile(ctx.tile)?.hex();
        tracing::debug!("dropFunc: {} from {:?} to {:?}", gp.tile_str(ctx.tile), ctx.from_hex, to);
        Ok(Dropped { tile: ctx.tile, from: ctx.from_hex, to })
    }

    /// Abort the drag in progress: the piece goes back to its origin with
    /// no move recorded.
    pub fn stop_dragging(&mut self, gp: &mut GamePlay) -> Result<Option<TileId>> {
        let Some(ctx) = self.drag_context.take() else {
            return Ok(None);
        };
        gp.move_to(ctx.tile, ctx.from_hex)?;
        gp.hex_map.clear_legal();
        self.view.show_mark(&mut gp.hex_map, None);
        self.view.update(&gp.hex_map);
        Ok(Some(ctx.tile))
    }

    /// Pick up `tile`, move it over `to` and drop it: a whole drag in one
    /// call. Returns None when the drag was refused.
    pub fn drag_start_and_drop(
        &mut self,
        gp: &mut GamePlay,
        tile: TileId,
        to: HexId,
        shift: bool,
    ) -> Result<Option<Dropped>> {
        match self.drag_func(gp, tile, None, DragInfo::first(shift))? {
            DragStatus::Refused(reason) => {
                tracing::debug!("dragStartAndDrop: {} refused: {}", gp.tile_str(tile), reason);
                Ok(None)
            }
            _ => {
                self.drag_func(gp, tile, Some(to), DragInfo::moving(shift))?;
                self.drop_func(gp).map(Some)
            }
        }
    }
}
