//! Dispensers of pieces
//!
//! A `TileSource` sits on an off-map hex and hands out units one at a time:
//! the unit currently on its hex is the one a player can drag, the rest
//! wait in a stack. Operations that move pieces need the whole game, so
//! they are methods on `GamePlay` taking a `SourceId`.

use rand::seq::SliceRandom;

use crate::error::{GameError, Result};
use crate::game_play::GamePlay;
use crate::hex::HexId;
use crate::tile::{PieceKind, TileId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceId(pub(crate) u32);

impl SourceId {
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Debug)]
pub struct TileSource {
    id: SourceId,
    aname: String,
    kind: PieceKind,
    hex: HexId,
    player: Option<usize>,
    all_units: Vec<TileId>,
    /// Next unit is popped from the end
    available: Vec<TileId>,
}

impl TileSource {
    pub fn id(&self) -> SourceId {
        self.id
    }

    pub fn aname(&self) -> &str {
        &self.aname
    }

    pub fn kind(&self) -> PieceKind {
        self.kind
    }

    /// Where the next unit is shown
    pub fn hex(&self) -> HexId {
        self.hex
    }

    pub fn player(&self) -> Option<usize> {
        self.player
    }

    pub fn all_units(&self) -> &[TileId] {
        &self.all_units
    }

    pub fn available(&self) -> &[TileId] {
        &self.available
    }

    pub(crate) fn unqueue(&mut self, unit: TileId) {
        self.available.retain(|&u| u != unit);
    }
}

impl GamePlay {
    pub fn sources(&self) -> impl Iterator<Item = &TileSource> {
        self.sources.iter()
    }

    pub fn source(&self, id: SourceId) -> Result<&TileSource> {
        self.sources
            .get(id.index())
            .ok_or_else(|| GameError::Scenario(format!("no such source: {:?}", id)))
    }

    fn source_mut(&mut self, id: SourceId) -> Result<&mut TileSource> {
        self.sources
            .get_mut(id.index())
            .ok_or_else(|| GameError::Scenario(format!("no such source: {:?}", id)))
    }

    /// A dispenser of `kind` units on `hex`, optionally owned by `player`.
    pub fn add_source(&mut self, kind: PieceKind, hex: HexId, player: Option<usize>) -> SourceId {
        let id = SourceId(self.sources.len() as u32);
        self.sources.push(TileSource {
            id,
            aname: format!("{}Source", kind.class_name()),
            kind,
            hex,
            player,
            all_units: Vec::new(),
            available: Vec::new(),
        });
        id
    }

    /// Create a unit of the source's kind and make it available.
    pub fn new_unit(&mut self, src: SourceId) -> Result<TileId> {
        let (kind, player) = {
            let s = self.source(src)?;
            (s.kind, s.player)
        };
        let unit = self.add_tile(kind, player);
        self.avail_unit(src, unit, false)?;
        Ok(unit)
    }

    /// Take `unit` off the table and stack it as the next available unit
    /// (or, with `queue`, the last).
    pub fn avail_unit(&mut self, src: SourceId, unit: TileId, queue: bool) -> Result<()> {
        {
            let s = self.source_mut(src)?;
            if !s.all_units.contains(&unit) {
                s.all_units.push(unit);
            }
        }
        self.tile_mut(unit)?.source = Some(src);
        if !self.source(src)?.available.contains(&unit) {
            self.move_to(unit, None)?;
            let s = self.source_mut(src)?;
            if queue {
                s.available.insert(0, unit);
            } else {
                s.available.push(unit);
            }
        }
        self.update_counter(src)
    }

    /// The unit on the source's hex, if any
    pub fn source_hex_unit(&self, src: SourceId) -> Result<Option<TileId>> {
        let s = self.source(src)?;
        Ok(self.hex_map.hex(s.hex).unit(s.kind.is_meep()))
    }

    /// Available units plus the one on the hex
    pub fn num_available(&self, src: SourceId) -> Result<usize> {
        let on_hex = usize::from(self.source_hex_unit(src)?.is_some());
        Ok(self.source(src)?.available.len() + on_hex)
    }

    /// Put `unit` (else the next available unit) on the source's hex.
    pub fn next_unit(&mut self, src: SourceId, unit: Option<TileId>) -> Result<Option<TileId>> {
        let unit = match unit {
            Some(unit) => {
                self.avail_unit(src, unit, false)?;
                self.source_mut(src)?.unqueue(unit);
                Some(unit)
            }
            None => self.source_mut(src)?.available.pop(),
        };
        if let Some(unit) = unit {
            let hex = self.source(src)?.hex;
            self.move_to(unit, Some(hex))?;
        }
        self.update_counter(src)?;
        Ok(unit)
    }

    /// Remove the unit on the source's hex from the table, refilling the hex
    /// when `next` is set.
    pub fn take_unit(&mut self, src: SourceId, next: bool) -> Result<Option<TileId>> {
        let unit = self.source_hex_unit(src)?;
        if let Some(unit) = unit {
            self.move_to(unit, None)?;
        }
        if next {
            self.next_unit(src, None)?;
        }
        Ok(unit)
    }

    /// Forget `unit`; if it is the one on the source's hex, lift it off.
    pub fn delete_unit(&mut self, src: SourceId, unit: TileId) -> Result<()> {
        if self.source_hex_unit(src)? == Some(unit) {
            self.move_to(unit, None)?;
        }
        let s = self.source_mut(src)?;
        s.all_units.retain(|&u| u != unit);
        s.available.retain(|&u| u != unit);
        self.tile_mut(unit)?.source = None;
        self.update_counter(src)
    }

    /// Lift every unit off the table and empty the source; returns how many
    /// units it had.
    pub fn delete_all(&mut self, src: SourceId) -> Result<usize> {
        let units = std::mem::take(&mut self.source_mut(src)?.all_units);
        self.source_mut(src)?.available.clear();
        for &unit in &units {
            self.move_to(unit, None)?;
            self.tile_mut(unit)?.source = None;
        }
        self.update_counter(src)?;
        Ok(units.len())
    }

    /// Units of the source matching `pred`, from all units or only the
    /// available stack.
    pub fn filter_units<P>(&self, src: SourceId, search_all: bool, mut pred: P) -> Result<Vec<TileId>>
    where
        P: FnMut(TileId) -> bool,
    {
        let s = self.source(src)?;
        let units = if search_all { &s.all_units } else { &s.available };
        Ok(units.iter().copied().filter(|&u| pred(u)).collect())
    }

    /// Shuffle the available stack so `next_unit` draws at random.
    pub fn permute_available(&mut self, src: SourceId) -> Result<()> {
        let mut available = std::mem::take(&mut self.source_mut(src)?.available);
        available.shuffle(&mut self.rng);
        self.source_mut(src)?.available = available;
        Ok(())
    }

    fn update_counter(&self, src: SourceId) -> Result<()> {
        let s = self.source(src)?;
        tracing::debug!("{}:{:?} available={}", s.aname, s.player, self.num_available(src)?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hex_map::HexMap;
    use crate::topo::Topo;

    fn game_with_source(n: usize) -> (GamePlay, SourceId) {
        let mut map = HexMap::new(Topo::Ew, 1.0);
        map.make_all_districts(1, 2);
        let hex = map.add_aux_hex("MeepleSource", -1, 0);
        let mut gp = GamePlay::new(map, 2);
        let src = gp.add_source(PieceKind::Meeple, hex, Some(0));
        for _ in 0..n {
            gp.new_unit(src).unwrap();
        }
        (gp, src)
    }

    #[test]
    fn test_dispense_in_stack_order() {
        let (mut gp, src) = game_with_source(3);
        assert_eq!(gp.source(src).unwrap().aname(), "MeepleSource");
        assert_eq!(gp.num_available(src).unwrap(), 3);

        let first = gp.next_unit(src, None).unwrap().unwrap();
        assert_eq!(first, TileId(2));
        assert_eq!(gp.source_hex_unit(src).unwrap(), Some(first));
        assert_eq!(gp.num_available(src).unwrap(), 3);

        let taken = gp.take_unit(src, true).unwrap();
        assert_eq!(taken, Some(first));
        assert_eq!(gp.tile(first).unwrap().hex(), None);
        assert_eq!(gp.source_hex_unit(src).unwrap(), Some(TileId(1)));
        assert_eq!(gp.num_available(src).unwrap(), 2);
    }

    #[test]
    fn test_queue_puts_unit_last() {
        let (mut gp, src) = game_with_source(2);
        let extra = gp.add_tile(PieceKind::Meeple, Some(0));
        gp.avail_unit(src, extra, true).unwrap();
        assert_eq!(gp.source(src).unwrap().available(), &[extra, TileId(0), TileId(1)]);
        assert_eq!(gp.tile(extra).unwrap().source(), Some(src));
    }

    #[test]
    fn test_dropping_back_on_refilled_source_returns_stale_unit() {
        let (mut gp, src) = game_with_source(2);
        let shown = gp.next_unit(src, None).unwrap().unwrap();
        let other = TileId(0);
        assert_ne!(shown, other);
        // `other` comes back onto the dispenser hex while `shown` sits there
        let hex = gp.source(src).unwrap().hex();
        gp.place_either(other, Some(hex)).unwrap();
        assert_eq!(gp.source_hex_unit(src).unwrap(), Some(other));
        assert_eq!(gp.source(src).unwrap().available(), &[shown]);
    }

    #[test]
    fn test_delete() {
        let (mut gp, src) = game_with_source(3);
        let shown = gp.next_unit(src, None).unwrap().unwrap();
        gp.delete_unit(src, shown).unwrap();
        assert_eq!(gp.source_hex_unit(src).unwrap(), None);
        assert_eq!(gp.source(src).unwrap().all_units().len(), 2);
        assert_eq!(gp.tile(shown).unwrap().source(), None);

        assert_eq!(gp.delete_all(src).unwrap(), 2);
        assert_eq!(gp.num_available(src).unwrap(), 0);
    }

    #[test]
    fn test_filter_and_permute() {
        let (mut gp, src) = game_with_source(6);
        gp.next_unit(src, None).unwrap();
        assert_eq!(gp.filter_units(src, true, |_| true).unwrap().len(), 6);
        assert_eq!(gp.filter_units(src, false, |_| true).unwrap().len(), 5);
        assert_eq!(gp.filter_units(src, true, |u| u.index() % 2 == 0).unwrap().len(), 3);

        let before = gp.source(src).unwrap().available().to_vec();
        gp.permute_available(src).unwrap();
        let mut after = gp.source(src).unwrap().available().to_vec();
        after.sort_unstable();
        assert_eq!(after, before);
    }

    #[test]
    fn test_next_named_unit() {
        let (mut gp, src) = game_with_source(3);
        let unit = gp.next_unit(src, Some(TileId(0))).unwrap();
        assert_eq!(unit, Some(TileId(0)));
        assert_eq!(gp.source(src).unwrap().available(), &[TileId(1), TileId(2)]);
    }
}
