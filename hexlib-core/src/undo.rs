//! Undo bookkeeping
//!
//! Piece moves are recorded into an open group as they happen; closing the
//! group seals one player's move. Undo pops the newest group (or the open
//! one, if it has anything in it).

use crate::hex::HexId;
use crate::tile::TileId;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UndoRec {
    pub tile: TileId,
    pub from: Option<HexId>,
    pub to: Option<HexId>,
}

/// Moves made during one turn
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UndoGroup {
    pub turn: i32,
    pub player: usize,
    pub recs: Vec<UndoRec>,
}

#[derive(Clone, Debug)]
pub struct UndoLog {
    closed: Vec<UndoGroup>,
    open: Vec<UndoRec>,
    enabled: bool,
}

impl Default for UndoLog {
    fn default() -> Self {
        Self { closed: Vec::new(), open: Vec::new(), enabled: true }
    }
}

impl UndoLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn add_undo_rec(&mut self, rec: UndoRec) {
        if self.enabled {
            self.open.push(rec);
        }
    }

    /// Seal the open records as the move of `player` on `turn`.
    /// An empty open group is not recorded.
    pub fn close_undo(&mut self, turn: i32, player: usize) {
        if self.open.is_empty() {
            return;
        }
        let recs = std::mem::take(&mut self.open);
        self.closed.push(UndoGroup { turn, player, recs });
    }

    /// Remove the open records if any, else the newest closed group.
    /// Open records come back with `closed == false`.
    pub fn pop_undo(&mut self) -> Option<(UndoGroup, bool)> {
        if !self.open.is_empty() {
            let recs = std::mem::take(&mut self.open);
            return Some((UndoGroup { turn: 0, player: 0, recs }, false));
        }
        self.closed.pop().map(|g| (g, true))
    }

    /// Put back a group taken by `pop_undo`.
    pub fn restore(&mut self, group: UndoGroup, closed: bool) {
        if closed {
            self.closed.push(group);
        } else {
            let newer = std::mem::replace(&mut self.open, group.recs);
            self.open.extend(newer);
        }
    }

    /// Number of sealed groups
    pub fn len(&self) -> usize {
        self.closed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.closed.is_empty() && self.open.is_empty()
    }

    pub fn open_recs(&self) -> &[UndoRec] {
        &self.open
    }

    pub fn groups(&self) -> &[UndoGroup] {
        &self.closed
    }

    pub fn clear(&mut self) {
        self.closed.clear();
        self.open.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(t: u32) -> UndoRec {
        UndoRec { tile: TileId(t), from: None, to: Some(HexId(t)) }
    }

    #[test]
    fn test_grouping() {
        let mut undo = UndoLog::new();
        undo.close_undo(1, 0);
        assert_eq!(undo.len(), 0);

        undo.add_undo_rec(rec(1));
        undo.add_undo_rec(rec(2));
        assert_eq!(undo.open_recs().len(), 2);
        undo.close_undo(1, 0);
        assert_eq!(undo.len(), 1);
        assert!(undo.open_recs().is_empty());
        assert_eq!(undo.groups()[0].recs.len(), 2);
    }

    #[test]
    fn test_pop_prefers_open_records() {
        let mut undo = UndoLog::new();
        undo.add_undo_rec(rec(1));
        undo.close_undo(3, 1);
        undo.add_undo_rec(rec(2));

        let (group, closed) = undo.pop_undo().unwrap();
        assert!(!closed);
        assert_eq!(group.recs, vec![rec(2)]);

        let (group, closed) = undo.pop_undo().unwrap();
        assert!(closed);
        assert_eq!((group.turn, group.player), (3, 1));
        assert!(undo.pop_undo().is_none());
    }

    #[test]
    fn test_restore_after_pop() {
        let mut undo = UndoLog::new();
        undo.add_undo_rec(rec(1));
        undo.close_undo(2, 1);
        undo.add_undo_rec(rec(2));

        let (open, closed) = undo.pop_undo().unwrap();
        undo.restore(open, closed);
        assert_eq!(undo.open_recs(), &[rec(2)]);

        undo.close_undo(3, 0);
        let (group, closed) = undo.pop_undo().unwrap();
        undo.restore(group.clone(), closed);
        assert_eq!(undo.groups().last(), Some(&group));
        assert_eq!(undo.len(), 2);
    }

    #[test]
    fn test_disabled_log_records_nothing() {
        let mut undo = UndoLog::new();
        undo.set_enabled(false);
        undo.add_undo_rec(rec(1));
        assert!(undo.is_empty());
    }
}
