//! Hex graph nodes
//!
//! A `Hex` is plain data owned by a `HexMap` arena and addressed by `HexId`.
//! Traversal needs the map to resolve links, so it lives on `HexRef`, a
//! borrowed view pairing a hex with its map.

use std::fmt;
use std::ops::Deref;

use serde::{Deserialize, Serialize};

use crate::hex_map::HexMap;
use crate::tile::TileId;
use crate::topo::{HexDir, RowCol, Xywh, SQRT3};

/// Index of a hex in its map's arena
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HexId(pub(crate) u32);

impl HexId {
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

// ============================================================================
// LINKS
// ============================================================================

/// Partial map from direction to neighbor
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Links([Option<HexId>; 12]);

impl Links {
    pub fn get(&self, dir: HexDir) -> Option<HexId> {
        self.0[dir.index()]
    }

    pub(crate) fn set(&mut self, dir: HexDir, hex: HexId) {
        self.0[dir.index()] = Some(hex);
    }

    /// Present links, in `HexDir::ALL` order
    pub fn iter(&self) -> impl Iterator<Item = (HexDir, HexId)> + '_ {
        HexDir::ALL
            .into_iter()
            .filter_map(|d| self.0[d.index()].map(|h| (d, h)))
    }

    pub fn len(&self) -> usize {
        self.0.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ============================================================================
// HEX
// ============================================================================

/// Serializable identity of a hex
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IHex {
    #[serde(rename = "Aname")]
    pub aname: String,
    pub row: i32,
    pub col: i32,
}

/// One node of the hex graph, with its two occupancy slots.
#[derive(Clone, Debug)]
pub struct Hex {
    id: HexId,
    rc: RowCol,
    aname: String,
    pub(crate) district: Option<usize>,
    pub(crate) links: Links,
    pub(crate) meta_links: Option<Links>,
    pub(crate) is_legal: bool,
    pub(crate) color: Option<&'static str>,
    pub(crate) tile: Option<TileId>,
    pub(crate) meep: Option<TileId>,
}

impl Hex {
    pub(crate) fn new(id: HexId, rc: RowCol, district: Option<usize>) -> Self {
        Self::named(id, rc, district, Self::aname_for(rc.row, rc.col))
    }

    pub(crate) fn named(id: HexId, rc: RowCol, district: Option<usize>, aname: String) -> Self {
        Self {
            id,
            rc,
            aname,
            district,
            links: Links::default(),
            meta_links: None,
            is_legal: false,
            color: None,
            tile: None,
            meep: None,
        }
    }

    /// Display name for a position. A negative row marks an off-map slot:
    /// column -1 is "skip", anything else "resign".
    pub fn aname_for(row: i32, col: i32) -> String {
        if row >= 0 {
            format!("Hex@[{},{}]", row, col)
        } else if col == -1 {
            "Hex@skip ".to_string()
        } else {
            "Hex@Resign".to_string()
        }
    }

    pub fn id(&self) -> HexId {
        self.id
    }

    pub fn row(&self) -> i32 {
        self.rc.row
    }

    pub fn col(&self) -> i32 {
        self.rc.col
    }

    pub fn rc(&self) -> RowCol {
        self.rc
    }

    pub fn aname(&self) -> &str {
        &self.aname
    }

    pub fn district(&self) -> Option<usize> {
        self.district
    }

    /// Hexes placed by map construction have a district; auxiliary hexes do not.
    pub fn is_on_map(&self) -> bool {
        self.district.is_some()
    }

    pub fn links(&self) -> &Links {
        &self.links
    }

    pub fn meta_links(&self) -> Option<&Links> {
        self.meta_links.as_ref()
    }

    pub fn is_legal(&self) -> bool {
        self.is_legal
    }

    pub fn color(&self) -> Option<&'static str> {
        self.color
    }

    /// Stationary piece on this hex
    pub fn tile(&self) -> Option<TileId> {
        self.tile
    }

    /// Mobile piece on this hex
    pub fn meep(&self) -> Option<TileId> {
        self.meep
    }

    pub fn unit(&self, is_meep: bool) -> Option<TileId> {
        if is_meep {
            self.meep
        } else {
            self.tile
        }
    }

    pub fn occupied(&self) -> bool {
        self.tile.is_some() || self.meep.is_some()
    }

    pub(crate) fn set_unit_slot(&mut self, is_meep: bool, unit: Option<TileId>) {
        if is_meep {
            self.meep = unit;
        } else {
            self.tile = unit;
        }
    }

    /// `[r,c]`, or the special name of an off-map hex
    pub fn rcs(&self) -> String {
        if self.rc.row >= 0 {
            self.rc.to_string()
        } else {
            self.special_name().to_string()
        }
    }

    /// `rcs` padded to a fixed width, for aligned logs
    pub fn rcsp(&self) -> String {
        if self.rc.row >= 0 {
            format!("[{:>2},{:>2}]", self.rc.row, self.rc.col)
        } else {
            format!("{:<7}", self.special_name())
        }
    }

    fn special_name(&self) -> &str {
        self.aname.strip_prefix("Hex@").unwrap_or(&self.aname)
    }

    pub fn ihex(&self) -> IHex {
        IHex { aname: self.aname.clone(), row: self.rc.row, col: self.rc.col }
    }
}

impl fmt::Display for Hex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.aname)
    }
}

// ============================================================================
// TRAVERSAL
// ============================================================================

/// A hex together with the map that owns it
#[derive(Clone, Copy)]
pub struct HexRef<'a> {
    map: &'a HexMap,
    hex: &'a Hex,
}

impl<'a> Deref for HexRef<'a> {
    type Target = Hex;

    fn deref(&self) -> &Hex {
        self.hex
    }
}

impl fmt::Debug for HexRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HexRef({})", self.hex.aname)
    }
}

impl PartialEq for HexRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.map, other.map) && self.hex.id == other.hex.id
    }
}

impl<'a> HexRef<'a> {
    pub(crate) fn new(map: &'a HexMap, hex: &'a Hex) -> Self {
        Self { map, hex }
    }

    pub fn hex(&self) -> &'a Hex {
        self.hex
    }

    pub fn map(&self) -> &'a HexMap {
        self.map
    }

    pub fn link_dirs(&self) -> [HexDir; 6] {
        self.map.topo().link_dirs()
    }

    /// Neighbor in `dir`, if there is one
    pub fn link(&self, dir: HexDir) -> Option<HexRef<'a>> {
        self.hex.links.get(dir).map(|id| self.map.hex(id))
    }

    pub fn meta_link(&self, dir: HexDir) -> Option<HexRef<'a>> {
        self.hex
            .meta_links
            .as_ref()
            .and_then(|l| l.get(dir))
            .map(|id| self.map.hex(id))
    }

    /// All present neighbors
    pub fn link_hexes(&self) -> Vec<HexRef<'a>> {
        self.hex.links.iter().map(|(_, id)| self.map.hex(id)).collect()
    }

    /// Visit every link direction with its neighbor (None at the map edge),
    /// optionally visiting this hex first with no direction.
    pub fn for_each_link_hex<F>(&self, incl_center: bool, mut f: F)
    where
        F: FnMut(Option<HexRef<'a>>, Option<HexDir>),
    {
        if incl_center {
            f(Some(*self), None);
        }
        for dir in self.link_dirs() {
            f(self.link(dir), Some(dir));
        }
    }

    /// First link direction whose neighbor satisfies `pred`.
    pub fn find_link_hex<P>(&self, mut pred: P) -> Option<HexDir>
    where
        P: FnMut(Option<HexRef<'a>>, HexDir) -> bool,
    {
        self.link_dirs().into_iter().find(|&dir| pred(self.link(dir), dir))
    }

    /// Walk in `dir`, starting with this hex, until `pred` holds.
    pub fn find_in_dir<P>(&self, dir: HexDir, mut pred: P) -> Option<HexRef<'a>>
    where
        P: FnMut(HexRef<'a>) -> bool,
    {
        let mut hex = Some(*self);
        while let Some(h) = hex {
            if pred(h) {
                return Some(h);
            }
            hex = h.link(dir);
        }
        None
    }

    /// Every hex beyond this one in `dir`, nearest first.
    pub fn hexes_in_dir(&self, dir: HexDir) -> Vec<HexRef<'a>> {
        let mut rv = Vec::new();
        let mut hex = self.link(dir);
        while let Some(h) = hex {
            rv.push(h);
            hex = h.link(dir);
        }
        rv
    }

    /// Apply `f` to every hex along every link direction.
    pub fn for_each_hex_dir<F>(&self, mut f: F)
    where
        F: FnMut(HexRef<'a>, HexDir),
    {
        for dir in self.link_dirs() {
            for hex in self.hexes_in_dir(dir) {
                f(hex, dir);
            }
        }
    }

    /// Follow `n` links in `dir`, stopping at the last hex reached if the
    /// chain ends early.
    pub fn next_hex(&self, dir: HexDir, n: usize) -> HexRef<'a> {
        let mut hex = *self;
        for _ in 0..n {
            match hex.link(dir) {
                Some(next) => hex = next,
                None => break,
            }
        }
        hex
    }

    /// The farthest hex in `dir`.
    pub fn last_hex(&self, dir: HexDir) -> HexRef<'a> {
        let mut hex = *self;
        while let Some(next) = hex.link(dir) {
            hex = next;
        }
        hex
    }

    pub fn xywh(&self, rad: f64) -> Xywh {
        self.map
            .topo()
            .xywh(rad, f64::from(self.hex.rc.row), f64::from(self.hex.rc.col))
    }

    /// Centre distance in units where adjacent hexes are 1 apart.
    pub fn radial_dist(&self, other: &Hex) -> f64 {
        self.scaled_dist(other, 1.0 / SQRT3)
    }

    /// Centre distance for a unit circumradius (adjacent hexes are sqrt(3) apart).
    pub fn metric_dist(&self, other: &Hex) -> f64 {
        self.scaled_dist(other, 1.0)
    }

    fn scaled_dist(&self, other: &Hex, unit: f64) -> f64 {
        let topo = self.map.topo();
        let a = self.xywh(unit);
        let b = topo.xywh(unit, f64::from(other.row()), f64::from(other.col()));
        ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt()
    }

    pub fn rc_linear(&self) -> i64 {
        self.map.rc_linear(self.hex.rc.row, self.hex.rc.col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topo::Topo;

    /// A straight line of four hexes along row 0 of an ew map
    fn line_map() -> HexMap {
        let mut map = HexMap::new(Topo::Ew, 1.0);
        for col in 0..4 {
            map.add_hex(0, col, Some(0));
        }
        map
    }

    #[test]
    fn test_names() {
        assert_eq!(Hex::aname_for(2, 3), "Hex@[2,3]");
        assert_eq!(Hex::aname_for(-1, -1), "Hex@skip ");
        assert_eq!(Hex::aname_for(-1, -2), "Hex@Resign");

        let map = line_map();
        let hex = map.get(0, 2).unwrap();
        assert_eq!(hex.rcs(), "[0,2]");
        assert_eq!(hex.rcsp(), "[ 0, 2]");
        assert_eq!(hex.to_string(), "Hex@[0,2]");
        assert_eq!(hex.ihex(), IHex { aname: "Hex@[0,2]".into(), row: 0, col: 2 });
    }

    #[test]
    fn test_next_hex_stops_at_edge() {
        let map = line_map();
        let start = map.get(0, 0).unwrap();
        assert_eq!(start.next_hex(HexDir::E, 2).col(), 2);
        assert_eq!(start.next_hex(HexDir::E, 10).col(), 3);
        assert_eq!(start.next_hex(HexDir::W, 1).col(), 0);
        assert_eq!(start.last_hex(HexDir::E).col(), 3);
    }

    #[test]
    fn test_hexes_in_dir_and_find() {
        let map = line_map();
        let start = map.get(0, 0).unwrap();
        let cols: Vec<i32> = start.hexes_in_dir(HexDir::E).iter().map(|h| h.col()).collect();
        assert_eq!(cols, vec![1, 2, 3]);

        // find_in_dir considers the starting hex too
        assert_eq!(start.find_in_dir(HexDir::E, |h| h.col() == 0).map(|h| h.col()), Some(0));
        assert_eq!(start.find_in_dir(HexDir::E, |h| h.col() == 3).map(|h| h.col()), Some(3));
        assert!(start.find_in_dir(HexDir::E, |h| h.col() == 9).is_none());

        assert_eq!(start.find_link_hex(|h, _| h.is_some()), Some(HexDir::E));

        let mut seen = 0;
        start.for_each_hex_dir(|_, _| seen += 1);
        assert_eq!(seen, 3);

        let mut visited = Vec::new();
        start.for_each_link_hex(true, |h, d| visited.push((h.is_some(), d)));
        assert_eq!(visited.len(), 7);
        assert_eq!(visited[0], (true, None));
    }

    #[test]
    fn test_radial_dist() {
        let map = line_map();
        let a = map.get(0, 0).unwrap();
        let b = map.get(0, 3).unwrap();
        assert!((a.radial_dist(&b) - 3.0).abs() < 1e-9);
        assert!((a.metric_dist(&b) - 3.0 * SQRT3).abs() < 1e-9);
    }
}
