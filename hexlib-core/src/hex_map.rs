//! HexMap: the owning collection of hexes and the algorithms that build it
//!
//! ## Construction
//!
//! A map is either a spiral of hexagonal districts ("meta-hexes") or a plain
//! rectangle. Districts are numbered in placement order: district 0 is the
//! centre, then each ring of districts clockwise starting from the west.
//! Every `add_hex` links the new hex to its already-placed neighbors, so the
//! graph is complete as soon as the last hex lands.
//!
//! ## Indices
//!
//! - `hexes`: arena of every hex, on-map and auxiliary, addressed by `HexId`
//! - `by_rc`: (row, col) -> on-map hex, iterated row-major
//! - `meta_map`: district centres on a coarser NS grid

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::hex::{Hex, HexId, HexRef, Links};
use crate::topo::{HexDir, RowCol, Topo};

// ============================================================================
// CONSTANTS
// ============================================================================

/// District palette; entry 0 is reserved for the central district.
pub const DIST_COLOR: [&str; 7] = [
    "lightgrey",
    "limegreen",
    "deepskyblue",
    "rgb(255,165,0)",
    "violet",
    "rgb(250,80,80)",
    "yellow",
];

/// Used when every palette colour is taken by a neighbor
pub const FALLBACK_COLOR: &str = "white";

/// Number of hexes in a hexagon with `n` hexes per side: 1, 7, 19, 37, 61, 91, ...
pub fn ft_hexes(n: usize) -> usize {
    if n <= 1 {
        n
    } else {
        6 * (n - 1) + ft_hexes(n - 1)
    }
}

// ============================================================================
// TYPES
// ============================================================================

/// Bounding box of the placed hexes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RcBounds {
    pub min_row: i32,
    pub max_row: i32,
    pub min_col: i32,
    pub max_col: i32,
}

/// How a map is laid out
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MapLayout {
    /// `mh` rings of districts, each district a hexagon with `nh` hexes per side
    MetaHexRings { nh: usize, mh: usize },
    /// `rows` x `cols` rectangle. `trim` shortens the first and last rows so
    /// the edges look even; `half` keeps only every other hex of the last row.
    Rect { rows: usize, cols: usize, trim: bool, half: bool },
}

impl MapLayout {
    /// Rectangle with the usual trimming
    pub fn rect(rows: usize, cols: usize) -> Self {
        MapLayout::Rect { rows, cols, trim: true, half: true }
    }
}

#[derive(Clone, Debug)]
pub struct HexMap {
    topo: Topo,
    radius: f64,
    hexes: Vec<Hex>,
    by_rc: BTreeMap<RowCol, HexId>,
    hex_ary: Vec<HexId>,
    aux: Vec<HexId>,
    districts: Vec<Vec<HexId>>,
    bounds: Option<RcBounds>,
    meta_map: FxHashMap<RowCol, HexId>,
    mark: Option<HexId>,
}

impl HexMap {
    pub fn new(topo: Topo, radius: f64) -> Self {
        Self {
            topo,
            radius,
            hexes: Vec::new(),
            by_rc: BTreeMap::new(),
            hex_ary: Vec::new(),
            aux: Vec::new(),
            districts: Vec::new(),
            bounds: None,
            meta_map: FxHashMap::default(),
            mark: None,
        }
    }

    pub fn topo(&self) -> Topo {
        self.topo
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Number of on-map hexes
    pub fn len(&self) -> usize {
        self.by_rc.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_rc.is_empty()
    }

    // ========================================================================
    // ACCESS
    // ========================================================================

    /// Resolve an id from this map. Panics on an id from another map.
    pub fn hex(&self, id: HexId) -> HexRef<'_> {
        HexRef::new(self, &self.hexes[id.index()])
    }

    pub(crate) fn hex_mut(&mut self, id: HexId) -> &mut Hex {
        &mut self.hexes[id.index()]
    }

    /// On-map hex at (row, col)
    pub fn get(&self, row: i32, col: i32) -> Option<HexRef<'_>> {
        self.get_id(RowCol::new(row, col)).map(|id| self.hex(id))
    }

    pub fn get_id(&self, rc: RowCol) -> Option<HexId> {
        self.by_rc.get(&rc).copied()
    }

    /// On-map hexes in placement order
    pub fn hex_ary(&self) -> &[HexId] {
        &self.hex_ary
    }

    /// Off-map hexes (recycle bin, dispensers)
    pub fn aux_hexes(&self) -> &[HexId] {
        &self.aux
    }

    /// Every hex in the arena, on-map and auxiliary
    pub fn all_ids(&self) -> impl Iterator<Item = HexId> + '_ {
        self.hexes.iter().map(Hex::id)
    }

    /// On-map hexes, row-major
    pub fn iter(&self) -> impl Iterator<Item = HexRef<'_>> + '_ {
        self.by_rc.values().map(move |&id| self.hex(id))
    }

    pub fn for_each_hex<F: FnMut(HexRef<'_>)>(&self, f: F) {
        self.iter().for_each(f)
    }

    pub fn map_each_hex<T, F: FnMut(HexRef<'_>) -> T>(&self, f: F) -> Vec<T> {
        self.iter().map(f).collect()
    }

    pub fn filter_each_hex<P: FnMut(&HexRef<'_>) -> bool>(&self, pred: P) -> Vec<HexRef<'_>> {
        self.iter().filter(pred).collect()
    }

    pub fn find_hex<P: FnMut(&HexRef<'_>) -> bool>(&self, pred: P) -> Option<HexRef<'_>> {
        self.iter().find(pred)
    }

    pub fn bounds(&self) -> Option<RcBounds> {
        self.bounds
    }

    /// Midpoint of the bounding box, rounded down
    pub fn center_rc(&self) -> RowCol {
        let b = self.bounds.unwrap_or(RcBounds { min_row: 0, max_row: 0, min_col: 0, max_col: 0 });
        RowCol::new(
            (b.max_row + b.min_row).div_euclid(2),
            (b.max_col + b.min_col).div_euclid(2),
        )
    }

    pub fn center_hex(&self) -> Option<HexRef<'_>> {
        let rc = self.center_rc();
        self.get(rc.row, rc.col)
    }

    /// Farthest hex from the centre in `dir`
    pub fn corner_hex(&self, dir: HexDir) -> Option<HexRef<'_>> {
        self.center_hex().map(|c| c.last_hex(dir))
    }

    /// Row-major linear index, stable once the map is complete
    pub fn rc_linear(&self, row: i32, col: i32) -> i64 {
        let (min_col, max_col) = self.bounds.map_or((0, 0), |b| (b.min_col, b.max_col));
        i64::from(col) + i64::from(row) * (1 + i64::from(max_col) - i64::from(min_col))
    }

    // ========================================================================
    // DISTRICTS
    // ========================================================================

    pub fn n_districts(&self) -> usize {
        self.districts.len()
    }

    pub fn district(&self, district: usize) -> &[HexId] {
        self.districts.get(district).map_or(&[], Vec::as_slice)
    }

    /// Districts whose centre is meta-linked to the centre of `district`
    pub fn district_neighbors(&self, district: usize) -> Vec<usize> {
        let Some(&center) = self.district(district).first() else {
            return Vec::new();
        };
        let mut rv: Vec<usize> = self.hexes[center.index()]
            .meta_links
            .iter()
            .flat_map(Links::iter)
            .filter_map(|(_, id)| self.hexes[id.index()].district)
            .collect();
        rv.sort_unstable();
        rv.dedup();
        rv
    }

    pub fn meta_hex(&self, mrc: RowCol) -> Option<HexRef<'_>> {
        self.meta_map.get(&mrc).map(|&id| self.hex(id))
    }

    // ========================================================================
    // PLACEMENT
    // ========================================================================

    /// Place an on-map hex and link it to any neighbors already present.
    /// A position that already has a hex keeps it: its id, links and
    /// district are returned unchanged.
    pub fn add_hex(&mut self, row: i32, col: i32, district: Option<usize>) -> HexId {
        let rc = RowCol::new(row, col);
        if let Some(id) = self.get_id(rc) {
            tracing::warn!("addHex: {} already placed", rc);
            return id;
        }
        let id = self.next_id();
        self.hexes.push(Hex::new(id, rc, district));
        self.by_rc.insert(rc, id);
        self.hex_ary.push(id);
        self.extend_bounds(rc);
        self.link(id);
        id
    }

    /// Create an off-map hex: not indexed by position, never linked, no district.
    pub fn add_aux_hex(&mut self, name: &str, row: i32, col: i32) -> HexId {
        let id = self.next_id();
        self.hexes.push(Hex::named(id, RowCol::new(row, col), None, name.to_string()));
        self.aux.push(id);
        id
    }

    fn next_id(&self) -> HexId {
        HexId(self.hexes.len() as u32)
    }

    fn extend_bounds(&mut self, rc: RowCol) {
        self.bounds = Some(match self.bounds {
            None => RcBounds { min_row: rc.row, max_row: rc.row, min_col: rc.col, max_col: rc.col },
            Some(b) => RcBounds {
                min_row: b.min_row.min(rc.row),
                max_row: b.max_row.max(rc.row),
                min_col: b.min_col.min(rc.col),
                max_col: b.max_col.max(rc.col),
            },
        });
    }

    fn link(&mut self, id: HexId) {
        let rc = self.hexes[id.index()].rc();
        for (nd, dir) in self.topo.link_dirs().into_iter().enumerate() {
            let Some(n) = self.get_id(self.topo.step(rc, nd)) else {
                continue;
            };
            self.hexes[id.index()].links.set(dir, n);
            self.hexes[n.index()].links.set(dir.rev(), id);
        }
    }

    /// Record `id` as the district centre at `mrc` on the meta map and link
    /// it to neighboring centres.
    pub fn add_meta_hex(&mut self, id: HexId, mrc: RowCol) {
        self.meta_map.insert(mrc, id);
        self.hexes[id.index()].meta_links.get_or_insert_with(Links::default);
        let topo = Topo::Ns;
        for (nd, dir) in topo.link_dirs().into_iter().enumerate() {
            let Some(&n) = self.meta_map.get(&topo.step(mrc, nd)) else {
                continue;
            };
            self.hexes[id.index()].meta_links.get_or_insert_with(Links::default).set(dir, n);
            self.hexes[n.index()].meta_links.get_or_insert_with(Links::default).set(dir.rev(), id);
        }
    }

    // ========================================================================
    // LAYOUTS
    // ========================================================================

    /// Build the whole map; returns the placed hexes in placement order.
    pub fn make_layout(&mut self, layout: MapLayout) -> Vec<HexId> {
        match layout {
            MapLayout::MetaHexRings { nh, mh } => self.make_all_districts(nh, mh),
            MapLayout::Rect { rows, cols, trim, half } => self.make_rect(rows, cols, trim, half),
        }
    }

    /// Position of the centre hex that keeps every row and column non-negative.
    pub fn calculate_rc0(nh: usize, mh: usize) -> RowCol {
        let offs = (2.0 * nh as f64 * (mh as f64 - 0.5)).ceil() as i32;
        RowCol::new(offs, offs)
    }

    pub fn make_all_districts(&mut self, nh: usize, mh: usize) -> Vec<HexId> {
        let rc0 = Self::calculate_rc0(nh, mh);
        let hexes = self.make_meta_hex_rings(nh, mh, rc0, RowCol::new(0, 0));
        tracing::debug!(
            "makeAllDistricts: nh={} mh={} -> {} hexes in {} districts",
            nh,
            mh,
            hexes.len(),
            self.districts.len()
        );
        hexes
    }

    /// District 0 at `rc0`, then `mh - 1` rings of districts spiralling
    /// clockwise. District numbers follow placement order.
    pub fn make_meta_hex_rings(&mut self, nh: usize, mh: usize, rc0: RowCol, mrc0: RowCol) -> Vec<HexId> {
        let topo = self.topo;
        let (long, short) = (nh, nh.saturating_sub(1));
        // from one district centre to the next: `long` steps in nd, then
        // `short` steps in the direction one counter-clockwise of it
        let next_meta_rc = |rc: RowCol, mrc: RowCol, nd: usize| {
            let turn = (nd + 5) % 6;
            let rc = topo.steps(topo.steps(rc, nd, long), turn, short);
            (rc, Topo::Ns.step(mrc, turn))
        };

        let (mut rc, mut mrc) = (rc0, mrc0);
        let mut district = 0;
        let mut hexes = self.make_meta_hex(nh, district, rc, Some(mrc));
        district += 1;

        for meta_ring in 1..mh {
            (rc, mrc) = next_meta_rc(rc, mrc, 4);
            for nd in 0..6 {
                for _ in 0..meta_ring {
                    (rc, mrc) = next_meta_rc(rc, mrc, nd);
                    hexes.extend(self.make_meta_hex(nh, district, rc, Some(mrc)));
                    district += 1;
                }
            }
        }
        hexes
    }

    /// One hexagonal district of `nh` hexes per side centred on `rc`;
    /// the centre hex comes first in the result.
    pub fn make_meta_hex(&mut self, nh: usize, district: usize, rc: RowCol, mrc: Option<RowCol>) -> Vec<HexId> {
        let center = self.add_hex(rc.row, rc.col, Some(district));
        if let Some(mrc) = mrc {
            self.add_meta_hex(center, mrc);
        }
        let mut hexes = vec![center];
        let mut rc = rc;
        for ring in 1..nh {
            rc = self.topo.step(rc, 4);
            rc = self.ring_walk(rc, ring, |map, rc| hexes.push(map.add_hex(rc.row, rc.col, Some(district))));
        }
        self.set_district_and_paint(&hexes, district);
        hexes
    }

    /// Visit the `6 * n` positions of a ring, `n` per side, turning clockwise.
    /// Returns the position after the last step (the starting corner).
    fn ring_walk<F>(&mut self, mut rc: RowCol, n: usize, mut f: F) -> RowCol
    where
        F: FnMut(&mut Self, RowCol),
    {
        let topo = self.topo;
        for nd in 0..6 {
            for _ in 0..n {
                f(self, rc);
                rc = topo.step(rc, nd);
            }
        }
        rc
    }

    /// Rectangle of `nr` rows by `nc` columns, all in district 0.
    pub fn make_rect(&mut self, nr: usize, nc: usize, trim: bool, half: bool) -> Vec<HexId> {
        let (nr, nc) = (nr as i32, nc as i32);
        let mut hexes = Vec::new();
        let nc_even = nc % 2 == 0;
        let c00 = i32::from(trim);
        let nc0 = if trim { nc - if nc_even { 1 } else { 2 } } else { nc };
        self.add_line_of_hex(nc0, 0, c00, 1, &mut hexes);
        for row in 1..nr - 1 {
            self.add_line_of_hex(nc, row, 0, 1, &mut hexes);
        }
        if nr > 1 {
            let (cf0, ncf) = if trim { (2, nc - 3) } else { (0, nc) };
            let dc = if half { 2 } else { 1 };
            self.add_line_of_hex(ncf, nr - 1, cf0, dc, &mut hexes);
        }
        self.set_district_and_paint(&hexes, 0);
        hexes
    }

    fn add_line_of_hex(&mut self, maxc: i32, row: i32, col: i32, dc: usize, hexes: &mut Vec<HexId>) {
        for i in (0..maxc.max(0)).step_by(dc) {
            hexes.push(self.add_hex(row, col + i, Some(0)));
        }
    }

    // ========================================================================
    // COLORING
    // ========================================================================

    /// Record the members of `district` and give them its colour.
    pub fn set_district_and_paint(&mut self, hexes: &[HexId], district: usize) {
        if self.districts.len() <= district {
            self.districts.resize_with(district + 1, Vec::new);
        }
        self.districts[district] = hexes.to_vec();
        let color = if district == 0 { DIST_COLOR[0] } else { self.pick_color(hexes) };
        for &id in hexes {
            let hex = &mut self.hexes[id.index()];
            hex.district = Some(district);
            hex.color = Some(color);
        }
    }

    /// First palette colour not used by a district seen along any ray from
    /// the centre of `hexes` (`hexes[0]`).
    pub fn pick_color(&self, hexes: &[HexId]) -> &'static str {
        let Some(&first) = hexes.first() else {
            return DIST_COLOR[0];
        };
        let hex0 = self.hex(first);
        let mut adj_color = vec![DIST_COLOR[0]];
        for dir in self.topo.link_dirs() {
            let found = hex0.hexes_in_dir(dir).into_iter().find(|h| h.district() != hex0.district());
            if let Some(color) = found.and_then(|h| h.color()) {
                adj_color.push(color);
            }
        }
        DIST_COLOR
            .into_iter()
            .find(|c| !adj_color.contains(c))
            .unwrap_or(FALLBACK_COLOR)
    }

    // ========================================================================
    // MARKS & HIT TESTING
    // ========================================================================

    pub fn set_legal(&mut self, id: HexId, legal: bool) {
        self.hexes[id.index()].is_legal = legal;
    }

    pub fn clear_legal(&mut self) {
        self.hexes.iter_mut().for_each(|h| h.is_legal = false);
    }

    pub fn legal_hexes(&self) -> impl Iterator<Item = HexId> + '_ {
        self.hexes.iter().filter(|h| h.is_legal).map(Hex::id)
    }

    /// Show the highlight mark on `hex`, or hide it.
    pub fn show_mark(&mut self, hex: Option<HexId>) {
        self.mark = hex;
    }

    pub fn mark(&self) -> Option<HexId> {
        self.mark
    }

    /// Hex whose centre is nearest (x, y) and within one radius, in map
    /// pixel space. With `legal_only`, only hexes marked legal qualify.
    pub fn hex_under_point(&self, x: f64, y: f64, legal_only: bool) -> Option<HexId> {
        let rad = self.radius;
        self.hexes
            .iter()
            .filter(|h| !legal_only || h.is_legal)
            .map(|h| {
                let p = self.topo.xywh(rad, f64::from(h.row()), f64::from(h.col()));
                (h.id(), (p.x - x).hypot(p.y - y))
            })
            .filter(|&(_, d)| d <= rad)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id)
    }

    /// Pixel centre of (row, col)
    pub fn xy_from_map(&self, row: i32, col: i32) -> (f64, f64) {
        let p = self.topo.xywh(self.radius, f64::from(row), f64::from(col));
        (p.x, p.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn rings(topo: Topo, nh: usize, mh: usize) -> HexMap {
        let mut map = HexMap::new(topo, 1.0);
        map.make_all_districts(nh, mh);
        map
    }

    #[test]
    fn test_ft_hexes() {
        let seq: Vec<usize> = (0..7).map(ft_hexes).collect();
        assert_eq!(seq, vec![0, 1, 7, 19, 37, 61, 91]);
    }

    #[test]
    fn test_single_hex_districts() {
        // one hex per district: the map is a hexagon of ft_hexes(mh) hexes
        let map = rings(Topo::Ew, 1, 2);
        assert_eq!(map.len(), 7);
        assert_eq!(map.n_districts(), 7);
        assert_eq!(map.len(), ft_hexes(2));
    }

    #[test]
    fn test_ring_counts() {
        for topo in [Topo::Ew, Topo::Ns] {
            for nh in 1..4 {
                for mh in 1..4 {
                    let map = rings(topo, nh, mh);
                    assert_eq!(map.len(), ft_hexes(nh) * ft_hexes(mh), "{topo:?} nh={nh} mh={mh}");
                    assert_eq!(map.n_districts(), ft_hexes(mh));
                    for d in 0..map.n_districts() {
                        assert_eq!(map.district(d).len(), ft_hexes(nh));
                    }
                }
            }
        }
    }

    #[test]
    fn test_rc0_keeps_map_non_negative() {
        assert_eq!(HexMap::calculate_rc0(1, 2), RowCol::new(3, 3));
        let map = rings(Topo::Ew, 3, 3);
        let b = map.bounds().unwrap();
        assert!(b.min_row >= 0 && b.min_col >= 0);
    }

    #[test]
    fn test_center_and_corners() {
        let map = rings(Topo::Ew, 2, 2);
        let center = map.center_hex().unwrap();
        assert_eq!(center.district(), Some(0));

        let east = map.corner_hex(HexDir::E).unwrap();
        assert!(east.link(HexDir::E).is_none());
        assert_eq!(east.row(), center.row());
    }

    #[test]
    fn test_links_are_symmetric() {
        for topo in [Topo::Ew, Topo::Ns] {
            let map = rings(topo, 2, 3);
            for hex in map.iter() {
                for (dir, n) in hex.links().iter() {
                    assert_eq!(map.hex(n).links().get(dir.rev()), Some(hex.id()));
                }
            }
        }
    }

    #[test]
    fn test_interior_hexes_have_six_links() {
        let map = rings(Topo::Ns, 3, 1);
        let center = map.center_hex().unwrap();
        assert_eq!(center.links().len(), 6);
        assert!(center.links().iter().all(|(d, _)| d.is_ns()));
    }

    #[test]
    fn test_meta_map() {
        let map = rings(Topo::Ew, 2, 2);
        let mut neighbors = map.district_neighbors(0);
        neighbors.sort_unstable();
        assert_eq!(neighbors, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(map.district_neighbors(1).len(), 3);
        assert!(map.meta_hex(RowCol::new(0, 0)).is_some());
    }

    #[test]
    fn test_district_colors() {
        let map = rings(Topo::Ew, 2, 3);
        assert_eq!(map.hex(map.district(0)[0]).color(), Some(DIST_COLOR[0]));
        for d in 1..map.n_districts() {
            let center = map.hex(map.district(d)[0]);
            let color = center.color().unwrap();
            assert_ne!(color, DIST_COLOR[0]);
            for dir in map.topo().link_dirs() {
                let other = center.hexes_in_dir(dir).into_iter().find(|h| h.district() != Some(d));
                if let Some(other) = other {
                    // only districts placed earlier constrain the choice
                    if other.district().unwrap() < d && color != FALLBACK_COLOR {
                        assert_ne!(other.color(), Some(color), "district {d} vs {:?}", other.district());
                    }
                }
            }
            // every member shares the centre's colour
            assert!(map.district(d).iter().all(|&id| map.hex(id).color() == Some(color)));
        }
    }

    #[test]
    fn test_make_rect() {
        let mut map = HexMap::new(Topo::Ew, 1.0);
        let hexes = map.make_layout(MapLayout::rect(9, 11));
        // 9 + 7 * 11 + 4
        assert_eq!(hexes.len(), 90);
        assert!(map.get(0, 0).is_none());
        assert!(map.get(0, 1).is_some());
        assert!(map.get(8, 2).is_some());
        assert!(map.get(8, 3).is_none());
        assert_eq!(map.n_districts(), 1);

        let mut full = HexMap::new(Topo::Ew, 1.0);
        let hexes = full.make_rect(3, 4, false, false);
        assert_eq!(hexes.len(), 12);
    }

    #[test]
    fn test_rc_linear_is_row_major() {
        let mut map = HexMap::new(Topo::Ew, 1.0);
        map.make_rect(3, 4, false, false);
        assert_eq!(map.rc_linear(0, 0), 0);
        assert_eq!(map.rc_linear(1, 0), 4);
        assert_eq!(map.get(2, 3).unwrap().rc_linear(), 11);
    }

    #[test]
    fn test_duplicate_hex_keeps_first() {
        let mut map = rings(Topo::Ew, 1, 2);
        let center = map.center_hex().unwrap().id();
        let rc = map.hex(center).rc();
        let links = map.hex(center).links().len();
        assert_eq!(map.add_hex(rc.row, rc.col, Some(5)), center);
        assert_eq!(map.len(), 7);
        assert_eq!(map.hex(center).district(), Some(0));
        assert_eq!(map.hex(center).links().len(), links);
    }

    #[test]
    fn test_aux_hexes_stay_off_map() {
        let mut map = rings(Topo::Ew, 1, 1);
        let recycle = map.add_aux_hex("Recycle", -1, -3);
        assert_eq!(map.len(), 1);
        assert!(!map.hex(recycle).is_on_map());
        assert!(map.hex(recycle).links().is_empty());
        assert_eq!(map.aux_hexes(), &[recycle]);
    }

    #[test]
    fn test_hex_under_point() {
        let mut map = HexMap::new(Topo::Ew, 10.0);
        map.make_rect(3, 3, false, false);
        let (x, y) = map.xy_from_map(1, 1);
        let id = map.hex_under_point(x + 2.0, y - 1.0, false).unwrap();
        assert_eq!(map.hex(id).rc(), RowCol::new(1, 1));
        assert!(map.hex_under_point(x, y, true).is_none());

        map.set_legal(id, true);
        assert_eq!(map.hex_under_point(x, y, true), Some(id));
        assert!(map.hex_under_point(-100.0, -100.0, false).is_none());

        map.clear_legal();
        assert_eq!(map.legal_hexes().count(), 0);
    }

    #[test]
    fn test_traversal_helpers() {
        let map = rings(Topo::Ew, 2, 1);
        assert_eq!(map.filter_each_hex(|h| h.district() == Some(0)).len(), 7);
        assert!(map.find_hex(|h| h.row() == 100).is_none());
        let rows = map.map_each_hex(|h| h.row());
        assert!(rows.windows(2).all(|w| w[0] <= w[1]));
        let mut n = 0;
        map.for_each_hex(|_| n += 1);
        assert_eq!(n, 7);
    }

    proptest! {
        #[test]
        fn prop_ring_hex_count(nh in 1usize..5, mh in 1usize..4, ew in any::<bool>()) {
            let map = rings(Topo::from_ew(ew), nh, mh);
            prop_assert_eq!(map.len(), ft_hexes(nh) * ft_hexes(mh));
            prop_assert_eq!(map.hex_ary().len(), map.len());
        }
    }
}
