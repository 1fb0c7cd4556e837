//! Hex directions and the two offset-coordinate topologies
//!
//! An `Ew` map is made of hexes with vertical east/west edges, and odd rows
//! sit half a hex to the right. An `Ns` map is its dual: horizontal
//! north/south edges, odd columns sit half a hex lower. In both cases the
//! neighbor offsets depend on the parity of the row (or column) you start
//! from, so every lookup takes the origin `RowCol`.

use std::fmt;

use serde::{Deserialize, Serialize};

pub const SQRT3: f64 = 1.732_050_807_568_877_2;
pub const SQRT3_2: f64 = SQRT3 / 2.0;

// ============================================================================
// DIRECTIONS
// ============================================================================

/// The twelve compass directions used by either topology.
///
/// The first six are the `Ew` link directions, the last six the `Ns` ones;
/// `index()` follows that order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HexDir {
    NE,
    E,
    SE,
    SW,
    W,
    NW,
    N,
    EN,
    ES,
    S,
    WS,
    WN,
}

impl HexDir {
    pub const ALL: [HexDir; 12] = [
        HexDir::NE,
        HexDir::E,
        HexDir::SE,
        HexDir::SW,
        HexDir::W,
        HexDir::NW,
        HexDir::N,
        HexDir::EN,
        HexDir::ES,
        HexDir::S,
        HexDir::WS,
        HexDir::WN,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    /// The opposite direction; `d.rev().rev() == d`.
    pub const fn rev(self) -> HexDir {
        match self {
            HexDir::N => HexDir::S,
            HexDir::S => HexDir::N,
            HexDir::E => HexDir::W,
            HexDir::W => HexDir::E,
            HexDir::NE => HexDir::SW,
            HexDir::SW => HexDir::NE,
            HexDir::SE => HexDir::NW,
            HexDir::NW => HexDir::SE,
            HexDir::ES => HexDir::WN,
            HexDir::WN => HexDir::ES,
            HexDir::EN => HexDir::WS,
            HexDir::WS => HexDir::EN,
        }
    }

    /// Compass angle in degrees, clockwise from north.
    pub const fn rot(self) -> u16 {
        match self {
            HexDir::N => 0,
            HexDir::NE => 30,
            HexDir::EN => 60,
            HexDir::E => 90,
            HexDir::ES => 120,
            HexDir::SE => 150,
            HexDir::S => 180,
            HexDir::SW => 210,
            HexDir::WS => 240,
            HexDir::W => 270,
            HexDir::WN => 300,
            HexDir::NW => 330,
        }
    }

    /// Inverse of `rot`; angles are taken modulo 360 and must land on a
    /// multiple of 30.
    pub fn from_rot(angle: i32) -> Option<HexDir> {
        let angle = angle.rem_euclid(360);
        HexDir::ALL.into_iter().find(|d| i32::from(d.rot()) == angle)
    }

    pub const fn is_ew(self) -> bool {
        (self as usize) < 6
    }

    pub const fn is_ns(self) -> bool {
        !self.is_ew()
    }

    pub const fn name(self) -> &'static str {
        match self {
            HexDir::NE => "NE",
            HexDir::E => "E",
            HexDir::SE => "SE",
            HexDir::SW => "SW",
            HexDir::W => "W",
            HexDir::NW => "NW",
            HexDir::N => "N",
            HexDir::EN => "EN",
            HexDir::ES => "ES",
            HexDir::S => "S",
            HexDir::WS => "WS",
            HexDir::WN => "WN",
        }
    }
}

impl fmt::Display for HexDir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Link directions of an `Ew` map.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EwDir {
    NE,
    E,
    SE,
    SW,
    W,
    NW,
}

impl EwDir {
    pub const ALL: [EwDir; 6] = [EwDir::NE, EwDir::E, EwDir::SE, EwDir::SW, EwDir::W, EwDir::NW];
}

/// Link directions of an `Ns` map.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NsDir {
    N,
    EN,
    ES,
    S,
    WS,
    WN,
}

impl NsDir {
    pub const ALL: [NsDir; 6] = [NsDir::N, NsDir::EN, NsDir::ES, NsDir::S, NsDir::WS, NsDir::WN];
}

impl From<EwDir> for HexDir {
    fn from(d: EwDir) -> Self {
        HexDir::ALL[d as usize]
    }
}

impl From<NsDir> for HexDir {
    fn from(d: NsDir) -> Self {
        HexDir::ALL[6 + d as usize]
    }
}

impl TryFrom<HexDir> for EwDir {
    type Error = HexDir;

    fn try_from(d: HexDir) -> Result<Self, HexDir> {
        if d.is_ew() {
            Ok(EwDir::ALL[d.index()])
        } else {
            Err(d)
        }
    }
}

impl TryFrom<HexDir> for NsDir {
    type Error = HexDir;

    fn try_from(d: HexDir) -> Result<Self, HexDir> {
        if d.is_ns() {
            Ok(NsDir::ALL[d.index() - 6])
        } else {
            Err(d)
        }
    }
}

// ============================================================================
// COORDINATES
// ============================================================================

/// Offset (row, col) coordinates
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RowCol {
    pub row: i32,
    pub col: i32,
}

impl RowCol {
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for RowCol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{},{}]", self.row, self.col)
    }
}

/// Pixel placement of one hex: centre, size and the per-step spacing.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Xywh {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    pub dxdc: f64,
    pub dydr: f64,
}

/// Axis-aligned rectangle relative to a hex centre
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// (drow, dcol) per link direction, in `Topo::link_dirs` order
type Deltas = [(i32, i32); 6];

const EW_EVEN: Deltas = [(-1, 0), (0, 1), (1, 0), (1, -1), (0, -1), (-1, -1)];
const EW_ODD: Deltas = [(-1, 1), (0, 1), (1, 1), (1, 0), (0, -1), (-1, 0)];
const NS_EVEN: Deltas = [(-1, 0), (-1, 1), (0, 1), (1, 0), (0, -1), (-1, -1)];
const NS_ODD: Deltas = [(-1, 0), (0, 1), (1, 1), (1, 0), (1, -1), (0, -1)];

const EW_DIRS: [HexDir; 6] = [HexDir::NE, HexDir::E, HexDir::SE, HexDir::SW, HexDir::W, HexDir::NW];
const NS_DIRS: [HexDir; 6] = [HexDir::N, HexDir::EN, HexDir::ES, HexDir::S, HexDir::WS, HexDir::WN];

// ============================================================================
// TOPOLOGY
// ============================================================================

/// Which of the two dual hex orientations a map uses
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Topo {
    /// Vertical east/west edges, odd rows offset
    #[default]
    Ew,
    /// Horizontal north/south edges, odd columns offset
    Ns,
}

impl Topo {
    pub fn from_ew(use_ew_topo: bool) -> Self {
        if use_ew_topo {
            Topo::Ew
        } else {
            Topo::Ns
        }
    }

    /// The six directions in which hexes of this topology have neighbors,
    /// clockwise. Ring construction depends on this order.
    pub const fn link_dirs(self) -> [HexDir; 6] {
        match self {
            Topo::Ew => EW_DIRS,
            Topo::Ns => NS_DIRS,
        }
    }

    /// Position of `dir` in `link_dirs`, or None for a direction of the other topology.
    pub fn dir_index(self, dir: HexDir) -> Option<usize> {
        match (self, dir.is_ew()) {
            (Topo::Ew, true) => Some(dir.index()),
            (Topo::Ns, false) => Some(dir.index() - 6),
            _ => None,
        }
    }

    fn deltas(self, rc: RowCol) -> &'static Deltas {
        match self {
            Topo::Ew if rc.row.rem_euclid(2) == 0 => &EW_EVEN,
            Topo::Ew => &EW_ODD,
            Topo::Ns if rc.col.rem_euclid(2) == 0 => &NS_EVEN,
            Topo::Ns => &NS_ODD,
        }
    }

    /// (drow, dcol) from `rc` in `dir`
    pub fn delta(self, rc: RowCol, dir: HexDir) -> Option<(i32, i32)> {
        self.dir_index(dir).map(|nd| self.deltas(rc)[nd])
    }

    /// The neighbor position of `rc` in `dir`; None when `dir` does not
    /// belong to this topology.
    pub fn next_row_col(self, rc: RowCol, dir: HexDir) -> Option<RowCol> {
        self.dir_index(dir).map(|nd| self.step(rc, nd))
    }

    /// Neighbor of `rc` in the `nd`-th link direction (taken modulo 6).
    pub fn step(self, rc: RowCol, nd: usize) -> RowCol {
        let (dr, dc) = self.deltas(rc)[nd % 6];
        RowCol::new(rc.row + dr, rc.col + dc)
    }

    /// Take `n` steps in the `nd`-th link direction.
    pub fn steps(self, rc: RowCol, nd: usize, n: usize) -> RowCol {
        (0..n).fold(rc, |rc, _| self.step(rc, nd))
    }

    /// Pixel geometry of the hex at (row, col) drawn with circumradius `rad`.
    pub fn xywh(self, rad: f64, row: f64, col: f64) -> Xywh {
        match self {
            Topo::Ew => {
                let (w, h) = (SQRT3 * rad, 2.0 * rad);
                let (dxdc, dydr) = (SQRT3 * rad, 1.5 * rad);
                let shift = parity(row) / 2.0;
                Xywh { x: (col + shift) * dxdc, y: row * dydr, w, h, dxdc, dydr }
            }
            Topo::Ns => {
                let (w, h) = (2.0 * rad, SQRT3 * rad);
                let (dxdc, dydr) = (1.5 * rad, SQRT3 * rad);
                let shift = parity(col) / 2.0;
                Xywh { x: col * dxdc, y: (row + shift) * dydr, w, h, dxdc, dydr }
            }
        }
    }

    /// Rotation at which a hex of this topology is drawn (degrees).
    pub const fn tilt(self) -> f64 {
        match self {
            Topo::Ew => 30.0,
            Topo::Ns => 0.0,
        }
    }
}

fn parity(v: f64) -> f64 {
    (v.floor() as i64).rem_euclid(2) as f64
}

// ============================================================================
// POINT GEOMETRY
// ============================================================================

/// Offset of the point `rad` away from a hex centre in `dir`.
pub fn polar_offset(dir: HexDir, rad: f64) -> (f64, f64) {
    let a = f64::from(dir.rot()).to_radians();
    (a.sin() * rad, -a.cos() * rad)
}

/// Offset of the corner between two adjacent directions.
pub fn corner_xy(dir0: HexDir, dir1: HexDir, rad: f64) -> (f64, f64) {
    let (d0, d1) = (f64::from(dir0.rot()), f64::from(dir1.rot()));
    let mut a2 = (d0 + d1) / 2.0;
    if (d0 - d1).abs() > 180.0 {
        a2 += 180.0;
    }
    let a = a2.to_radians();
    (a.sin() * rad, -a.cos() * rad)
}

/// Offset of the midpoint of the edge facing `dir`.
pub fn edge_point(dir: HexDir, rad: f64) -> (f64, f64) {
    polar_offset(dir, rad * SQRT3_2)
}

/// Bounding rectangle of a hex of circumradius `r` rotated by `tilt` degrees.
pub fn hex_bounds(r: f64, tilt: f64) -> Bounds {
    let w = r * tilt.to_radians().cos();
    let h = r * (tilt - 30.0).to_radians().cos();
    Bounds { x: -w, y: -h, width: 2.0 * w, height: 2.0 * h }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_rev_is_involution() {
        for d in HexDir::ALL {
            assert_eq!(d.rev().rev(), d);
            assert_ne!(d.rev(), d);
            assert_eq!(d.rev().is_ew(), d.is_ew());
        }
    }

    #[test]
    fn test_rot_round_trip() {
        for d in HexDir::ALL {
            assert_eq!(HexDir::from_rot(i32::from(d.rot())), Some(d));
        }
        assert_eq!(HexDir::from_rot(360), Some(HexDir::N));
        assert_eq!(HexDir::from_rot(-90), Some(HexDir::W));
        assert_eq!(HexDir::from_rot(45), None);
    }

    #[test]
    fn test_subsets_are_disjoint() {
        assert_eq!(Topo::Ew.next_row_col(RowCol::new(0, 0), HexDir::N), None);
        assert_eq!(Topo::Ns.next_row_col(RowCol::new(0, 0), HexDir::E), None);
        assert_eq!(EwDir::try_from(HexDir::S), Err(HexDir::S));
        assert_eq!(NsDir::try_from(HexDir::WS), Ok(NsDir::WS));
        assert_eq!(HexDir::from(EwDir::SW), HexDir::SW);
        assert_eq!(HexDir::from(NsDir::EN), HexDir::EN);
    }

    #[test]
    fn test_ew_parity() {
        let even = RowCol::new(2, 3);
        let odd = RowCol::new(3, 3);
        assert_eq!(Topo::Ew.next_row_col(even, HexDir::NE), Some(RowCol::new(1, 3)));
        assert_eq!(Topo::Ew.next_row_col(odd, HexDir::NE), Some(RowCol::new(2, 4)));
        assert_eq!(Topo::Ew.next_row_col(even, HexDir::SW), Some(RowCol::new(3, 2)));
        assert_eq!(Topo::Ew.next_row_col(odd, HexDir::SW), Some(RowCol::new(4, 3)));
        // negative odd rows behave like positive odd rows
        assert_eq!(Topo::Ew.next_row_col(RowCol::new(-1, 0), HexDir::SE), Some(RowCol::new(0, 1)));
    }

    #[test]
    fn test_ns_parity() {
        let even = RowCol::new(2, 2);
        let odd = RowCol::new(2, 3);
        assert_eq!(Topo::Ns.next_row_col(even, HexDir::EN), Some(RowCol::new(1, 3)));
        assert_eq!(Topo::Ns.next_row_col(odd, HexDir::EN), Some(RowCol::new(2, 4)));
        assert_eq!(Topo::Ns.next_row_col(odd, HexDir::WS), Some(RowCol::new(3, 2)));
    }

    #[test]
    fn test_xywh_offsets() {
        let a = Topo::Ew.xywh(1.0, 0.0, 0.0);
        let b = Topo::Ew.xywh(1.0, 1.0, 0.0);
        assert_eq!(a.x, 0.0);
        assert!((b.x - SQRT3 / 2.0).abs() < 1e-9);
        assert!((b.y - 1.5).abs() < 1e-9);

        let c = Topo::Ns.xywh(1.0, 0.0, 1.0);
        assert!((c.x - 1.5).abs() < 1e-9);
        assert!((c.y - SQRT3 / 2.0).abs() < 1e-9);
        assert_eq!(c.w, 2.0);
    }

    #[test]
    fn test_neighbors_are_one_hex_apart() {
        for topo in [Topo::Ew, Topo::Ns] {
            for rc in [RowCol::new(4, 4), RowCol::new(5, 4), RowCol::new(4, 5)] {
                let p = topo.xywh(1.0, rc.row as f64, rc.col as f64);
                for nd in 0..6 {
                    let n = topo.step(rc, nd);
                    let q = topo.xywh(1.0, n.row as f64, n.col as f64);
                    let dist = ((p.x - q.x).powi(2) + (p.y - q.y).powi(2)).sqrt();
                    assert!((dist - SQRT3).abs() < 1e-9, "{topo:?} {rc} -> {n}: {dist}");
                }
            }
        }
    }

    #[test]
    fn test_edge_and_corner_points() {
        let (x, y) = edge_point(HexDir::N, 2.0);
        assert!(x.abs() < 1e-9);
        assert!((y + SQRT3).abs() < 1e-9);

        let (x, y) = corner_xy(HexDir::WN, HexDir::N, 1.0);
        let a = 330f64.to_radians();
        assert!((x - a.sin()).abs() < 1e-9);
        assert!((y + a.cos()).abs() < 1e-9);

        let b = hex_bounds(1.0, 30.0);
        assert!((b.width - SQRT3).abs() < 1e-9);
        assert!((b.height - 2.0).abs() < 1e-9);
    }

    proptest! {
        #[test]
        fn prop_step_then_reverse_returns(row in -50i32..50, col in -50i32..50, nd in 0usize..6, ew in any::<bool>()) {
            let topo = Topo::from_ew(ew);
            let rc = RowCol::new(row, col);
            let dir = topo.link_dirs()[nd];
            let there = topo.next_row_col(rc, dir).unwrap();
            prop_assert_eq!(topo.next_row_col(there, dir.rev()), Some(rc));
        }
    }
}
