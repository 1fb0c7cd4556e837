//! MapView: what the core asks of whatever draws the map
//!
//! The core never renders. It asks a view for hit testing, to show or hide
//! the target mark, to reflect changed legality flags, and to redraw.

use crate::hex::HexId;
use crate::hex_map::HexMap;

pub trait MapView {
    /// The hex under a pixel position. The default is geometric: the
    /// nearest hex centre within one radius.
    fn hex_under_point(&self, map: &HexMap, x: f64, y: f64) -> Option<HexId> {
        map.hex_under_point(x, y, false)
    }

    fn show_mark(&mut self, map: &mut HexMap, hex: Option<HexId>) {
        map.show_mark(hex);
    }

    /// Legality flags were recomputed.
    fn show_legal(&mut self, _map: &HexMap) {}

    fn update(&mut self, _map: &HexMap) {}
}

/// A view with nothing to draw; counts redraw requests.
#[derive(Clone, Copy, Debug, Default)]
pub struct Headless {
    pub updates: usize,
}

impl MapView for Headless {
    fn update(&mut self, _map: &HexMap) {
        self.updates += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topo::Topo;

    #[test]
    fn test_headless_defaults() {
        let mut map = HexMap::new(Topo::Ns, 20.0);
        map.make_rect(2, 2, false, false);
        let mut view = Headless::default();
        let (x, y) = map.xy_from_map(1, 0);
        let hex = view.hex_under_point(&map, x, y);
        assert_eq!(hex, map.get(1, 0).map(|h| h.id()));

        view.show_mark(&mut map, hex);
        assert_eq!(map.mark(), hex);
        view.update(&map);
        assert_eq!(view.updates, 1);
    }
}
