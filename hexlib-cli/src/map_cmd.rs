//! Map command - build a map and describe it
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: build_map(), summarize(), report()
//! - Level 3: district and corner summaries
//! - Level 4: parsing and formatting utilities

use anyhow::{bail, Context, Result};
use clap::Args;
use serde::Serialize;

use hexlib_core::{HexMap, MapLayout, Topo};

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct MapArgs {
    /// Hexes per side of a district
    #[arg(long, default_value = "2")]
    pub nh: usize,

    /// Rings of districts
    #[arg(long, default_value = "2")]
    pub mh: usize,

    /// Use north-south topology (columns of hexes) instead of east-west
    #[arg(long)]
    pub ns: bool,

    /// Build a ROWSxCOLS rectangle instead of districts
    #[arg(long, value_name = "ROWSxCOLS")]
    pub rect: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct DistrictSummary {
    index: usize,
    hexes: usize,
    color: String,
}

#[derive(Debug, Serialize)]
struct MapSummary {
    topo: Topo,
    layout: MapLayout,
    hexes: usize,
    districts: Vec<DistrictSummary>,
    center: Option<String>,
    corners: Vec<(String, String)>,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run map command
///
/// 1. Build the map from the layout arguments
/// 2. Summarize districts and corners
/// 3. Report
pub fn run(args: MapArgs) -> Result<()> {
    let layout = parse_layout(&args)?;
    let topo = Topo::from_ew(!args.ns);
    let map = build_map(topo, layout);

    tracing::info!("Built {:?} map: {} hexes", layout, map.len());

    let summary = summarize(&map, layout);
    report(&summary, args.json)
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

fn build_map(topo: Topo, layout: MapLayout) -> HexMap {
    let mut map = HexMap::new(topo, 60.0);
    map.make_layout(layout);
    map
}

fn summarize(map: &HexMap, layout: MapLayout) -> MapSummary {
    MapSummary {
        topo: map.topo(),
        layout,
        hexes: map.len(),
        districts: district_summaries(map),
        center: map.center_hex().map(|h| h.aname().to_string()),
        corners: corner_summaries(map),
    }
}

fn report(summary: &MapSummary, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
        return Ok(());
    }
    println!("\n=== Map ===");
    println!("Topology:  {:?}", summary.topo);
    println!("Layout:    {:?}", summary.layout);
    println!("Hexes:     {} in {} districts", summary.hexes, summary.districts.len());
    if let Some(center) = &summary.center {
        println!("Center:    {}", center);
    }
    println!("\nDistricts:");
    for d in &summary.districts {
        println!("  {:>3}: {:>4} hexes  {}", d.index, d.hexes, d.color);
    }
    println!("\nCorners:");
    for (dir, hex) in &summary.corners {
        println!("  {:<3} {}", dir, hex);
    }
    Ok(())
}

// ============================================================================
// LEVEL 3 - STEPS
// ============================================================================

fn district_summaries(map: &HexMap) -> Vec<DistrictSummary> {
    (0..map.n_districts())
        .map(|index| {
            let hexes = map.district(index);
            let color = hexes
                .first()
                .and_then(|&h| map.hex(h).color())
                .unwrap_or("-")
                .to_string();
            DistrictSummary { index, hexes: hexes.len(), color }
        })
        .collect()
}

fn corner_summaries(map: &HexMap) -> Vec<(String, String)> {
    map.topo()
        .link_dirs()
        .into_iter()
        .filter_map(|dir| {
            let hex = map.corner_hex(dir)?;
            Some((dir.name().to_string(), hex.aname().to_string()))
        })
        .collect()
}

// ============================================================================
// LEVEL 4 - UTILITIES
// ============================================================================

fn parse_layout(args: &MapArgs) -> Result<MapLayout> {
    match &args.rect {
        Some(spec) => {
            let (rows, cols) = parse_rect(spec)?;
            Ok(MapLayout::rect(rows, cols))
        }
        None => {
            if args.nh == 0 || args.mh == 0 {
                bail!("--nh and --mh must be at least 1");
            }
            Ok(MapLayout::MetaHexRings { nh: args.nh, mh: args.mh })
        }
    }
}

/// "5x7" -> (5, 7)
fn parse_rect(spec: &str) -> Result<(usize, usize)> {
    let (rows, cols) = spec
        .split_once(['x', 'X'])
        .with_context(|| format!("expected ROWSxCOLS, got {}", spec))?;
    let rows = rows.trim().parse().with_context(|| format!("bad row count in {}", spec))?;
    let cols = cols.trim().parse().with_context(|| format!("bad column count in {}", spec))?;
    Ok((rows, cols))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rect() {
        assert_eq!(parse_rect("5x7").unwrap(), (5, 7));
        assert_eq!(parse_rect("3X4").unwrap(), (3, 4));
        assert!(parse_rect("5").is_err());
        assert!(parse_rect("axb").is_err());
    }

    #[test]
    fn test_summary_of_small_map() {
        let layout = MapLayout::MetaHexRings { nh: 1, mh: 2 };
        let map = build_map(Topo::Ew, layout);
        let summary = summarize(&map, layout);
        assert_eq!(summary.hexes, 7);
        assert_eq!(summary.districts.len(), 7);
        assert_eq!(summary.center.as_deref(), Some("Hex@[3,3]"));
        assert_eq!(summary.corners.len(), 6);
    }
}
