//! Table parameters
//!
//! Everything needed to build a table: hex size and topology, map shape,
//! player count. Loadable from JSON and overridable key by key, the way URL
//! query parameters override a saved configuration.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{GameError, Result};
use crate::text_log::DEFAULT_LINES;
use crate::topo::Topo;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableParams {
    /// Hex radius in pixels
    pub hex_rad: f64,
    pub use_ew_topo: bool,
    /// District size (hexes per side of a district)
    pub n_hexes: usize,
    /// Map order (rings of districts)
    pub m_hexes: usize,
    pub num_players: usize,
    pub max_players: usize,
    pub text_log_lines: usize,
    pub seed: Option<u64>,
}

impl Default for TableParams {
    fn default() -> Self {
        Self {
            hex_rad: 60.0,
            use_ew_topo: true,
            n_hexes: 6,
            m_hexes: 1,
            num_players: 2,
            max_players: 6,
            text_log_lines: DEFAULT_LINES,
            seed: None,
        }
    }
}

impl TableParams {
    pub fn with_map(mut self, n_hexes: usize, m_hexes: usize) -> Self {
        self.n_hexes = n_hexes;
        self.m_hexes = m_hexes;
        self
    }

    pub fn with_players(mut self, num_players: usize) -> Self {
        self.num_players = num_players;
        self
    }

    pub fn with_hex_rad(mut self, hex_rad: f64) -> Self {
        self.hex_rad = hex_rad;
        self
    }

    pub fn with_topo(mut self, topo: Topo) -> Self {
        self.use_ew_topo = topo == Topo::Ew;
        self
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn topo(&self) -> Topo {
        Topo::from_ew(self.use_ew_topo)
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading params {}", path.display()))?;
        let params: Self = serde_json::from_str(&text)
            .with_context(|| format!("parsing params {}", path.display()))?;
        params.validate()?;
        Ok(params)
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text).with_context(|| format!("writing params {}", path.display()))
    }

    /// Merge `overrides` into these params. Numbers and booleans given as
    /// strings are coerced. Returns the keys that are not parameters.
    pub fn set_params(&mut self, overrides: &Map<String, Value>) -> Result<Vec<String>> {
        let mut current = match serde_json::to_value(&*self)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        let mut unknown = Vec::new();
        for (key, value) in overrides {
            if !current.contains_key(key) {
                unknown.push(key.clone());
                continue;
            }
            current.insert(key.clone(), coerce(value));
        }
        *self = serde_json::from_value(Value::Object(current))
            .map_err(|e| GameError::InvalidParams(e.to_string()))?;
        if !unknown.is_empty() {
            tracing::debug!("setParams: ignoring {:?}", unknown);
        }
        Ok(unknown)
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_players == 0 || self.num_players > self.max_players {
            return Err(GameError::InvalidParams(format!(
                "num_players {} not in 1..={}",
                self.num_players, self.max_players
            )));
        }
        if self.n_hexes < 1 || self.m_hexes < 1 {
            return Err(GameError::InvalidParams(format!(
                "map size nh={} mh={} must be at least 1",
                self.n_hexes, self.m_hexes
            )));
        }
        if self.hex_rad <= 0.0 {
            return Err(GameError::InvalidParams(format!("hex_rad {} must be positive", self.hex_rad)));
        }
        Ok(())
    }
}

fn coerce(value: &Value) -> Value {
    let Value::String(s) = value else {
        return value.clone();
    };
    if let Ok(n) = s.parse::<u64>() {
        return Value::from(n);
    }
    if let Ok(x) = s.parse::<f64>() {
        return Value::from(x);
    }
    match s.as_str() {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => value.clone(),
    }
}
