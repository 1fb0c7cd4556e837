//! Players and the planner seam

use serde::{Deserialize, Serialize};

use crate::game_play::{GamePlay, Move};

/// Canonical colour names and the display colour of each
pub const COLOR_SCHEME: [(&str, &str); 6] = [
    ("red", "Red"),
    ("blue", "Blue"),
    ("green", "darkgreen"),
    ("violet", "Violet"),
    ("gold", "gold"),
    ("purple", "purple"),
];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub index: usize,
    /// `P{index}:{color}`
    pub name: String,
    /// Canonical colour name
    pub color: String,
    /// Automated (planner-driven) rather than GUI-driven
    pub use_robo: bool,
    pub score: i32,
    pub coins: i32,
}

impl Player {
    pub fn new(index: usize) -> Self {
        let color = Self::color_name(index).to_string();
        Self {
            index,
            name: format!("P{}:{}", index, color),
            color,
            use_robo: false,
            score: 0,
            coins: 0,
        }
    }

    /// Canonical colour for the nth player, wrapping around the scheme.
    pub fn color_name(index: usize) -> &'static str {
        COLOR_SCHEME[index % COLOR_SCHEME.len()].0
    }

    /// Display colour for a canonical name
    pub fn player_color(cname: &str) -> Option<&'static str> {
        COLOR_SCHEME.iter().find(|(k, _)| *k == cname).map(|(_, c)| *c)
    }

    /// Identifier used in logs, `Plyr{index}`
    pub fn plyr_id(&self) -> String {
        format!("Plyr{}", self.index)
    }

    /// Index of the player `nth` seats after this one.
    pub fn nth_player(&self, nth: usize, n_players: usize) -> usize {
        (self.index + nth) % n_players.max(1)
    }
}

/// Source of automated moves for a player with `use_robo` set.
pub trait Planner {
    fn plan_move(&mut self, game: &GamePlay) -> Option<Move>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_names() {
        let p = Player::new(1);
        assert_eq!(p.name, "P1:blue");
        assert_eq!(p.plyr_id(), "Plyr1");
        assert_eq!(Player::player_color(&p.color), Some("Blue"));
        assert_eq!(Player::new(2).color, "green");
        assert_eq!(Player::player_color("green"), Some("darkgreen"));
        assert_eq!(Player::color_name(6), "red");
    }

    #[test]
    fn test_nth_player_wraps() {
        let p = Player::new(2);
        assert_eq!(p.nth_player(1, 3), 0);
        assert_eq!(p.nth_player(2, 3), 1);
        assert_eq!(p.nth_player(3, 3), 2);
    }
}
