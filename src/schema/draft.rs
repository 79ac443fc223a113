//! Draft tables and the per-player statistics derived from them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Playable houses, in seating order around the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum House {
    Stark,
    Greyjoy,
    Lannister,
    Tyrell,
    Martell,
    Baratheon,
    Arryn,
}

impl House {
    /// All houses in seating order.
    pub const ALL: [House; 7] = [
        House::Stark,
        House::Greyjoy,
        House::Lannister,
        House::Tyrell,
        House::Martell,
        House::Baratheon,
        House::Arryn,
    ];

    /// Smallest supported game size.
    pub const MIN_PER_GAME: usize = 3;

    /// Houses in play for a game of `count` players.
    pub fn in_play(count: usize) -> &'static [House] {
        &Self::ALL[..count.min(Self::ALL.len())]
    }

    /// Position of this house on the seating ring.
    pub fn seat(self) -> usize {
        self as usize
    }
}

impl fmt::Display for House {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Unknown house name.
#[derive(Debug, thiserror::Error)]
#[error("Unknown house '{0}'")]
pub struct ParseHouseError(pub String);

impl FromStr for House {
    type Err = ParseHouseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        House::ALL
            .iter()
            .copied()
            .find(|h| h.to_string().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ParseHouseError(trimmed.to_string()))
    }
}

/// One candidate assignment of players to houses across a set of games.
///
/// `rows[player][game]` is the house the player takes in that game, or
/// `None` when the player sits that game out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftTable {
    pub rows: Vec<Vec<Option<House>>>,
}

impl DraftTable {
    pub fn new(rows: Vec<Vec<Option<House>>>) -> Self {
        Self { rows }
    }

    pub fn player_count(&self) -> usize {
        self.rows.len()
    }

    pub fn game_count(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    /// House of `player` in `game`.
    pub fn house(&self, player: usize, game: usize) -> Option<House> {
        self.rows.get(player)?.get(game).copied().flatten()
    }

    /// Seated players of one game as `(player, house)` pairs.
    pub fn seating(&self, game: usize) -> Vec<(usize, House)> {
        (0..self.player_count())
            .filter_map(|p| self.house(p, game).map(|h| (p, h)))
            .collect()
    }

    /// Text form written to `<id>.draft.txt`: one tab-separated line per player.
    pub fn serialize_text(&self, players: &[String]) -> String {
        let mut out = String::new();
        for (index, row) in self.rows.iter().enumerate() {
            let name = players
                .get(index)
                .cloned()
                .unwrap_or_else(|| (index + 1).to_string());
            out.push_str(&name);
            for cell in row {
                out.push('\t');
                match cell {
                    Some(house) => out.push_str(&house.to_string()),
                    None => out.push('-'),
                }
            }
            out.push('\n');
        }
        out
    }
}

/// Raw statistics for one (player, opponent) pair of a draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerStatRecord {
    pub player: String,
    pub opponent: String,
    /// Games in which the two sit next to each other.
    pub neighbor: f64,
    /// Games the two share.
    pub game: f64,
    /// Board closeness accumulated over shared games.
    pub proximity: f64,
}
