// Player-season records and their enum-typed attributes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Fantasy positions that can appear in the game. Fullbacks are dropped at
/// normalization and have no variant here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Position {
    QB,
    RB,
    WR,
    TE,
}

impl Position {
    /// Parse a `FantPos` value. Returns `None` for `FB`, blanks, and
    /// anything else outside the four game positions.
    pub fn from_str_pos(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "QB" => Some(Position::QB),
            "RB" => Some(Position::RB),
            "WR" => Some(Position::WR),
            "TE" => Some(Position::TE),
            _ => None,
        }
    }

    pub fn display_str(&self) -> &'static str {
        match self {
            Position::QB => "QB",
            Position::RB => "RB",
            Position::WR => "WR",
            Position::TE => "TE",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Conference {
    NFC,
    AFC,
    #[serde(rename = "N/A")]
    NotApplicable,
}

impl Conference {
    pub fn display_str(&self) -> &'static str {
        match self {
            Conference::NFC => "NFC",
            Conference::AFC => "AFC",
            Conference::NotApplicable => "N/A",
        }
    }
}

impl fmt::Display for Conference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Division {
    North,
    South,
    East,
    West,
    #[serde(rename = "N/A")]
    NotApplicable,
}

impl Division {
    pub fn display_str(&self) -> &'static str {
        match self {
            Division::North => "North",
            Division::South => "South",
            Division::East => "East",
            Division::West => "West",
            Division::NotApplicable => "N/A",
        }
    }
}

impl fmt::Display for Division {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_str())
    }
}

/// One player's stats for one season, after normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct SeasonRecord {
    pub player: String,
    pub team: String,
    pub year: u16,
    pub position: Position,
    pub games: u32,
    pub pass_yds: u32,
    pub pass_td: u32,
    pub rush_yds: u32,
    pub rush_td: u32,
    pub receptions: u32,
    pub rec_yds: u32,
    pub rec_td: u32,
    pub ppr: f64,
    pub conference: Conference,
    pub division: Division,
}

/// A season record with its dense PPR ranks attached.
///
/// `difficulty` is the player's career-wide rating merged onto every season
/// row; it is `None` until the scorer has run (or if the player was outside
/// the scored population).
#[derive(Debug, Clone, PartialEq)]
pub struct RankedRecord {
    pub season: SeasonRecord,
    /// Rank of PPR within the year across all positions (1 = best).
    pub ppr_rank: u32,
    /// Rank of PPR within the (year, position) group.
    pub ppr_rank_by_pos: u32,
    pub difficulty: Option<f64>,
}

impl RankedRecord {
    pub fn player(&self) -> &str {
        &self.season.player
    }

    pub fn year(&self) -> u16 {
        self.season.year
    }

    pub fn position(&self) -> Position {
        self.season.position
    }

    pub fn team(&self) -> &str {
        &self.season.team
    }
}

/// Group records by player name, each history in input order. Keys iterate
/// alphabetically so downstream passes are deterministic.
pub fn group_by_player<'a, I>(records: I) -> BTreeMap<&'a str, Vec<&'a RankedRecord>>
where
    I: IntoIterator<Item = &'a RankedRecord>,
{
    let mut groups: BTreeMap<&str, Vec<&RankedRecord>> = BTreeMap::new();
    for record in records {
        groups.entry(record.player()).or_default().push(record);
    }
    groups
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
