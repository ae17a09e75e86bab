// Read-only game API over the built tables.

use chrono::NaiveDate;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashMap;
use thiserror::Error;

use crate::daily::DailyOrder;
use crate::difficulty::DifficultyTable;
use crate::eligibility::EligiblePool;
use crate::record::{Position, RankedRecord};

#[derive(Debug, Error, PartialEq)]
pub enum GameError {
    #[error("no eligible players are available")]
    NoEligiblePlayers,

    #[error("the daily challenge starts on {epoch}; {date} is too early")]
    ChallengeNotStarted { date: NaiveDate, epoch: NaiveDate },

    #[error("no game in progress for session `{session_id}`")]
    GameNotStarted { session_id: String },

    #[error("`{name}` is not an eligible player")]
    UnknownPlayer { name: String },

    #[error("the game is already over")]
    GameOver,
}

/// Everything the game reads after startup. Built once, never mutated.
#[derive(Debug, Clone)]
pub struct GameData {
    pool: EligiblePool,
    ratings: DifficultyTable,
    daily: DailyOrder,
    epoch: NaiveDate,
    suggestion_limit: usize,
}

impl GameData {
    pub fn new(
        pool: EligiblePool,
        ratings: DifficultyTable,
        daily: DailyOrder,
        epoch: NaiveDate,
        suggestion_limit: usize,
    ) -> Self {
        Self {
            pool,
            ratings,
            daily,
            epoch,
            suggestion_limit,
        }
    }

    pub fn eligible_pool(&self) -> &EligiblePool {
        &self.pool
    }

    pub fn ratings(&self) -> &DifficultyTable {
        &self.ratings
    }

    pub fn daily_order(&self) -> &DailyOrder {
        &self.daily
    }

    pub fn epoch(&self) -> NaiveDate {
        self.epoch
    }

    /// A player's difficulty rating, if they were scored.
    pub fn difficulty(&self, player: &str) -> Option<f64> {
        self.ratings.rating(player)
    }

    /// The challenge player for a calendar date.
    pub fn daily_player(&self, date: NaiveDate) -> Result<&str, GameError> {
        self.daily.player_for(date, self.epoch)
    }

    /// A uniformly sampled eligible player.
    pub fn random_player<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<&str, GameError> {
        self.pool
            .player_names()
            .choose(rng)
            .map(String::as_str)
            .ok_or(GameError::NoEligiblePlayers)
    }

    /// Seasons for `player` ordered by year; empty for unknown names.
    pub fn player_history(&self, player: &str) -> Vec<&RankedRecord> {
        self.pool.history(player)
    }

    /// Eligible players at `position` whose name contains `query`,
    /// case-insensitively, in alphabetical order. A blank query matches
    /// nothing.
    pub fn suggest_players(&self, position: Position, query: &str) -> Vec<&str> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        self.pool
            .player_names()
            .iter()
            .filter(|name| name.to_lowercase().contains(&needle))
            .filter(|name| {
                self.pool
                    .history(name)
                    .first()
                    .is_some_and(|r| r.position() == position)
            })
            .take(self.suggestion_limit)
            .map(String::as_str)
            .collect()
    }
}

/// The team a player spent the most seasons with. Ties go to the team
/// played for most recently.
pub fn most_frequent_team<'a>(history: &[&'a RankedRecord]) -> Option<&'a str> {
    // team -> (seasons, latest year)
    let mut tally: HashMap<&str, (usize, u16)> = HashMap::new();
    for record in history {
        let entry = tally.entry(record.team()).or_insert((0, record.year()));
        entry.0 += 1;
        entry.1 = entry.1.max(record.year());
    }
    tally
        .into_iter()
        .max_by(|(a_team, a), (b_team, b)| {
            a.0.cmp(&b.0)
                .then(a.1.cmp(&b.1))
                .then_with(|| b_team.cmp(a_team))
        })
        .map(|(team, _)| team)
}

/// Columns shown in a player's career-stats view.
pub fn stat_columns(position: Position) -> &'static [&'static str] {
    match position {
        Position::QB => &[
            "Year",
            "G",
            "PassYds",
            "PassTD",
            "RushYds",
            "RushTD",
            "PPR_Rank_by_Pos",
            "PPR",
        ],
        Position::RB | Position::WR | Position::TE => &[
            "Year",
            "G",
            "RushYds",
            "RushTD",
            "Rec",
            "RecYds",
            "RecTD",
            "PPR_Rank_by_Pos",
            "PPR",
        ],
    }
}

/// Display value of one career-stat column for a season row.
pub fn stat_value(record: &RankedRecord, column: &str) -> Option<String> {
    let s = &record.season;
    let value = match column {
        "Year" => s.year.to_string(),
        "Tm" => s.team.clone(),
        "G" => s.games.to_string(),
        "PassYds" => s.pass_yds.to_string(),
        "PassTD" => s.pass_td.to_string(),
        "RushYds" => s.rush_yds.to_string(),
        "RushTD" => s.rush_td.to_string(),
        "Rec" => s.receptions.to_string(),
        "RecYds" => s.rec_yds.to_string(),
        "RecTD" => s.rec_td.to_string(),
        "PPR" => format!("{:.1}", s.ppr),
        "PPR_Rank" => record.ppr_rank.to_string(),
        "PPR_Rank_by_Pos" => record.ppr_rank_by_pos.to_string(),
        _ => return None,
    };
    Some(value)
}

/// Career-stats rows for a year-ordered history, newest season first, one
/// cell per `stat_columns(position)` entry.
pub fn career_rows(history: &[&RankedRecord], position: Position) -> Vec<Vec<String>> {
    let columns = stat_columns(position);
    history
        .iter()
        .rev()
        .map(|record| {
            columns
                .iter()
                .map(|c| stat_value(record, c).unwrap_or_default())
                .collect()
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
