// Eligibility filtering: which players are fair game.

use std::collections::{HashMap, HashSet};
use tracing::{info, warn};

use crate::config::EligibilityConfig;
use crate::difficulty::DifficultyTable;
use crate::record::{group_by_player, RankedRecord};

/// Whether a player's full career history qualifies them for the game.
///
/// A player qualifies with enough ranked seasons or a single star season,
/// and only if their first season is inside the game's window.
pub fn is_eligible(history: &[&RankedRecord], rules: &EligibilityConfig) -> bool {
    let Some(first_year) = history.iter().map(|r| r.year()).min() else {
        return false;
    };
    if first_year < rules.earliest_year {
        return false;
    }

    let ranked_seasons = history
        .iter()
        .filter(|r| r.ppr_rank_by_pos <= rules.ranked_season_cutoff)
        .count();
    let has_star_season = history
        .iter()
        .any(|r| r.ppr_rank_by_pos <= rules.star_season_cutoff);

    ranked_seasons >= rules.min_ranked_seasons || has_star_season
}

/// The immutable set of season rows for every eligible player.
///
/// Full career history is retained, not just the qualifying seasons.
#[derive(Debug, Clone, Default)]
pub struct EligiblePool {
    records: Vec<RankedRecord>,
    /// Row indices per player, ordered by year.
    by_player: HashMap<String, Vec<usize>>,
    /// Distinct player names, sorted.
    names: Vec<String>,
}

impl EligiblePool {
    /// Filter the normalized table down to eligible players. Ranks are kept
    /// as computed over the whole table.
    pub fn build(records: &[RankedRecord], rules: &EligibilityConfig) -> Self {
        let eligible: HashSet<&str> = group_by_player(records)
            .into_iter()
            .filter(|(_, history)| is_eligible(history, rules))
            .map(|(name, _)| name)
            .collect();

        let kept: Vec<RankedRecord> = records
            .iter()
            .filter(|r| eligible.contains(r.player()) && r.year() >= rules.earliest_year)
            .cloned()
            .collect();

        let pool = Self::from_records(kept);
        if pool.is_empty() {
            warn!(
                "No eligible players found for starting year {}",
                rules.earliest_year
            );
        } else {
            info!(
                "Eligible pool: {} players, {} seasons",
                pool.len(),
                pool.records.len()
            );
        }
        pool
    }

    /// Index an already-filtered set of rows.
    pub fn from_records(records: Vec<RankedRecord>) -> Self {
        let mut by_player: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, record) in records.iter().enumerate() {
            by_player.entry(record.player().to_string()).or_default().push(i);
        }
        for indices in by_player.values_mut() {
            indices.sort_by_key(|&i| records[i].year());
        }

        let mut names: Vec<String> = by_player.keys().cloned().collect();
        names.sort();

        Self {
            records,
            by_player,
            names,
        }
    }

    pub fn records(&self) -> &[RankedRecord] {
        &self.records
    }

    /// Distinct eligible player names, sorted.
    pub fn player_names(&self) -> &[String] {
        &self.names
    }

    /// Number of distinct players.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_player.contains_key(name)
    }

    /// Canonical spelling of a player name, matched case-insensitively.
    pub fn find_player(&self, name: &str) -> Option<&str> {
        let name = name.trim();
        if let Some((canonical, _)) = self.by_player.get_key_value(name) {
            return Some(canonical);
        }
        self.names
            .iter()
            .find(|n| n.eq_ignore_ascii_case(name))
            .map(String::as_str)
    }

    /// A player's seasons ordered by year. Empty for unknown players.
    pub fn history(&self, name: &str) -> Vec<&RankedRecord> {
        self.by_player
            .get(name)
            .map(|indices| indices.iter().map(|&i| &self.records[i]).collect())
            .unwrap_or_default()
    }

    /// Copy each player's rating onto all of their season rows.
    pub fn merge_difficulty(&mut self, ratings: &DifficultyTable) {
        for record in &mut self.records {
            record.difficulty = ratings.rating(record.player());
        }
    }

    /// True when every row already carries a rating.
    pub fn has_difficulty(&self) -> bool {
        !self.records.is_empty() && self.records.iter().all(|r| r.difficulty.is_some())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
