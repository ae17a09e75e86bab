// Difficulty rating: four weighted sub-scores rescaled to 1..=10.
//
// Two passes over the population. The first collects `PopulationStats`
// (season-count and year bounds, best star rate); the second scores each
// player against those bounds. Higher sub-scores mean harder to guess.

use std::collections::{BTreeMap, HashMap};
use tracing::info;

use crate::config::DifficultyConfig;
use crate::record::{group_by_player, Position, RankedRecord};

/// Returned by any min-max step whose population bounds coincide.
const NEUTRAL_SCORE: f64 = 0.5;
/// Rating given to everyone when all raw scores are equal.
pub const NEUTRAL_RATING: f64 = 5.0;
pub const MIN_RATING: f64 = 1.0;
pub const MAX_RATING: f64 = 10.0;

const EPSILON: f64 = 1e-12;

// ---------------------------------------------------------------------------
// Population statistics
// ---------------------------------------------------------------------------

/// Population-wide bounds that every per-player score is scaled against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PopulationStats {
    pub min_seasons: usize,
    pub max_seasons: usize,
    pub min_year: u16,
    pub max_year: u16,
    /// Highest average star points per season across the population.
    pub max_star_points: f64,
}

impl PopulationStats {
    /// Collect bounds over grouped player histories. `None` for an empty
    /// population.
    pub fn collect(groups: &BTreeMap<&str, Vec<&RankedRecord>>, cfg: &DifficultyConfig) -> Option<Self> {
        let mut stats: Option<Self> = None;
        for history in groups.values() {
            let seasons = season_count(history);
            let star = average_star_points(history, cfg);
            for record in history {
                let year = record.year();
                let s = stats.get_or_insert(Self {
                    min_seasons: seasons,
                    max_seasons: seasons,
                    min_year: year,
                    max_year: year,
                    max_star_points: star,
                });
                s.min_year = s.min_year.min(year);
                s.max_year = s.max_year.max(year);
            }
            if let Some(s) = stats.as_mut() {
                s.min_seasons = s.min_seasons.min(seasons);
                s.max_seasons = s.max_seasons.max(seasons);
                s.max_star_points = s.max_star_points.max(star);
            }
        }
        stats
    }
}

// ---------------------------------------------------------------------------
// Per-player components
// ---------------------------------------------------------------------------

/// The four unweighted sub-scores for one player, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComponentScores {
    pub performance: f64,
    pub longevity: f64,
    pub recency: f64,
    pub star_power: f64,
    /// Average star points per season, before inversion.
    pub star_points: f64,
}

/// `numerator / denominator`, or the neutral score when the population
/// bounds coincide.
fn scaled(numerator: f64, denominator: f64) -> f64 {
    if denominator.abs() < EPSILON {
        NEUTRAL_SCORE
    } else {
        numerator / denominator
    }
}

/// Number of distinct seasons in a history.
fn season_count(history: &[&RankedRecord]) -> usize {
    let mut years: Vec<u16> = history.iter().map(|r| r.year()).collect();
    years.sort_unstable();
    years.dedup();
    years.len()
}

fn median(values: &mut [f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

fn average_star_points(history: &[&RankedRecord], cfg: &DifficultyConfig) -> f64 {
    let seasons = season_count(history);
    if seasons == 0 {
        return 0.0;
    }
    let total: f64 = history
        .iter()
        .map(|r| cfg.star_points(r.ppr_rank_by_pos))
        .sum();
    total / seasons as f64
}

/// Score one player's history against the population bounds.
pub fn component_scores(
    history: &[&RankedRecord],
    pop: &PopulationStats,
    cfg: &DifficultyConfig,
) -> ComponentScores {
    // Performance: median positional rank, capped, rank 1 -> 0.0, cap -> 1.0.
    let cap = cfg.max_rank_cap as f64;
    let mut ranks: Vec<f64> = history.iter().map(|r| r.ppr_rank_by_pos as f64).collect();
    let capped = median(&mut ranks).min(cap);
    let performance = scaled(capped - 1.0, cap - 1.0);

    let seasons = season_count(history);
    let longevity = scaled(
        pop.max_seasons as f64 - seasons as f64,
        pop.max_seasons as f64 - pop.min_seasons as f64,
    );

    // Recency: last good season, else last season of any kind.
    let last_good = history
        .iter()
        .filter(|r| r.ppr_rank_by_pos <= cfg.good_season_rank_threshold)
        .map(|r| r.year())
        .max();
    let last_relevant = last_good
        .or_else(|| history.iter().map(|r| r.year()).max())
        .unwrap_or(pop.max_year);
    let recency = scaled(
        pop.max_year as f64 - last_relevant as f64,
        pop.max_year as f64 - pop.min_year as f64,
    );

    let star_points = average_star_points(history, cfg);
    let star_power = if pop.max_star_points.abs() < EPSILON {
        NEUTRAL_SCORE
    } else {
        1.0 - star_points / pop.max_star_points
    };

    ComponentScores {
        performance,
        longevity,
        recency,
        star_power,
        star_points,
    }
}

/// Weighted sum of the components times the position multiplier.
pub fn raw_score(scores: &ComponentScores, position: Position, cfg: &DifficultyConfig) -> f64 {
    let w = &cfg.weights;
    let weighted = w.performance * scores.performance
        + w.longevity * scores.longevity
        + w.recency * scores.recency
        + w.star_power * scores.star_power;
    weighted * cfg.multipliers.for_position(position)
}

/// Min-max rescale a raw score to `[1, 10]`, unrounded.
pub fn rescale(raw: f64, min_raw: f64, max_raw: f64) -> f64 {
    if (max_raw - min_raw).abs() < EPSILON {
        return NEUTRAL_RATING;
    }
    MIN_RATING + (MAX_RATING - MIN_RATING) * (raw - min_raw) / (max_raw - min_raw)
}

/// Round to one decimal place, halves to even.
fn round_one_decimal(v: f64) -> f64 {
    (v * 10.0).round_ties_even() / 10.0
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerDifficulty {
    pub player: String,
    pub position: Position,
    /// Final rating, one decimal place.
    pub rating: f64,
    /// Rating before rounding. `None` along with the scoring detail when
    /// the rating was read back from a cached table.
    pub unrounded: Option<f64>,
    pub raw_score: Option<f64>,
    pub components: Option<ComponentScores>,
}

/// Ratings for a scored population, keyed by player name.
#[derive(Debug, Clone, Default)]
pub struct DifficultyTable {
    players: HashMap<String, PlayerDifficulty>,
}

impl DifficultyTable {
    /// Rebuild a table from ratings already embedded in season rows. Rows
    /// without a rating are ignored.
    pub fn from_embedded(records: &[RankedRecord]) -> Self {
        let mut players = HashMap::new();
        for record in records {
            let Some(rating) = record.difficulty else {
                continue;
            };
            players
                .entry(record.player().to_string())
                .or_insert_with(|| PlayerDifficulty {
                    player: record.player().to_string(),
                    position: record.position(),
                    rating,
                    unrounded: None,
                    raw_score: None,
                    components: None,
                });
        }
        Self { players }
    }

    pub fn get(&self, player: &str) -> Option<&PlayerDifficulty> {
        self.players.get(player)
    }

    pub fn rating(&self, player: &str) -> Option<f64> {
        self.players.get(player).map(|p| p.rating)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Every player ordered easiest first (ties broken by name).
    pub fn ranked_easiest(&self) -> Vec<&PlayerDifficulty> {
        let mut all: Vec<&PlayerDifficulty> = self.players.values().collect();
        all.sort_by(|a, b| {
            a.rating
                .total_cmp(&b.rating)
                .then_with(|| a.player.cmp(&b.player))
        });
        all
    }

    /// Every player ordered hardest first (ties broken by name).
    pub fn ranked_hardest(&self) -> Vec<&PlayerDifficulty> {
        let mut all: Vec<&PlayerDifficulty> = self.players.values().collect();
        all.sort_by(|a, b| {
            b.rating
                .total_cmp(&a.rating)
                .then_with(|| a.player.cmp(&b.player))
        });
        all
    }
}

// ---------------------------------------------------------------------------
// Top-level entry point
// ---------------------------------------------------------------------------

/// Rate every player in `records`.
///
/// Steps:
/// 1. Group seasons by player.
/// 2. Collect population bounds.
/// 3. Score each player's components and weight them into a raw score.
/// 4. Min-max rescale raw scores to `[1, 10]` and round to one decimal.
pub fn score_population(records: &[RankedRecord], cfg: &DifficultyConfig) -> DifficultyTable {
    let groups = group_by_player(records);
    let Some(pop) = PopulationStats::collect(&groups, cfg) else {
        return DifficultyTable::default();
    };

    let scored: Vec<(&str, Position, ComponentScores, f64)> = groups
        .iter()
        .map(|(name, history)| {
            let position = history[0].position();
            let components = component_scores(history, &pop, cfg);
            let raw = raw_score(&components, position, cfg);
            (*name, position, components, raw)
        })
        .collect();

    let min_raw = scored.iter().map(|s| s.3).fold(f64::INFINITY, f64::min);
    let max_raw = scored.iter().map(|s| s.3).fold(f64::NEG_INFINITY, f64::max);

    let players: HashMap<String, PlayerDifficulty> = scored
        .into_iter()
        .map(|(name, position, components, raw)| {
            let unrounded = rescale(raw, min_raw, max_raw);
            (
                name.to_string(),
                PlayerDifficulty {
                    player: name.to_string(),
                    position,
                    rating: round_one_decimal(unrounded),
                    unrounded: Some(unrounded),
                    raw_score: Some(raw),
                    components: Some(components),
                },
            )
        })
        .collect();

    info!(
        "Rated {} players (seasons {}..={}, {}-{} seasons per player)",
        players.len(),
        pop.min_year,
        pop.max_year,
        pop.min_seasons,
        pop.max_seasons
    );

    DifficultyTable { players }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
