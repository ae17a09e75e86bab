// Configuration loading and parsing (game.toml).

use chrono::NaiveDate;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::record::Position;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    pub data: DataConfig,
    #[serde(default)]
    pub eligibility: EligibilityConfig,
    pub daily: DailyConfig,
    #[serde(default)]
    pub difficulty: DifficultyConfig,
    #[serde(default)]
    pub game: GameConfig,
}

// ---------------------------------------------------------------------------
// [data]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    /// Directory holding one `player_stats<year>.csv` per season.
    pub stats_dir: PathBuf,
    pub first_season: u16,
    pub last_season: u16,
    /// Persisted normalized table. When present it is the sole input.
    pub normalized_table: PathBuf,
    /// Persisted daily permutation of eligible player names.
    pub daily_order: PathBuf,
    pub session_db: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            stats_dir: PathBuf::from("stats"),
            first_season: 2010,
            last_season: 2024,
            normalized_table: PathBuf::from("stats/combined_stats.csv"),
            daily_order: PathBuf::from("stats/daily_order.csv"),
            session_db: PathBuf::from("gridiron.db"),
        }
    }
}

impl DataConfig {
    /// All data paths rooted under `dir`. Handy for tests and tooling that
    /// keep a dataset outside the working directory.
    pub fn rooted_at(dir: &Path) -> Self {
        Self {
            stats_dir: dir.to_path_buf(),
            normalized_table: dir.join("combined_stats.csv"),
            daily_order: dir.join("daily_order.csv"),
            session_db: dir.join("gridiron.db"),
            ..Self::default()
        }
    }

    /// Path of the raw stats file for one season.
    pub fn season_path(&self, year: u16) -> PathBuf {
        self.stats_dir.join(format!("player_stats{year}.csv"))
    }

    /// Rewrite relative paths so they resolve against `base_dir`.
    fn rebase(&mut self, base_dir: &Path) {
        for path in [
            &mut self.stats_dir,
            &mut self.normalized_table,
            &mut self.daily_order,
            &mut self.session_db,
        ] {
            if path.is_relative() {
                *path = base_dir.join(&*path);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// [eligibility]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct EligibilityConfig {
    /// Players whose first season predates this year are never eligible.
    pub earliest_year: u16,
    /// A "ranked" season is one with a positional rank at or above this.
    pub ranked_season_cutoff: u32,
    /// How many ranked seasons qualify a player.
    pub min_ranked_seasons: usize,
    /// A single season at or above this positional rank qualifies a player.
    pub star_season_cutoff: u32,
}

impl Default for EligibilityConfig {
    fn default() -> Self {
        Self {
            earliest_year: 2011,
            ranked_season_cutoff: 24,
            min_ranked_seasons: 2,
            star_season_cutoff: 12,
        }
    }
}

// ---------------------------------------------------------------------------
// [daily]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct DailyConfig {
    /// Day zero of the daily challenge.
    pub epoch: NaiveDate,
}

impl Default for DailyConfig {
    fn default() -> Self {
        Self {
            epoch: NaiveDate::from_ymd_opt(2025, 7, 1).unwrap_or(NaiveDate::MIN),
        }
    }
}

// ---------------------------------------------------------------------------
// [difficulty]
// ---------------------------------------------------------------------------

/// Which population the difficulty scorer runs over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyScope {
    #[default]
    Eligible,
    All,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DifficultyConfig {
    #[serde(default)]
    pub scope: DifficultyScope,
    pub max_rank_cap: u32,
    pub good_season_rank_threshold: u32,
    pub weights: DifficultyWeights,
    pub multipliers: PositionMultipliers,
    pub star_tiers: Vec<StarTier>,
}

impl Default for DifficultyConfig {
    fn default() -> Self {
        Self {
            scope: DifficultyScope::Eligible,
            max_rank_cap: 100,
            good_season_rank_threshold: 24,
            weights: DifficultyWeights::default(),
            multipliers: PositionMultipliers::default(),
            star_tiers: vec![
                StarTier::new(1, 1, 15.0),
                StarTier::new(2, 3, 10.0),
                StarTier::new(4, 12, 5.0),
                StarTier::new(13, 24, 2.0),
            ],
        }
    }
}

impl DifficultyConfig {
    /// Star points earned by one season at the given positional rank. Tiers
    /// are scanned in order and the first match wins.
    pub fn star_points(&self, rank: u32) -> f64 {
        self.star_tiers
            .iter()
            .find(|tier| tier.contains(rank))
            .map_or(0.0, |tier| tier.points)
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct DifficultyWeights {
    pub performance: f64,
    pub longevity: f64,
    pub recency: f64,
    pub star_power: f64,
}

impl Default for DifficultyWeights {
    fn default() -> Self {
        // Performance is computed but carries no weight in the current formula.
        Self {
            performance: 0.0,
            longevity: 0.15,
            recency: 0.30,
            star_power: 0.55,
        }
    }
}

/// Per-position multipliers. Field names use UPPERCASE to match the TOML
/// keys (QB, RB, ...).
#[derive(Debug, Clone, Copy, Deserialize)]
#[allow(non_snake_case)]
pub struct PositionMultipliers {
    pub QB: f64,
    pub RB: f64,
    pub WR: f64,
    pub TE: f64,
}

impl Default for PositionMultipliers {
    fn default() -> Self {
        Self {
            QB: 0.85,
            RB: 1.0,
            WR: 1.0,
            TE: 1.25,
        }
    }
}

impl PositionMultipliers {
    pub fn for_position(&self, position: Position) -> f64 {
        match position {
            Position::QB => self.QB,
            Position::RB => self.RB,
            Position::WR => self.WR,
            Position::TE => self.TE,
        }
    }
}

/// One band of the star-power table: ranks `min_rank..=max_rank` earn
/// `points` per season.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct StarTier {
    pub min_rank: u32,
    pub max_rank: u32,
    pub points: f64,
}

impl StarTier {
    pub fn new(min_rank: u32, max_rank: u32, points: f64) -> Self {
        Self {
            min_rank,
            max_rank,
            points,
        }
    }

    pub fn contains(&self, rank: u32) -> bool {
        (self.min_rank..=self.max_rank).contains(&rank)
    }
}

// ---------------------------------------------------------------------------
// [game]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct GameConfig {
    pub max_guesses: u32,
    pub suggestion_limit: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            max_guesses: 5,
            suggestion_limit: 10,
        }
    }
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/game.toml` relative to the
/// given `base_dir`. Relative data paths are resolved against `base_dir`.
///
/// This is the lower-level loading primitive that does not auto-copy defaults.
/// Prefer `load_config()` which handles default initialization automatically.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join("game.toml");
    let text = read_file(&path)?;
    let mut config: Config = toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        source: e,
    })?;
    config.data.rebase(base_dir);

    validate(&config)?;

    Ok(config)
}

/// Install `defaults/game.toml` as `config/game.toml` on first run.
///
/// Returns the installed path, or `None` when a `config/game.toml` already
/// exists (it is never overwritten). The defaults are parsed and validated
/// before anything is written, so a broken defaults file is reported rather
/// than installed.
pub fn ensure_game_config(base_dir: &Path) -> Result<Option<PathBuf>, ConfigError> {
    let target = base_dir.join("config").join("game.toml");
    if target.exists() {
        return Ok(None);
    }

    let source = base_dir.join("defaults").join("game.toml");
    if !source.exists() {
        return Err(ConfigError::DefaultsCopyError {
            message: format!(
                "no config/game.toml or defaults/game.toml under {}",
                base_dir.display()
            ),
        });
    }

    let text = read_file(&source)?;
    let mut defaults: Config = toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: source.clone(),
        source: e,
    })?;
    defaults.data.rebase(base_dir);
    validate(&defaults)?;

    if let Some(dir) = target.parent() {
        std::fs::create_dir_all(dir).map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to create {}: {e}", dir.display()),
        })?;
    }
    std::fs::write(&target, text).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to write {}: {e}", target.display()),
    })?;

    Ok(Some(target))
}

/// Convenience wrapper: loads config relative to the current working directory.
/// Installs the default game config first if none exists.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_game_config(&cwd)?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.into(),
        message: message.into(),
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

pub fn validate(config: &Config) -> Result<(), ConfigError> {
    let data = &config.data;
    if data.first_season > data.last_season {
        return Err(invalid(
            "data.first_season",
            format!(
                "must not be after data.last_season ({} > {})",
                data.first_season, data.last_season
            ),
        ));
    }

    let elig = &config.eligibility;
    let cutoffs: &[(&str, u32)] = &[
        ("eligibility.ranked_season_cutoff", elig.ranked_season_cutoff),
        ("eligibility.star_season_cutoff", elig.star_season_cutoff),
    ];
    for (name, val) in cutoffs {
        if *val == 0 {
            return Err(invalid(name, "must be > 0"));
        }
    }
    if elig.min_ranked_seasons == 0 {
        return Err(invalid("eligibility.min_ranked_seasons", "must be > 0"));
    }

    let diff = &config.difficulty;
    if diff.max_rank_cap < 2 {
        return Err(invalid(
            "difficulty.max_rank_cap",
            format!("must be at least 2, got {}", diff.max_rank_cap),
        ));
    }

    let w = &diff.weights;
    let weight_fields: &[(&str, f64)] = &[
        ("weights.performance", w.performance),
        ("weights.longevity", w.longevity),
        ("weights.recency", w.recency),
        ("weights.star_power", w.star_power),
    ];
    for (name, val) in weight_fields {
        if !val.is_finite() || *val < 0.0 {
            return Err(invalid(name, format!("must be >= 0, got {val}")));
        }
    }
    if weight_fields.iter().all(|(_, val)| *val == 0.0) {
        return Err(invalid("weights", "at least one weight must be > 0"));
    }

    let m = &diff.multipliers;
    let multiplier_fields: &[(&str, f64)] = &[
        ("multipliers.QB", m.QB),
        ("multipliers.RB", m.RB),
        ("multipliers.WR", m.WR),
        ("multipliers.TE", m.TE),
    ];
    for (name, val) in multiplier_fields {
        if !val.is_finite() || *val <= 0.0 {
            return Err(invalid(name, format!("must be > 0, got {val}")));
        }
    }

    if diff.star_tiers.is_empty() {
        return Err(invalid("difficulty.star_tiers", "must contain at least one tier"));
    }
    for (i, tier) in diff.star_tiers.iter().enumerate() {
        if tier.min_rank == 0 || tier.min_rank > tier.max_rank {
            return Err(invalid(
                &format!("difficulty.star_tiers[{i}]"),
                format!(
                    "rank range {}..={} is empty or starts at 0",
                    tier.min_rank, tier.max_rank
                ),
            ));
        }
        if !tier.points.is_finite() || tier.points < 0.0 {
            return Err(invalid(
                &format!("difficulty.star_tiers[{i}].points"),
                format!("must be >= 0, got {}", tier.points),
            ));
        }
    }

    if config.game.max_guesses == 0 {
        return Err(invalid("game.max_guesses", "must be > 0"));
    }
    if config.game.suggestion_limit == 0 {
        return Err(invalid("game.suggestion_limit", "must be > 0"));
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
