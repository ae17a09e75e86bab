// Startup pipeline: load, normalize, filter, score, sequence.
//
// A warm start reads the persisted normalized table instead of the raw
// season files. Either way the result is an immutable `GameData`.

use rand::Rng;
use thiserror::Error;
use tracing::info;

use crate::cache::{self, CacheError};
use crate::config::{Config, DifficultyScope};
use crate::daily::DailyOrder;
use crate::difficulty::{score_population, DifficultyTable};
use crate::eligibility::EligiblePool;
use crate::game::GameData;
use crate::loader::load_seasons;
use crate::normalize::normalize;
use crate::record::RankedRecord;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no season files could be loaded from {dir}")]
    NoSeasonData { dir: String },

    #[error("normalized table {path} has no `{column}` column")]
    MissingPlayerColumn { path: String, column: &'static str },

    #[error(transparent)]
    Cache(CacheError),
}

impl From<CacheError> for PipelineError {
    fn from(e: CacheError) -> Self {
        match e {
            CacheError::MissingColumn { path, column } => PipelineError::MissingPlayerColumn {
                path: path.display().to_string(),
                column,
            },
            other => PipelineError::Cache(other),
        }
    }
}

/// Build the game tables using the thread-local RNG for a fresh daily order.
pub fn build(config: &Config) -> Result<GameData, PipelineError> {
    build_with_rng(config, &mut rand::thread_rng())
}

/// Build the game tables. `rng` is only used when no daily order has been
/// persisted yet.
pub fn build_with_rng<R: Rng + ?Sized>(
    config: &Config,
    rng: &mut R,
) -> Result<GameData, PipelineError> {
    let data = &config.data;

    let (pool, ratings) = if data.normalized_table.exists() {
        info!("Using cached table {}", data.normalized_table.display());
        warm_start(config, cache::read_table(&data.normalized_table)?)
    } else {
        cold_start(config)?
    };

    let daily = DailyOrder::load_or_create(&data.daily_order, &pool, rng)?;

    Ok(GameData::new(
        pool,
        ratings,
        daily,
        config.daily.epoch,
        config.game.suggestion_limit,
    ))
}

/// Rebuild from raw season files and persist the normalized table.
fn cold_start(config: &Config) -> Result<(EligiblePool, DifficultyTable), PipelineError> {
    let tables = load_seasons(&config.data);
    if tables.is_empty() {
        return Err(PipelineError::NoSeasonData {
            dir: config.data.stats_dir.display().to_string(),
        });
    }

    let mut records = normalize(&tables);
    let mut pool = EligiblePool::build(&records, &config.eligibility);
    let ratings = match config.difficulty.scope {
        DifficultyScope::Eligible => score_population(pool.records(), &config.difficulty),
        DifficultyScope::All => score_population(&records, &config.difficulty),
    };

    pool.merge_difficulty(&ratings);
    embed_difficulty(&mut records, &pool, &ratings, config.difficulty.scope);
    cache::write_table(&config.data.normalized_table, &records)?;

    Ok((pool, ratings))
}

/// Use a previously persisted table. Embedded ratings are reused when every
/// row in the scored population has one, so the rebuilt table covers the
/// same players as a cold start.
fn warm_start(config: &Config, records: Vec<RankedRecord>) -> (EligiblePool, DifficultyTable) {
    let mut pool = EligiblePool::build(&records, &config.eligibility);
    let reusable = match config.difficulty.scope {
        DifficultyScope::Eligible => pool.has_difficulty(),
        DifficultyScope::All => {
            !records.is_empty() && records.iter().all(|r| r.difficulty.is_some())
        }
    };
    if reusable {
        info!("Reusing embedded difficulty ratings");
        let ratings = match config.difficulty.scope {
            DifficultyScope::Eligible => DifficultyTable::from_embedded(pool.records()),
            DifficultyScope::All => DifficultyTable::from_embedded(&records),
        };
        return (pool, ratings);
    }

    info!("Cached table lacks ratings; scoring");
    let ratings = match config.difficulty.scope {
        DifficultyScope::Eligible => score_population(pool.records(), &config.difficulty),
        DifficultyScope::All => score_population(&records, &config.difficulty),
    };
    pool.merge_difficulty(&ratings);
    (pool, ratings)
}

/// Copy ratings onto the full table. With the eligible scope only pool
/// members carry a rating; everyone else is left blank.
fn embed_difficulty(
    records: &mut [RankedRecord],
    pool: &EligiblePool,
    ratings: &DifficultyTable,
    scope: DifficultyScope,
) {
    for record in records.iter_mut() {
        let in_scope = match scope {
            DifficultyScope::Eligible => pool.contains(record.player()),
            DifficultyScope::All => true,
        };
        record.difficulty = if in_scope {
            ratings.rating(record.player())
        } else {
            None
        };
    }
}
