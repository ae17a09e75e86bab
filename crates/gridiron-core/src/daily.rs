// Daily challenge order: a persisted permutation of eligible player names.

use chrono::NaiveDate;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

use crate::cache::CacheError;
use crate::eligibility::EligiblePool;
use crate::game::GameError;

#[derive(Debug, Serialize, Deserialize)]
struct OrderRow {
    #[serde(rename = "Player")]
    player: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DailyOrder {
    names: Vec<String>,
}

impl DailyOrder {
    pub fn from_names(names: Vec<String>) -> Self {
        Self { names }
    }

    /// A fresh order: eligible names sorted, then shuffled with `rng`.
    pub fn shuffled<R: Rng + ?Sized>(pool: &EligiblePool, rng: &mut R) -> Self {
        let mut names = pool.player_names().to_vec();
        names.sort();
        names.shuffle(rng);
        Self { names }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// `order[(date - epoch).days mod len]`.
    pub fn player_for(&self, date: NaiveDate, epoch: NaiveDate) -> Result<&str, GameError> {
        if self.names.is_empty() {
            return Err(GameError::NoEligiblePlayers);
        }
        let days = (date - epoch).num_days();
        if days < 0 {
            return Err(GameError::ChallengeNotStarted { date, epoch });
        }
        let idx = (days as u64 % self.names.len() as u64) as usize;
        Ok(&self.names[idx])
    }

    /// Load the order from `path`, verbatim.
    pub fn load(path: &Path) -> Result<Self, CacheError> {
        let csv_err = |source: csv::Error| CacheError::Csv {
            path: path.to_path_buf(),
            source,
        };
        let mut reader = csv::Reader::from_path(path).map_err(csv_err)?;
        let names = reader
            .deserialize::<OrderRow>()
            .map(|row| row.map(|r| r.player))
            .collect::<Result<Vec<_>, _>>()
            .map_err(csv_err)?;
        Ok(Self { names })
    }

    pub fn save(&self, path: &Path) -> Result<(), CacheError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| CacheError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        }
        let csv_err = |source: csv::Error| CacheError::Csv {
            path: path.to_path_buf(),
            source,
        };
        let mut writer = csv::Writer::from_path(path).map_err(csv_err)?;
        for name in &self.names {
            writer
                .serialize(OrderRow {
                    player: name.clone(),
                })
                .map_err(csv_err)?;
        }
        writer
            .flush()
            .map_err(|source| CacheError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(())
    }

    /// Load the persisted order, or create and persist one. An empty order
    /// is returned but never written.
    pub fn load_or_create<R: Rng + ?Sized>(
        path: &Path,
        pool: &EligiblePool,
        rng: &mut R,
    ) -> Result<Self, CacheError> {
        if path.exists() {
            let order = Self::load(path)?;
            info!("Loaded daily order of {} players from {}", order.len(), path.display());
            return Ok(order);
        }

        let order = Self::shuffled(pool, rng);
        if order.is_empty() {
            warn!("No eligible players; daily order not written");
            return Ok(order);
        }
        order.save(path)?;
        info!("Created daily order of {} players at {}", order.len(), path.display());
        Ok(order)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
