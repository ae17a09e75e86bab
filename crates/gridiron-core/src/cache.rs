// Persisted normalized table.
//
// One flat CSV row per player-season, carrying everything the eligibility
// filter and scorer need so a warm start never touches the raw files.

use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::loader::PLAYER_COLUMN;
use crate::record::{Conference, Division, Position, RankedRecord, SeasonRecord};

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: PathBuf, source: csv::Error },

    #[error("{path} has no `{column}` column")]
    MissingColumn { path: PathBuf, column: &'static str },
}

/// On-disk row layout. Field order is column order.
#[derive(Debug, Serialize, Deserialize)]
struct CacheRow {
    #[serde(rename = "Player")]
    player: String,
    #[serde(rename = "Tm")]
    team: String,
    #[serde(rename = "Year")]
    year: u16,
    #[serde(rename = "FantPos")]
    position: Position,
    #[serde(rename = "G")]
    games: u32,
    #[serde(rename = "PassYds")]
    pass_yds: u32,
    #[serde(rename = "PassTD")]
    pass_td: u32,
    #[serde(rename = "RushYds")]
    rush_yds: u32,
    #[serde(rename = "RushTD")]
    rush_td: u32,
    #[serde(rename = "Rec")]
    receptions: u32,
    #[serde(rename = "RecYds")]
    rec_yds: u32,
    #[serde(rename = "RecTD")]
    rec_td: u32,
    #[serde(rename = "PPR")]
    ppr: f64,
    #[serde(rename = "Conference")]
    conference: Conference,
    #[serde(rename = "Division")]
    division: Division,
    #[serde(rename = "PPR_Rank")]
    ppr_rank: u32,
    #[serde(rename = "PPR_Rank_by_Pos")]
    ppr_rank_by_pos: u32,
    #[serde(rename = "Difficulty")]
    difficulty: Option<f64>,
}

impl From<&RankedRecord> for CacheRow {
    fn from(r: &RankedRecord) -> Self {
        let s = &r.season;
        Self {
            player: s.player.clone(),
            team: s.team.clone(),
            year: s.year,
            position: s.position,
            games: s.games,
            pass_yds: s.pass_yds,
            pass_td: s.pass_td,
            rush_yds: s.rush_yds,
            rush_td: s.rush_td,
            receptions: s.receptions,
            rec_yds: s.rec_yds,
            rec_td: s.rec_td,
            ppr: s.ppr,
            conference: s.conference,
            division: s.division,
            ppr_rank: r.ppr_rank,
            ppr_rank_by_pos: r.ppr_rank_by_pos,
            difficulty: r.difficulty,
        }
    }
}

impl From<CacheRow> for RankedRecord {
    fn from(row: CacheRow) -> Self {
        RankedRecord {
            season: SeasonRecord {
                player: row.player,
                team: row.team,
                year: row.year,
                position: row.position,
                games: row.games,
                pass_yds: row.pass_yds,
                pass_td: row.pass_td,
                rush_yds: row.rush_yds,
                rush_td: row.rush_td,
                receptions: row.receptions,
                rec_yds: row.rec_yds,
                rec_td: row.rec_td,
                ppr: row.ppr,
                conference: row.conference,
                division: row.division,
            },
            ppr_rank: row.ppr_rank,
            ppr_rank_by_pos: row.ppr_rank_by_pos,
            difficulty: row.difficulty,
        }
    }
}

fn io_error(path: &Path, source: std::io::Error) -> CacheError {
    CacheError::Io {
        path: path.to_path_buf(),
        source,
    }
}

// ---------------------------------------------------------------------------
// Reader/writer-based (private)
// ---------------------------------------------------------------------------

fn write_rows<W: Write>(w: W, records: &[RankedRecord]) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(w);
    for record in records {
        writer.serialize(CacheRow::from(record))?;
    }
    writer.flush()?;
    Ok(())
}

enum ReadFailure {
    Csv(csv::Error),
    MissingPlayer,
}

fn read_rows<R: Read>(r: R) -> Result<Vec<RankedRecord>, ReadFailure> {
    let mut reader = csv::Reader::from_reader(r);
    let headers = reader.headers().map_err(ReadFailure::Csv)?;
    if !headers.iter().any(|h| h == PLAYER_COLUMN) {
        return Err(ReadFailure::MissingPlayer);
    }
    reader
        .deserialize::<CacheRow>()
        .map(|row| row.map(RankedRecord::from).map_err(ReadFailure::Csv))
        .collect()
}

// ---------------------------------------------------------------------------
// Public path-based API
// ---------------------------------------------------------------------------

/// Write the normalized table, creating parent directories as needed.
pub fn write_table(path: &Path, records: &[RankedRecord]) -> Result<(), CacheError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| io_error(path, e))?;
    }
    let file = std::fs::File::create(path).map_err(|e| io_error(path, e))?;
    write_rows(file, records).map_err(|source| CacheError::Csv {
        path: path.to_path_buf(),
        source,
    })?;
    info!("Wrote {} rows to {}", records.len(), path.display());
    Ok(())
}

/// Read a previously written normalized table.
pub fn read_table(path: &Path) -> Result<Vec<RankedRecord>, CacheError> {
    let file = std::fs::File::open(path).map_err(|e| io_error(path, e))?;
    let records = read_rows(file).map_err(|failure| match failure {
        ReadFailure::Csv(source) => CacheError::Csv {
            path: path.to_path_buf(),
            source,
        },
        ReadFailure::MissingPlayer => CacheError::MissingColumn {
            path: path.to_path_buf(),
            column: PLAYER_COLUMN,
        },
    })?;
    info!("Read {} cached rows from {}", records.len(), path.display());
    Ok(records)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
