// Raw season loading.
//
// Reads one `player_stats<year>.csv` per season into an untyped table,
// disambiguates repeated headers by position, rewrites legacy team codes,
// and tags each table with its year. Typing happens in `normalize`.

use csv::StringRecord;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::config::DataConfig;
use crate::teams::normalize_team_code;

pub const PLAYER_COLUMN: &str = "Player";
const TEAM_COLUMNS: &[&str] = &["Tm", "Team"];

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// One season file, untyped. Headers are unique: the n-th repeat of a name
/// gets a `.n` suffix (`Yds`, `Yds.1`, `Yds.2`).
#[derive(Debug, Clone)]
pub struct RawSeasonTable {
    pub year: u16,
    pub headers: Vec<String>,
    pub rows: Vec<StringRecord>,
}

impl RawSeasonTable {
    /// Index of a column by (deduplicated) header name.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Field of `row` at `idx`, or `""` when the column is absent.
    pub fn field<'r>(row: &'r StringRecord, idx: Option<usize>) -> &'r str {
        idx.and_then(|i| row.get(i)).unwrap_or("")
    }
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("{path} has no `{column}` column")]
    MissingColumn { path: String, column: &'static str },
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Suffix repeated header names with their occurrence index.
pub(crate) fn dedupe_headers(raw: &StringRecord) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    raw.iter()
        .map(|h| {
            let name = h.trim().to_string();
            let count = seen.entry(name.clone()).or_insert(0);
            let unique = if *count == 0 {
                name
            } else {
                format!("{name}.{count}")
            };
            *count += 1;
            unique
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Reader-based loader (private, enables testing without temp files)
// ---------------------------------------------------------------------------

enum ReadFailure {
    Csv(csv::Error),
    MissingPlayer,
}

fn load_season_from_reader<R: Read>(rdr: R, year: u16) -> Result<RawSeasonTable, ReadFailure> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(rdr);
    let headers = dedupe_headers(reader.headers().map_err(ReadFailure::Csv)?);

    let Some(player_idx) = headers.iter().position(|h| h == PLAYER_COLUMN) else {
        return Err(ReadFailure::MissingPlayer);
    };
    let team_idx = headers
        .iter()
        .position(|h| TEAM_COLUMNS.contains(&h.as_str()));

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                warn!("{year}: skipping malformed row: {}", e);
                continue;
            }
        };

        let player = record.get(player_idx).unwrap_or("").trim();
        // Blank lines and header rows repeated mid-file carry no player.
        if player.is_empty() || player == PLAYER_COLUMN {
            continue;
        }

        let record = match team_idx {
            Some(t) => record
                .iter()
                .enumerate()
                .map(|(i, f)| if i == t { normalize_team_code(f) } else { f.to_string() })
                .collect::<StringRecord>(),
            None => record,
        };
        rows.push(record);
    }

    Ok(RawSeasonTable {
        year,
        headers,
        rows,
    })
}

// ---------------------------------------------------------------------------
// Public path-based loaders
// ---------------------------------------------------------------------------

/// Load a single season file.
pub fn load_season(path: &Path, year: u16) -> Result<RawSeasonTable, LoadError> {
    let file = std::fs::File::open(path).map_err(|e| LoadError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    load_season_from_reader(file, year).map_err(|failure| match failure {
        ReadFailure::Csv(source) => LoadError::Csv {
            path: path.display().to_string(),
            source,
        },
        ReadFailure::MissingPlayer => LoadError::MissingColumn {
            path: path.display().to_string(),
            column: PLAYER_COLUMN,
        },
    })
}

/// Load every configured season, oldest first. Files that are absent,
/// unreadable, or lack a player column are skipped. An empty result is the
/// caller's to treat as fatal.
pub fn load_seasons(data: &DataConfig) -> Vec<RawSeasonTable> {
    let mut tables = Vec::new();
    for year in data.first_season..=data.last_season {
        let path = data.season_path(year);
        if !path.exists() {
            debug!("no stats file for {year} at {}", path.display());
            continue;
        }
        match load_season(&path, year) {
            Ok(table) => {
                debug!("loaded {} rows for {year}", table.rows.len());
                tables.push(table);
            }
            Err(e) => warn!("skipping season {year}: {}", e),
        }
    }
    info!(
        "Loaded {} season files ({} rows)",
        tables.len(),
        tables.iter().map(|t| t.rows.len()).sum::<usize>()
    );
    tables
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn load(csv_data: &str, year: u16) -> RawSeasonTable {
        match load_season_from_reader(csv_data.as_bytes(), year) {
            Ok(table) => table,
            Err(_) => panic!("expected table to load"),
        }
    }

    #[test]
    fn repeated_headers_get_positional_suffixes() {
        let csv_data = "\
Rk,Player,Tm,FantPos,G,Yds,TD,Att,Yds,TD,Rec,Yds,TD,TD,PPR
1,Josh Allen,BUF,QB,17,4306,29,102,523,15,0,0,0,15,392.8";

        let table = load(csv_data, 2023);
        assert_eq!(
            table.headers,
            vec![
                "Rk", "Player", "Tm", "FantPos", "G", "Yds", "TD", "Att", "Yds.1", "TD.1",
                "Rec", "Yds.2", "TD.2", "TD.3", "PPR"
            ]
        );
        assert_eq!(table.year, 2023);
        assert_eq!(table.rows.len(), 1);
        let rush = table.column("Yds.1");
        assert_eq!(RawSeasonTable::field(&table.rows[0], rush), "523");
    }

    #[test]
    fn team_aliases_applied_on_load() {
        let csv_data = "\
Player,Tm,FantPos,PPR
Davante Adams,OAK,WR,200.1
Aaron Jones,GNB,RB,180.0
Travis Kelce,KC,TE,250.0";

        let table = load(csv_data, 2019);
        let tm = table.column("Tm");
        let teams: Vec<&str> = table
            .rows
            .iter()
            .map(|r| RawSeasonTable::field(r, tm))
            .collect();
        assert_eq!(teams, vec!["LV", "GB", "KC"]);
    }

    #[test]
    fn team_header_alias_is_recognized() {
        let csv_data = "\
Player,Team,FantPos,PPR
Derek Carr,LVR,QB,220.0";

        let table = load(csv_data, 2021);
        assert_eq!(RawSeasonTable::field(&table.rows[0], table.column("Team")), "LV");
    }

    #[test]
    fn row_order_preserved_and_blank_players_skipped() {
        let csv_data = "\
Player,Tm,FantPos,PPR
B Player,DAL,WR,10
,DAL,WR,5
Player,Tm,FantPos,PPR
A Player,DAL,WR,20";

        let table = load(csv_data, 2015);
        let names: Vec<&str> = table
            .rows
            .iter()
            .map(|r| RawSeasonTable::field(r, table.column(PLAYER_COLUMN)))
            .collect();
        assert_eq!(names, vec!["B Player", "A Player"]);
    }

    #[test]
    fn missing_player_column_is_rejected() {
        let csv_data = "\
Name,Tm,FantPos,PPR
Someone,DAL,WR,10";

        assert!(matches!(
            load_season_from_reader(csv_data.as_bytes(), 2015),
            Err(ReadFailure::MissingPlayer)
        ));
    }

    #[test]
    fn missing_field_reads_as_empty() {
        let csv_data = "\
Player,Tm,FantPos,PPR
Short Row,DAL";

        let table = load(csv_data, 2015);
        assert_eq!(RawSeasonTable::field(&table.rows[0], table.column("PPR")), "");
        assert_eq!(RawSeasonTable::field(&table.rows[0], None), "");
    }

    #[test]
    fn load_seasons_skips_missing_and_broken_files() {
        let tmp = std::env::temp_dir().join("gridiron_loader_skips");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&tmp).unwrap();

        fs::write(tmp.join("player_stats2012.csv"), "Player,Tm,FantPos,PPR\nA,DAL,WR,1\n").unwrap();
        // No player column: skipped.
        fs::write(tmp.join("player_stats2013.csv"), "Name,Tm\nB,DAL\n").unwrap();
        fs::write(tmp.join("player_stats2014.csv"), "Player,Tm,FantPos,PPR\nC,NYG,RB,2\n").unwrap();

        let data = DataConfig {
            first_season: 2011,
            last_season: 2015,
            ..DataConfig::rooted_at(&tmp)
        };
        let tables = load_seasons(&data);
        let years: Vec<u16> = tables.iter().map(|t| t.year).collect();
        assert_eq!(years, vec![2012, 2014]);

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn load_seasons_skips_unreadable_files() {
        let tmp = std::env::temp_dir().join("gridiron_loader_unreadable");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&tmp).unwrap();

        fs::write(tmp.join("player_stats2012.csv"), "Player,Tm,FantPos,PPR\nA,DAL,WR,1\n").unwrap();
        // A directory where the file should be.
        fs::create_dir_all(tmp.join("player_stats2013.csv")).unwrap();
        fs::write(tmp.join("player_stats2014.csv"), "Player,Tm,FantPos,PPR\nC,NYG,RB,2\n").unwrap();
        // Header is not UTF-8.
        fs::write(tmp.join("player_stats2015.csv"), b"Pla\xffyer,Tm\nD,DAL\n").unwrap();
        fs::write(tmp.join("player_stats2016.csv"), "Player,Tm,FantPos,PPR\nE,KC,TE,3\n").unwrap();

        let data = DataConfig {
            first_season: 2012,
            last_season: 2016,
            ..DataConfig::rooted_at(&tmp)
        };
        let years: Vec<u16> = load_seasons(&data).iter().map(|t| t.year).collect();
        assert_eq!(years, vec![2012, 2014, 2016]);

        assert!(matches!(
            load_season(&tmp.join("player_stats2015.csv"), 2015),
            Err(LoadError::Csv { .. })
        ));

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn row_with_invalid_utf8_is_skipped() {
        let bytes: &[u8] = b"Player,Tm,FantPos,PPR\nA,DAL,WR,1\nB\xff,DAL,WR,2\nC,NYG,RB,3\n";
        let table = match load_season_from_reader(bytes, 2018) {
            Ok(table) => table,
            Err(_) => panic!("expected table to load"),
        };
        let names: Vec<&str> = table
            .rows
            .iter()
            .map(|r| RawSeasonTable::field(r, table.column(PLAYER_COLUMN)))
            .collect();
        assert_eq!(names, vec!["A", "C"]);
    }

    #[test]
    fn load_season_reports_missing_file() {
        let err = load_season(Path::new("/nonexistent/player_stats2000.csv"), 2000).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }
}
