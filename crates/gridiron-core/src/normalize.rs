// Schema normalization: raw season tables into ranked, typed records.

use std::collections::HashSet;
use tracing::{debug, info, warn};

use crate::loader::{RawSeasonTable, PLAYER_COLUMN};
use crate::rank::dense_rank_grouped;
use crate::record::{Position, RankedRecord, SeasonRecord};
use crate::teams::team_info;

// Each logical field lists the headers it may arrive under. Source tables
// reuse `Yds`/`TD` for passing, rushing and receiving in that column order.
const TEAM: &[&str] = &["Tm", "Team"];
const POSITION: &[&str] = &["FantPos", "Pos"];
const GAMES: &[&str] = &["G"];
const PASS_YDS: &[&str] = &["PassYds", "Yds"];
const PASS_TD: &[&str] = &["PassTD", "TD"];
const RUSH_YDS: &[&str] = &["RushYds", "Yds.1"];
const RUSH_TD: &[&str] = &["RushTD", "TD.1"];
const RECEPTIONS: &[&str] = &["Rec"];
const REC_YDS: &[&str] = &["RecYds", "Yds.2"];
const REC_TD: &[&str] = &["RecTD", "TD.2"];
const PPR: &[&str] = &["PPR"];

/// Resolved column indices for one table.
struct Columns {
    player: Option<usize>,
    team: Option<usize>,
    position: Option<usize>,
    games: Option<usize>,
    pass_yds: Option<usize>,
    pass_td: Option<usize>,
    rush_yds: Option<usize>,
    rush_td: Option<usize>,
    receptions: Option<usize>,
    rec_yds: Option<usize>,
    rec_td: Option<usize>,
    ppr: Option<usize>,
}

impl Columns {
    fn resolve(table: &RawSeasonTable) -> Self {
        let find = |names: &[&str]| names.iter().find_map(|n| table.column(n));
        Self {
            player: table.column(PLAYER_COLUMN),
            team: find(TEAM),
            position: find(POSITION),
            games: find(GAMES),
            pass_yds: find(PASS_YDS),
            pass_td: find(PASS_TD),
            rush_yds: find(RUSH_YDS),
            rush_td: find(RUSH_TD),
            receptions: find(RECEPTIONS),
            rec_yds: find(REC_YDS),
            rec_td: find(REC_TD),
            ppr: find(PPR),
        }
    }
}

/// Coerce a count column: numeric text is truncated and clamped at zero,
/// anything unparsable becomes zero.
pub fn coerce_count(raw: &str) -> u32 {
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => v.trunc() as u32,
        _ => 0,
    }
}

/// Coerce the fantasy-points column; unparsable or non-finite becomes zero.
pub fn coerce_points(raw: &str) -> f64 {
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

/// Strip a trailing run of characters that are not word characters,
/// whitespace, or hyphens (roster markers such as `*+`), then trim.
pub fn clean_player_name(raw: &str) -> String {
    raw.trim()
        .trim_end_matches(|c: char| {
            !(c.is_alphanumeric() || c == '_' || c == '-' || c.is_whitespace())
        })
        .trim()
        .to_string()
}

/// Type, clean, and rank every row of the loaded seasons.
///
/// Fullbacks and rows without a recognizable position are dropped before
/// ranking. Within a season the first row for a player wins; later
/// duplicates are logged and dropped. Output keeps table order, then row
/// order.
pub fn normalize(tables: &[RawSeasonTable]) -> Vec<RankedRecord> {
    let mut seasons: Vec<SeasonRecord> = Vec::new();
    let mut dropped_positions = 0usize;

    for table in tables {
        let cols = Columns::resolve(table);
        let mut seen: HashSet<String> = HashSet::new();

        for row in &table.rows {
            let get = |idx: Option<usize>| RawSeasonTable::field(row, idx);

            let player = clean_player_name(get(cols.player));
            if player.is_empty() {
                continue;
            }
            let Some(position) = Position::from_str_pos(get(cols.position)) else {
                debug!(
                    "{}: dropping {} with position '{}'",
                    table.year,
                    player,
                    get(cols.position)
                );
                dropped_positions += 1;
                continue;
            };
            if !seen.insert(player.clone()) {
                warn!("{}: duplicate row for {}, keeping the first", table.year, player);
                continue;
            }

            let team = get(cols.team).trim().to_string();
            let (conference, division) = team_info(&team);
            seasons.push(SeasonRecord {
                player,
                team,
                year: table.year,
                position,
                games: coerce_count(get(cols.games)),
                pass_yds: coerce_count(get(cols.pass_yds)),
                pass_td: coerce_count(get(cols.pass_td)),
                rush_yds: coerce_count(get(cols.rush_yds)),
                rush_td: coerce_count(get(cols.rush_td)),
                receptions: coerce_count(get(cols.receptions)),
                rec_yds: coerce_count(get(cols.rec_yds)),
                rec_td: coerce_count(get(cols.rec_td)),
                ppr: coerce_points(get(cols.ppr)),
                conference,
                division,
            });
        }
    }

    if dropped_positions > 0 {
        info!("Dropped {} rows outside QB/RB/WR/TE", dropped_positions);
    }

    let ranked = rank_seasons(seasons);
    info!("Normalized {} player-seasons", ranked.len());
    ranked
}

/// Attach `ppr_rank` (per year) and `ppr_rank_by_pos` (per year and
/// position) to each season.
pub fn rank_seasons(seasons: Vec<SeasonRecord>) -> Vec<RankedRecord> {
    let ppr: Vec<f64> = seasons.iter().map(|s| s.ppr).collect();
    let by_year: Vec<u16> = seasons.iter().map(|s| s.year).collect();
    let by_year_pos: Vec<(u16, Position)> =
        seasons.iter().map(|s| (s.year, s.position)).collect();

    let year_ranks = dense_rank_grouped(&by_year, &ppr);
    let pos_ranks = dense_rank_grouped(&by_year_pos, &ppr);

    seasons
        .into_iter()
        .zip(year_ranks.into_iter().zip(pos_ranks))
        .map(|(season, (ppr_rank, ppr_rank_by_pos))| RankedRecord {
            season,
            ppr_rank,
            ppr_rank_by_pos,
            difficulty: None,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
