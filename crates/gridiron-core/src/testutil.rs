// Shared fixtures for unit tests.

use crate::record::{Position, RankedRecord, SeasonRecord};

/// A ranked season whose PPR is consistent with its positional rank.
pub(crate) fn ranked(player: &str, year: u16, position: Position, rank_by_pos: u32) -> RankedRecord {
    ranked_with_team(player, year, position, rank_by_pos, "DAL")
}

pub(crate) fn ranked_with_team(
    player: &str,
    year: u16,
    position: Position,
    rank_by_pos: u32,
    team: &str,
) -> RankedRecord {
    let (conference, division) = crate::teams::team_info(team);
    RankedRecord {
        season: SeasonRecord {
            player: player.to_string(),
            team: team.to_string(),
            year,
            position,
            games: 16,
            pass_yds: 0,
            pass_td: 0,
            rush_yds: 100,
            rush_td: 1,
            receptions: 20,
            rec_yds: 250,
            rec_td: 2,
            ppr: 500.0 - 10.0 * rank_by_pos as f64,
            conference,
            division,
        },
        ppr_rank: rank_by_pos,
        ppr_rank_by_pos: rank_by_pos,
        difficulty: None,
    }
}
