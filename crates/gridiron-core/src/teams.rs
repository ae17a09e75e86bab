// Static team tables: legacy code aliases and conference/division lookup.

use crate::record::{Conference, Division};

/// Legacy or alternate franchise codes and the code they collapse into.
const TEAM_ALIASES: &[(&str, &str)] = &[
    ("GNB", "GB"),
    ("LVR", "LV"),
    ("OAK", "LV"),
    ("NWE", "NE"),
    ("KAN", "KC"),
    ("NOR", "NO"),
    ("TAM", "TB"),
    ("SFO", "SF"),
    ("WSH", "WAS"),
];

/// 32 current teams, two legacy codes that can survive aliasing in older
/// data, and the "total" / "free agent" placeholders.
const TEAM_INFO: &[(&str, Conference, Division)] = &[
    ("ARI", Conference::NFC, Division::West),
    ("ATL", Conference::NFC, Division::South),
    ("BAL", Conference::AFC, Division::North),
    ("BUF", Conference::AFC, Division::East),
    ("CAR", Conference::NFC, Division::South),
    ("CHI", Conference::NFC, Division::North),
    ("CIN", Conference::AFC, Division::North),
    ("CLE", Conference::AFC, Division::North),
    ("DAL", Conference::NFC, Division::East),
    ("DEN", Conference::AFC, Division::West),
    ("DET", Conference::NFC, Division::North),
    ("GB", Conference::NFC, Division::North),
    ("HOU", Conference::AFC, Division::South),
    ("IND", Conference::AFC, Division::South),
    ("JAX", Conference::AFC, Division::South),
    ("KC", Conference::AFC, Division::West),
    ("LAC", Conference::AFC, Division::West),
    ("LAR", Conference::NFC, Division::West),
    ("LV", Conference::AFC, Division::West),
    ("MIA", Conference::AFC, Division::East),
    ("MIN", Conference::NFC, Division::North),
    ("NE", Conference::AFC, Division::East),
    ("NO", Conference::NFC, Division::South),
    ("NYG", Conference::NFC, Division::East),
    ("NYJ", Conference::AFC, Division::East),
    ("PHI", Conference::NFC, Division::East),
    ("PIT", Conference::AFC, Division::North),
    ("SF", Conference::NFC, Division::West),
    ("SEA", Conference::NFC, Division::West),
    ("TB", Conference::NFC, Division::South),
    ("TEN", Conference::AFC, Division::South),
    ("WAS", Conference::NFC, Division::East),
    ("OAK", Conference::AFC, Division::West),
    ("SDG", Conference::AFC, Division::West),
    ("TOT", Conference::NotApplicable, Division::NotApplicable),
    ("FA", Conference::NotApplicable, Division::NotApplicable),
];

/// Map a raw team code to its current franchise code. Unknown codes pass
/// through unchanged (trimmed).
pub fn normalize_team_code(code: &str) -> String {
    let code = code.trim();
    TEAM_ALIASES
        .iter()
        .find(|(legacy, _)| *legacy == code)
        .map_or_else(|| code.to_string(), |(_, current)| current.to_string())
}

/// Conference and division for a team code; `N/A` for both when unknown.
pub fn team_info(code: &str) -> (Conference, Division) {
    TEAM_INFO
        .iter()
        .find(|(team, _, _)| *team == code)
        .map_or((Conference::NotApplicable, Division::NotApplicable), |&(_, conf, div)| {
            (conf, div)
        })
}
