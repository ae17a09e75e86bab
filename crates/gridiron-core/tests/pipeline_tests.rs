// Integration tests for the startup pipeline.
//
// Each test writes raw season fixtures into its own temp directory, runs the
// full build through the public API and checks what the game sees and what
// gets persisted.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::SeedableRng;

use gridiron_core::cache;
use gridiron_core::config::{self, Config, DataConfig, DifficultyScope};
use gridiron_core::game::{most_frequent_team, GameData, GameError};
use gridiron_core::pipeline::{build_with_rng, PipelineError};
use gridiron_core::record::Position;
use gridiron_core::session::{GameSession, GuessOutcome, SessionStore};

// ===========================================================================
// Test helpers
// ===========================================================================

const HEADER: &str = "Rk,Player,Tm,FantPos,G,Yds,TD,Att,Yds,TD,Rec,Yds,TD,PPR";

fn season_2012() -> String {
    format!(
        "{HEADER}
1,Alpha*,KAN,QB,16,4200,30,40,150,2,0,0,0,300.5
2,Bravo+,GNB,RB,16,0,0,280,1300,10,40,350,2,250.0
3,Charlie,NWE,WR,16,0,0,2,10,0,90,1200,8,200.0
4,Delta,KAN,TE,15,0,0,0,0,0,60,700,5,150.0
5,Fuller,DAL,FB,16,0,0,30,90,1,10,60,0,50.0
"
    )
}

fn season_2013() -> String {
    format!(
        "{HEADER}
1,Alpha,KAN,QB,16,4300,32,35,120,1,0,0,0,310.0
2,Bravo,GNB,RB,16,0,0,270,1250,9,35,300,1,240.0
3,Charlie,NWE,WR,14,0,0,0,0,0,85,1100,7,190.0
Rk,Player,Tm,FantPos,G,Yds,TD,Att,Yds,TD,Rec,Yds,TD,PPR
4,Echo,SFO,WR,12,0,0,0,0,0,40,500,3,100.0
"
    )
}

fn season_2014() -> String {
    format!(
        "{HEADER}
1,Alpha,KAN,QB,16,4000,28,30,100,1,0,0,0,280.0
2,Bravo,GNB,RB,13,0,0,230,1000,7,30,250,1,230.0
3,Echo,SFO,WR,16,0,0,0,0,0,70,900,6,120.0
4,Delta,KAN,TE,16,0,0,0,0,0,55,600,4,140.0
"
    )
}

fn season_2015() -> String {
    format!(
        "{HEADER}
1,Alpha,KAN,QB,16,3900,25,25,80,0,0,0,0,260.0
2,Echo,SFO,WR,16,0,0,0,0,0,80,1000,8,180.0
3,Charlie,NWE,WR,10,0,0,0,0,0,30,400,2,70.0
"
    )
}

/// Fresh fixture directory with four good seasons, one file missing its
/// player column and one configured season with no file at all.
fn fixture_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(name);
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();

    fs::write(dir.join("player_stats2011.csv"), "Name,Tm\nNobody,DAL\n").unwrap();
    fs::write(dir.join("player_stats2012.csv"), season_2012()).unwrap();
    fs::write(dir.join("player_stats2013.csv"), season_2013()).unwrap();
    fs::write(dir.join("player_stats2014.csv"), season_2014()).unwrap();
    fs::write(dir.join("player_stats2015.csv"), season_2015()).unwrap();
    dir
}

fn test_config(dir: &Path) -> Config {
    Config {
        data: DataConfig {
            first_season: 2011,
            last_season: 2016,
            ..DataConfig::rooted_at(dir)
        },
        ..Config::default()
    }
}

fn build(config: &Config, seed: u64) -> GameData {
    build_with_rng(config, &mut StdRng::seed_from_u64(seed)).unwrap()
}

fn remove_raw_seasons(dir: &Path) {
    for year in 2011..=2016 {
        let _ = fs::remove_file(dir.join(format!("player_stats{year}.csv")));
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// ===========================================================================
// Cold start
// ===========================================================================

#[test]
fn cold_start_builds_pool_and_persists_tables() {
    let dir = fixture_dir("gridiron_it_cold_start");
    let config = test_config(&dir);
    let data = build(&config, 1);

    let pool = data.eligible_pool();
    assert_eq!(
        pool.player_names(),
        &["Alpha", "Bravo", "Charlie", "Delta", "Echo"]
    );
    assert!(!pool.contains("Fuller"));

    // Legacy codes were rewritten and conference info attached.
    let bravo = data.player_history("Bravo");
    assert!(bravo.iter().all(|r| r.team() == "GB"));
    assert_eq!(bravo[0].season.conference.to_string(), "NFC");

    assert!(config.data.normalized_table.exists());
    assert!(config.data.daily_order.exists());
    assert_eq!(data.daily_order().len(), 5);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn positional_ranks_are_dense_within_each_season() {
    let dir = fixture_dir("gridiron_it_ranks");
    let data = build(&test_config(&dir), 1);

    let charlie = data.player_history("Charlie");
    let echo = data.player_history("Echo");
    // 2013: Charlie 190 > Echo 100. 2015: Echo 180 > Charlie 70.
    assert_eq!(charlie[1].year(), 2013);
    assert_eq!(charlie[1].ppr_rank_by_pos, 1);
    assert_eq!(echo[0].ppr_rank_by_pos, 2);
    assert_eq!(echo[2].ppr_rank_by_pos, 1);
    assert_eq!(charlie[2].ppr_rank_by_pos, 2);

    // Overall rank in 2012 ignores the dropped fullback.
    let alpha = data.player_history("Alpha");
    assert_eq!(alpha[0].ppr_rank, 1);
    let delta = data.player_history("Delta");
    assert_eq!(delta[0].ppr_rank, 4);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn ratings_span_full_range() {
    let dir = fixture_dir("gridiron_it_ratings");
    let data = build(&test_config(&dir), 1);

    let ratings = data.ratings();
    assert_eq!(ratings.len(), 5);
    assert_eq!(ratings.ranked_easiest()[0].rating, 1.0);
    assert_eq!(ratings.ranked_hardest()[0].rating, 10.0);
    for name in data.eligible_pool().player_names() {
        let r = data.difficulty(name).unwrap();
        assert!((1.0..=10.0).contains(&r), "{name}: {r}");
    }

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn no_loadable_seasons_is_fatal() {
    let dir = fixture_dir("gridiron_it_no_data");
    remove_raw_seasons(&dir);
    let err = build_with_rng(&test_config(&dir), &mut StdRng::seed_from_u64(1)).unwrap_err();
    assert!(matches!(err, PipelineError::NoSeasonData { .. }));

    let _ = fs::remove_dir_all(&dir);
}

// ===========================================================================
// Warm start / persistence
// ===========================================================================

#[test]
fn warm_start_reads_only_the_cache() {
    let dir = fixture_dir("gridiron_it_warm_start");
    let config = test_config(&dir);
    let cold = build(&config, 1);
    let cached_bytes = fs::read(&config.data.normalized_table).unwrap();

    remove_raw_seasons(&dir);
    let warm = build(&config, 2);

    assert_eq!(
        cold.eligible_pool().player_names(),
        warm.eligible_pool().player_names()
    );
    for name in cold.eligible_pool().player_names() {
        assert_eq!(cold.difficulty(name), warm.difficulty(name));
        assert_eq!(cold.player_history(name), warm.player_history(name));
    }
    assert_eq!(cold.daily_order(), warm.daily_order());
    assert_eq!(fs::read(&config.data.normalized_table).unwrap(), cached_bytes);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn rebuilding_from_raw_files_is_byte_identical() {
    let dir = fixture_dir("gridiron_it_idempotent");
    let config = test_config(&dir);
    build(&config, 1);
    let first = fs::read(&config.data.normalized_table).unwrap();

    fs::remove_file(&config.data.normalized_table).unwrap();
    build(&config, 1);
    let second = fs::read(&config.data.normalized_table).unwrap();
    assert_eq!(first, second);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn cache_without_ratings_is_rescored() {
    let dir = fixture_dir("gridiron_it_rescore");
    let config = test_config(&dir);
    let cold = build(&config, 1);

    let mut records = cache::read_table(&config.data.normalized_table).unwrap();
    for r in &mut records {
        r.difficulty = None;
    }
    cache::write_table(&config.data.normalized_table, &records).unwrap();

    let warm = build(&config, 1);
    for name in cold.eligible_pool().player_names() {
        assert_eq!(cold.difficulty(name), warm.difficulty(name));
    }

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn cache_missing_player_column_is_fatal() {
    let dir = fixture_dir("gridiron_it_bad_cache");
    let config = test_config(&dir);
    fs::write(&config.data.normalized_table, "Name,Tm,Year\nA,DAL,2015\n").unwrap();

    let err = build_with_rng(&config, &mut StdRng::seed_from_u64(1)).unwrap_err();
    assert!(matches!(err, PipelineError::MissingPlayerColumn { .. }));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn only_eligible_rows_carry_ratings_by_default() {
    let dir = fixture_dir("gridiron_it_scope");
    let mut config = test_config(&dir);
    // Only Echo debuts in or after 2013.
    config.eligibility.earliest_year = 2013;
    let data = build(&config, 1);

    assert_eq!(data.eligible_pool().player_names(), &["Echo"]);
    assert_eq!(data.difficulty("Echo"), Some(5.0));

    let cached = cache::read_table(&config.data.normalized_table).unwrap();
    for r in &cached {
        assert_eq!(r.difficulty.is_some(), r.player() == "Echo", "{}", r.player());
    }

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn all_scope_rates_the_full_table() {
    let dir = fixture_dir("gridiron_it_scope_all");
    let mut config = test_config(&dir);
    config.eligibility.earliest_year = 2013;
    config.difficulty.scope = DifficultyScope::All;
    let data = build(&config, 1);

    assert_eq!(data.ratings().len(), 5);
    let cached = cache::read_table(&config.data.normalized_table).unwrap();
    assert!(cached.iter().all(|r| r.difficulty.is_some()));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn all_scope_ratings_survive_warm_start() {
    let dir = fixture_dir("gridiron_it_scope_all_warm");
    let mut config = test_config(&dir);
    config.eligibility.earliest_year = 2013;
    config.difficulty.scope = DifficultyScope::All;
    let cold = build(&config, 1);

    remove_raw_seasons(&dir);
    let warm = build(&config, 1);

    assert_eq!(cold.ratings().len(), 5);
    assert_eq!(warm.ratings().len(), cold.ratings().len());
    let listing = |data: &GameData| -> Vec<(String, f64)> {
        data.ratings()
            .ranked_easiest()
            .iter()
            .map(|p| (p.player.clone(), p.rating))
            .collect()
    };
    assert_eq!(listing(&warm), listing(&cold));
    assert_eq!(warm.eligible_pool().player_names(), &["Echo"]);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn switching_to_all_scope_rescores_a_partially_rated_cache() {
    let dir = fixture_dir("gridiron_it_scope_switch");
    let mut config = test_config(&dir);
    config.eligibility.earliest_year = 2013;
    let eligible_only = build(&config, 1);
    assert_eq!(eligible_only.ratings().len(), 1);

    remove_raw_seasons(&dir);
    config.difficulty.scope = DifficultyScope::All;
    let warm = build(&config, 1);
    assert_eq!(warm.ratings().len(), 5);
    assert!(warm.difficulty("Echo").is_some());

    let _ = fs::remove_dir_all(&dir);
}

// ===========================================================================
// Daily challenge
// ===========================================================================

#[test]
fn daily_player_is_stable_across_restarts() {
    let dir = fixture_dir("gridiron_it_daily");
    let config = test_config(&dir);
    let first = build(&config, 11);
    let second = build(&config, 12345);

    let epoch = config.daily.epoch;
    let mut seen = Vec::new();
    for offset in 0..5 {
        let d = epoch + chrono::Duration::days(offset);
        let a = first.daily_player(d).unwrap();
        assert_eq!(a, second.daily_player(d).unwrap());
        assert_eq!(a, first.daily_player(d).unwrap());
        seen.push(a.to_string());
    }
    seen.sort();
    assert_eq!(seen, first.eligible_pool().player_names());

    // The cycle repeats after the full order.
    assert_eq!(
        first.daily_player(epoch).unwrap(),
        first.daily_player(epoch + chrono::Duration::days(5)).unwrap()
    );

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn daily_before_epoch_is_rejected() {
    let dir = fixture_dir("gridiron_it_daily_early");
    let data = build(&test_config(&dir), 1);
    assert!(matches!(
        data.daily_player(date(2020, 1, 1)),
        Err(GameError::ChallengeNotStarted { .. })
    ));

    let _ = fs::remove_dir_all(&dir);
}

// ===========================================================================
// Game API and sessions
// ===========================================================================

#[test]
fn suggestions_stay_within_position() {
    let dir = fixture_dir("gridiron_it_suggest");
    let data = build(&test_config(&dir), 1);

    assert_eq!(data.suggest_players(Position::WR, "h"), vec!["Charlie", "Echo"]);
    assert_eq!(data.suggest_players(Position::QB, "A"), vec!["Alpha"]);
    assert!(data.suggest_players(Position::TE, "alpha").is_empty());

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn most_frequent_team_from_built_history() {
    let dir = fixture_dir("gridiron_it_team");
    let data = build(&test_config(&dir), 1);
    assert_eq!(most_frequent_team(&data.player_history("Echo")), Some("SF"));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn session_survives_reopening_the_store() {
    let dir = fixture_dir("gridiron_it_session");
    let config = test_config(&dir);
    let data = build(&config, 1);
    let db_path = config.data.session_db.display().to_string();

    let secret = data.daily_player(config.daily.epoch).unwrap().to_string();
    {
        let store = SessionStore::open(&db_path).unwrap();
        let mut session = GameSession::start(&data, &secret, config.game.max_guesses).unwrap();
        let wrong = data
            .eligible_pool()
            .player_names()
            .iter()
            .find(|n| **n != secret)
            .unwrap()
            .clone();
        assert_eq!(
            session.guess(&wrong),
            Ok(GuessOutcome::Incorrect { remaining: 4 })
        );
        store.save("daily", &session).unwrap();
    }

    let store = SessionStore::open(&db_path).unwrap();
    let mut session = store.load("daily").unwrap();
    assert_eq!(session.guesses_remaining, 4);
    assert_eq!(session.guess(&secret.to_uppercase()), Ok(GuessOutcome::Correct));

    let _ = fs::remove_dir_all(&dir);
}

// ===========================================================================
// Shipped configuration
// ===========================================================================

#[test]
fn shipped_defaults_load_and_validate() {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("../..");
    let tmp = std::env::temp_dir().join("gridiron_it_defaults");
    let _ = fs::remove_dir_all(&tmp);
    fs::create_dir_all(tmp.join("defaults")).unwrap();
    fs::copy(
        root.join("defaults/game.toml"),
        tmp.join("defaults/game.toml"),
    )
    .unwrap();

    let installed = config::ensure_game_config(&tmp).unwrap();
    assert_eq!(installed, Some(tmp.join("config/game.toml")));
    let cfg = config::load_config_from(&tmp).unwrap();

    assert_eq!(cfg.game.max_guesses, 5);
    assert_eq!(cfg.daily.epoch, date(2025, 7, 1));
    assert_eq!(cfg.difficulty.star_points(1), 15.0);
    assert_eq!(cfg.difficulty.star_points(25), 0.0);
    assert_eq!(cfg.data.stats_dir, tmp.join("stats"));

    let _ = fs::remove_dir_all(&tmp);
}
