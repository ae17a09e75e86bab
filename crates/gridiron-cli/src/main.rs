// Gridiron entry point.
//
// Startup sequence:
// 1. Initialize tracing (stderr, so stdout stays clean for game output)
// 2. Copy default config if needed, load config
// 3. Build game tables (cached table if present, raw seasons otherwise)
// 4. Run the requested subcommand

use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::{bail, Context};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::info;

use gridiron_core::config;
use gridiron_core::game::{career_rows, most_frequent_team, stat_columns, GameData, GameError};
use gridiron_core::pipeline;
use gridiron_core::record::Position;
use gridiron_core::session::{GameSession, GuessOutcome, Hint, SessionStore};

#[derive(Parser)]
#[command(name = "gridiron")]
#[command(about = "Guess the NFL player from their fantasy career")]
#[command(version)]
struct Cli {
    /// Project directory holding `config/`, `defaults/` and the stats files
    #[arg(long, default_value = ".")]
    dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List players by difficulty rating
    Ratings {
        /// Number of players to show
        #[arg(long, default_value_t = 20)]
        limit: usize,

        /// Show the hardest players first
        #[arg(long)]
        hardest: bool,
    },

    /// Show a player's career stats
    Player { name: String },

    /// Show the daily challenge player
    Daily {
        /// Date to look up (defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Pick a random eligible player
    Random,

    /// Suggest player names for a partial query
    Suggest {
        #[arg(long, value_parser = parse_position)]
        position: Position,

        #[arg(long)]
        query: String,
    },

    /// Play a game in the terminal
    Play {
        /// Play today's daily challenge instead of a random player
        #[arg(long)]
        daily: bool,

        /// Session id to resume or create
        #[arg(long, default_value = "default")]
        session: String,

        /// Discard any stored session with this id first
        #[arg(long)]
        new: bool,
    },
}

fn parse_position(s: &str) -> Result<Position, String> {
    Position::from_str_pos(s).ok_or_else(|| format!("unknown position `{s}` (QB, RB, WR, TE)"))
}

fn main() -> anyhow::Result<()> {
    init_tracing()?;
    let cli = Cli::parse();

    if let Some(path) =
        config::ensure_game_config(&cli.dir).context("failed to initialize config")?
    {
        info!("Installed default config at {}", path.display());
    }
    let cfg = config::load_config_from(&cli.dir).context("failed to load configuration")?;
    info!(
        "Config loaded: seasons {}..={}, epoch {}",
        cfg.data.first_season, cfg.data.last_season, cfg.daily.epoch
    );

    let data = pipeline::build(&cfg).context("failed to build game data")?;
    info!("Game data ready: {} eligible players", data.eligible_pool().len());

    match cli.command {
        Commands::Ratings { limit, hardest } => print_ratings(&data, limit, hardest),
        Commands::Player { name } => print_player(&data, &name)?,
        Commands::Daily { date } => {
            let date = date.unwrap_or_else(today);
            let player = data.daily_player(date)?;
            println!("{date}: {player}");
        }
        Commands::Random => {
            let player = data.random_player(&mut rand::thread_rng())?;
            println!("{player}");
        }
        Commands::Suggest { position, query } => {
            for name in data.suggest_players(position, &query) {
                println!("{name}");
            }
        }
        Commands::Play {
            daily,
            session,
            new,
        } => {
            let store = SessionStore::open(&cfg.data.session_db.display().to_string())?;
            if new {
                store.delete(&session)?;
            }
            play(&data, &store, &session, daily, cfg.game.max_guesses)?;
        }
    }

    Ok(())
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

fn print_ratings(data: &GameData, limit: usize, hardest: bool) {
    let ratings = data.ratings();
    let listing = if hardest {
        ratings.ranked_hardest()
    } else {
        ratings.ranked_easiest()
    };
    for p in listing.into_iter().take(limit) {
        println!("{:>5.1}  {:<3} {}", p.rating, p.position.display_str(), p.player);
    }
}

fn print_player(data: &GameData, name: &str) -> anyhow::Result<()> {
    let Some(player) = data.eligible_pool().find_player(name) else {
        bail!("`{name}` is not an eligible player");
    };
    let history = data.player_history(player);
    let Some(first) = history.first() else {
        bail!("no seasons recorded for `{player}`");
    };

    let rating = data
        .difficulty(player)
        .map(|r| format!("{r:.1}"))
        .unwrap_or_else(|| "-".to_string());
    let team = most_frequent_team(&history).unwrap_or("-");
    println!("{player} ({}, mostly {team}) difficulty {rating}", first.position());

    println!("{}", stat_columns(first.position()).join("\t"));
    for row in career_rows(&history, first.position()) {
        println!("{}", row.join("\t"));
    }
    Ok(())
}

/// Interactive loop. Each input line is a guess, `hint`, `?<query>` for
/// suggestions, or `quit`. The session is saved after every action.
fn play(
    data: &GameData,
    store: &SessionStore,
    session_id: &str,
    daily: bool,
    max_guesses: u32,
) -> anyhow::Result<()> {
    let stored = match store.load(session_id) {
        Ok(s) => Some(s),
        Err(e) if e.downcast_ref::<GameError>().is_some() => None,
        Err(e) => return Err(e),
    };
    let mut session = match stored {
        Some(s) if !s.is_over() => {
            println!("Resuming game with {} guesses left.", s.guesses_remaining);
            s
        }
        _ => {
            let secret = if daily {
                data.daily_player(today())?
            } else {
                data.random_player(&mut rand::thread_rng())?
            };
            let s = GameSession::start(data, secret, max_guesses)?;
            store.save(session_id, &s)?;
            s
        }
    };

    println!(
        "Guess the {}. {} guesses. Type `hint`, `?name` for suggestions, or `quit`.",
        session.position, session.guesses_remaining
    );

    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next() else {
            break;
        };
        let line = line.context("failed to read input")?;
        let input = line.trim();

        if input.is_empty() {
            continue;
        }
        if input.eq_ignore_ascii_case("quit") {
            break;
        }
        if input.eq_ignore_ascii_case("hint") {
            match session.next_hint(data)? {
                Some(Hint::Conference(c)) => println!("Conference: {c}"),
                Some(Hint::Division(d)) => println!("Division: {d}"),
                Some(Hint::Team(t)) => println!("Most frequent team: {t}"),
                None => println!("No more hints."),
            }
            store.save(session_id, &session)?;
            continue;
        }
        if let Some(query) = input.strip_prefix('?') {
            for name in data.suggest_players(session.position, query) {
                println!("  {name}");
            }
            continue;
        }

        match session.guess(input)? {
            GuessOutcome::Correct => println!("Correct! It was {}.", session.secret),
            GuessOutcome::Incorrect { remaining } => println!("Nope. {remaining} left."),
            GuessOutcome::OutOfGuesses => println!("Out of guesses. It was {}.", session.secret),
        }
        store.save(session_id, &session)?;
        if session.is_over() {
            break;
        }
    }
    Ok(())
}

/// Initialize tracing to stderr.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("gridiron=info,warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
