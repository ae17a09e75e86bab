// Per-game mutable state and its SQLite persistence.

use std::sync::{Mutex, MutexGuard};

use anyhow::{anyhow, Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use crate::game::{most_frequent_team, GameData, GameError};
use crate::record::{Conference, Division, Position};
use crate::teams::team_info;

// ---------------------------------------------------------------------------
// Session value object
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    InProgress,
    Won,
    Lost,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuessOutcome {
    Correct,
    Incorrect { remaining: u32 },
    OutOfGuesses,
}

/// Hints in the order they are revealed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Hint {
    Conference(Conference),
    Division(Division),
    Team(String),
}

const HINT_COUNT: u8 = 3;

/// One game in progress. Holds only what changes during play; the shared
/// tables stay in `GameData`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSession {
    pub secret: String,
    pub position: Position,
    pub guesses_remaining: u32,
    pub hints_revealed: u8,
    pub status: GameStatus,
    #[serde(default)]
    pub guesses: Vec<String>,
}

impl GameSession {
    /// Start a game for `secret`, which must be an eligible player.
    pub fn start(data: &GameData, secret: &str, max_guesses: u32) -> Result<Self, GameError> {
        let pool = data.eligible_pool();
        let canonical = pool.find_player(secret).ok_or_else(|| GameError::UnknownPlayer {
            name: secret.to_string(),
        })?;
        let position = pool
            .history(canonical)
            .first()
            .map(|r| r.position())
            .ok_or_else(|| GameError::UnknownPlayer {
                name: secret.to_string(),
            })?;

        Ok(Self {
            secret: canonical.to_string(),
            position,
            guesses_remaining: max_guesses,
            hints_revealed: 0,
            status: GameStatus::InProgress,
            guesses: Vec::new(),
        })
    }

    pub fn is_over(&self) -> bool {
        self.status != GameStatus::InProgress
    }

    /// Spend a guess. Names match case-insensitively.
    pub fn guess(&mut self, name: &str) -> Result<GuessOutcome, GameError> {
        if self.is_over() {
            return Err(GameError::GameOver);
        }
        let name = name.trim();
        self.guesses.push(name.to_string());

        if name.eq_ignore_ascii_case(&self.secret) {
            self.status = GameStatus::Won;
            return Ok(GuessOutcome::Correct);
        }

        self.guesses_remaining = self.guesses_remaining.saturating_sub(1);
        if self.guesses_remaining == 0 {
            self.status = GameStatus::Lost;
            Ok(GuessOutcome::OutOfGuesses)
        } else {
            Ok(GuessOutcome::Incorrect {
                remaining: self.guesses_remaining,
            })
        }
    }

    /// Reveal the next hint, or `None` once all are shown. Conference and
    /// division are those of the player's most frequent team.
    pub fn next_hint(&mut self, data: &GameData) -> Result<Option<Hint>, GameError> {
        if self.is_over() {
            return Err(GameError::GameOver);
        }
        if self.hints_revealed >= HINT_COUNT {
            return Ok(None);
        }

        let history = data.player_history(&self.secret);
        let team = most_frequent_team(&history).ok_or_else(|| GameError::UnknownPlayer {
            name: self.secret.clone(),
        })?;
        let (conference, division) = team_info(team);

        let hint = match self.hints_revealed {
            0 => Hint::Conference(conference),
            1 => Hint::Division(division),
            _ => Hint::Team(team.to_string()),
        };
        self.hints_revealed += 1;
        Ok(Some(hint))
    }
}

// ---------------------------------------------------------------------------
// SQLite store
// ---------------------------------------------------------------------------

/// SQLite-backed persistence for game sessions, keyed by session id.
pub struct SessionStore {
    conn: Mutex<Connection>,
}

impl SessionStore {
    /// Open (or create) a store at `path`. Pass `":memory:"` for an
    /// ephemeral database.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open session database at {path}"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )
        .context("failed to set database pragmas")?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS sessions (
                id         TEXT PRIMARY KEY,
                state      TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
            );
            ",
        )
        .context("failed to create session schema")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("session database mutex poisoned"))
    }

    /// Insert or overwrite the session stored under `id`.
    pub fn save(&self, id: &str, session: &GameSession) -> Result<()> {
        let conn = self.conn()?;
        let json = serde_json::to_string(session).context("failed to serialize session")?;
        conn.execute(
            "INSERT INTO sessions (id, state) VALUES (?1, ?2)
             ON CONFLICT(id) DO UPDATE SET
                state      = excluded.state,
                updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
            params![id, json],
        )
        .context("failed to save session")?;
        Ok(())
    }

    /// Load the session stored under `id`. Unknown ids fail with
    /// `GameError::GameNotStarted`.
    pub fn load(&self, id: &str) -> Result<GameSession> {
        let conn = self.conn()?;
        let json: Option<String> = conn
            .query_row(
                "SELECT state FROM sessions WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()
            .context("failed to query session")?;

        let json = json.ok_or_else(|| GameError::GameNotStarted {
            session_id: id.to_string(),
        })?;
        serde_json::from_str(&json).context("failed to deserialize session")
    }

    /// Remove a session. Returns whether one existed.
    pub fn delete(&self, id: &str) -> Result<bool> {
        let conn = self.conn()?;
        let n = conn
            .execute("DELETE FROM sessions WHERE id = ?1", params![id])
            .context("failed to delete session")?;
        Ok(n > 0)
    }

    /// New session id from the current UTC time, e.g.
    /// `game_20260228_143022_123`.
    pub fn generate_session_id() -> String {
        chrono::Utc::now().format("game_%Y%m%d_%H%M%S_%3f").to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
