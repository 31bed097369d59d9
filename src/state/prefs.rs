use rusqlite::{Connection, OptionalExtension, Result as SqlResult};
use std::fmt;
use std::path::PathBuf;

/// How votes are captured in the fullscreen review session.
///
/// Process-wide setting, independent of any single image. Persisted so it
/// survives restarts, and re-read on every fullscreen render so switching it
/// in the admin screen takes effect without reopening the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RatingMode {
    /// 1-5 star score
    #[default]
    Star,
    /// Binary yes/no judgment
    YesNo,
}

impl RatingMode {
    pub const ALL: [RatingMode; 2] = [RatingMode::Star, RatingMode::YesNo];

    fn as_key(self) -> &'static str {
        match self {
            RatingMode::Star => "star",
            RatingMode::YesNo => "yesno",
        }
    }

    fn from_key(key: &str) -> Self {
        match key {
            "yesno" => RatingMode::YesNo,
            _ => RatingMode::Star,
        }
    }
}

impl fmt::Display for RatingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RatingMode::Star => write!(f, "Stars (1-5)"),
            RatingMode::YesNo => write!(f, "Yes / No"),
        }
    }
}

/// Durable client-side preferences.
///
/// Stores the rater's display name and the rating mode in a small SQLite
/// key-value table under the user's data directory:
/// - Linux: ~/.local/share/family-rater/prefs.db
/// - macOS: ~/Library/Application Support/family-rater/prefs.db
/// - Windows: %APPDATA%\family-rater\prefs.db
pub struct Prefs {
    conn: Connection,
}

const KEY_RATER_NAME: &str = "rater_name";
const KEY_RATING_MODE: &str = "rating_type";

impl Prefs {
    /// Open (or create) the preferences database
    pub fn open() -> SqlResult<Self> {
        let db_path = Self::db_path();

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .expect("Failed to create application data directory");
        }

        let conn = Connection::open(&db_path)?;
        Self::from_connection(conn)
    }

    /// Build a store over an existing connection (also used by tests with an
    /// in-memory database)
    fn from_connection(conn: Connection) -> SqlResult<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS prefs (
                key     TEXT PRIMARY KEY,
                value   TEXT NOT NULL
            )",
            [],
        )?;
        Ok(Prefs { conn })
    }

    fn db_path() -> PathBuf {
        let mut path = dirs::data_dir()
            .or_else(dirs::home_dir)
            .expect("Could not determine user data directory");
        path.push("family-rater");
        path.push("prefs.db");
        path
    }

    /// The stored rater name, trimmed; empty string when never saved
    pub fn rater_name(&self) -> String {
        self.get(KEY_RATER_NAME)
            .map(|v| v.trim().to_string())
            .unwrap_or_default()
    }

    /// Persist the rater name (trimmed); no expiry
    pub fn set_rater_name(&self, name: &str) -> SqlResult<()> {
        self.set(KEY_RATER_NAME, name.trim())
    }

    pub fn rating_mode(&self) -> RatingMode {
        self.get(KEY_RATING_MODE)
            .map(|v| RatingMode::from_key(&v))
            .unwrap_or_default()
    }

    pub fn set_rating_mode(&self, mode: RatingMode) -> SqlResult<()> {
        self.set(KEY_RATING_MODE, mode.as_key())
    }

    fn get(&self, key: &str) -> Option<String> {
        self.conn
            .query_row("SELECT value FROM prefs WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()
            .ok()
            .flatten()
    }

    fn set(&self, key: &str, value: &str) -> SqlResult<()> {
        self.conn.execute(
            "INSERT INTO prefs (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            [key, value],
        )?;
        Ok(())
    }
}

impl fmt::Debug for Prefs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Prefs").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn in_memory() -> Prefs {
        Prefs::from_connection(Connection::open_in_memory().unwrap()).unwrap()
    }

    #[test]
    fn test_name_defaults_to_empty() {
        let prefs = in_memory();
        assert_eq!(prefs.rater_name(), "");
    }

    #[test]
    fn test_name_is_trimmed_on_save() {
        let prefs = in_memory();
        prefs.set_rater_name("  Alice  ").unwrap();
        assert_eq!(prefs.rater_name(), "Alice");
    }

    #[test]
    fn test_name_overwrite() {
        let prefs = in_memory();
        prefs.set_rater_name("Alice").unwrap();
        prefs.set_rater_name("Bob").unwrap();
        assert_eq!(prefs.rater_name(), "Bob");
    }

    #[test]
    fn test_rating_mode_defaults_to_star() {
        let prefs = in_memory();
        assert_eq!(prefs.rating_mode(), RatingMode::Star);
    }

    #[test]
    fn test_rating_mode_roundtrip() {
        let prefs = in_memory();
        prefs.set_rating_mode(RatingMode::YesNo).unwrap();
        assert_eq!(prefs.rating_mode(), RatingMode::YesNo);
        prefs.set_rating_mode(RatingMode::Star).unwrap();
        assert_eq!(prefs.rating_mode(), RatingMode::Star);
    }

    #[test]
    fn test_unknown_stored_mode_falls_back_to_star() {
        let prefs = in_memory();
        prefs.set(KEY_RATING_MODE, "thumbs").unwrap();
        assert_eq!(prefs.rating_mode(), RatingMode::Star);
    }
}
