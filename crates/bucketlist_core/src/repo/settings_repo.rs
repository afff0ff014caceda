//! Key-value settings repository over SQLite.
//!
//! # Invariants
//! - One row per key; writes are upserts.
//! - Values are stored as text; typed decoding happens in callers.

use crate::db::DbError;
use rusqlite::{params, Connection, OptionalExtension};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type SettingsResult<T> = Result<T, SettingsError>;

#[derive(Debug)]
pub enum SettingsError {
    Db(DbError),
    InvalidKey(String),
}

impl Display for SettingsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidKey(key) => write!(f, "invalid settings key `{key}`"),
        }
    }
}

impl Error for SettingsError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidKey(_) => None,
        }
    }
}

impl From<DbError> for SettingsError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for SettingsError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Simple string settings store.
pub trait SettingsRepository {
    fn get_setting(&self, key: &str) -> SettingsResult<Option<String>>;
    fn set_setting(&self, key: &str, value: &str) -> SettingsResult<()>;
}

/// SQLite-backed settings repository owning its connection.
pub struct SqliteSettingsRepository {
    conn: Connection,
}

impl SqliteSettingsRepository {
    /// Wraps a connection returned by `open_db`/`open_db_in_memory`.
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }
}

impl SettingsRepository for SqliteSettingsRepository {
    fn get_setting(&self, key: &str) -> SettingsResult<Option<String>> {
        let key = validate_key(key)?;
        let value = self
            .conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set_setting(&self, key: &str, value: &str) -> SettingsResult<()> {
        let key = validate_key(key)?;
        self.conn.execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![key, value],
        )?;
        Ok(())
    }
}

fn validate_key(key: &str) -> SettingsResult<&str> {
    let trimmed = key.trim();
    if trimmed.is_empty() || trimmed.len() != key.len() {
        return Err(SettingsError::InvalidKey(key.to_string()));
    }
    Ok(trimmed)
}
