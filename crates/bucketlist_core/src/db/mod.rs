//! Settings database: where map preferences such as `map.hybrid_mode` live.
//!
//! # Responsibility
//! - Open `settings.sqlite3` next to the places file, or an in-memory
//!   stand-in when the file cannot be used.
//! - Bring the `settings` table up to the schema this build knows.
//!
//! # Invariants
//! - Schema version is tracked via `PRAGMA user_version`.
//! - A database written by a newer build is refused, never downgraded.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// The data directory holding the database could not be created.
    DataDir {
        path: PathBuf,
        source: std::io::Error,
    },
    /// `user_version` is ahead of the newest migration in this build.
    SchemaTooNew { found: u32, supported: u32 },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "settings database error: {err}"),
            Self::DataDir { path, source } => write!(
                f,
                "cannot create settings directory `{}`: {source}",
                path.display()
            ),
            Self::SchemaTooNew { found, supported } => write!(
                f,
                "settings schema version {found} is newer than supported {supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::DataDir { source, .. } => Some(source),
            Self::SchemaTooNew { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
