//! Storage location resolution.
//!
//! # Invariants
//! - The data directory is absolute once resolved.
//! - The places file and settings database always live in the same directory.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "BUCKETLIST_DATA_DIR";
/// File name of the JSON place list.
pub const PLACES_FILE_NAME: &str = "SavedPlaces";
/// File name of the SQLite settings database.
pub const SETTINGS_DB_FILE_NAME: &str = "settings.sqlite3";

const DEFAULT_DATA_DIR_NAME: &str = "bucketlist";

/// Serializes tests that mutate process environment variables.
#[cfg(test)]
pub(crate) static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    EmptyDataDir,
    RelativeDataDir(PathBuf),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyDataDir => write!(f, "data directory cannot be empty"),
            Self::RelativeDataDir(path) => write!(
                f,
                "data directory must be an absolute path, got `{}`",
                path.display()
            ),
        }
    }
}

impl Error for ConfigError {}

/// Where the application keeps its private files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    data_dir: PathBuf,
}

impl StorageConfig {
    /// Uses `data_dir` as given.
    pub fn new(data_dir: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let data_dir = data_dir.into();
        if data_dir.as_os_str().is_empty() {
            return Err(ConfigError::EmptyDataDir);
        }
        if !data_dir.is_absolute() {
            return Err(ConfigError::RelativeDataDir(data_dir));
        }
        Ok(Self { data_dir })
    }

    /// Resolves from `explicit`, then `BUCKETLIST_DATA_DIR`, then the temp dir.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::new(path);
        }
        if let Ok(raw) = std::env::var(DATA_DIR_ENV) {
            let trimmed = raw.trim();
            if !trimmed.is_empty() {
                return Self::new(trimmed);
            }
        }
        Self::new(std::env::temp_dir().join(DEFAULT_DATA_DIR_NAME))
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn places_path(&self) -> PathBuf {
        self.data_dir.join(PLACES_FILE_NAME)
    }

    pub fn settings_db_path(&self) -> PathBuf {
        self.data_dir.join(SETTINGS_DB_FILE_NAME)
    }
}
