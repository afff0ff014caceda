//! Place repository contract and JSON file implementation.
//!
//! # Responsibility
//! - Read and write the full place sequence as one JSON array.
//! - Keep file layout and write mechanics inside the persistence boundary.
//!
//! # Invariants
//! - Writes replace the file atomically: readers see the old or the new
//!   array, never a truncated one.
//! - On Unix the file is only readable and writable by its owner.
//! - Reads return the persisted order unchanged.

use crate::model::place::Place;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tempfile::NamedTempFile;

pub type PersistResult<T> = Result<T, PersistError>;

/// Persistence failures for the place file.
#[derive(Debug)]
pub enum PersistError {
    Io { path: PathBuf, source: std::io::Error },
    Encode(serde_json::Error),
    Decode { path: PathBuf, source: serde_json::Error },
}

impl Display for PersistError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "io error on `{}`: {source}", path.display()),
            Self::Encode(err) => write!(f, "failed to encode places: {err}"),
            Self::Decode { path, source } => {
                write!(f, "malformed places file `{}`: {source}", path.display())
            }
        }
    }
}

impl Error for PersistError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Encode(err) => Some(err),
            Self::Decode { source, .. } => Some(source),
        }
    }
}

/// Storage seam for the place sequence.
pub trait PlaceRepository {
    /// Reads every persisted place, in persisted order.
    fn load_places(&self) -> PersistResult<Vec<Place>>;
    /// Replaces the persisted sequence with `places`.
    fn save_places(&self, places: &[Place]) -> PersistResult<()>;
}

/// Place repository backed by one JSON file.
#[derive(Debug, Clone)]
pub struct JsonFilePlaceRepository {
    path: PathBuf,
}

impl JsonFilePlaceRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> PersistError {
        PersistError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }
}

impl PlaceRepository for JsonFilePlaceRepository {
    fn load_places(&self) -> PersistResult<Vec<Place>> {
        let bytes = std::fs::read(&self.path).map_err(|err| self.io_error(err))?;
        serde_json::from_slice(&bytes).map_err(|source| PersistError::Decode {
            path: self.path.clone(),
            source,
        })
    }

    fn save_places(&self, places: &[Place]) -> PersistResult<()> {
        let started_at = Instant::now();
        let dir = self.parent_dir();
        std::fs::create_dir_all(dir).map_err(|err| self.io_error(err))?;

        // Same directory as the target so `persist` is a rename, not a copy.
        let temp = NamedTempFile::new_in(dir).map_err(|err| self.io_error(err))?;
        restrict_to_owner(temp.as_file()).map_err(|err| self.io_error(err))?;

        {
            let mut writer = BufWriter::new(temp.as_file());
            serde_json::to_writer(&mut writer, places).map_err(PersistError::Encode)?;
            writer.flush().map_err(|err| self.io_error(err))?;
        }
        temp.as_file()
            .sync_all()
            .map_err(|err| self.io_error(err))?;
        temp.persist(&self.path)
            .map_err(|err| self.io_error(err.error))?;

        sync_dir(dir);
        info!(
            "event=places_save module=repo status=ok count={} duration_ms={}",
            places.len(),
            started_at.elapsed().as_millis()
        );
        Ok(())
    }
}

#[cfg(unix)]
fn restrict_to_owner(file: &File) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(std::fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_to_owner(_file: &File) -> std::io::Result<()> {
    Ok(())
}

/// Flushes the rename to disk where the platform allows opening directories.
#[cfg(unix)]
fn sync_dir(dir: &Path) {
    if let Err(err) = File::open(dir).and_then(|handle| handle.sync_all()) {
        warn!(
            "event=places_save module=repo status=warn step=dir_sync error={}",
            err
        );
    }
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) {}
