//! Owned map-screen session: places, access gate and preferences together.
//!
//! # Responsibility
//! - Replace a process-wide view model with one explicitly constructed
//!   object handed to the presentation layer.
//! - Refuse to expose or mutate places until the gate is unlocked.
//!
//! # Invariants
//! - Every place read or write goes through the gate check.
//! - Preferences and authentication stay available while locked.

use crate::config::StorageConfig;
use crate::db::{open_db, open_db_in_memory};
use crate::gate::{AccessGate, AccessOutcome, AccessProbe, GateState};
use crate::model::place::{Coordinate, Place, PlaceId, PlaceValidationError};
use crate::repo::place_repo::{JsonFilePlaceRepository, PlaceRepository};
use crate::repo::settings_repo::{SettingsError, SettingsRepository, SqliteSettingsRepository};
use crate::service::edit_session::{EditIdentity, EditSession};
use crate::service::place_store::{PlaceStore, UpdateOutcome};
use crate::service::preferences::MapPreferences;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type SessionResult<T> = Result<T, SessionError>;

#[derive(Debug)]
pub enum SessionError {
    /// The access gate has not been unlocked.
    Locked,
    NoSelection,
    UnknownPlace(PlaceId),
    InvalidPlace(PlaceValidationError),
    Settings(SettingsError),
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Locked => write!(f, "places are locked; authenticate first"),
            Self::NoSelection => write!(f, "no place is selected"),
            Self::UnknownPlace(id) => write!(f, "place not found: {id}"),
            Self::InvalidPlace(err) => write!(f, "{err}"),
            Self::Settings(err) => write!(f, "settings unavailable: {err}"),
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidPlace(err) => Some(err),
            Self::Settings(err) => Some(err),
            Self::Locked | Self::NoSelection | Self::UnknownPlace(_) => None,
        }
    }
}

impl From<PlaceValidationError> for SessionError {
    fn from(value: PlaceValidationError) -> Self {
        Self::InvalidPlace(value)
    }
}

impl From<SettingsError> for SessionError {
    fn from(value: SettingsError) -> Self {
        Self::Settings(value)
    }
}

pub struct MapSession<R = JsonFilePlaceRepository, S = SqliteSettingsRepository>
where
    R: PlaceRepository,
    S: SettingsRepository,
{
    store: PlaceStore<R>,
    gate: AccessGate,
    preferences: MapPreferences<S>,
}

impl MapSession {
    /// Opens the file-backed session under `config`'s data directory.
    ///
    /// An unusable settings database degrades to in-memory settings.
    ///
    /// # Errors
    /// Fails only when not even an in-memory settings database can be opened.
    pub fn open(config: &StorageConfig) -> SessionResult<Self> {
        let store = PlaceStore::open(JsonFilePlaceRepository::new(config.places_path()));

        let conn = match open_db(config.settings_db_path()) {
            Ok(conn) => conn,
            Err(err) => {
                warn!(
                    "event=session_open module=session status=warn fallback=memory_settings error={}",
                    err
                );
                open_db_in_memory().map_err(SettingsError::from)?
            }
        };
        let preferences = MapPreferences::load(SqliteSettingsRepository::new(conn));

        info!(
            "event=session_open module=session status=ok places={}",
            store.len()
        );
        Ok(Self::from_parts(store, preferences))
    }
}

impl<R: PlaceRepository, S: SettingsRepository> MapSession<R, S> {
    pub fn from_parts(store: PlaceStore<R>, preferences: MapPreferences<S>) -> Self {
        Self {
            store,
            gate: AccessGate::new(),
            preferences,
        }
    }

    pub fn gate_state(&self) -> &GateState {
        self.gate.state()
    }

    pub fn is_unlocked(&self) -> bool {
        self.gate.is_unlocked()
    }

    pub async fn authenticate(&mut self, probe: &dyn AccessProbe) -> AccessOutcome {
        self.gate.authenticate(probe).await
    }

    pub fn apply_access_outcome(&mut self, outcome: &AccessOutcome) -> &GateState {
        self.gate.apply(outcome)
    }

    /// Relocks and drops any selection.
    pub fn lock(&mut self) {
        self.store.clear_selection();
        self.gate.lock();
    }

    pub fn is_hybrid_mode(&self) -> bool {
        self.preferences.is_hybrid_mode()
    }

    pub fn set_hybrid_mode(&mut self, enabled: bool) {
        self.preferences.set_hybrid_mode(enabled);
    }

    pub fn places(&self) -> SessionResult<&[Place]> {
        self.ensure_unlocked()?;
        Ok(self.store.places())
    }

    pub fn add_place(&mut self, coordinate: Coordinate) -> SessionResult<Place> {
        self.ensure_unlocked()?;
        let place = self.store.add(coordinate)?;
        Ok(place.clone())
    }

    pub fn select_place(&mut self, id: PlaceId) -> SessionResult<&Place> {
        self.ensure_unlocked()?;
        if !self.store.select(id) {
            return Err(SessionError::UnknownPlace(id));
        }
        self.store.selected().ok_or(SessionError::UnknownPlace(id))
    }

    pub fn clear_selection(&mut self) {
        self.store.clear_selection();
    }

    pub fn selected_place(&self) -> SessionResult<Option<&Place>> {
        self.ensure_unlocked()?;
        Ok(self.store.selected())
    }

    /// Starts editing the selected place.
    pub fn begin_edit(&self) -> SessionResult<EditSession> {
        self.ensure_unlocked()?;
        let place = self.store.selected().ok_or(SessionError::NoSelection)?;
        Ok(EditSession::begin(place.clone()))
    }

    /// Writes `replacement` over the selected place.
    pub fn update_selected(&mut self, replacement: Place) -> SessionResult<UpdateOutcome> {
        self.ensure_unlocked()?;
        Ok(self.store.update_selected(replacement))
    }

    /// Saves an edit over the selected place and ends the selection.
    pub fn commit_edit(
        &mut self,
        edit: &EditSession,
        identity: EditIdentity,
    ) -> SessionResult<UpdateOutcome> {
        let outcome = self.update_selected(edit.finish(identity))?;
        self.store.clear_selection();
        Ok(outcome)
    }

    /// Most recent swallowed save failure, for diagnostics.
    pub fn last_persist_error(&self) -> Option<&str> {
        self.store.last_persist_error()
    }

    fn ensure_unlocked(&self) -> SessionResult<()> {
        if self.gate.is_unlocked() {
            Ok(())
        } else {
            Err(SessionError::Locked)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{MapSession, SessionError};
    use crate::config::StorageConfig;
    use crate::gate::AccessOutcome;
    use crate::model::place::Coordinate;
    use crate::service::edit_session::EditIdentity;
    use crate::service::place_store::UpdateOutcome;

    fn open_session(dir: &tempfile::TempDir) -> MapSession {
        let config = StorageConfig::new(dir.path()).expect("absolute temp dir");
        MapSession::open(&config).expect("open session")
    }

    #[test]
    fn locked_session_hides_and_protects_places() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut session = open_session(&dir);

        assert!(matches!(session.places(), Err(SessionError::Locked)));
        assert!(matches!(
            session.add_place(Coordinate::new(1.0, 1.0)),
            Err(SessionError::Locked)
        ));

        session.apply_access_outcome(&AccessOutcome::Unsupported);
        assert!(matches!(session.places(), Err(SessionError::Locked)));

        session.apply_access_outcome(&AccessOutcome::Granted);
        assert!(session.places().expect("unlocked").is_empty());
    }

    #[test]
    fn edit_flow_commits_and_clears_selection() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut session = open_session(&dir);
        session.apply_access_outcome(&AccessOutcome::Granted);

        let place = session
            .add_place(Coordinate::new(56.0, -3.0))
            .expect("add place");
        assert!(matches!(session.begin_edit(), Err(SessionError::NoSelection)));

        session.select_place(place.id).expect("select");
        let mut edit = session.begin_edit().expect("begin edit");
        edit.set_name("Edinburgh");

        let outcome = session
            .commit_edit(&edit, EditIdentity::Preserve)
            .expect("commit");
        assert_eq!(outcome, UpdateOutcome::Replaced { index: 0 });
        assert_eq!(session.selected_place().expect("unlocked"), None);
        assert_eq!(session.places().expect("unlocked")[0].name, "Edinburgh");

        let again = session
            .commit_edit(&edit, EditIdentity::Preserve)
            .expect("commit without selection");
        assert_eq!(again, UpdateOutcome::NoSelection);
    }

    #[test]
    fn hybrid_mode_is_available_while_locked_and_persists() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut session = open_session(&dir);
        session.set_hybrid_mode(true);
        drop(session);

        assert!(open_session(&dir).is_hybrid_mode());
    }
}
