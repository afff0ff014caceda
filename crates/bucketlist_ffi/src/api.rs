//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose the map session to Dart via FRB as plain use-case functions.
//! - Hold the one process-level session the UI talks to.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - Place data is only returned after the UI reports a granted unlock.
//! - Errors travel as `ok=false` envelopes with a message, never as panics.

use bucketlist_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    run_lookup, AccessOutcome, Coordinate, EditIdentity, GateState, GeosearchConfig, LoadingState,
    MapSession, NearbyPage, Place, StorageConfig, UpdateOutcome, WikipediaGeosearch,
};
use log::warn;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

static SESSION: Mutex<Option<MapSession>> = Mutex::new(None);

/// Minimal health-check API for FRB smoke integration.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// # FFI contract
/// - `level`: `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory for rolling logs.
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Place item returned to the map and edit screens.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceItem {
    pub id: String,
    pub name: String,
    pub description: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Place list envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceListResponse {
    pub ok: bool,
    pub items: Vec<PlaceItem>,
    pub message: String,
}

/// Single-place action envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceActionResponse {
    pub ok: bool,
    pub place: Option<PlaceItem>,
    pub message: String,
}

impl PlaceActionResponse {
    fn success(message: impl Into<String>, place: Option<&Place>) -> Self {
        Self {
            ok: true,
            place: place.map(to_place_item),
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            place: None,
            message: message.into(),
        }
    }
}

/// Nearby page item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NearbyPageItem {
    pub page_id: u64,
    pub title: String,
    pub description: String,
}

/// Nearby lookup envelope. `state` is `loaded` or `failed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NearbyResponse {
    pub state: String,
    pub items: Vec<NearbyPageItem>,
}

/// Opens (or reopens) the session under `data_dir`.
///
/// `None` resolves through `BUCKETLIST_DATA_DIR`, then the temp directory.
/// Reopening relocks the gate.
///
/// # FFI contract
/// - Sync call; performs file-system setup.
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn session_open(data_dir: Option<String>) -> String {
    let explicit = data_dir
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from);
    let config = match StorageConfig::resolve(explicit.as_deref()) {
        Ok(config) => config,
        Err(err) => return format!("session_open failed: {err}"),
    };
    match MapSession::open(&config) {
        Ok(session) => {
            *lock_session() = Some(session);
            String::new()
        }
        Err(err) => format!("session_open failed: {err}"),
    }
}

/// Applies the outcome of the UI-side biometric prompt.
///
/// `outcome`: `granted|denied|unsupported`. Returns the resulting gate state
/// label (`locked|unlocked|failed`), or an error message for unknown values.
#[flutter_rust_bridge::frb(sync)]
pub fn access_report(outcome: String, reason: Option<String>) -> String {
    let outcome = match outcome.trim() {
        "granted" => AccessOutcome::Granted,
        "denied" => AccessOutcome::Denied {
            reason: reason.unwrap_or_default(),
        },
        "unsupported" => AccessOutcome::Unsupported,
        other => return format!("access_report failed: unknown outcome `{other}`"),
    };
    with_session(|session| gate_label(session.apply_access_outcome(&outcome)).to_string())
        .unwrap_or_else(|err| format!("access_report failed: {err}"))
}

/// Current gate state label: `locked|unlocked|failed`.
#[flutter_rust_bridge::frb(sync)]
pub fn access_state() -> String {
    with_session(|session| gate_label(session.gate_state()).to_string())
        .unwrap_or_else(|err| format!("access_state failed: {err}"))
}

/// Relocks the session, e.g. when the app is backgrounded.
#[flutter_rust_bridge::frb(sync)]
pub fn access_lock() {
    if let Err(err) = with_session(MapSession::lock) {
        warn!("event=ffi_access_lock module=ffi status=error error={}", err);
    }
}

/// Lists places in display order.
#[flutter_rust_bridge::frb(sync)]
pub fn places_list() -> PlaceListResponse {
    let result = with_session(|session| {
        session
            .places()
            .map(|places| places.iter().map(to_place_item).collect::<Vec<_>>())
            .map_err(|err| err.to_string())
    });
    match result.and_then(|inner| inner) {
        Ok(items) => PlaceListResponse {
            ok: true,
            message: format!("{} place(s).", items.len()),
            items,
        },
        Err(err) => PlaceListResponse {
            ok: false,
            items: Vec::new(),
            message: format!("places_list failed: {err}"),
        },
    }
}

/// Adds a default-named place at the tapped coordinate.
#[flutter_rust_bridge::frb(sync)]
pub fn place_add(latitude: f64, longitude: f64) -> PlaceActionResponse {
    let result = with_session(|session| {
        session
            .add_place(Coordinate::new(latitude, longitude))
            .map(|place| PlaceActionResponse::success("Place added.", Some(&place)))
            .unwrap_or_else(|err| PlaceActionResponse::failure(format!("place_add failed: {err}")))
    });
    result.unwrap_or_else(|err| PlaceActionResponse::failure(format!("place_add failed: {err}")))
}

/// Selects a place for editing.
#[flutter_rust_bridge::frb(sync)]
pub fn place_select(id: String) -> PlaceActionResponse {
    let Ok(id) = Uuid::parse_str(id.trim()) else {
        return PlaceActionResponse::failure(format!("place_select failed: invalid id `{id}`"));
    };
    let result = with_session(|session| match session.select_place(id) {
        Ok(place) => PlaceActionResponse::success("Place selected.", Some(place)),
        Err(err) => PlaceActionResponse::failure(format!("place_select failed: {err}")),
    });
    result.unwrap_or_else(|err| PlaceActionResponse::failure(format!("place_select failed: {err}")))
}

/// Saves name/description edits over the selected place and ends the edit.
///
/// Text is stored as typed. `rotate_id=true` gives the edited place a fresh id.
#[flutter_rust_bridge::frb(sync)]
pub fn place_update_selected(
    name: String,
    description: String,
    rotate_id: bool,
) -> PlaceActionResponse {
    let identity = if rotate_id {
        EditIdentity::Rotate
    } else {
        EditIdentity::Preserve
    };
    let result = with_session(|session| {
        let mut edit = match session.begin_edit() {
            Ok(edit) => edit,
            Err(err) => {
                return PlaceActionResponse::failure(format!("place_update_selected failed: {err}"))
            }
        };
        edit.set_name(name);
        edit.set_description(description);
        let replacement = edit.finish(identity);

        let outcome = session.update_selected(replacement.clone());
        session.clear_selection();
        match outcome {
            Ok(UpdateOutcome::Replaced { .. }) => {
                PlaceActionResponse::success("Place updated.", Some(&replacement))
            }
            Ok(outcome) => PlaceActionResponse::failure(format!(
                "place_update_selected skipped: {}",
                outcome_label(outcome)
            )),
            Err(err) => PlaceActionResponse::failure(format!("place_update_selected failed: {err}")),
        }
    });
    result.unwrap_or_else(|err| {
        PlaceActionResponse::failure(format!("place_update_selected failed: {err}"))
    })
}

/// Reads the persisted hybrid map mode flag. `false` when unavailable.
#[flutter_rust_bridge::frb(sync)]
pub fn map_hybrid_mode() -> bool {
    with_session(|session| session.is_hybrid_mode()).unwrap_or(false)
}

/// Persists the hybrid map mode flag.
#[flutter_rust_bridge::frb(sync)]
pub fn map_set_hybrid_mode(enabled: bool) {
    if let Err(err) = with_session(|session| session.set_hybrid_mode(enabled)) {
        warn!(
            "event=ffi_set_hybrid_mode module=ffi status=error error={}",
            err
        );
    }
}

/// Fetches pages near a coordinate. Runs on an FRB worker thread.
///
/// # FFI contract
/// - Blocking network call; never on the UI thread.
/// - Returns `state=failed` with no items on any error.
pub fn nearby_pages(latitude: f64, longitude: f64) -> NearbyResponse {
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            warn!("event=ffi_nearby module=ffi status=error error={}", err);
            return to_nearby_response(&LoadingState::Failed);
        }
    };
    let source = match WikipediaGeosearch::new(GeosearchConfig::from_env()) {
        Ok(source) => source,
        Err(err) => {
            warn!("event=ffi_nearby module=ffi status=error error={}", err);
            return to_nearby_response(&LoadingState::Failed);
        }
    };

    let state = runtime.block_on(run_lookup(&source, Coordinate::new(latitude, longitude)));
    to_nearby_response(&state)
}

fn lock_session() -> MutexGuard<'static, Option<MapSession>> {
    SESSION.lock().unwrap_or_else(PoisonError::into_inner)
}

fn with_session<T>(f: impl FnOnce(&mut MapSession) -> T) -> Result<T, String> {
    let mut guard = lock_session();
    if guard.is_none() {
        let config = StorageConfig::resolve(None).map_err(|err| err.to_string())?;
        let session = MapSession::open(&config).map_err(|err| err.to_string())?;
        *guard = Some(session);
    }
    match guard.as_mut() {
        Some(session) => Ok(f(session)),
        None => Err("session unavailable".to_string()),
    }
}

fn gate_label(state: &GateState) -> &'static str {
    match state {
        GateState::Locked => "locked",
        GateState::Unlocked => "unlocked",
        GateState::Failed { .. } => "failed",
    }
}

fn outcome_label(outcome: UpdateOutcome) -> &'static str {
    match outcome {
        UpdateOutcome::Replaced { .. } => "replaced",
        UpdateOutcome::NotFound => "not_found",
        UpdateOutcome::NoSelection => "no_selection",
        UpdateOutcome::IdConflict => "id_conflict",
        UpdateOutcome::InvalidReplacement => "invalid_replacement",
    }
}

fn to_place_item(place: &Place) -> PlaceItem {
    PlaceItem {
        id: place.id.to_string(),
        name: place.name.clone(),
        description: place.description.clone(),
        latitude: place.latitude,
        longitude: place.longitude,
    }
}

fn to_nearby_response(state: &LoadingState) -> NearbyResponse {
    let label = match state {
        LoadingState::Loading => "loading",
        LoadingState::Loaded(_) => "loaded",
        LoadingState::Failed => "failed",
    };
    NearbyResponse {
        state: label.to_string(),
        items: state.pages().iter().map(to_nearby_item).collect(),
    }
}

fn to_nearby_item(page: &NearbyPage) -> NearbyPageItem {
    NearbyPageItem {
        page_id: page.page_id,
        title: page.title.clone(),
        description: page.description().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        access_lock, access_report, access_state, core_version, init_logging, map_hybrid_mode,
        map_set_hybrid_mode, ping, place_add, place_select, place_update_selected, places_list,
        session_open, to_nearby_response, NearbyPageItem,
    };
    use bucketlist_core::{LoadingState, NearbyPage};
    use std::sync::{Mutex, MutexGuard, PoisonError};

    // Tests share the process-level session.
    static SERIAL: Mutex<()> = Mutex::new(());

    fn fresh_session() -> (MutexGuard<'static, ()>, tempfile::TempDir) {
        let guard = SERIAL.lock().unwrap_or_else(PoisonError::into_inner);
        let dir = tempfile::tempdir().expect("temp dir");
        let dir_str = dir.path().to_str().expect("utf-8 temp dir").to_string();
        assert_eq!(session_open(Some(dir_str)), "");
        (guard, dir)
    }

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_bad_input() {
        assert!(!init_logging("info".to_string(), String::new()).is_empty());
        assert!(!init_logging("verbose".to_string(), "tmp/logs".to_string()).is_empty());
    }

    #[test]
    fn session_open_rejects_relative_dir() {
        let _guard = SERIAL.lock().unwrap_or_else(PoisonError::into_inner);
        let message = session_open(Some("relative/dir".to_string()));
        assert!(message.contains("absolute"));
    }

    #[test]
    fn places_are_hidden_until_granted() {
        let (_guard, _dir) = fresh_session();

        assert_eq!(access_state(), "locked");
        let locked = places_list();
        assert!(!locked.ok);
        assert!(locked.items.is_empty());
        assert!(!place_add(1.0, 2.0).ok);

        assert_eq!(access_report("unsupported".to_string(), None), "locked");
        assert_eq!(
            access_report("denied".to_string(), Some("cancel".to_string())),
            "failed"
        );
        assert!(access_report("maybe".to_string(), None).contains("unknown outcome"));
        assert_eq!(access_report("granted".to_string(), None), "unlocked");

        let unlocked = places_list();
        assert!(unlocked.ok, "{}", unlocked.message);
        assert!(unlocked.items.is_empty());

        access_lock();
        assert_eq!(access_state(), "locked");
    }

    #[test]
    fn add_select_update_flow() {
        let (_guard, _dir) = fresh_session();
        access_report("granted".to_string(), None);

        let added = place_add(56.0, -3.0);
        assert!(added.ok, "{}", added.message);
        let place = added.place.expect("added place");
        assert_eq!(place.name, "New Location");

        let no_selection =
            place_update_selected("Edinburgh".to_string(), String::new(), false);
        assert!(!no_selection.ok);
        assert!(no_selection.message.contains("no place is selected"));

        assert!(place_select(place.id.clone()).ok);
        let updated = place_update_selected(
            "  Edinburgh ".to_string(),
            "old town\n".to_string(),
            false,
        );
        assert!(updated.ok, "{}", updated.message);
        let updated_place = updated.place.expect("updated place");
        assert_eq!(updated_place.id, place.id);
        assert_eq!(updated_place.name, "  Edinburgh ");
        assert_eq!(updated_place.description, "old town\n");

        let listed = places_list();
        assert_eq!(listed.items, vec![updated_place]);
        assert!(!place_select("not-a-uuid".to_string()).ok);
    }

    #[test]
    fn rotate_id_gives_edited_place_new_id() {
        let (_guard, _dir) = fresh_session();
        access_report("granted".to_string(), None);

        let place = place_add(10.0, 10.0).place.expect("added place");
        place_select(place.id.clone());
        let updated = place_update_selected("Rotated".to_string(), String::new(), true);
        let updated_place = updated.place.expect("updated place");
        assert_ne!(updated_place.id, place.id);
        assert_eq!(places_list().items.len(), 1);
    }

    #[test]
    fn hybrid_mode_round_trips_while_locked() {
        let (_guard, _dir) = fresh_session();

        assert!(!map_hybrid_mode());
        map_set_hybrid_mode(true);
        assert!(map_hybrid_mode());
    }

    #[test]
    fn nearby_response_labels_state_and_carries_pages() {
        let loaded = to_nearby_response(&LoadingState::Loaded(vec![
            NearbyPage::new(7, "Edinburgh Castle"),
            NearbyPage::new(11, "Royal Mile"),
        ]));
        assert_eq!(loaded.state, "loaded");
        assert_eq!(
            loaded.items,
            vec![
                NearbyPageItem {
                    page_id: 7,
                    title: "Edinburgh Castle".to_string(),
                    description: "More information".to_string(),
                },
                NearbyPageItem {
                    page_id: 11,
                    title: "Royal Mile".to_string(),
                    description: "More information".to_string(),
                },
            ]
        );

        let failed = to_nearby_response(&LoadingState::Failed);
        assert_eq!(failed.state, "failed");
        assert!(failed.items.is_empty());
    }
}
