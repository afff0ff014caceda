//! Core domain logic for BucketList.
//! This crate is the single source of truth for place storage, access gating
//! and nearby lookups; UI layers only call into it.

pub mod config;
pub mod db;
pub mod gate;
pub mod logging;
pub mod model;
pub mod nearby;
pub mod repo;
pub mod service;

pub use config::{ConfigError, StorageConfig};
pub use gate::{AccessGate, AccessOutcome, AccessProbe, GateState};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::page::NearbyPage;
pub use model::place::{Coordinate, Place, PlaceId, PlaceValidationError, DEFAULT_PLACE_NAME};
pub use nearby::geosearch::{
    parse_geosearch_response, FetchError, GeosearchConfig, PageSource, WikipediaGeosearch,
};
pub use nearby::{run_lookup, LoadingState, NearbyLookup};
pub use repo::place_repo::{JsonFilePlaceRepository, PersistError, PersistResult, PlaceRepository};
pub use repo::settings_repo::{SettingsError, SettingsRepository, SqliteSettingsRepository};
pub use service::edit_session::{EditIdentity, EditSession};
pub use service::map_session::{MapSession, SessionError, SessionResult};
pub use service::place_store::{PlaceStore, UpdateOutcome};
pub use service::preferences::{MapPreferences, HYBRID_MODE_KEY};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
