//! Persisted map display preferences.
//!
//! # Invariants
//! - The flag is read once at construction and written on every change.
//! - Read or write failures fall back to the in-memory value.

use crate::repo::settings_repo::SettingsRepository;
use log::{error, warn};

/// Settings key of the hybrid map mode flag.
pub const HYBRID_MODE_KEY: &str = "map.hybrid_mode";

pub struct MapPreferences<S: SettingsRepository> {
    settings: S,
    hybrid_mode: bool,
}

impl<S: SettingsRepository> MapPreferences<S> {
    /// Reads the stored flag; missing or unreadable values mean `false`.
    pub fn load(settings: S) -> Self {
        let hybrid_mode = match settings.get_setting(HYBRID_MODE_KEY) {
            Ok(Some(value)) => parse_flag(&value),
            Ok(None) => false,
            Err(err) => {
                warn!(
                    "event=prefs_load module=prefs status=error fallback=default error={}",
                    err
                );
                false
            }
        };
        Self {
            settings,
            hybrid_mode,
        }
    }

    pub fn is_hybrid_mode(&self) -> bool {
        self.hybrid_mode
    }

    /// Updates and persists the flag.
    pub fn set_hybrid_mode(&mut self, enabled: bool) {
        self.hybrid_mode = enabled;
        let value = if enabled { "true" } else { "false" };
        if let Err(err) = self.settings.set_setting(HYBRID_MODE_KEY, value) {
            error!(
                "event=prefs_save module=prefs status=error key={} error={}",
                HYBRID_MODE_KEY, err
            );
        }
    }
}

fn parse_flag(value: &str) -> bool {
    match value.trim() {
        "true" | "1" => true,
        "false" | "0" => false,
        other => {
            warn!(
                "event=prefs_load module=prefs status=warn reason=unknown_value value_len={}",
                other.len()
            );
            false
        }
    }
}
