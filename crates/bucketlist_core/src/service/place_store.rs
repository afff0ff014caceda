//! Authoritative in-memory place list kept in sync with its repository.
//!
//! # Responsibility
//! - Own the ordered place sequence for one session.
//! - Persist the full sequence after every mutation.
//! - Track which place is selected for editing.
//!
//! # Invariants
//! - Place ids are unique within the sequence.
//! - Insertion order is preserved; updates keep the slot position.
//! - Persistence failures never propagate. They are logged, the last one is
//!   retained, and the in-memory sequence stays authoritative.
//! - Load failures degrade to an empty sequence.

use crate::model::place::{Coordinate, Place, PlaceId, PlaceValidationError};
use crate::repo::place_repo::{PersistError, PlaceRepository};
use log::{debug, error, info, warn};
use std::collections::HashSet;

/// Result of an update attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The slot at `index` now holds the replacement.
    Replaced { index: usize },
    /// The original place is not in the store; nothing changed.
    NotFound,
    /// No place is selected; the selected-place update did not run.
    NoSelection,
    /// The replacement id belongs to a different stored place; nothing changed.
    IdConflict,
    /// The replacement has a non-finite or out-of-range coordinate; nothing
    /// changed.
    InvalidReplacement,
}

impl UpdateOutcome {
    pub fn is_replaced(self) -> bool {
        matches!(self, Self::Replaced { .. })
    }
}

/// Ordered, durably backed place collection.
pub struct PlaceStore<R: PlaceRepository> {
    repo: R,
    places: Vec<Place>,
    selected: Option<PlaceId>,
    last_persist_error: Option<String>,
}

impl<R: PlaceRepository> PlaceStore<R> {
    /// Opens the store, loading whatever the repository holds.
    pub fn open(repo: R) -> Self {
        let places = load(&repo);
        Self {
            repo,
            places,
            selected: None,
            last_persist_error: None,
        }
    }

    pub fn places(&self) -> &[Place] {
        &self.places
    }

    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }

    pub fn get(&self, id: PlaceId) -> Option<&Place> {
        self.places.iter().find(|place| place.id == id)
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Appends a new default-named place at `coordinate` and saves.
    ///
    /// # Errors
    /// Returns the validation error for non-finite or out-of-range
    /// coordinates; the store is unchanged in that case.
    pub fn add(&mut self, coordinate: Coordinate) -> Result<&Place, PlaceValidationError> {
        coordinate.validate()?;

        let mut place = Place::new_at(coordinate);
        while self.get(place.id).is_some() {
            place = Place::new_at(coordinate);
        }
        debug!(
            "event=place_add module=store status=ok place_id={} count={}",
            place.id,
            self.places.len() + 1
        );
        self.places.push(place);
        self.save();

        let index = self.places.len() - 1;
        Ok(&self.places[index])
    }

    /// Replaces the stored place matching `original`'s id with `replacement`.
    ///
    /// Saves only when a slot was replaced. Replacements that fail
    /// `Place::validate` are rejected before any lookup.
    pub fn update(&mut self, original: &Place, replacement: Place) -> UpdateOutcome {
        if let Err(err) = replacement.validate() {
            warn!(
                "event=place_update module=store status=skip reason=invalid place_id={} error={}",
                replacement.id, err
            );
            return UpdateOutcome::InvalidReplacement;
        }

        let Some(index) = self
            .places
            .iter()
            .position(|place| place.is_same_place(original))
        else {
            debug!(
                "event=place_update module=store status=skip reason=not_found place_id={}",
                original.id
            );
            return UpdateOutcome::NotFound;
        };

        let conflict = self
            .places
            .iter()
            .enumerate()
            .any(|(other, place)| other != index && place.id == replacement.id);
        if conflict {
            warn!(
                "event=place_update module=store status=skip reason=id_conflict place_id={}",
                replacement.id
            );
            return UpdateOutcome::IdConflict;
        }

        if self.selected == Some(original.id) {
            self.selected = Some(replacement.id);
        }
        debug!(
            "event=place_update module=store status=ok index={} old_id={} new_id={}",
            index, original.id, replacement.id
        );
        self.places[index] = replacement;
        self.save();

        UpdateOutcome::Replaced { index }
    }

    /// Updates the currently selected place; no-op without a selection.
    pub fn update_selected(&mut self, replacement: Place) -> UpdateOutcome {
        let Some(original) = self.selected().cloned() else {
            debug!("event=place_update module=store status=skip reason=no_selection");
            return UpdateOutcome::NoSelection;
        };
        self.update(&original, replacement)
    }

    /// Marks `id` as the place being edited. Returns `false` for unknown ids.
    pub fn select(&mut self, id: PlaceId) -> bool {
        if self.get(id).is_none() {
            return false;
        }
        self.selected = Some(id);
        true
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn selected(&self) -> Option<&Place> {
        self.selected.and_then(|id| self.get(id))
    }

    /// Message of the most recent failed save, cleared by the next success.
    pub fn last_persist_error(&self) -> Option<&str> {
        self.last_persist_error.as_deref()
    }

    /// Writes the whole sequence through the repository.
    ///
    /// Returns whether the write succeeded. Failures are logged, never raised.
    pub fn save(&mut self) -> bool {
        match self.repo.save_places(&self.places) {
            Ok(()) => {
                self.last_persist_error = None;
                true
            }
            Err(err) => {
                error!(
                    "event=places_save module=store status=error count={} error={}",
                    self.places.len(),
                    err
                );
                self.last_persist_error = Some(err.to_string());
                false
            }
        }
    }
}

/// Best-effort load: any repository failure yields an empty sequence.
pub fn load<R: PlaceRepository + ?Sized>(repo: &R) -> Vec<Place> {
    match repo.load_places() {
        Ok(places) => {
            let places = dedupe_by_id(places);
            info!(
                "event=places_load module=store status=ok count={}",
                places.len()
            );
            places
        }
        Err(PersistError::Io { source, .. })
            if source.kind() == std::io::ErrorKind::NotFound =>
        {
            info!("event=places_load module=store status=ok count=0 reason=no_file");
            Vec::new()
        }
        Err(err) => {
            warn!(
                "event=places_load module=store status=error fallback=empty error={}",
                err
            );
            Vec::new()
        }
    }
}

fn dedupe_by_id(places: Vec<Place>) -> Vec<Place> {
    let mut seen = HashSet::with_capacity(places.len());
    let total = places.len();
    let unique = places
        .into_iter()
        .filter(|place| seen.insert(place.id))
        .collect::<Vec<_>>();
    if unique.len() != total {
        warn!(
            "event=places_load module=store status=warn reason=duplicate_ids dropped={}",
            total - unique.len()
        );
    }
    unique
}
