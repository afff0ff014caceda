//! Editing draft for one selected place.
//!
//! # Responsibility
//! - Hold name/description drafts separate from the stored place.
//! - Own the session's single nearby lookup.
//! - Build the replacement handed to `PlaceStore::update`.
//!
//! # Invariants
//! - The replacement keeps the original coordinate.
//! - At most one lookup per session; dropping the session cancels it.

use crate::model::page::NearbyPage;
use crate::model::place::Place;
use crate::nearby::geosearch::PageSource;
use crate::nearby::{LoadingState, NearbyLookup};
use std::sync::Arc;
use uuid::Uuid;

/// Identity given to the replacement built by `EditSession::finish`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditIdentity {
    /// Keep the original id.
    #[default]
    Preserve,
    /// Mint a fresh id for the edited place.
    Rotate,
}

#[derive(Debug)]
pub struct EditSession {
    original: Place,
    name: String,
    description: String,
    lookup: Option<NearbyLookup>,
}

impl EditSession {
    pub fn begin(place: Place) -> Self {
        Self {
            name: place.name.clone(),
            description: place.description.clone(),
            original: place,
            lookup: None,
        }
    }

    pub fn original(&self) -> &Place {
        &self.original
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    /// Starts the nearby lookup for the original coordinate.
    ///
    /// Returns `false` when this session already started one.
    pub fn start_lookup(&mut self, source: Arc<dyn PageSource>) -> bool {
        if self.lookup.is_some() {
            return false;
        }
        self.lookup = Some(NearbyLookup::spawn(source, self.original.coordinate()));
        true
    }

    /// `Loading` until a started lookup settles.
    pub fn lookup_state(&self) -> LoadingState {
        self.lookup
            .as_ref()
            .map(NearbyLookup::state)
            .unwrap_or_default()
    }

    /// Waits for the started lookup. Without one, returns `Loading` at once.
    pub async fn wait_for_lookup(&mut self) -> LoadingState {
        match self.lookup.as_mut() {
            Some(lookup) => lookup.settled().await,
            None => LoadingState::Loading,
        }
    }

    pub fn pages(&self) -> Vec<NearbyPage> {
        self.lookup_state().pages().to_vec()
    }

    /// Builds the replacement place from the current drafts.
    pub fn finish(&self, identity: EditIdentity) -> Place {
        let id = match identity {
            EditIdentity::Preserve => self.original.id,
            EditIdentity::Rotate => Uuid::new_v4(),
        };
        Place {
            id,
            name: self.name.clone(),
            description: self.description.clone(),
            ..self.original.clone()
        }
    }
}
