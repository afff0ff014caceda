//! Place domain model.
//!
//! # Responsibility
//! - Define the persisted record for one bucket-list point of interest.
//! - Validate coordinates before a place enters the store.
//!
//! # Invariants
//! - `id` is never reused for another place.
//! - `latitude`/`longitude` are fixed at creation; edits only touch text fields.
//! - Serialized field names match the on-disk JSON shape
//!   `{id, name, description, latitude, longitude}`.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier of one place.
pub type PlaceId = Uuid;

/// Display name given to places created from a map tap.
pub const DEFAULT_PLACE_NAME: &str = "New Location";

/// A WGS84 point in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Checks that both components are finite and within their ranges.
    pub fn validate(&self) -> Result<(), PlaceValidationError> {
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(PlaceValidationError::LatitudeOutOfRange(self.latitude));
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(PlaceValidationError::LongitudeOutOfRange(self.longitude));
        }
        Ok(())
    }
}

/// One user-recorded point of interest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub id: PlaceId,
    /// Free display text; duplicates across places are allowed.
    pub name: String,
    pub description: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Place {
    /// Creates a place with a fresh id, the default name and no description.
    pub fn new_at(coordinate: Coordinate) -> Self {
        Self::with_id(Uuid::new_v4(), DEFAULT_PLACE_NAME, "", coordinate)
    }

    /// Creates a place with a caller-provided id.
    pub fn with_id(
        id: PlaceId,
        name: impl Into<String>,
        description: impl Into<String>,
        coordinate: Coordinate,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            description: description.into(),
            latitude: coordinate.latitude,
            longitude: coordinate.longitude,
        }
    }

    /// Sample place for previews and fixtures.
    pub fn example() -> Self {
        Self::with_id(
            Uuid::new_v4(),
            "Buckingham Palace",
            "Lit by over 40,000 lightbulbs.",
            Coordinate::new(51.501, -0.141),
        )
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }

    /// Lookup equality: two values denote the same place when ids match.
    pub fn is_same_place(&self, other: &Place) -> bool {
        self.id == other.id
    }

    pub fn validate(&self) -> Result<(), PlaceValidationError> {
        self.coordinate().validate()
    }
}

/// Rejected place values.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaceValidationError {
    LatitudeOutOfRange(f64),
    LongitudeOutOfRange(f64),
}

impl Display for PlaceValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LatitudeOutOfRange(value) => {
                write!(f, "latitude must be finite and within [-90, 90], got {value}")
            }
            Self::LongitudeOutOfRange(value) => {
                write!(
                    f,
                    "longitude must be finite and within [-180, 180], got {value}"
                )
            }
        }
    }
}

impl Error for PlaceValidationError {}
