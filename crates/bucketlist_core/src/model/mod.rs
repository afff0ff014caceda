//! Domain model for places and nearby lookup results.
//!
//! # Invariants
//! - Every stored place is identified by a unique `PlaceId`.
//! - `NearbyPage` values are never persisted.

pub mod page;
pub mod place;
