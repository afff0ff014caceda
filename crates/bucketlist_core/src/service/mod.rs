//! Use-case services over the repositories.
//!
//! # Responsibility
//! - Own in-memory state for the map and edit screens.
//! - Decide which persistence failures are swallowed and how they are reported.

pub mod edit_session;
pub mod map_session;
pub mod place_store;
pub mod preferences;
