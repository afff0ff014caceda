//! Repository layer: persistence contracts and their implementations.
//!
//! # Responsibility
//! - Define storage seams used by the services.
//! - Keep file formats and SQL inside the persistence boundary.
//!
//! # Invariants
//! - Repositories report failures; deciding whether a failure is fatal is
//!   left to the service layer.

pub mod place_repo;
pub mod settings_repo;
