//! Flutter bridge over `bucketlist_core`.

pub mod api;
