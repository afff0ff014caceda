//! Nearby encyclopedia page model.
//!
//! Pages are transient: produced by one nearby lookup, never persisted.

use serde::Deserialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;

const FALLBACK_DESCRIPTION: &str = "More information";

/// One geosearch result.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NearbyPage {
    #[serde(rename = "pageid")]
    pub page_id: u64,
    pub title: String,
    /// Wikidata terms, e.g. `{"description": ["capital of Scotland"]}`.
    #[serde(default)]
    pub terms: Option<BTreeMap<String, Vec<String>>>,
}

impl NearbyPage {
    pub fn new(page_id: u64, title: impl Into<String>) -> Self {
        Self {
            page_id,
            title: title.into(),
            terms: None,
        }
    }

    /// First `description` term, or a generic label when none is present.
    pub fn description(&self) -> &str {
        self.terms
            .as_ref()
            .and_then(|terms| terms.get("description"))
            .and_then(|values| values.first())
            .map(String::as_str)
            .unwrap_or(FALLBACK_DESCRIPTION)
    }
}

impl Ord for NearbyPage {
    /// Title order; `page_id` breaks ties so sorting is deterministic.
    fn cmp(&self, other: &Self) -> Ordering {
        self.title
            .cmp(&other.title)
            .then_with(|| self.page_id.cmp(&other.page_id))
    }
}

impl PartialOrd for NearbyPage {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
