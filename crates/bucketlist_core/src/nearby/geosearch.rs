//! Wikipedia geosearch client.
//!
//! # Responsibility
//! - Build the geosearch request for one coordinate.
//! - Decode `{query: {pages: {<id>: page}}}` into sorted `NearbyPage`s.
//!
//! # Invariants
//! - One GET per lookup; no retries, no caching.
//! - Any transport, status or decoding problem is a `FetchError`.

use crate::model::page::NearbyPage;
use crate::model::place::Coordinate;
use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Url;
use serde::Deserialize;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{Duration, Instant};

/// Default public endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://en.wikipedia.org/w/api.php";
/// Environment variable overriding the endpoint.
pub const ENDPOINT_ENV: &str = "BUCKETLIST_GEOSEARCH_ENDPOINT";

const DEFAULT_RADIUS_METERS: u32 = 10_000;
const DEFAULT_RESULT_LIMIT: u32 = 50;
const DEFAULT_THUMBNAIL_SIZE: u32 = 500;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Lookup failures. Callers surface all of them as a single failed state.
#[derive(Debug)]
pub enum FetchError {
    InvalidUrl(String),
    Http(reqwest::Error),
    Status(u16),
    Decode(serde_json::Error),
}

impl Display for FetchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidUrl(message) => write!(f, "bad geosearch url: {message}"),
            Self::Http(err) => write!(f, "geosearch request failed: {err}"),
            Self::Status(code) => write!(f, "geosearch returned http status {code}"),
            Self::Decode(err) => write!(f, "malformed geosearch response: {err}"),
        }
    }
}

impl Error for FetchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Http(err) => Some(err),
            Self::Decode(err) => Some(err),
            Self::InvalidUrl(_) | Self::Status(_) => None,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(value: reqwest::Error) -> Self {
        Self::Http(value)
    }
}

/// Anything that can list pages near a coordinate.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn nearby_pages(&self, coordinate: Coordinate) -> Result<Vec<NearbyPage>, FetchError>;
}

/// Request parameters for the geosearch call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeosearchConfig {
    pub endpoint: String,
    pub radius_meters: u32,
    pub limit: u32,
    pub thumbnail_size: u32,
    pub timeout: Duration,
    pub user_agent: String,
    /// Honor `HTTP(S)_PROXY` environment settings.
    pub use_system_proxy: bool,
}

impl Default for GeosearchConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            radius_meters: DEFAULT_RADIUS_METERS,
            limit: DEFAULT_RESULT_LIMIT,
            thumbnail_size: DEFAULT_THUMBNAIL_SIZE,
            timeout: DEFAULT_TIMEOUT,
            user_agent: format!("bucketlist/{}", env!("CARGO_PKG_VERSION")),
            use_system_proxy: true,
        }
    }
}

impl GeosearchConfig {
    /// Defaults, with the endpoint taken from `BUCKETLIST_GEOSEARCH_ENDPOINT`
    /// when set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(raw) = std::env::var(ENDPOINT_ENV) {
            let trimmed = raw.trim();
            if !trimmed.is_empty() {
                config.endpoint = trimmed.to_string();
            }
        }
        config
    }

    /// Full request URL for `coordinate`.
    pub fn request_url(&self, coordinate: Coordinate) -> Result<Url, FetchError> {
        let limit = self.limit.to_string();
        let params = [
            (
                "ggscoord",
                format!("{}|{}", coordinate.latitude, coordinate.longitude),
            ),
            ("action", "query".to_string()),
            ("prop", "coordinates|pageimages|pageterms".to_string()),
            ("colimit", limit.clone()),
            ("piprop", "thumbnail".to_string()),
            ("pithumbsize", self.thumbnail_size.to_string()),
            ("pilimit", limit.clone()),
            ("wbptterms", "description".to_string()),
            ("generator", "geosearch".to_string()),
            ("ggsradius", self.radius_meters.to_string()),
            ("ggslimit", limit),
            ("format", "json".to_string()),
        ];
        Url::parse_with_params(&self.endpoint, &params)
            .map_err(|err| FetchError::InvalidUrl(format!("{}: {err}", self.endpoint)))
    }
}

#[derive(Deserialize)]
struct GeosearchResponse {
    query: GeosearchQuery,
}

#[derive(Deserialize)]
struct GeosearchQuery {
    pages: HashMap<String, NearbyPage>,
}

/// Decodes a geosearch body into pages sorted by title.
pub fn parse_geosearch_response(body: &[u8]) -> Result<Vec<NearbyPage>, FetchError> {
    let response: GeosearchResponse = serde_json::from_slice(body).map_err(FetchError::Decode)?;
    let mut pages = response.query.pages.into_values().collect::<Vec<_>>();
    pages.sort();
    Ok(pages)
}

/// `reqwest`-backed geosearch page source.
#[derive(Debug, Clone)]
pub struct WikipediaGeosearch {
    client: reqwest::Client,
    config: GeosearchConfig,
}

impl WikipediaGeosearch {
    pub fn new(config: GeosearchConfig) -> Result<Self, FetchError> {
        let mut builder = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout);
        if !config.use_system_proxy {
            builder = builder.no_proxy();
        }
        let client = builder.build()?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl PageSource for WikipediaGeosearch {
    async fn nearby_pages(&self, coordinate: Coordinate) -> Result<Vec<NearbyPage>, FetchError> {
        let started_at = Instant::now();
        let url = self.config.request_url(coordinate)?;

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!(
                "event=nearby_fetch module=nearby status=error http_status={} duration_ms={}",
                status.as_u16(),
                started_at.elapsed().as_millis()
            );
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        let pages = parse_geosearch_response(&body)?;
        debug!(
            "event=nearby_fetch module=nearby status=ok pages={} duration_ms={}",
            pages.len(),
            started_at.elapsed().as_millis()
        );
        Ok(pages)
    }
}
