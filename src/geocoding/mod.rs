//! Resolve free-text place names to bounding regions.
//!
//! Speaks the Nominatim search API: one rate-limited GET per lookup with
//! `limit=1`, taking the first match as-is. The response encodes numbers as
//! strings and orders the bounding box `[south, north, west, east]`; both
//! quirks are handled in [`parse_bounds`] rather than assumed away.

use crate::geo::Region;
use crate::net::rate_limiter::RateLimiter;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Public OpenStreetMap Nominatim search endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://nominatim.openstreetmap.org/search";

/// Minimum spacing between lookups. Nominatim's usage policy caps clients
/// at one request per second; 1.1s leaves headroom.
pub const MIN_DELAY: Duration = Duration::from_millis(1100);

/// Why a lookup produced no location.
#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("no match for {0:?}")]
    NotFound(String),
    #[error("geocoding request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("malformed geocoding response: {0}")]
    Malformed(String),
}

/// A place name resolved to a coordinate and bounding region. Produced once
/// per pipeline run and immutable afterward.
#[derive(Debug, Clone)]
pub struct ResolvedLocation {
    pub display_name: String,
    pub lat: f64,
    pub lon: f64,
    pub region: Region,
}

/// One match from the search endpoint. Numeric fields arrive as strings.
#[derive(Debug, Deserialize)]
struct SearchHit {
    display_name: String,
    lat: String,
    lon: String,
    #[serde(default)]
    boundingbox: Vec<String>,
}

/// Client for the place-name search endpoint.
pub struct GeocodingClient {
    http: reqwest::Client,
    limiter: Arc<RateLimiter>,
    endpoint: String,
}

impl GeocodingClient {
    pub fn new(http: reqwest::Client, limiter: Arc<RateLimiter>) -> Self {
        Self::with_endpoint(http, limiter, DEFAULT_ENDPOINT)
    }

    /// Point the client at a different search endpoint (tests, mirrors).
    pub fn with_endpoint(
        http: reqwest::Client,
        limiter: Arc<RateLimiter>,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            http,
            limiter,
            endpoint: endpoint.into(),
        }
    }

    /// Resolve `query` to its first match.
    pub async fn resolve(&self, query: &str) -> Result<ResolvedLocation, GeocodeError> {
        let _guard = self.limiter.acquire().await;
        debug!(query, "dispatching geocoding lookup");

        let response = self
            .http
            .get(&self.endpoint)
            .query(&[
                ("q", query),
                ("format", "json"),
                ("polygon_geojson", "1"),
                ("limit", "1"),
            ])
            .send()
            .await?
            .error_for_status()?;

        let hits: Vec<SearchHit> = response.json().await?;
        let Some(hit) = hits.into_iter().next() else {
            return Err(GeocodeError::NotFound(query.to_string()));
        };

        hit_into_location(hit)
    }
}

fn hit_into_location(hit: SearchHit) -> Result<ResolvedLocation, GeocodeError> {
    let lat = parse_coord(&hit.lat)?;
    let lon = parse_coord(&hit.lon)?;
    let region = parse_bounds(&hit.boundingbox)?;
    Ok(ResolvedLocation {
        display_name: hit.display_name,
        lat,
        lon,
        region,
    })
}

fn parse_coord(raw: &str) -> Result<f64, GeocodeError> {
    raw.parse()
        .map_err(|_| GeocodeError::Malformed(format!("non-numeric coordinate {raw:?}")))
}

/// The endpoint orders bounds `[south, north, west, east]` — not the
/// `(south, west, ...)` order other services use. Reorder explicitly into
/// the canonical [`Region`] fields.
fn parse_bounds(bounds: &[String]) -> Result<Region, GeocodeError> {
    if bounds.len() != 4 {
        return Err(GeocodeError::Malformed(format!(
            "expected 4 bounding box values, got {}",
            bounds.len()
        )));
    }
    let mut parsed = [0f64; 4];
    for (slot, raw) in parsed.iter_mut().zip(bounds) {
        *slot = raw
            .parse()
            .map_err(|_| GeocodeError::Malformed(format!("non-numeric bound {raw:?}")))?;
    }
    let [south, north, west, east] = parsed;
    Region::new(south, north, west, east).map_err(|e| GeocodeError::Malformed(e.to_string()))
}
