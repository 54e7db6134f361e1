//! Query an Overpass-style interpreter for tagged features in a region.
//!
//! One rate-limited POST per tile; the interpreter evaluates the QL payload
//! and returns `{elements: [...]}`. Ways and relations carry a centroid
//! instead of a direct point (the query asks for `out center`), which
//! [`Element::coordinate`] papers over for callers.

pub mod query;

use crate::geo::Region;
use crate::net::rate_limiter::RateLimiter;
use query::TagQuery;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Public Overpass API interpreter endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://overpass-api.de/api/interpreter";

/// Minimum spacing between interpreter calls. The service throttles on
/// query complexity more than rate, but two seconds keeps us clearly
/// inside its fair-use expectations.
pub const MIN_DELAY: Duration = Duration::from_secs(2);

/// A failed interpreter round trip (transport, status, or decode).
#[derive(Debug, Error)]
#[error("interpreter request failed: {0}")]
pub struct SpatialError(#[from] reqwest::Error);

/// Geometry kind of a returned element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Node,
    Way,
    Relation,
}

impl ElementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementKind::Node => "node",
            ElementKind::Way => "way",
            ElementKind::Relation => "relation",
        }
    }
}

/// Centroid emitted for ways and relations under `out center`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Center {
    pub lat: f64,
    pub lon: f64,
}

/// One raw feature from the interpreter.
#[derive(Debug, Clone, Deserialize)]
pub struct Element {
    #[serde(rename = "type")]
    pub kind: ElementKind,
    pub id: i64,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
    #[serde(default)]
    pub center: Option<Center>,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

impl Element {
    /// The element's point: direct coordinates when present, otherwise the
    /// centroid. `None` when the interpreter provided neither.
    pub fn coordinate(&self) -> Option<(f64, f64)> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => self.center.map(|c| (c.lat, c.lon)),
        }
    }
}

#[derive(Debug, Deserialize)]
struct InterpreterResponse {
    #[serde(default)]
    elements: Vec<Element>,
}

/// Client for the spatial feature interpreter.
pub struct SpatialClient {
    http: reqwest::Client,
    limiter: Arc<RateLimiter>,
    endpoint: String,
}

impl SpatialClient {
    pub fn new(http: reqwest::Client, limiter: Arc<RateLimiter>) -> Self {
        Self::with_endpoint(http, limiter, DEFAULT_ENDPOINT)
    }

    /// Point the client at a different interpreter (tests, mirrors).
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

    /// Fetch every element matching `tag_query` inside `region`.
    ///
    /// Callers decide what a failure means; the pipeline treats a failed
    /// tile as empty and keeps going.
    pub async fn fetch(
        &self,
        region: &Region,
        tag_query: &TagQuery,
    ) -> Result<Vec<Element>, SpatialError> {
        let ql = tag_query.to_overpass_ql(region);

        let _guard = self.limiter.acquire().await;
        debug!(area = region.area_sq_deg(), "dispatching interpreter query");

        let response = self
            .http
            .post(&self.endpoint)
            .form(&[("data", ql.as_str())])
            .send()
            .await?
            .error_for_status()?;

        let body: InterpreterResponse = response.json().await?;
        Ok(body.elements)
    }
}
