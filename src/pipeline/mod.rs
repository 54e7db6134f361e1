//! The search pipeline: geocode, tile, query, aggregate, enrich.
//!
//! A strictly forward sequence. Geocoding failure is the only condition
//! that ends a run early; a failed tile degrades to zero elements and a
//! failed enrichment degrades to an error marker on that one place.

pub mod aggregate;

use crate::enrichment::Enricher;
use crate::geo::TilingPolicy;
use crate::geocoding::{self, GeocodingClient, ResolvedLocation};
use crate::net::rate_limiter::RateLimiter;
use crate::spatial::query::TagQuery;
use crate::spatial::{self, SpatialClient};
use aggregate::{Aggregator, Place};
use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Knobs for one search run.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Crawl each found place's website for contact metadata.
    pub enrich: bool,
    /// Tile queries in flight at once. Dispatch timing is still serialized
    /// by the interpreter's rate limiter; this only pipelines the waiting.
    pub tile_workers: usize,
    /// Enrichment crawls in flight at once.
    pub enrich_workers: usize,
    /// Soft wall-clock budget. Checked between tiles and between
    /// enrichment batches; in-flight calls still finish within their own
    /// timeouts.
    pub time_budget: Option<Duration>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            enrich: false,
            tile_workers: 4,
            enrich_workers: 8,
            time_budget: None,
        }
    }
}

/// What one run produced. An empty outcome is an answer, not an error.
#[derive(Debug, Default)]
pub struct SearchOutcome {
    /// The resolved location, absent when geocoding found nothing.
    pub location: Option<ResolvedLocation>,
    pub places: Vec<Place>,
    pub tiles_queried: usize,
    pub tiles_failed: usize,
}

/// Orchestrates one search end to end.
pub struct Scout {
    geocoder: GeocodingClient,
    spatial: SpatialClient,
    enricher: Enricher,
    tiling: TilingPolicy,
}

impl Scout {
    /// Wire up clients against the public endpoints with their documented
    /// politeness delays.
    pub fn new() -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(crate::USER_AGENT)
            .build()
            .context("building http client")?;

        Ok(Self::with_parts(
            GeocodingClient::new(
                http.clone(),
                Arc::new(RateLimiter::new(1, geocoding::MIN_DELAY)),
            ),
            SpatialClient::new(http.clone(), Arc::new(RateLimiter::new(4, spatial::MIN_DELAY))),
            Enricher::new(http),
            TilingPolicy::default(),
        ))
    }

    /// Assemble a pipeline from pre-built parts (custom endpoints, tests).
    pub fn with_parts(
        geocoder: GeocodingClient,
        spatial: SpatialClient,
        enricher: Enricher,
        tiling: TilingPolicy,
    ) -> Self {
        Self {
            geocoder,
            spatial,
            enricher,
            tiling,
        }
    }

    /// Run one search.
    ///
    /// Returns an empty outcome when the location cannot be resolved;
    /// callers must treat that as "no results", not as a failure.
    pub async fn search(
        &self,
        terms: &[String],
        location: &str,
        options: &SearchOptions,
    ) -> SearchOutcome {
        let started = Instant::now();

        info!(location, ?terms, "resolving location");
        let resolved = match self.geocoder.resolve(location).await {
            Ok(resolved) => resolved,
            Err(e) => {
                warn!(error = %e, "geocoding failed, returning empty outcome");
                return SearchOutcome::default();
            }
        };
        info!(
            display_name = %resolved.display_name,
            area_sq_deg = resolved.region.area_sq_deg(),
            "location resolved"
        );

        let tiles = self.tiling.tile(resolved.region);
        if tiles.len() > 1 {
            info!(tiles = tiles.len(), "region exceeds query area, tiling");
        }

        let tag_query = TagQuery::for_terms(terms);
        let mut aggregator = Aggregator::new(terms);
        let mut tiles_queried = 0;
        let mut tiles_failed = 0;

        // buffered() pipelines requests but yields results in row-major
        // tile order, keeping first-seen-wins dedupe deterministic.
        {
            let tag_query = &tag_query;
            let mut results = stream::iter(tiles.iter().enumerate())
                .map(move |(index, tile)| async move {
                    (index, self.spatial.fetch(tile, tag_query).await)
                })
                .buffered(options.tile_workers.max(1));

            while let Some((index, result)) = results.next().await {
                tiles_queried += 1;
                match result {
                    Ok(elements) => {
                        debug!(tile = index, elements = elements.len(), "tile fetched");
                        aggregator.push_tile(elements);
                    }
                    Err(e) => {
                        tiles_failed += 1;
                        warn!(tile = index, error = %e, "tile query failed, treating as empty");
                    }
                }
                if budget_spent(started, options.time_budget) {
                    warn!("time budget exhausted, stopping tile queries");
                    break;
                }
            }
        }

        let mut places = aggregator.finish();
        info!(
            places = places.len(),
            tiles_queried, tiles_failed, "aggregation complete"
        );

        if options.enrich && !places.is_empty() {
            places = self.enrich_all(places, options, started).await;
        }

        SearchOutcome {
            location: Some(resolved),
            places,
            tiles_queried,
            tiles_failed,
        }
    }

    /// Fan the places out through bounded-concurrency enrichment.
    ///
    /// Runs in batches so the time budget can be honored between places;
    /// once spent, the remaining places pass through un-enriched rather
    /// than being dropped.
    async fn enrich_all(
        &self,
        places: Vec<Place>,
        options: &SearchOptions,
        started: Instant,
    ) -> Vec<Place> {
        info!(places = places.len(), "starting enrichment crawl");
        let batch_size = options.enrich_workers.max(1);
        let mut remaining = places.into_iter();
        let mut out = Vec::new();

        loop {
            if budget_spent(started, options.time_budget) {
                let rest: Vec<Place> = remaining.by_ref().collect();
                if !rest.is_empty() {
                    warn!(
                        skipped = rest.len(),
                        "time budget exhausted, skipping remaining enrichment"
                    );
                    out.extend(rest);
                }
                break;
            }

            let batch: Vec<Place> = remaining.by_ref().take(batch_size).collect();
            if batch.is_empty() {
                break;
            }
            let enriched =
                futures::future::join_all(batch.into_iter().map(|place| self.enricher.enrich(place)))
                    .await;
            out.extend(enriched);
        }

        let failures = out.iter().filter(|p| p.enrichment_error.is_some()).count();
        info!(places = out.len(), failures, "enrichment complete");
        out
    }
}

fn budget_spent(started: Instant, budget: Option<Duration>) -> bool {
    budget.is_some_and(|budget| started.elapsed() >= budget)
}
