//! Find named places (businesses, amenities) inside a geographic area.
//!
//! The pipeline resolves a free-text location to a bounding region, tiles
//! the region when it is larger than one query can politely cover, fetches
//! tagged map features for every tile from an Overpass-style interpreter,
//! folds the raw elements into deduplicated [`pipeline::aggregate::Place`]
//! records, and optionally crawls each place's website for contact and
//! social metadata.
//!
//! Entry point: [`pipeline::Scout`].

pub mod enrichment;
pub mod geo;
pub mod geocoding;
pub mod net;
pub mod output;
pub mod pipeline;
pub mod spatial;

/// Identifying client header sent to every remote service.
pub const USER_AGENT: &str = concat!(
    "geoscout/",
    env!("CARGO_PKG_VERSION"),
    " (+https://github.com/geoscout/geoscout)"
);
