//! Tag queries and Overpass QL text assembly.

use crate::geo::Region;

/// OSM feature keys searched for every user term, in priority order.
///
/// The order is load-bearing twice over: filters are emitted in this order,
/// and category resolution scans these keys first, so a value match on
/// `amenity` beats one on `leisure`.
pub const FEATURE_KEYS: [&str; 5] = ["amenity", "shop", "office", "tourism", "leisure"];

/// Server-side evaluation timeout embedded in every query.
pub const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 60;

/// An ordered set of tag filters: each feature key paired with the
/// candidate values to match. Built once per run from the user's search
/// terms and applied identically to every tile.
#[derive(Debug, Clone)]
pub struct TagQuery {
    entries: Vec<(String, Vec<String>)>,
    timeout_secs: u64,
}

impl TagQuery {
    /// Search every feature key in [`FEATURE_KEYS`] for each term.
    pub fn for_terms(terms: &[String]) -> Self {
        let entries = FEATURE_KEYS
            .iter()
            .map(|key| (key.to_string(), terms.to_vec()))
            .collect();
        Self {
            entries,
            timeout_secs: DEFAULT_QUERY_TIMEOUT_SECS,
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn entries(&self) -> &[(String, Vec<String>)] {
        &self.entries
    }

    /// Render the query as Overpass QL for one region.
    ///
    /// Every (key, value) pair gets a filter for each geometry kind, and
    /// `out center` forces a centroid on non-point geometries. The
    /// interpreter wants bounding boxes in `(south, west, north, east)`
    /// order — not the `[south, north, west, east]` order the geocoder
    /// uses — and this is the one place that reorder happens.
    pub fn to_overpass_ql(&self, region: &Region) -> String {
        let bbox = format!(
            "({},{},{},{})",
            region.south, region.west, region.north, region.east
        );

        let mut filters = String::new();
        for (key, values) in &self.entries {
            for value in values {
                for kind in ["node", "way", "relation"] {
                    filters.push_str(&format!(
                        "{kind}[\"{}\"=\"{}\"]{bbox};",
                        escape(key),
                        escape(value)
                    ));
                }
            }
        }

        format!(
            "[out:json][timeout:{}];({filters});out center;",
            self.timeout_secs
        )
    }
}

/// Escape a value for use inside an Overpass QL quoted string.
fn escape(raw: &str) -> String {
    raw.replace('\\', "\\\\").replace('"', "\\\"")
}
