//! Normalize raw elements into deduplicated place records.
//!
//! A pure, single-pass fold: no I/O, order-sensitive only in that the
//! first tile to yield an element id wins. Tiles returned by overlapping
//! or adjacent queries routinely repeat elements, so identity is the
//! element id, which the data source keeps globally unique.

use crate::spatial::query::FEATURE_KEYS;
use crate::spatial::{Element, ElementKind};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Category assigned when no tag value matches a search term.
pub const OTHER_CATEGORY: &str = "other";

/// A normalized, deduplicated place record — the pipeline's output unit.
///
/// Aggregation fills everything through `category`; the enrichment crawl
/// fills the remaining fields and never touches the earlier ones.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Place {
    pub id: i64,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub kind: ElementKind,
    pub tags: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_street: Option<String>,
    pub category: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extracted_emails: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub social_links: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enrichment_error: Option<String>,
}

/// Folds per-tile element batches into deduplicated places.
pub struct Aggregator {
    terms: Vec<String>,
    seen: HashSet<i64>,
    places: Vec<Place>,
}

impl Aggregator {
    pub fn new(terms: &[String]) -> Self {
        Self {
            terms: terms.to_vec(),
            seen: HashSet::new(),
            places: Vec::new(),
        }
    }

    /// Fold one tile's elements in, in the order the tile returned them.
    ///
    /// Skips elements whose id was already seen, elements without a
    /// non-empty `name` tag, and elements with no resolvable coordinate.
    /// Only elements that become places mark their id as seen.
    pub fn push_tile(&mut self, elements: Vec<Element>) {
        for element in elements {
            if self.seen.contains(&element.id) {
                continue;
            }
            let Some(name) = element
                .tags
                .get("name")
                .filter(|name| !name.is_empty())
                .cloned()
            else {
                continue;
            };
            let Some((lat, lon)) = element.coordinate() else {
                continue;
            };

            self.seen.insert(element.id);
            let tags = element.tags;
            self.places.push(Place {
                id: element.id,
                name,
                lat,
                lon,
                kind: element.kind,
                phone: first_tag(&tags, &["phone", "contact:phone"]),
                website: first_tag(&tags, &["website", "contact:website"]),
                address_city: tags.get("addr:city").cloned(),
                address_street: tags.get("addr:street").cloned(),
                category: categorize(&tags, &self.terms),
                tags,
                extracted_emails: Vec::new(),
                social_links: BTreeMap::new(),
                meta_description: None,
                enrichment_error: None,
            });
        }
    }

    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }

    pub fn finish(self) -> Vec<Place> {
        self.places
    }
}

fn first_tag(tags: &BTreeMap<String, String>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| tags.get(*key).cloned())
}

/// First tag value equal to a search term wins. [`FEATURE_KEYS`] are
/// scanned in priority order, then any remaining tags in sorted key order,
/// so the result never depends on map iteration order.
fn categorize(tags: &BTreeMap<String, String>, terms: &[String]) -> String {
    for key in FEATURE_KEYS {
        if let Some(value) = tags.get(key) {
            if terms.iter().any(|term| term == value) {
                return value.clone();
            }
        }
    }
    for (key, value) in tags {
        if FEATURE_KEYS.contains(&key.as_str()) {
            continue;
        }
        if terms.iter().any(|term| term == value) {
            return value.clone();
        }
    }
    OTHER_CATEGORY.to_string()
}
