//! Crawl place websites for contact and social metadata.
//!
//! Each place is enriched independently: one GET with a short timeout, then
//! extraction over the returned HTML. A failure of any kind marks the place
//! with `enrichment_error` and leaves every other field untouched, so one
//! dead website never poisons the batch.

pub mod extract;

use crate::pipeline::aggregate::Place;
use std::time::Duration;
use tracing::{debug, warn};

/// Bounded per-page fetch time. Business sites are small; anything slower
/// than this is not worth holding the batch for.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Website crawler for place enrichment.
pub struct Enricher {
    http: reqwest::Client,
    timeout: Duration,
}

impl Enricher {
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Crawl `place`'s website and attach whatever the page yields.
    ///
    /// Places without a website pass through unchanged. Failures set
    /// `enrichment_error` only; extracted collections land in their own
    /// fields and never overwrite the normalized tag data.
    pub async fn enrich(&self, mut place: Place) -> Place {
        let Some(website) = place.website.clone().filter(|w| !w.is_empty()) else {
            return place;
        };
        let target = ensure_scheme(&website);
        debug!(place = %place.name, url = %target, "crawling website");

        let html = match self.fetch_page(&target).await {
            Ok(html) => html,
            Err(e) => {
                warn!(place = %place.name, error = %e, "enrichment fetch failed");
                place.enrichment_error = Some(e.to_string());
                return place;
            }
        };

        // The DOM type is not Send; parse and extract off the runtime.
        let base = target.clone();
        match tokio::task::spawn_blocking(move || extract::extract_page(&html, &base)).await {
            Ok(extracted) => {
                place.extracted_emails = extracted.emails.into_iter().collect();
                place.social_links = extracted.social_links;
                place.meta_description = extracted.meta_description;
            }
            Err(e) => {
                warn!(place = %place.name, error = %e, "extraction task failed");
                place.enrichment_error = Some(format!("extraction failed: {e}"));
            }
        }
        place
    }

    async fn fetch_page(&self, url: &str) -> Result<String, reqwest::Error> {
        let response = self
            .http
            .get(url)
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?;
        response.text().await
    }
}

/// Prepend `http://` when the stored website has no scheme — a correction
/// applied before the first attempt, not a retry.
pub fn ensure_scheme(website: &str) -> String {
    if website.starts_with("http://") || website.starts_with("https://") {
        website.to_string()
    } else {
        format!("http://{website}")
    }
}
