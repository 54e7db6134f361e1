//! Synchronous HTML extraction for the enrichment crawl.
//!
//! Everything here is CPU-only and runs inside `spawn_blocking` — the
//! parsed DOM is not `Send`, so it must never cross an await point.

use regex::Regex;
use scraper::{Html, Selector};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;
use url::Url;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").unwrap());

/// Social and review platforms worth surfacing, by registrable domain.
pub const SOCIAL_PLATFORMS: [&str; 6] = [
    "facebook.com",
    "instagram.com",
    "twitter.com",
    "linkedin.com",
    "yelp.com",
    "tripadvisor.com",
];

/// Everything pulled out of one fetched page.
#[derive(Debug, Default)]
pub struct PageExtract {
    pub emails: BTreeSet<String>,
    /// Network short name (e.g. `facebook`) to the first link seen for it.
    pub social_links: BTreeMap<String, String>,
    pub meta_description: Option<String>,
}

/// Run all extractors over one HTML document.
///
/// `base_url` anchors relative links when matching against the platform
/// allow-list.
pub fn extract_page(html: &str, base_url: &str) -> PageExtract {
    let document = Html::parse_document(html);
    let mut out = PageExtract::default();

    // Emails: pattern matches over the document text...
    let text = document.root_element().text().collect::<Vec<_>>().join(" ");
    for m in EMAIL_RE.find_iter(&text) {
        out.emails.insert(m.as_str().to_string());
    }

    // ...unioned with mailto: anchors, which survive even when the page
    // never prints the address. The same anchor pass collects social links.
    if let Ok(sel) = Selector::parse("a[href]") {
        for el in document.select(&sel) {
            let Some(href) = el.value().attr("href") else {
                continue;
            };
            if let Some(target) = href.strip_prefix("mailto:") {
                let addr = target.split('?').next().unwrap_or(target).trim();
                if EMAIL_RE.is_match(addr) {
                    out.emails.insert(addr.to_string());
                }
                continue;
            }
            if let Some((network, link)) = social_link(href, base_url) {
                out.social_links.entry(network).or_insert(link);
            }
        }
    }

    out.meta_description = meta_description(&document);
    out
}

/// Match an anchor against the platform allow-list.
///
/// Relative links resolve against `base_url`; the host comparison drops
/// the scheme and any leading `www.`.
fn social_link(href: &str, base_url: &str) -> Option<(String, String)> {
    let base = Url::parse(base_url).ok()?;
    let resolved = base.join(href).ok()?;
    let host = resolved.host_str()?.to_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);

    for platform in SOCIAL_PLATFORMS {
        if host == platform || host.ends_with(&format!(".{platform}")) {
            let network = platform.split('.').next().unwrap_or(platform);
            return Some((network.to_string(), resolved.to_string()));
        }
    }
    None
}

fn meta_description(document: &Html) -> Option<String> {
    let sel = Selector::parse(r#"meta[name="description"]"#).ok()?;
    document
        .select(&sel)
        .find_map(|el| el.value().attr("content"))
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty())
}
