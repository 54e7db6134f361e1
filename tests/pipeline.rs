//! End-to-end pipeline behaviour against mock HTTP services.

use geoscout::enrichment::Enricher;
use geoscout::geo::TilingPolicy;
use geoscout::geocoding::GeocodingClient;
use geoscout::net::rate_limiter::RateLimiter;
use geoscout::pipeline::{Scout, SearchOptions};
use geoscout::spatial::SpatialClient;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn terms(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// Wire a pipeline against mock endpoints, with rate limiting disabled so
/// tests run instantly.
fn scout_for(server: &MockServer, tiling: TilingPolicy) -> Scout {
    let http = reqwest::Client::builder()
        .user_agent("geoscout-tests")
        .build()
        .unwrap();
    Scout::with_parts(
        GeocodingClient::with_endpoint(
            http.clone(),
            Arc::new(RateLimiter::new(1, Duration::ZERO)),
            format!("{}/search", server.uri()),
        ),
        SpatialClient::with_endpoint(
            http.clone(),
            Arc::new(RateLimiter::new(4, Duration::ZERO)),
            format!("{}/interpreter", server.uri()),
        ),
        Enricher::new(http).with_timeout(Duration::from_secs(2)),
        tiling,
    )
}

/// Mount a geocoding hit for Springfield: 0.02 sq deg, below the default
/// tiling threshold.
async fn mount_springfield(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "Springfield"))
        .and(query_param("limit", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "display_name": "Springfield, Sangamon County, Illinois",
            "lat": "39.1",
            "lon": "-89.65",
            "boundingbox": ["39.0", "39.2", "-89.7", "-89.6"]
        }])))
        .mount(server)
        .await;
}

#[tokio::test]
async fn springfield_end_to_end() {
    let server = MockServer::start().await;
    mount_springfield(&server).await;

    Mock::given(method("POST"))
        .and(path("/interpreter"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "elements": [
                {
                    "type": "node", "id": 1, "lat": 39.05, "lon": -89.64,
                    "tags": {"name": "Beanery", "amenity": "cafe"}
                },
                {
                    "type": "node", "id": 2, "lat": 39.06, "lon": -89.65,
                    "tags": {"name": "Roasted", "amenity": "cafe"}
                },
                {
                    "type": "node", "id": 3, "lat": 39.07, "lon": -89.66,
                    "tags": {"amenity": "cafe"}
                }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let scout = scout_for(&server, TilingPolicy::default());
    let outcome = scout
        .search(&terms(&["cafe"]), "Springfield", &SearchOptions::default())
        .await;

    assert_eq!(outcome.tiles_queried, 1);
    assert_eq!(outcome.tiles_failed, 0);
    assert!(outcome
        .location
        .as_ref()
        .is_some_and(|l| l.display_name.starts_with("Springfield")));

    // The unnamed element is discarded; the named ones categorize as cafe.
    assert_eq!(outcome.places.len(), 2);
    assert!(outcome.places.iter().all(|p| p.category == "cafe"));
    assert_eq!(outcome.places[0].name, "Beanery");
}

#[tokio::test]
async fn oversized_region_tiles_and_dedupes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "display_name": "Big County",
            "lat": "40.0",
            "lon": "-89.0",
            "boundingbox": ["39.0", "41.0", "-90.0", "-88.0"]
        }])))
        .mount(&server)
        .await;

    // Every tile reports the same two elements; dedupe keeps one copy each.
    Mock::given(method("POST"))
        .and(path("/interpreter"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "elements": [
                {
                    "type": "node", "id": 10, "lat": 40.0, "lon": -89.0,
                    "tags": {"name": "Beanery", "amenity": "cafe"}
                },
                {
                    "type": "way", "id": 11,
                    "center": {"lat": 40.1, "lon": -89.1},
                    "tags": {"name": "Market Hall", "shop": "bakery"}
                }
            ]
        })))
        .expect(4)
        .mount(&server)
        .await;

    let scout = scout_for(&server, TilingPolicy::default());
    let outcome = scout
        .search(&terms(&["cafe", "bakery"]), "Big County", &SearchOptions::default())
        .await;

    assert_eq!(outcome.tiles_queried, 4);
    assert_eq!(outcome.places.len(), 2);

    let market = outcome.places.iter().find(|p| p.id == 11).unwrap();
    assert_eq!(market.category, "bakery");
    // Way geometry: coordinate came from the centroid.
    assert_eq!(market.lat, 40.1);
    assert_eq!(market.lon, -89.1);
}

#[tokio::test]
async fn unresolvable_location_yields_empty_outcome() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let scout = scout_for(&server, TilingPolicy::default());
    let outcome = scout
        .search(&terms(&["cafe"]), "Nowhereville", &SearchOptions::default())
        .await;

    assert!(outcome.location.is_none());
    assert!(outcome.places.is_empty());
    assert_eq!(outcome.tiles_queried, 0);
}

#[tokio::test]
async fn geocoding_transport_failure_is_terminal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let scout = scout_for(&server, TilingPolicy::default());
    let outcome = scout
        .search(&terms(&["cafe"]), "Springfield", &SearchOptions::default())
        .await;

    assert!(outcome.location.is_none());
    assert!(outcome.places.is_empty());
}

#[tokio::test]
async fn failed_tile_degrades_to_empty() {
    let server = MockServer::start().await;
    mount_springfield(&server).await;
    Mock::given(method("POST"))
        .and(path("/interpreter"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let scout = scout_for(&server, TilingPolicy::default());
    let outcome = scout
        .search(&terms(&["cafe"]), "Springfield", &SearchOptions::default())
        .await;

    // The run completes; the tile just contributed nothing.
    assert!(outcome.location.is_some());
    assert!(outcome.places.is_empty());
    assert_eq!(outcome.tiles_queried, 1);
    assert_eq!(outcome.tiles_failed, 1);
}

#[tokio::test]
async fn enrichment_failure_is_isolated_per_place() {
    let server = MockServer::start().await;
    let sites = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/good"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><head>
                <meta name="description" content="Best espresso in town.">
            </head><body>
                <p>Bookings: hello@beanery.example</p>
                <a href="mailto:owner@beanery.example">owner</a>
                <a href="https://www.facebook.com/beanery">facebook</a>
                <a href="https://www.facebook.com/beanery-alt">facebook again</a>
            </body></html>"#,
        ))
        .mount(&sites)
        .await;
    Mock::given(method("GET"))
        .and(path("/bad"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&sites)
        .await;

    mount_springfield(&server).await;
    // One healthy website (no scheme, exercising the prepend), one broken,
    // one place with no website at all.
    let bare_host = sites.uri().strip_prefix("http://").unwrap().to_string();
    Mock::given(method("POST"))
        .and(path("/interpreter"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "elements": [
                {
                    "type": "node", "id": 1, "lat": 39.05, "lon": -89.64,
                    "tags": {
                        "name": "Beanery", "amenity": "cafe",
                        "website": format!("{bare_host}/good"),
                        "phone": "+1 555 0100"
                    }
                },
                {
                    "type": "node", "id": 2, "lat": 39.06, "lon": -89.65,
                    "tags": {
                        "name": "Roasted", "amenity": "cafe",
                        "website": format!("http://{bare_host}/bad")
                    }
                },
                {
                    "type": "node", "id": 3, "lat": 39.07, "lon": -89.66,
                    "tags": {"name": "Quiet Corner", "amenity": "cafe"}
                }
            ]
        })))
        .mount(&server)
        .await;

    let scout = scout_for(&server, TilingPolicy::default());
    let options = SearchOptions {
        enrich: true,
        ..SearchOptions::default()
    };
    let outcome = scout.search(&terms(&["cafe"]), "Springfield", &options).await;

    assert_eq!(outcome.places.len(), 3);
    // Enrichment preserves aggregation order.
    let beanery = &outcome.places[0];
    let roasted = &outcome.places[1];
    let quiet = &outcome.places[2];

    assert_eq!(beanery.name, "Beanery");
    assert!(beanery.enrichment_error.is_none());
    assert_eq!(
        beanery.extracted_emails,
        ["hello@beanery.example", "owner@beanery.example"]
    );
    assert_eq!(
        beanery.social_links.get("facebook").map(String::as_str),
        Some("https://www.facebook.com/beanery")
    );
    assert_eq!(
        beanery.meta_description.as_deref(),
        Some("Best espresso in town.")
    );
    // Normalized fields survive enrichment untouched.
    assert_eq!(beanery.phone.as_deref(), Some("+1 555 0100"));

    // The sibling's failure stays its own: error marker, nothing else.
    assert_eq!(roasted.name, "Roasted");
    assert!(roasted.enrichment_error.is_some());
    assert!(roasted.extracted_emails.is_empty());
    assert!(roasted.social_links.is_empty());
    assert_eq!(roasted.category, "cafe");
    assert_eq!(roasted.website.as_deref(), Some(&*format!("http://{bare_host}/bad")));

    // No website: passed through untouched.
    assert!(quiet.enrichment_error.is_none());
    assert!(quiet.extracted_emails.is_empty());
}
