//! Tests for the product-search API client.

use std::time::Duration;

use wiremock::matchers::{method, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::{build_query, CatalogClient, ClientConfig, QueryStyle, SearchOutcome};

fn test_config(endpoint: String) -> ClientConfig {
    ClientConfig {
        endpoint,
        token: "test-token".to_string(),
        query_style: QueryStyle::Spaced,
        // Keep the tests fast; real deployments use the 2s/5s defaults
        rate_limit: Duration::ZERO,
        backoff: Duration::from_millis(1),
    }
}

fn products_json() -> serde_json::Value {
    serde_json::json!({
        "products": [
            {
                "id": "101",
                "product-name": "Wolverine #12",
                "console-name": "1992 Skybox Marvel Masterpieces",
                "loose-price": 550,
                "cib-price": null,
                "new-price": 1200,
                "image": "https://example.com/wolverine.jpg"
            },
            {
                "id": "102",
                "product-name": "Colossus #64",
                "console-name": "1992 Skybox Marvel Masterpieces"
            }
        ]
    })
}

// ── build_query ──────────────────────────────────────────────────────

#[test]
fn build_query_spaced_keeps_phrase() {
    assert_eq!(
        build_query("1992 Marvel Masterpieces", QueryStyle::Spaced),
        "1992 Marvel Masterpieces"
    );
}

#[test]
fn build_query_dashed_lowercases_and_joins() {
    assert_eq!(
        build_query("1992 SkyBox Marvel Masterpieces", QueryStyle::Dashed),
        "1992-skybox-marvel-masterpieces"
    );
}

#[test]
fn build_query_collapses_extra_whitespace_when_dashed() {
    assert_eq!(
        build_query("  1992   Marvel  Masterpieces ", QueryStyle::Dashed),
        "1992-marvel-masterpieces"
    );
}

// ── CatalogClient::search ────────────────────────────────────────────

#[tokio::test]
async fn search_parses_kebab_case_products() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("query", "1992 Marvel Masterpieces"))
        .and(query_param("auth", "test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(products_json()))
        .mount(&server)
        .await;

    let client = CatalogClient::new(test_config(server.uri()));
    let outcome = client.search("1992 Marvel Masterpieces").await;

    let products = match outcome {
        SearchOutcome::Products(p) => p,
        other => panic!("Expected products, got: {other:?}"),
    };
    assert_eq!(products.len(), 2);
    assert_eq!(products[0].product_name, "Wolverine #12");
    assert_eq!(products[0].console_name, "1992 Skybox Marvel Masterpieces");
    assert_eq!(products[0].loose_price, Some(550));
    assert_eq!(products[0].estimated_value(), Some(5.5));
    assert_eq!(products[1].loose_price, None);
    assert_eq!(products[1].estimated_value(), None);
}

#[tokio::test]
async fn search_uses_dashed_query_style() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("query", "1992-skybox-marvel-masterpieces"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "products": [] })),
        )
        .mount(&server)
        .await;

    let mut config = test_config(server.uri());
    config.query_style = QueryStyle::Dashed;
    let client = CatalogClient::new(config);

    let outcome = client.search("1992 SkyBox Marvel Masterpieces").await;
    assert!(matches!(outcome, SearchOutcome::Products(p) if p.is_empty()));
}

#[tokio::test]
async fn search_returns_fetch_failed_after_three_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let client = CatalogClient::new(test_config(server.uri()));
    let outcome = client.search("1992 Marvel Masterpieces").await;

    match outcome {
        SearchOutcome::FetchFailed {
            query,
            attempts,
            reason,
        } => {
            assert_eq!(query, "1992 Marvel Masterpieces");
            assert_eq!(attempts, 3);
            assert!(reason.contains("503"), "unexpected reason: {reason}");
        }
        other => panic!("Expected FetchFailed, got: {other:?}"),
    }
}

#[tokio::test]
async fn search_recovers_after_transient_error() {
    let server = MockServer::start().await;
    // First request fails, the retry succeeds
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(products_json()))
        .mount(&server)
        .await;

    let client = CatalogClient::new(test_config(server.uri()));
    let outcome = client.search("1992 Marvel Masterpieces").await;

    assert!(matches!(outcome, SearchOutcome::Products(p) if p.len() == 2));
}

#[tokio::test]
async fn search_treats_connection_error_as_fetch_failed() {
    // Nothing listens on this port
    let client = CatalogClient::new(test_config("http://127.0.0.1:9".to_string()));
    let outcome = client.search("1992 Marvel Masterpieces").await;
    assert!(matches!(outcome, SearchOutcome::FetchFailed { .. }));
}

#[tokio::test]
async fn search_handles_missing_products_field() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .mount(&server)
        .await;

    let client = CatalogClient::new(test_config(server.uri()));
    let outcome = client.search("1992 Marvel Masterpieces").await;
    assert!(matches!(outcome, SearchOutcome::Products(p) if p.is_empty()));
}
