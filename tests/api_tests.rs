//! HTTP API tests driven through the router without a listener

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use ransomwatch::api::{create_router, AppState};
use ransomwatch::models::Dataset;
use ransomwatch::storage::ThreatIntelRepo;

const DATA: &str = r##"{
    "advisories": {
        "aa23-061a": {
            "title": "#StopRansomware: Royal Ransomware",
            "url": "https://www.cisa.gov/news-events/cybersecurity-advisories/aa23-061a",
            "published": "2023-03-02"
        },
        "aa1": {"title": "#StopRansomware: Foo", "url": "http://x", "published": null}
    },
    "iocs": [
        {"type": "ipv4-addr", "value": "193.233.254.21", "advisory_id": "aa23-061a", "source": "stix"},
        {"type": "ipv4-addr", "value": "10.0.0.1", "advisory_id": "aa1", "source": "CISA"},
        {"type": "ipv4-addr", "value": "10.0.0.1", "advisory_id": "aa1", "source": "CISA"},
        {"type": "domain-name", "value": "evil.example.com", "advisory_id": "aa23-061a", "source": "stix"}
    ],
    "stats": {"advisory_count": 2, "ioc_count": 4}
}"##;

fn app() -> axum::Router {
    let dataset = Dataset::from_json(DATA).unwrap();
    create_router(Arc::new(AppState {
        repo: ThreatIntelRepo::new(dataset),
    }))
}

async fn get_json(uri: &str) -> (StatusCode, Value) {
    let response = app()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_health_reports_dataset_size() {
    let (status, json) = get_json("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["advisories"], 2);
    assert_eq!(json["iocs"], 4);
}

#[tokio::test]
async fn test_lookup_direct_link_parameter() {
    let (status, json) = get_json("/api/v1/lookup?ip=10%5B.%5D0%5B.%5D0%5B.%5D1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["query"], "10[.]0[.]0[.]1");
    assert_eq!(json["normalized"], "10.0.0.1");
    assert_eq!(json["found"], true);
    assert_eq!(
        json["matches"],
        json!([{
            "advisory_id": "aa1",
            "title": "Foo",
            "url": "http://x",
            "source": "CISA",
            "published": null
        }])
    );
}

#[tokio::test]
async fn test_lookup_missing_parameter() {
    let (status, json) = get_json("/api/v1/lookup").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Missing 'ip' parameter");
}

#[tokio::test]
async fn test_lookup_invalid_address_is_data() {
    let (status, json) = get_json("/api/v1/lookup/999.1.1.1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["error"], "Invalid IPv4 address");
    assert_eq!(json["normalized"], "999.1.1.1");
    assert!(json.get("found").is_none());
}

#[tokio::test]
async fn test_lookup_by_path_not_found() {
    let (status, json) = get_json("/api/v1/lookup/8.8.8.8").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["found"], false);
    assert_eq!(json["matches"], json!([]));
}

#[tokio::test]
async fn test_stats_and_groups() {
    let (_, stats) = get_json("/api/v1/stats").await;
    assert_eq!(stats["advisory_count"], 2);
    assert_eq!(stats["ioc_count"], 4);
    assert_eq!(stats["ipv4_count"], 3);
    assert_eq!(stats["group_count"], 2);
    assert_eq!(stats["by_type"]["domain-name"], 1);

    let (_, groups) = get_json("/api/v1/groups").await;
    assert_eq!(groups[0]["name"], "Foo");
    assert_eq!(groups[1]["name"], "Royal Ransomware");
    assert_eq!(groups[1]["advisory_id"], "aa23-061a");
}

#[tokio::test]
async fn test_get_advisory() {
    let (status, json) = get_json("/api/v1/advisories/aa23-061a").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["published"], "2023-03-02");

    let (status, _) = get_json("/api/v1/advisories/aa99-999z").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_scan_text() {
    let body = json!({ "text": "beacons to 193[.]233[.]254[.]21 and 8.8.8.8" }).to_string();
    let response = app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/scan")
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["total"], 2);
    assert_eq!(json["found"], 1);
    assert_eq!(json["results"][0]["matches"][0]["title"], "Royal Ransomware");
    assert_eq!(json["results"][1]["normalized"], "8.8.8.8");
}
