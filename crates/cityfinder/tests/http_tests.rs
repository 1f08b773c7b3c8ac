//! HTTP tests: the router served on an ephemeral port, queried with reqwest.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use cityfinder::data_processing::{TestDataConfig, create_test_data};
use cityfinder::store::{CitiesIter, StoreStats};
use cityfinder::{CityRecord, CityService, CityStore, ServiceConfig, server};
use reqwest::StatusCode;
use serde_json::{Value, json};
use tokio::net::TcpListener;

async fn serve(service: CityService, config: ServiceConfig) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        server::serve_listener(listener, Arc::new(service), &config, std::future::pending())
            .await
            .unwrap();
    });
    addr
}

async fn spawn_server() -> SocketAddr {
    let _ = cityfinder::init_logging(tracing::Level::WARN);

    let file = create_test_data(&TestDataConfig::sample()).expect("Should create test data");
    let config = ServiceConfig::builder().data_file(file.path()).build();
    let service = CityService::load(config.clone())
        .await
        .expect("Should load service");

    serve(service, config).await
}

/// One city, and a scan that takes far longer than any sane request timeout.
struct SlowStore {
    city: CityRecord,
}

impl CityStore for SlowStore {
    fn get_by_id(&self, id: u32) -> Option<&CityRecord> {
        (id == self.city.geoname_id).then_some(&self.city)
    }

    fn scan<'a>(&'a self, _country: Option<&'a str>) -> CitiesIter<'a> {
        std::thread::sleep(Duration::from_millis(300));
        Box::new(std::iter::once(&self.city))
    }

    fn stats(&self) -> StoreStats {
        StoreStats {
            cities: 1,
            countries: 1,
        }
    }
}

async fn get(addr: SocketAddr, path_and_query: &str) -> (StatusCode, Value) {
    let response = reqwest::get(format!("http://{addr}{path_and_query}"))
        .await
        .unwrap();
    let status = response.status();
    (status, response.json().await.unwrap())
}

#[tokio::test]
async fn test_proximity_endpoint() {
    let addr = spawn_server().await;

    let (status, body) = get(addr, "/city/proximity?city_id=5392171&top_k=2&country_restriction=US").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "closest_cities_by_proximity": [["San Jose", 5392171], ["San Francisco", 5391959]]
        })
    );
}

#[tokio::test]
async fn test_proximity_unknown_city_is_404() {
    let addr = spawn_server().await;

    let (status, body) = get(addr, "/city/proximity?city_id=1&top_k=2").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error_msg": "Did not find city_id=1"}));
}

#[tokio::test]
async fn test_proximity_missing_params_are_400() {
    let addr = spawn_server().await;

    let (status, body) = get(addr, "/city/proximity?city_id=5392171").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error_msg": "Could not find `top_k` parameter"}));

    let (status, body) = get(addr, "/city/proximity?top_k=3").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error_msg": "Could not find `city_id` parameter"}));

    // top_k is checked first, and a non-integer counts as missing.
    let (status, body) = get(addr, "/city/proximity?city_id=abc&top_k=ten").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error_msg": "Could not find `top_k` parameter"}));
}

#[tokio::test]
async fn test_lexicographical_endpoint() {
    let addr = spawn_server().await;

    let (status, body) = get(
        addr,
        "/city/lexicographical?city_name_match_str=san%20jose&country_restriction=US",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "closest_cities_by_lexicography": [["San Jacinto Jose", 9900001], ["San Jose", 5392171]]
        })
    );
}

#[tokio::test]
async fn test_lexicographical_top_k_and_bad_top_k() {
    let addr = spawn_server().await;

    let (status, body) = get(addr, "/city/lexicographical?city_name_match_str=&top_k=3").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["closest_cities_by_lexicography"].as_array().unwrap().len(), 3);

    // Not an integer, so the default limit applies.
    let (status, body) = get(addr, "/city/lexicographical?city_name_match_str=&top_k=lots").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["closest_cities_by_lexicography"].as_array().unwrap().len(), 40);
}

#[tokio::test]
async fn test_lexicographical_missing_match_str_is_400() {
    let addr = spawn_server().await;

    let (status, body) = get(addr, "/city/lexicographical?top_k=3").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({"error_msg": "Could not find `city_name_match_str` parameter"})
    );
}

#[tokio::test]
async fn test_health() {
    let addr = spawn_server().await;

    let (status, body) = get(addr, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok", "cities": 40}));
}

#[tokio::test]
async fn test_query_timeout_is_500() {
    let _ = cityfinder::init_logging(tracing::Level::WARN);

    let store = SlowStore {
        city: CityRecord {
            geoname_id: 7,
            name: "Slowtown".to_string(),
            asciiname: "Slowtown".to_string(),
            country_code: "ZZ".to_string(),
            ..Default::default()
        },
    };
    let config = ServiceConfig::builder()
        .request_timeout(Duration::from_millis(1))
        .unwrap()
        .build();
    let addr = serve(CityService::new(store, 100), config).await;

    let (status, body) = get(addr, "/city/proximity?city_id=7&top_k=1").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let msg = body["error_msg"].as_str().unwrap();
    assert!(msg.starts_with("Query timed out"), "{msg}");

    let (status, body) = get(addr, "/city/lexicographical?city_name_match_str=slow").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error_msg"].as_str().unwrap().starts_with("Query timed out"));
}
