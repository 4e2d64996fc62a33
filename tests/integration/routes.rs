//! HTTP surface tests
//!
//! Tests for the endpoints exposed by the relay:
//! - POST /v1beta/models/{model}:generateContent
//! - POST /v1beta/models/{model}:streamGenerateContent
//! - GET /api/proxy/test
//! - GET /health, /health/ready, /health/live, /metrics

use axum::http::{HeaderName, HeaderValue, StatusCode};
use pretty_assertions::assert_eq;
use reqwest::Url;
use serde_json::{json, Value};
use wiremock::{
    matchers::{method, path},
    Mock, ResponseTemplate,
};

use gemini_relay::routes::metrics::init_metrics;

use crate::common::{self, constants::*};
use crate::mocks::{GeminiTestData, MockGemini};

#[tokio::test]
async fn test_health_reports_relay_settings() {
    let server = common::test_server(common::app_config("http://127.0.0.1:9/v1beta"));

    let response = server.get("/health").await;
    response.assert_status_ok();

    let json: Value = response.json();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(json["relay"]["base_url"], "http://127.0.0.1:9/v1beta");
    assert_eq!(json["relay"]["proxy_enabled"], false);
    assert!(json.get("uptime_seconds").is_some());
    assert!(json.get("timestamp").is_some());
}

#[tokio::test]
async fn test_liveness_and_readiness() {
    let server = common::test_server(common::app_config("http://127.0.0.1:9/v1beta"));

    for path in ["/health/live", "/health/ready"] {
        let response = server.get(path).await;
        response.assert_status_ok();
        let json: Value = response.json();
        assert_eq!(json["status"], "healthy");
    }
}

#[tokio::test]
async fn test_metrics_endpoint() {
    init_metrics();
    let server = common::test_server(common::app_config("http://127.0.0.1:9/v1beta"));

    let response = server.get("/metrics").await;
    response.assert_status_ok();
}

#[tokio::test]
async fn test_generate_with_query_key() {
    let upstream = MockGemini::start().await;
    upstream
        .mock_generate_for_key(TEST_MODEL, TEST_API_KEY, GeminiTestData::simple_response())
        .await;

    let server = common::test_server(common::app_config(&upstream.base_url()));
    let response = server
        .post("/v1beta/models/gemini-pro:generateContent")
        .add_query_param("key", TEST_API_KEY)
        .json(&GeminiTestData::simple_request())
        .await;

    response.assert_status_ok();
    let json: Value = response.json();
    assert_eq!(json, GeminiTestData::simple_response());
}

#[tokio::test]
async fn test_generate_with_header_key() {
    let upstream = MockGemini::start().await;
    upstream
        .mock_generate_for_key(TEST_MODEL, "header-key", GeminiTestData::simple_response())
        .await;

    let server = common::test_server(common::app_config(&upstream.base_url()));
    let response = server
        .post("/v1beta/models/gemini-pro-search:generateContent")
        .add_header(
            HeaderName::from_static("x-goog-api-key"),
            HeaderValue::from_static("header-key"),
        )
        .json(&GeminiTestData::simple_request())
        .await;

    response.assert_status_ok();
}

#[tokio::test]
async fn test_generate_with_configured_key() {
    let upstream = MockGemini::start().await;
    upstream
        .mock_generate_for_key(TEST_MODEL, "configured-key", GeminiTestData::simple_response())
        .await;

    let mut config = common::app_config(&upstream.base_url());
    config.api_key = Some("configured-key".to_string());
    let server = common::test_server(config);

    let response = server
        .post("/v1beta/models/gemini-pro:generateContent")
        .json(&GeminiTestData::simple_request())
        .await;

    response.assert_status_ok();
}

#[tokio::test]
async fn test_generate_without_key_is_bad_request() {
    let server = common::test_server(common::app_config("http://127.0.0.1:9/v1beta"));

    let response = server
        .post("/v1beta/models/gemini-pro:generateContent")
        .json(&GeminiTestData::simple_request())
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let json: Value = response.json();
    assert_eq!(json["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_unknown_action_is_not_found() {
    let server = common::test_server(common::app_config("http://127.0.0.1:9/v1beta"));

    let response = server
        .post("/v1beta/models/gemini-pro:countTokens")
        .add_query_param("key", TEST_API_KEY)
        .json(&GeminiTestData::simple_request())
        .await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_upstream_rejection_is_relayed() {
    let upstream = MockGemini::start().await;
    let body = GeminiTestData::location_error();
    upstream.mock_generate_error(TEST_MODEL, 403, &body).await;

    let server = common::test_server(common::app_config(&upstream.base_url()));
    let response = server
        .post("/v1beta/models/gemini-pro:generateContent")
        .add_query_param("key", TEST_API_KEY)
        .json(&GeminiTestData::simple_request())
        .await;

    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
    assert_eq!(response.text(), body);
}

#[tokio::test]
async fn test_unreachable_upstream_is_server_error() {
    let base_url = format!("http://127.0.0.1:{}/v1beta", common::closed_port());
    let server = common::test_server(common::app_config(&base_url));

    let response = server
        .post("/v1beta/models/gemini-pro:generateContent")
        .add_query_param("key", TEST_API_KEY)
        .json(&GeminiTestData::simple_request())
        .await;

    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    let json: Value = response.json();
    assert_eq!(json["error"]["code"], "TRANSPORT_FAILURE");
}

#[tokio::test]
async fn test_stream_endpoint_relays_lines() {
    let upstream = MockGemini::start().await;
    let first = GeminiTestData::sse_data_line("Hi");
    upstream.mock_stream_lines(TEST_MODEL, &[&first, ""]).await;

    let server = common::test_server(common::app_config(&upstream.base_url()));
    let response = server
        .post("/v1beta/models/gemini-pro:streamGenerateContent")
        .add_query_param("key", TEST_API_KEY)
        .json(&GeminiTestData::simple_request())
        .await;

    response.assert_status_ok();
    assert_eq!(response.header("content-type"), "text/event-stream");
    assert_eq!(response.text(), format!("{}\n\n", first));
}

#[tokio::test]
async fn test_stream_endpoint_relays_rejection_status() {
    let upstream = MockGemini::start().await;
    upstream
        .mock_stream_error_expect(TEST_MODEL, 429, "quota exhausted", 1)
        .await;

    let server = common::test_server(common::app_config(&upstream.base_url()));
    let response = server
        .post("/v1beta/models/gemini-pro:streamGenerateContent")
        .add_query_param("key", TEST_API_KEY)
        .json(&GeminiTestData::simple_request())
        .await;

    assert_eq!(response.status_code(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.text(), "quota exhausted");
}

#[tokio::test]
async fn test_proxy_test_endpoint_when_disabled() {
    let server = common::test_server(common::app_config("http://127.0.0.1:9/v1beta"));

    let response = server.get("/api/proxy/test").await;
    response.assert_status_ok();

    let json: Value = response.json();
    assert_eq!(json["status"], "disabled");
    assert_eq!(json["message"], "Proxy is not enabled");
}

#[tokio::test]
async fn test_proxy_test_endpoint_reports_origin() {
    let proxy = MockGemini::start().await;
    Mock::given(method("GET"))
        .and(path("/ip"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "origin": "198.51.100.4" })))
        .expect(1)
        .mount(proxy.server())
        .await;

    let mut config = common::app_config("http://127.0.0.2:9/v1beta");
    config.proxy_enabled = true;
    config.http_proxy = Some(Url::parse(&proxy.uri()).unwrap());
    config.proxy_test_url = Url::parse("http://127.0.0.2:9/ip").unwrap();
    let server = common::test_server(config);

    let response = server.get("/api/proxy/test").await;
    response.assert_status_ok();

    let json: Value = response.json();
    assert_eq!(json["status"], "success");
    assert_eq!(json["origin_ip"], "198.51.100.4");
}
