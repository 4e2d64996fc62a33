//! Proxy connectivity probe tests
//!
//! A wiremock instance plays the forward proxy and answers for the IP echo
//! endpoint, so the probe target itself never needs to exist.

use pretty_assertions::assert_eq;
use reqwest::Url;
use serde_json::{json, Value};
use wiremock::{
    matchers::{method, path},
    Mock, ResponseTemplate,
};

use gemini_relay::relay::{GenerativeClient, ProbeStatus, RelayError};
use gemini_relay::GeminiRelay;

use crate::common;
use crate::mocks::MockGemini;

fn probe_target() -> Url {
    Url::parse("http://127.0.0.2:9/ip").unwrap()
}

/// Relay whose proxy is `proxy_uri` and whose probe target is the IP echo
fn relay_via(proxy_uri: &str) -> GeminiRelay {
    let mut config = common::proxied_relay_config("http://127.0.0.2:9/v1beta", proxy_uri);
    config.proxy_test_url = probe_target();
    common::relay(&config)
}

async fn mount_ip_echo(proxy: &MockGemini, template: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/ip"))
        .respond_with(template)
        .expect(1)
        .mount(proxy.server())
        .await;
}

#[tokio::test]
async fn test_probe_reports_origin_ip() {
    let proxy = MockGemini::start().await;
    mount_ip_echo(
        &proxy,
        ResponseTemplate::new(200).set_body_json(json!({ "origin": "203.0.113.7" })),
    )
    .await;

    let relay = relay_via(&proxy.uri());
    let report = relay.probe_proxy().await.expect("probe should succeed");

    assert_eq!(report.status, ProbeStatus::Success);
    assert_eq!(report.origin_ip.as_deref(), Some("203.0.113.7"));
    assert_eq!(report.status_code, Some(200));
    assert!(report.proxy.is_some());
    assert_eq!(report.raw_response, None);
}

#[tokio::test]
async fn test_probe_unparsable_body() {
    let proxy = MockGemini::start().await;
    mount_ip_echo(&proxy, ResponseTemplate::new(200).set_body_string("plain text")).await;

    let relay = relay_via(&proxy.uri());
    let report = relay.probe_proxy().await.expect("probe should connect");

    assert_eq!(report.status, ProbeStatus::SuccessParsingFailed);
    assert_eq!(report.raw_response.as_deref(), Some("plain text"));

    let json: Value = serde_json::to_value(&report).unwrap();
    assert_eq!(json["status"], "success_parsing_failed");
    assert!(json.get("origin_ip").is_none());
}

#[tokio::test]
async fn test_probe_non_success_status() {
    let proxy = MockGemini::start().await;
    mount_ip_echo(&proxy, ResponseTemplate::new(407).set_body_string("auth required")).await;

    let relay = relay_via(&proxy.uri());
    let err = relay.probe_proxy().await.unwrap_err();

    assert_eq!(
        err,
        RelayError::UpstreamStatus {
            status: 407,
            body: "auth required".to_string(),
        }
    );
}

#[tokio::test]
async fn test_probe_unreachable_proxy() {
    let dead_proxy = format!("http://127.0.0.1:{}", common::closed_port());
    let relay = relay_via(&dead_proxy);

    let err = relay.probe_proxy().await.unwrap_err();
    assert!(matches!(err, RelayError::ProxyFailure(_)), "got {:?}", err);
}
