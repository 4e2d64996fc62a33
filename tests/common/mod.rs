//! Common test utilities for the Gemini Relay
//!
//! Shared fixtures and helpers used across the integration tests.

#![allow(dead_code)]

use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;

use axum_test::TestServer;
use reqwest::Url;

use gemini_relay::relay::{ProxyConfig, RelayConfig};
use gemini_relay::{routes, AppState, Config, GeminiRelay};

/// Test configuration constants
pub mod constants {
    /// API key passed on relay calls
    pub const TEST_API_KEY: &str = "test-gemini-api-key";
    /// Model used by most tests
    pub const TEST_MODEL: &str = "gemini-pro";
    /// Timeout used for relays under test
    pub const TEST_TIMEOUT_SECS: u64 = 5;
}

/// Relay configuration without a proxy
pub fn direct_relay_config(base_url: &str) -> RelayConfig {
    RelayConfig {
        base_url: base_url.to_string(),
        timeout: Duration::from_secs(constants::TEST_TIMEOUT_SECS),
        proxy: ProxyConfig::default(),
        internal_hosts: vec!["mysql".to_string()],
        proxy_test_url: Url::parse("https://httpbin.org/ip").expect("valid probe URL"),
    }
}

/// Relay configuration routing remote targets through `proxy_uri`
pub fn proxied_relay_config(base_url: &str, proxy_uri: &str) -> RelayConfig {
    RelayConfig {
        proxy: proxy_config(proxy_uri),
        ..direct_relay_config(base_url)
    }
}

/// Enabled proxy configuration using `proxy_uri` for both schemes
pub fn proxy_config(proxy_uri: &str) -> ProxyConfig {
    let url = Url::parse(proxy_uri).expect("valid proxy URI");
    ProxyConfig {
        enabled: true,
        http_proxy: Some(url.clone()),
        https_proxy: Some(url),
    }
}

/// Build a relay, panicking on client construction errors
pub fn relay(config: &RelayConfig) -> GeminiRelay {
    GeminiRelay::new(config).expect("Failed to build relay")
}

/// A port on every interface that nothing listens on
pub fn closed_port() -> u16 {
    let listener = TcpListener::bind("0.0.0.0:0").expect("Failed to bind probe listener");
    let port = listener.local_addr().expect("listener address").port();
    drop(listener);
    port
}

/// Application config pointing at `base_url` with no proxy
pub fn app_config(base_url: &str) -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        base_url: base_url.to_string(),
        timeout_seconds: constants::TEST_TIMEOUT_SECS,
        proxy_enabled: false,
        http_proxy: None,
        https_proxy: None,
        internal_hosts: vec!["mysql".to_string()],
        api_key: None,
        proxy_test_url: Url::parse("https://httpbin.org/ip").expect("valid probe URL"),
    }
}

/// Start a test server around the full application router
pub fn test_server(config: Config) -> TestServer {
    let state = AppState::new(config).expect("Failed to build app state");
    TestServer::new(routes::create_router(Arc::new(state))).expect("Failed to start test server")
}
