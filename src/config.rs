//! Configuration management for Gemini Relay
//!
//! Configuration is loaded from environment variables.

use anyhow::{Context, Result};
use reqwest::Url;
use std::env;
use std::time::Duration;

use crate::relay::{probe::DEFAULT_PROBE_URL, ProxyConfig, RelayConfig};

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,

    /// Upstream API base URL
    pub base_url: String,
    /// Connect/read timeout for upstream calls (in seconds)
    pub timeout_seconds: u64,

    /// Route remote upstream traffic through a proxy
    pub proxy_enabled: bool,
    /// Proxy for HTTP targets
    pub http_proxy: Option<Url>,
    /// Proxy for HTTPS targets (preferred for the relay transport)
    pub https_proxy: Option<Url>,
    /// Service hostnames that always bypass the proxy
    pub internal_hosts: Vec<String>,

    /// API key used when the caller does not provide one
    pub api_key: Option<String>,
    /// Target fetched by the proxy connectivity probe
    pub proxy_test_url: Url,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build configuration from any variable source
    pub fn from_lookup<F>(var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let or = |name: &str, default: &str| var(name).unwrap_or_else(|| default.to_string());

        Ok(Self {
            host: or("RELAY_HOST", "0.0.0.0"),
            port: or("RELAY_PORT", "8000")
                .parse()
                .context("Invalid RELAY_PORT")?,

            base_url: or(
                "BASE_URL",
                "https://generativelanguage.googleapis.com/v1beta",
            ),
            timeout_seconds: or("TIME_OUT", "300")
                .parse()
                .context("Invalid TIME_OUT")?,

            proxy_enabled: var("PROXY_ENABLED")
                .map(|v| parse_flag(&v))
                .unwrap_or(false),
            http_proxy: optional_url("HTTP_PROXY", var("HTTP_PROXY"))?,
            https_proxy: optional_url("HTTPS_PROXY", var("HTTPS_PROXY"))?,
            internal_hosts: parse_list(&or("INTERNAL_HOSTS", "mysql")),

            api_key: var("API_KEY").filter(|k| !k.trim().is_empty()),
            proxy_test_url: Url::parse(&or("PROXY_TEST_URL", DEFAULT_PROBE_URL))
                .context("Invalid PROXY_TEST_URL")?,
        })
    }

    /// Proxy settings as consumed by the relay
    pub fn proxy_config(&self) -> ProxyConfig {
        ProxyConfig {
            enabled: self.proxy_enabled,
            http_proxy: self.http_proxy.clone(),
            https_proxy: self.https_proxy.clone(),
        }
    }

    /// Relay-relevant subset of the configuration
    pub fn relay_config(&self) -> RelayConfig {
        RelayConfig {
            base_url: self.base_url.clone(),
            timeout: Duration::from_secs(self.timeout_seconds),
            proxy: self.proxy_config(),
            internal_hosts: self.internal_hosts.clone(),
            proxy_test_url: self.proxy_test_url.clone(),
        }
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes")
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse an optional URL variable; empty values count as unset
fn optional_url(name: &str, value: Option<String>) -> Result<Option<Url>> {
    match value {
        Some(value) if !value.trim().is_empty() => Url::parse(value.trim())
            .map(Some)
            .with_context(|| format!("Invalid {}", name)),
        _ => Ok(None),
    }
}
