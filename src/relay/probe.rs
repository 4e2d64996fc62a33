//! Proxy connectivity probe
//!
//! Checks that the configured proxy can reach the outside world by fetching
//! an IP echo endpoint through it.

use std::time::Duration;

use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use super::error::{RelayError, RelayResult};
use super::router::RouteMode;
use super::transport::SchemeProxies;

/// Default IP echo endpoint
pub const DEFAULT_PROBE_URL: &str = "https://httpbin.org/ip";

const PROBE_TIMEOUT: Duration = Duration::from_secs(10);
const PROBE_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const RAW_RESPONSE_LIMIT: usize = 500;

/// Outcome category of a probe that did not fail outright
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeStatus {
    Disabled,
    Success,
    SuccessParsingFailed,
}

/// Probe report returned to the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeReport {
    pub status: ProbeStatus,
    pub message: String,
    /// Proxy the request was routed through
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin_ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
}

impl ProbeReport {
    fn disabled(message: &str) -> Self {
        Self {
            status: ProbeStatus::Disabled,
            message: message.to_string(),
            proxy: None,
            origin_ip: None,
            status_code: None,
            raw_response: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct OriginResponse {
    origin: Option<String>,
}

/// Probes the proxy configured for a relay
#[derive(Debug, Clone)]
pub struct ProxyProbe {
    enabled: bool,
    schemes: Option<SchemeProxies>,
    target: Url,
}

impl ProxyProbe {
    /// `schemes` is the mapping kept by transport resolution; `None` when no
    /// proxy URL applies.
    pub fn new(enabled: bool, schemes: Option<SchemeProxies>, target: Url) -> Self {
        Self {
            enabled,
            schemes,
            target,
        }
    }

    /// Fetch the probe target through the per-scheme proxy mapping.
    #[instrument(skip(self), fields(target = %self.target))]
    pub async fn run(&self) -> RelayResult<ProbeReport> {
        if !self.enabled {
            return Ok(ProbeReport::disabled("Proxy is not enabled"));
        }

        let Some(schemes) = &self.schemes else {
            return Ok(ProbeReport::disabled(
                "Proxy is enabled but no proxy URL is configured",
            ));
        };

        let proxy = schemes.for_target(&self.target).map(Url::to_string);
        info!(proxy = ?proxy, "Probing proxy connectivity");

        let builder = Client::builder()
            .timeout(PROBE_TIMEOUT)
            .connect_timeout(PROBE_CONNECT_TIMEOUT);
        let client = schemes
            .apply(builder)
            .and_then(|b| b.build())
            .map_err(|e| RelayError::ProxyFailure(e.to_string()))?;

        let response = client
            .get(self.target.clone())
            .send()
            .await
            .map_err(|e| {
                let err = RelayError::classify(e, RouteMode::Proxy);
                error!(error = %err, "Proxy probe request failed");
                err
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RelayError::UpstreamStatus {
                status: status.as_u16(),
                body,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| RelayError::classify(e, RouteMode::Proxy))?;

        let report = match serde_json::from_str::<OriginResponse>(&body) {
            Ok(parsed) => ProbeReport {
                status: ProbeStatus::Success,
                message: format!("Connected to {} through the proxy", self.target),
                proxy,
                origin_ip: Some(
                    parsed
                        .origin
                        .unwrap_or_else(|| "unknown".to_string()),
                ),
                status_code: Some(status.as_u16()),
                raw_response: None,
            },
            Err(e) => {
                error!(error = %e, "Proxy probe response is not valid JSON");
                ProbeReport {
                    status: ProbeStatus::SuccessParsingFailed,
                    message: format!(
                        "Connected to {} (status {}) but the response could not be parsed",
                        self.target,
                        status.as_u16()
                    ),
                    proxy,
                    origin_ip: None,
                    status_code: Some(status.as_u16()),
                    raw_response: Some(body.chars().take(RAW_RESPONSE_LIMIT).collect()),
                }
            }
        };

        info!(status = ?report.status, origin_ip = ?report.origin_ip, "Proxy probe finished");
        Ok(report)
    }
}
