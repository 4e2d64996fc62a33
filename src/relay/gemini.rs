//! Gemini relay client
//!
//! Forwards `generateContent` and `streamGenerateContent` calls upstream,
//! routing each request directly or through the configured proxy.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, Response, StatusCode, Url};
use serde_json::Value;
use tracing::{debug, instrument};

use super::error::{RelayError, RelayResult};
use super::locality::LocalityClassifier;
use super::logging::RelayContext;
use super::model::RelayEndpoint;
use super::probe::{ProbeReport, ProxyProbe};
use super::provider::{GenerativeClient, LineStream};
use super::router::{ConnectionRouter, RouteMode};
use super::transport::{self, ProxyConfig, Timeouts, Transport};
use crate::routes::metrics::{record_relay, record_stream_fallback};
use crate::streaming;

/// Settings the relay consumes from the configuration layer
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Upstream base URL, e.g. `https://generativelanguage.googleapis.com/v1beta`
    pub base_url: String,
    /// Connect and unary read timeout
    pub timeout: Duration,
    pub proxy: ProxyConfig,
    /// Hostnames that always bypass the proxy
    pub internal_hosts: Vec<String>,
    /// Target fetched by `probe_proxy`
    pub proxy_test_url: Url,
}

/// Relay client shared by all request handlers
#[derive(Debug, Clone)]
pub struct GeminiRelay {
    base_url: String,
    direct: Transport,
    router: ConnectionRouter,
    probe: ProxyProbe,
}

impl GeminiRelay {
    /// Build the relay and its transports.
    ///
    /// Fails only if an HTTP client cannot be constructed (e.g. a proxy URL
    /// reqwest does not accept).
    pub fn new(config: &RelayConfig) -> reqwest::Result<Self> {
        let timeouts = Timeouts::from_timeout(config.timeout);
        let resolved = transport::resolve(&config.proxy, &timeouts)?;
        let locality = LocalityClassifier::new(config.internal_hosts.iter().cloned());

        let probe = ProxyProbe::new(
            config.proxy.enabled,
            resolved.schemes,
            config.proxy_test_url.clone(),
        );

        Ok(Self {
            base_url: config.base_url.clone(),
            direct: Transport::direct(&timeouts)?,
            router: ConnectionRouter::new(locality, resolved.primary),
            probe,
        })
    }

    /// Whether a proxy transport is available for remote targets
    pub fn proxy_enabled(&self) -> bool {
        self.router.has_proxy()
    }
}

#[async_trait]
impl GenerativeClient for GeminiRelay {
    #[instrument(skip(self, payload, api_key), fields(model = %model))]
    async fn generate(&self, payload: &Value, model: &str, api_key: &str) -> RelayResult<Value> {
        let endpoint = RelayEndpoint::new(&self.base_url, model, api_key);
        let url = endpoint.generate_url();
        let plan = self.router.plan(&url);
        let ctx = RelayContext::new("generateContent", endpoint.model());
        ctx.log_request_start(&url, plan.mode);

        let client = plan.transport.unwrap_or(&self.direct).unary_client();
        let result = post_json(client, &url, payload, plan.mode, &ctx).await;

        match &result {
            Ok(_) => {
                ctx.log_request_complete(plan.mode, None);
                record_relay("generate", plan.mode, "success", ctx.elapsed_secs());
            }
            Err(e) => {
                ctx.log_request_failed(plan.mode, e);
                record_relay("generate", plan.mode, e.code(), ctx.elapsed_secs());
            }
        }

        result
    }

    fn stream_generate(&self, payload: Value, model: &str, api_key: &str) -> LineStream {
        let endpoint = RelayEndpoint::new(&self.base_url, model, api_key);
        let url = endpoint.stream_url();
        let plan = self.router.plan(&url);
        let ctx = RelayContext::new("streamGenerateContent", endpoint.model()).with_streaming(true);

        let direct = self.direct.stream_client().clone();
        let proxy = plan.transport.map(|t| t.stream_client().clone());
        let planned = plan.mode;

        let lines = async_stream::stream! {
            ctx.log_request_start(&url, planned);

            // Remote target with a proxy available: direct first, proxy only
            // if the direct path fails before producing its first line.
            let (route, opened) = match proxy {
                Some(proxy) => match open_stream(&direct, &url, &payload, RouteMode::Direct, &ctx).await {
                    Ok(opened) => (RouteMode::Direct, Ok(opened)),
                    Err(e) => {
                        ctx.log_fallback(&e);
                        record_stream_fallback();
                        (
                            RouteMode::Proxy,
                            open_stream(&proxy, &url, &payload, RouteMode::Proxy, &ctx).await,
                        )
                    }
                },
                None => (
                    RouteMode::Direct,
                    open_stream(&direct, &url, &payload, RouteMode::Direct, &ctx).await,
                ),
            };

            let (first, mut rest) = match opened {
                Ok(opened) => opened,
                Err(e) => {
                    ctx.log_request_failed(route, &e);
                    record_relay("stream_generate", route, e.code(), ctx.elapsed_secs());
                    yield Err(e);
                    return;
                }
            };

            let mut count = 0usize;
            if let Some(line) = first {
                count += 1;
                yield Ok(line);
            }

            while let Some(item) = rest.next().await {
                match item {
                    Ok(line) => {
                        count += 1;
                        yield Ok(line);
                    }
                    Err(e) => {
                        ctx.log_request_failed(route, &e);
                        record_relay("stream_generate", route, e.code(), ctx.elapsed_secs());
                        yield Err(e);
                        return;
                    }
                }
            }

            ctx.log_request_complete(route, Some(count));
            record_relay("stream_generate", route, "success", ctx.elapsed_secs());
        };

        Box::pin(lines)
    }

    async fn probe_proxy(&self) -> RelayResult<ProbeReport> {
        self.probe.run().await
    }
}

/// POST a JSON payload and parse a 200 response as JSON
async fn post_json(
    client: &Client,
    url: &str,
    payload: &Value,
    route: RouteMode,
    ctx: &RelayContext,
) -> RelayResult<Value> {
    let response = client
        .post(url)
        .json(payload)
        .send()
        .await
        .map_err(|e| RelayError::classify(e, route))?;

    let status = response.status();
    ctx.log_upstream_status(route, status.as_u16());

    if status != StatusCode::OK {
        return Err(upstream_status(response).await);
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| RelayError::classify(e, route))?;

    serde_json::from_slice(&body).map_err(|e| {
        debug!(error = %e, body_len = body.len(), "Upstream returned non-JSON body");
        RelayError::MalformedResponse(e.to_string())
    })
}

/// Open a streaming request and wait for its first line.
///
/// Returns the first line (or `None` for an empty stream) together with the
/// remaining lines. Any failure up to that point is returned as an error so
/// the caller can still choose another path.
async fn open_stream(
    client: &Client,
    url: &str,
    payload: &Value,
    route: RouteMode,
    ctx: &RelayContext,
) -> RelayResult<(Option<String>, LineStream)> {
    let response = client
        .post(url)
        .json(payload)
        .send()
        .await
        .map_err(|e| RelayError::classify(e, route))?;

    let status = response.status();
    ctx.log_upstream_status(route, status.as_u16());

    if status != StatusCode::OK {
        return Err(upstream_status(response).await);
    }

    let bytes = response
        .bytes_stream()
        .map(move |chunk| chunk.map_err(|e| RelayError::classify(e, route)));
    let mut lines = streaming::lines(bytes);

    match lines.next().await {
        Some(Ok(first)) => Ok((Some(first), lines)),
        Some(Err(e)) => Err(e),
        None => Ok((None, lines)),
    }
}

/// Turn a non-200 response into `UpstreamStatus`, keeping the status even if
/// the body cannot be read
async fn upstream_status(response: Response) -> RelayError {
    let status = response.status().as_u16();
    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => {
            debug!(status, error = %e, "Failed to read upstream error body");
            String::new()
        }
    };
    RelayError::UpstreamStatus { status, body }
}
