//! Structured logging for relay calls
//!
//! Each call gets a short trace id so the direct attempt, a possible proxy
//! fallback and the final outcome can be correlated in the logs.

use std::time::Instant;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::error::RelayError;
use super::router::RouteMode;

/// Matches the `key` query parameter so it can be masked
static API_KEY_PARAM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([?&]key=)[^&]*").expect("valid api key regex"));

/// Mask the API key in an upstream URL before it is logged
pub fn redact_key(url: &str) -> String {
    API_KEY_PARAM.replace_all(url, "${1}***").into_owned()
}

/// Context for tracking one relay call
#[derive(Debug, Clone)]
pub struct RelayContext {
    /// Short identifier for log correlation
    pub trace_id: String,
    pub start_time: Instant,
    /// Upstream action, `generateContent` or `streamGenerateContent`
    pub operation: &'static str,
    /// Normalized model name
    pub model: String,
    pub streaming: bool,
}

impl RelayContext {
    pub fn new(operation: &'static str, model: impl Into<String>) -> Self {
        Self {
            trace_id: Uuid::new_v4().to_string()[..8].to_string(),
            start_time: Instant::now(),
            operation,
            model: model.into(),
            streaming: false,
        }
    }

    pub fn with_streaming(mut self, streaming: bool) -> Self {
        self.streaming = streaming;
        self
    }

    pub fn elapsed_ms(&self) -> u128 {
        self.start_time.elapsed().as_millis()
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.start_time.elapsed().as_secs_f64()
    }

    pub fn log_request_start(&self, url: &str, planned: RouteMode) {
        info!(
            trace_id = %self.trace_id,
            operation = %self.operation,
            model = %self.model,
            streaming = %self.streaming,
            route = %planned,
            url = %redact_key(url),
            "Relay request started"
        );
    }

    pub fn log_upstream_status(&self, route: RouteMode, status: u16) {
        debug!(
            trace_id = %self.trace_id,
            route = %route,
            status = %status,
            elapsed_ms = %self.elapsed_ms(),
            "Response received from upstream"
        );
    }

    /// Direct attempt failed before its first line; retrying through the proxy
    pub fn log_fallback(&self, cause: &RelayError) {
        warn!(
            trace_id = %self.trace_id,
            model = %self.model,
            error = %cause,
            elapsed_ms = %self.elapsed_ms(),
            "Direct stream failed, falling back to proxy"
        );
    }

    pub fn log_request_complete(&self, route: RouteMode, lines: Option<usize>) {
        info!(
            trace_id = %self.trace_id,
            operation = %self.operation,
            model = %self.model,
            route = %route,
            lines = ?lines,
            elapsed_ms = %self.elapsed_ms(),
            "Relay request completed"
        );
    }

    pub fn log_request_failed(&self, route: RouteMode, err: &RelayError) {
        match err {
            RelayError::UpstreamStatus { status, .. } => warn!(
                trace_id = %self.trace_id,
                operation = %self.operation,
                model = %self.model,
                route = %route,
                status = %status,
                elapsed_ms = %self.elapsed_ms(),
                "Upstream rejected relay request"
            ),
            _ => error!(
                trace_id = %self.trace_id,
                operation = %self.operation,
                model = %self.model,
                route = %route,
                kind = %err.code(),
                error = %err,
                elapsed_ms = %self.elapsed_ms(),
                "Relay request failed"
            ),
        }
    }
}
