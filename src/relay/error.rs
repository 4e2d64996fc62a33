//! Relay error taxonomy
//!
//! Every failure the relay can produce is classified into one of these kinds
//! before it reaches the caller.

use thiserror::Error;

use super::router::RouteMode;

/// Errors surfaced by relay operations
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RelayError {
    /// Connect or read timed out
    #[error("Upstream request timed out: {0}")]
    Timeout(String),

    /// The proxy could not be reached or refused the tunnel
    #[error("Proxy connection failed: {0}")]
    ProxyFailure(String),

    /// Upstream answered with a non-200 status
    #[error("API call failed with status code {status}, {body}")]
    UpstreamStatus { status: u16, body: String },

    /// Any other network or protocol failure
    #[error("Transport failure: {0}")]
    TransportFailure(String),

    /// A 200 response whose body is not valid JSON
    #[error("Malformed upstream response: {0}")]
    MalformedResponse(String),
}

impl RelayError {
    /// Classify a transport-level failure observed on the given route.
    pub fn classify(err: reqwest::Error, route: RouteMode) -> Self {
        if err.is_timeout() {
            return Self::Timeout(err.to_string());
        }

        if route == RouteMode::Proxy && err.is_connect() {
            return Self::ProxyFailure(err.to_string());
        }

        Self::TransportFailure(err.to_string())
    }

    /// Stable code used in logs, metrics labels and error bodies
    pub fn code(&self) -> &'static str {
        match self {
            Self::Timeout(_) => "TIMEOUT",
            Self::ProxyFailure(_) => "PROXY_FAILURE",
            Self::UpstreamStatus { .. } => "UPSTREAM_STATUS",
            Self::TransportFailure(_) => "TRANSPORT_FAILURE",
            Self::MalformedResponse(_) => "MALFORMED_RESPONSE",
        }
    }
}

/// Result type alias for relay operations
pub type RelayResult<T> = Result<T, RelayError>;
