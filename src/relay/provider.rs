//! Client-facing relay interface
//!
//! The request layer talks to upstream only through this trait, which keeps
//! handlers independent of how connections are routed.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use serde_json::Value;

use super::error::RelayResult;
use super::probe::ProbeReport;

/// Lazy sequence of raw protocol lines from a streaming call
pub type LineStream = Pin<Box<dyn Stream<Item = RelayResult<String>> + Send>>;

/// Generate-content operations exposed to the request layer
#[async_trait]
pub trait GenerativeClient: Send + Sync {
    /// Unary `generateContent`: one request, one parsed JSON response.
    async fn generate(&self, payload: &Value, model: &str, api_key: &str) -> RelayResult<Value>;

    /// Streaming `streamGenerateContent`.
    ///
    /// Nothing is sent until the returned stream is first polled. Lines are
    /// yielded verbatim and in order; an error item is always the last item.
    fn stream_generate(&self, payload: Value, model: &str, api_key: &str) -> LineStream;

    /// Check that the configured proxy reaches the outside world.
    async fn probe_proxy(&self) -> RelayResult<ProbeReport>;
}
