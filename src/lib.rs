//! Gemini Relay - proxy-aware relay for the Gemini generateContent API
//!
//! This library provides the relay client, which forwards unary and streaming
//! generate-content calls upstream and decides per request whether to connect
//! directly or through a configured proxy, plus the HTTP surface around it.

pub mod config;
pub mod error;
pub mod relay;
pub mod routes;
pub mod streaming;

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;

pub use crate::config::Config;
pub use crate::relay::{GeminiRelay, GenerativeClient, RelayError};

/// Application state shared across all request handlers
pub struct AppState {
    pub config: Config,
    pub start_time: Instant,
    /// Relay used to forward generate-content calls and probe the proxy
    pub relay: Arc<dyn GenerativeClient>,
}

impl AppState {
    /// Create a new application state
    pub fn new(config: Config) -> Result<Self> {
        let relay = GeminiRelay::new(&config.relay_config())?;
        Ok(Self::with_client(config, Arc::new(relay)))
    }

    /// Create application state around an existing relay client
    pub fn with_client(config: Config, relay: Arc<dyn GenerativeClient>) -> Self {
        Self {
            config,
            start_time: Instant::now(),
            relay,
        }
    }
}
