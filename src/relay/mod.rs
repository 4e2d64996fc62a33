//! Relay module
//!
//! Forwards generate-content requests upstream, deciding per request whether
//! to connect directly or through the configured proxy.

pub mod error;
pub mod gemini;
pub mod locality;
pub mod logging;
pub mod model;
pub mod probe;
pub mod provider;
pub mod router;
pub mod transport;

pub use error::{RelayError, RelayResult};
pub use gemini::{GeminiRelay, RelayConfig};
pub use locality::LocalityClassifier;
pub use model::{normalize_model, RelayEndpoint};
pub use probe::{ProbeReport, ProbeStatus, ProxyProbe};
pub use provider::{GenerativeClient, LineStream};
pub use router::{ConnectionPlan, ConnectionRouter, RouteMode};
pub use transport::{ProxyConfig, SchemeProxies, Timeouts, Transport};
