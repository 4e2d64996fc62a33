//! HTTP routes for Gemini Relay
//!
//! This module defines all HTTP endpoints exposed by the relay.

pub mod generate;
pub mod health;
pub mod metrics;
pub mod proxy;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::AppState;

/// Create the main application router
pub fn create_router(state: Arc<AppState>) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let relay_routes = Router::new()
        .route("/v1beta/models/:target", post(generate::model_action))
        .route("/api/proxy/test", get(proxy::test_proxy_connection));

    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
        .route("/health/live", get(health::liveness_check))
        .route("/metrics", get(metrics::prometheus_metrics));

    Router::new()
        .merge(public_routes)
        .merge(relay_routes)
        // Event streams are excluded by the default compression predicate
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
