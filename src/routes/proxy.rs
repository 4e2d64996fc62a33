//! Proxy connectivity test endpoint

use std::sync::Arc;

use axum::{extract::State, Json};

use crate::{error::AppResult, relay::ProbeReport, AppState};

/// Handle `GET /api/proxy/test`
///
/// Reports `disabled` when no proxy applies; probe failures are returned as
/// relay errors (504 on timeout, 502 on proxy failure).
pub async fn test_proxy_connection(State(state): State<Arc<AppState>>) -> AppResult<Json<ProbeReport>> {
    let report = state.relay.probe_proxy().await?;
    Ok(Json(report))
}
