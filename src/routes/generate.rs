//! Generate-content endpoints
//!
//! Gemini-compatible `models/{model}:generateContent` and
//! `models/{model}:streamGenerateContent` endpoints backed by the relay.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use futures::{stream, StreamExt};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::{
    error::{AppError, AppResult},
    AppState,
};

/// Header carrying the API key when it is not in the query string
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Query parameters accepted on model actions
#[derive(Debug, Deserialize)]
pub struct ActionQuery {
    pub key: Option<String>,
}

/// Upstream model action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelAction {
    Generate,
    StreamGenerate,
}

/// Split `gemini-pro:generateContent` into model and action
pub fn parse_target(target: &str) -> AppResult<(&str, ModelAction)> {
    let (model, action) = target
        .rsplit_once(':')
        .ok_or_else(|| AppError::NotFound(format!("Unknown model action: {}", target)))?;

    if model.is_empty() {
        return Err(AppError::BadRequest("Model name is required".to_string()));
    }

    let action = match action {
        "generateContent" => ModelAction::Generate,
        "streamGenerateContent" => ModelAction::StreamGenerate,
        other => {
            return Err(AppError::NotFound(format!(
                "Unsupported model action: {}",
                other
            )))
        }
    };

    Ok((model, action))
}

/// Resolve the API key: query parameter, then header, then configured default
fn resolve_api_key(state: &AppState, query: &ActionQuery, headers: &HeaderMap) -> AppResult<String> {
    query
        .key
        .clone()
        .filter(|k| !k.is_empty())
        .or_else(|| {
            headers
                .get(API_KEY_HEADER)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        })
        .or_else(|| state.config.api_key.clone())
        .ok_or_else(|| AppError::BadRequest("API key is required".to_string()))
}

/// Handle `POST /v1beta/models/{model}:{action}`
pub async fn model_action(
    State(state): State<Arc<AppState>>,
    Path(target): Path<String>,
    Query(query): Query<ActionQuery>,
    headers: HeaderMap,
    Json(payload): Json<Value>,
) -> AppResult<Response> {
    let (model, action) = parse_target(&target)?;
    let api_key = resolve_api_key(&state, &query, &headers)?;

    info!(model = %model, action = ?action, "Processing generate request");

    match action {
        ModelAction::Generate => {
            let response = state.relay.generate(&payload, model, &api_key).await?;
            Ok((StatusCode::OK, Json(response)).into_response())
        }
        ModelAction::StreamGenerate => stream_response(&state, payload, model, &api_key).await,
    }
}

/// Relay a streaming call as `text/event-stream`.
///
/// The first item is awaited before the response starts so that an upstream
/// rejection is returned with its own status instead of a truncated 200.
async fn stream_response(
    state: &AppState,
    payload: Value,
    model: &str,
    api_key: &str,
) -> AppResult<Response> {
    let mut lines = state.relay.stream_generate(payload, model, api_key);

    let first = match lines.next().await {
        Some(Err(e)) => return Err(e.into()),
        Some(Ok(line)) => Some(line),
        None => None,
    };

    let body = stream::iter(first.map(Ok))
        .chain(lines)
        .map(|item| item.map(|line| Bytes::from(format!("{}\n", line))));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/event-stream")
        .header(header::CACHE_CONTROL, "no-cache")
        .header("X-Accel-Buffering", "no")
        .body(Body::from_stream(body))
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to build response: {}", e)))
}
