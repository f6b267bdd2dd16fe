//! HTTP request handlers

use super::state::AppState;
use crate::connection::ConnectionState;
use crate::metrics::RequestStats;
use crate::places::{Prediction, QueryError};
use crate::request::RequestKind;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Query parameters for autocomplete
#[derive(Debug, Deserialize)]
pub struct AutocompleteParams {
    /// Text typed so far
    pub q: Option<String>,
}

/// Autocomplete response
#[derive(Debug, Serialize)]
pub struct AutocompleteResponse {
    pub query: String,
    pub predictions: Vec<Prediction>,
}

/// Service status response
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub instance: String,
    #[serde(flatten)]
    pub connection: ConnectionState,
    pub total_requests: u64,
    pub requests: HashMap<RequestKind, RequestStats>,
}

fn status_code(error: &QueryError) -> StatusCode {
    match error {
        QueryError::NotConnected => StatusCode::SERVICE_UNAVAILABLE,
        QueryError::SkippedNoConstraint | QueryError::InvalidPlaceId => StatusCode::BAD_REQUEST,
        QueryError::Timeout => StatusCode::GATEWAY_TIMEOUT,
        QueryError::ServiceError(_) => StatusCode::BAD_GATEWAY,
        QueryError::EmptyResult => StatusCode::NOT_FOUND,
    }
}

fn error_response(error: QueryError) -> Response {
    (
        status_code(&error),
        Json(serde_json::json!({
            "error": error.to_string(),
            "kind": error.kind(),
        })),
    )
        .into_response()
}

/// Health check handler
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": crate::VERSION
    }))
}

/// Connection state and request statistics
pub async fn status(State(state): State<AppState>) -> impl IntoResponse {
    Json(StatusResponse {
        instance: state.instance_name().to_string(),
        connection: state.connection.state(),
        total_requests: state.metrics.get_total_requests(),
        requests: state.metrics.snapshot(),
    })
}

/// Autocomplete handler
pub async fn autocomplete(
    State(state): State<AppState>,
    Query(params): Query<AutocompleteParams>,
) -> Response {
    match state.engine.query(params.q.as_deref()).await {
        Ok(predictions) => Json(AutocompleteResponse {
            query: params.q.unwrap_or_default(),
            predictions,
        })
        .into_response(),
        Err(e) => error_response(e),
    }
}

/// Place details handler
pub async fn place(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.fetcher.fetch_details(&id).await {
        Ok(detail) => Json(detail).into_response(),
        Err(e) => error_response(e),
    }
}
