//! HTTP routes.
//!
//! ```text
//! /kv        PUT|POST write, GET read, anything else 405
//! /history   pretty JSON export of every recorded operation
//! /timeline  ASCII timeline of the history
//! /check     consistency check report
//! ```

use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use linear_kv_checker::CheckSuite;
use linear_kv_core::Outcome;
use linear_kv_report::{
    check_report_to_json, history_to_json, CheckReport, JsonFormat, TimelineRenderer,
};
use linear_kv_store::Store;
use serde::{Deserialize, Serialize};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::debug;

use crate::error::ApiError;

/// Header carrying the client request id on reads.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub suite: Arc<CheckSuite>,
    pub renderer: TimelineRenderer,
}

impl AppState {
    pub fn new(store: Arc<Store>, suite: Arc<CheckSuite>, renderer: TimelineRenderer) -> Self {
        Self {
            store,
            suite,
            renderer,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PutRequest {
    #[serde(default)]
    request_id: String,
    #[serde(default)]
    key: String,
    #[serde(default)]
    value: String,
}

#[derive(Debug, Serialize)]
struct PutResponse {
    result: Outcome,
}

/// Query pairs in request order. A repeated parameter keeps every value.
type QueryPairs = Vec<(String, String)>;

#[derive(Debug, Serialize)]
struct GetResponse {
    key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<String>,
    found: bool,
    result: Outcome,
}

/// Build the service router.
pub fn build_router(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .route(
            "/kv",
            get(get_value)
                .put(put_value)
                .post(put_value)
                .fallback(method_not_allowed),
        )
        .route("/history", get(history))
        .route("/timeline", get(timeline))
        .route("/check", get(check))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(request_timeout))
        .with_state(state)
}

async fn put_value(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<PutResponse>, ApiError> {
    let request: PutRequest = serde_json::from_slice(&body).map_err(ApiError::malformed)?;
    let result = state
        .store
        .put(&request.request_id, &request.key, &request.value)?;
    Ok(Json(PutResponse { result }))
}

async fn get_value(
    State(state): State<AppState>,
    query: Result<Query<QueryPairs>, QueryRejection>,
    headers: HeaderMap,
) -> Result<Json<GetResponse>, ApiError> {
    let Query(pairs) = query.map_err(ApiError::malformed_query)?;
    // First occurrence wins.
    let key = pairs
        .iter()
        .find(|(name, _)| name == "key")
        .map(|(_, value)| value.as_str())
        .unwrap_or_default();
    let request_id = headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|id| !id.is_empty());
    let read = state.store.get(key, request_id)?;

    Ok(Json(GetResponse {
        found: read.found(),
        key: read.key,
        value: read.value,
        result: read.outcome,
    }))
}

async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotSupported
}

async fn history(State(state): State<AppState>) -> Result<Response, ApiError> {
    let history = state.store.history();
    let body = history_to_json(&history, JsonFormat::Pretty)?;
    Ok(json_response(body))
}

async fn timeline(State(state): State<AppState>) -> String {
    state.renderer.render(&state.store.history())
}

async fn check(State(state): State<AppState>) -> Result<Response, ApiError> {
    let history = state.store.history();
    let suite = Arc::clone(&state.suite);

    let report = tokio::task::spawn_blocking(move || {
        let result = suite.check(&history);
        CheckReport::new(&result, history.len())
    })
    .await
    .map_err(ApiError::internal)?;

    debug!(
        linearizable = report.is_linearizable,
        total_ops = report.total_ops,
        "check served"
    );
    let body = check_report_to_json(&report, JsonFormat::Pretty)?;
    Ok(json_response(body))
}

fn json_response(body: String) -> Response {
    ([(header::CONTENT_TYPE, "application/json")], body).into_response()
}
