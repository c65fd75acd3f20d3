use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::Query;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

use super::types::{
    top_n_from_json, top_n_from_query, ErrorResponse, HealthResponse, InvalidTopN,
};
use super::AppState;

pub const NO_QUERY_MESSAGE: &str = "No query provided";
pub const INVALID_TOP_N_MESSAGE: &str = "top_n must be a positive integer";

fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}

pub async fn handle_home() -> &'static str {
    "Product recommender running"
}

pub async fn handle_health(Extension(state): Extension<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        ready: state.recommender.is_ready(),
        catalog_size: state.recommender.catalog().len(),
        vocabulary_size: state.recommender.vocabulary_size(),
    })
}

/// `GET /predict/recommend?query=...&top_n=...`
pub async fn handle_recommend_get(
    Extension(state): Extension<AppState>,
    params: Result<Query<HashMap<String, String>>, QueryRejection>,
) -> Response {
    let Query(params) = match params {
        Ok(params) => params,
        Err(rejection) => {
            debug!("Rejected query string: {}", rejection);
            return error_response(StatusCode::BAD_REQUEST, NO_QUERY_MESSAGE);
        }
    };
    let top_n = top_n_from_query(params.get("top_n").map(String::as_str));
    recommend(state, params.get("query").cloned(), top_n).await
}

/// `POST /predict/recommend` with a JSON body `{"query": ..., "top_n": ...}`.
///
/// A missing, empty or non-JSON body is treated as a request without a query.
pub async fn handle_recommend_post(
    Extension(state): Extension<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => {
            debug!("Rejected request body: {}", rejection);
            return error_response(StatusCode::BAD_REQUEST, NO_QUERY_MESSAGE);
        }
    };
    let query = body.get("query").and_then(Value::as_str).map(String::from);
    let top_n = top_n_from_json(body.get("top_n"));
    recommend(state, query, top_n).await
}

async fn recommend(
    state: AppState,
    query: Option<String>,
    top_n: Result<Option<usize>, InvalidTopN>,
) -> Response {
    let query = match query {
        Some(q) if !q.is_empty() => q,
        _ => return error_response(StatusCode::BAD_REQUEST, NO_QUERY_MESSAGE),
    };
    let top_n = match top_n {
        Ok(Some(0)) | Err(InvalidTopN) => {
            return error_response(StatusCode::BAD_REQUEST, INVALID_TOP_N_MESSAGE)
        }
        Ok(requested) => state.config.effective_top_n(requested),
    };

    // Scoring is CPU-bound; keep it off the async workers.
    let recommender = state.recommender.clone();
    match tokio::task::spawn_blocking(move || recommender.search(&query, top_n)).await {
        Ok(results) => {
            debug!("Returning {} recommendations", results.len());
            (StatusCode::OK, Json(results)).into_response()
        }
        Err(e) => {
            tracing::error!("Recommendation task failed: {:?}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
        }
    }
}
