//! API Handlers
use askdb_core::{ExecutionContext, QueryResponse, QuestionRequest, ASKDB_VERSION};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::{json, Value};
use std::time::Instant;

use crate::error::ApiError;
use crate::metrics::{OUTCOME_ERROR, OUTCOME_EXECUTION_FAILED, OUTCOME_OK};
use crate::AppState;

/// `POST /query`: run the pipeline once. Either the full four-field response
/// or an error; never partial state.
pub async fn query(
    State(state): State<AppState>,
    payload: Result<Json<QuestionRequest>, JsonRejection>,
) -> Result<Json<QueryResponse>, ApiError> {
    let Json(request) = payload?;
    let ctx = ExecutionContext::new();
    let start = Instant::now();

    let outcome = state.runner.run(&request.question, &ctx).await;
    let elapsed = start.elapsed().as_secs_f64();

    match outcome {
        Ok((final_state, _traces)) => {
            state.metrics.observe(OUTCOME_OK, elapsed);
            Ok(Json(final_state.into()))
        }
        Err(e) => {
            let label = if e.is_client_error() {
                OUTCOME_EXECUTION_FAILED
            } else {
                OUTCOME_ERROR
            };
            state.metrics.observe(label, elapsed);
            Err(e.into())
        }
    }
}

pub async fn health() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "ok", "version": ASKDB_VERSION })))
}

pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    match state.metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            [(header::CONTENT_TYPE, "text/plain")],
            e.to_string(),
        ),
    }
}
