//! # Request Handlers

use crate::{
    auth::AccessGranted,
    errors::AppError,
    state::AppState,
    types::{QueryParams, QueryResponse},
};
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use cpiquery::QueryError;
use tracing::info;

/// The root handler.
pub async fn root() -> &'static str {
    "cpiquery server is running."
}

/// The health check handler.
pub async fn health_check() -> &'static str {
    "OK"
}

/// The handler for `GET /query`.
///
/// Runs one generation and one execution for the question in `user_query`.
pub async fn query_handler(
    _access: AccessGranted,
    State(app_state): State<AppState>,
    params: Result<Query<QueryParams>, QueryRejection>,
) -> Result<Json<QueryResponse>, AppError> {
    let Query(params) = params?;
    let question = params.user_query.unwrap_or_default();
    info!("Received query request: '{}'", question);

    if question.trim().is_empty() {
        return Err(QueryError::EmptyQuestion.into());
    }

    let outcome = app_state.query_client.run(&question).await?;
    Ok(Json(QueryResponse::from_outcome(
        outcome,
        params.debug.unwrap_or(false),
    )))
}
