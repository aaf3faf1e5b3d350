use axum::{
    extract::rejection::QueryRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use cpiquery::QueryError;
use serde_json::json;
use tracing::error;

/// A custom error type for the server application.
///
/// Every failure of `/query` is reported in-band: status 200 with an
/// `{"error": <message>}` body.
#[derive(Debug)]
pub enum AppError {
    /// Errors originating from the `cpiquery` pipeline.
    Query(QueryError),
    /// A query string that does not fit `QueryParams`.
    InvalidParams(QueryRejection),
    /// Generic internal server errors.
    Internal(anyhow::Error),
}

impl From<QueryError> for AppError {
    fn from(err: QueryError) -> Self {
        AppError::Query(err)
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::InvalidParams(rejection)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let error_message = match self {
            AppError::Query(err) => {
                // Log the original error for debugging purposes
                error!("QueryError: {:?}", err);
                match err {
                    QueryError::MissingAiProvider(_) | QueryError::MissingStorageProvider => {
                        "Server is not configured correctly.".to_string()
                    }
                    QueryError::StorageConnection(e) => {
                        format!("Storage provider connection error: {e}")
                    }
                    other => other.to_string(),
                }
            }
            AppError::InvalidParams(rejection) => {
                error!("Rejected query string: {}", rejection.body_text());
                format!("Invalid query parameters: {}", rejection.body_text())
            }
            AppError::Internal(err) => {
                error!("Internal server error: {:?}", err);
                "An internal server error occurred.".to_string()
            }
        };

        (StatusCode::OK, Json(json!({ "error": error_message }))).into_response()
    }
}
