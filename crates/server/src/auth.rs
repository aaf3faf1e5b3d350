//! # Access-Token Gate
//!
//! An extractor that guards `/query` with a shared secret sent in the
//! `access_token` header. When no token is configured the gate is open.

use crate::state::AppState;
use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::warn;

/// The header carrying the shared secret.
pub const ACCESS_TOKEN_HEADER: &str = "access_token";

/// Proof that the request passed the access-token gate.
#[derive(Debug, Clone, Copy)]
pub struct AccessGranted;

/// A rejection rendered as `{"error": <message>}` with its status code.
pub struct AuthError(StatusCode, &'static str);

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (self.0, Json(json!({ "error": self.1 }))).into_response()
    }
}

impl FromRequestParts<AppState> for AccessGranted {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(expected) = state.access_token() else {
            return Ok(AccessGranted);
        };

        let provided = parts
            .headers
            .get(ACCESS_TOKEN_HEADER)
            .ok_or(AuthError(StatusCode::FORBIDDEN, "Not authenticated"))?;

        if provided.to_str().map(|v| v == expected).unwrap_or(false) {
            Ok(AccessGranted)
        } else {
            warn!("Rejected request with an invalid access token.");
            Err(AuthError(
                StatusCode::FORBIDDEN,
                "Could not validate credentials",
            ))
        }
    }
}
