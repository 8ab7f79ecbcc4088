//! Unified server error type.
//!
//! Every handler returns `Result<T, ServerError>`, which implements
//! [`axum::response::IntoResponse`] so errors become a JSON body
//! `{"error": "..."}` with a matching status code.
//!
//! Upstream and internal failures are logged in full; callers only see the
//! remote and what was being done, without URLs or transport detail.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use conan_lens_core::CatalogError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ServerError {
    /// The caller referenced a resource that does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The caller sent an invalid or malformed request.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The registry has not been initialised yet.
    #[error("backend not ready: {0}")]
    BackendNotReady(String),

    /// The upstream remote failed to answer.
    #[error("upstream error: {0}")]
    Upstream(#[source] CatalogError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, client_message) = match &self {
            ServerError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
            ServerError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
            ServerError::BackendNotReady(m) => (StatusCode::SERVICE_UNAVAILABLE, m.clone()),

            ServerError::Upstream(e) => {
                error!(error = ?e, "upstream registry error");
                let message = match e {
                    CatalogError::Upstream { remote, context, .. } => {
                        format!("Error talking to remote '{remote}' while {context}")
                    }
                    _ => "upstream registry error".to_owned(),
                };
                (StatusCode::BAD_GATEWAY, message)
            }
            ServerError::Internal(m) => {
                error!(message = %m, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_owned(),
                )
            }
        };
        (status, Json(json!({ "error": client_message }))).into_response()
    }
}

impl From<CatalogError> for ServerError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::Validation(m) => ServerError::BadRequest(m),
            CatalogError::NotFound(m) => ServerError::NotFound(m),
            CatalogError::Unavailable(m) => ServerError::BackendNotReady(m),
            upstream @ CatalogError::Upstream { .. } => ServerError::Upstream(upstream),
        }
    }
}

impl From<validator::ValidationErrors> for ServerError {
    fn from(e: validator::ValidationErrors) -> Self {
        ServerError::BadRequest(e.to_string())
    }
}

impl From<anyhow::Error> for ServerError {
    fn from(e: anyhow::Error) -> Self {
        // Keep the whole chain in the logs; clients get a generic message.
        error!(error = ?e, "converting anyhow error to ServerError::Internal");
        ServerError::Internal(e.to_string())
    }
}
