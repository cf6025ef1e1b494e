//! Error types for the REST API.
//!
//! [`ApiError`] unifies all failure modes of the CRUD endpoints into a
//! single enum that converts into an Axum HTTP response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Errors that can occur in the REST layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The requested item does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The path id is not an integer.
    #[error("invalid id: {0}")]
    InvalidId(String),

    /// The store failed.
    #[error("store error: {0}")]
    Store(#[from] todosync_db::DbError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Self::InvalidId(_) => (StatusCode::BAD_REQUEST, String::from("Invalid ID format")),
            Self::Store(e) => {
                tracing::error!(error = %e, "REST request failed in the store");
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        };

        let body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}
