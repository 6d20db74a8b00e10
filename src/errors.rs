use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::models::ContentType;

/// ApiError
///
/// The error taxonomy every fallible core operation reports through. All
/// variants propagate upward unchanged (fail-fast); nothing below the handler
/// layer retries or silently recovers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A request was rejected before any store call was made: a required
    /// field is missing, or mutually-exclusive inputs were both empty.
    #[error("validation failed: {0}")]
    Validation(String),

    /// An update or delete by id affected zero rows. Surfaced distinctly from
    /// generic failure so callers can decide whether "already gone" is benign.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// The access replace for one (user, type) cleared the existing grants
    /// but failed while writing the new set. The user is left with zero
    /// access for that type; retrying the whole replace is safe.
    #[error("access replace for user {user_id} ({content_type}) failed after clearing existing grants")]
    PartialMutation {
        user_id: i64,
        content_type: ContentType,
        #[source]
        source: sqlx::Error,
    },

    /// The persistent store was unreachable or rejected the operation.
    /// Always surfaced, never swallowed, never retried here.
    #[error("data store error")]
    Transport(#[from] sqlx::Error),

    /// The object storage boundary failed while preparing an upload.
    #[error("storage backend error")]
    Storage(String),

    /// Invalid credentials. Deliberately generic: unknown identifier, wrong
    /// code and deactivated account are indistinguishable to the caller.
    #[error("invalid credentials")]
    Unauthorized,

    /// The subject is authenticated but lacks the admin capability.
    #[error("forbidden")]
    Forbidden,
}

/// Convenience alias used across the repository and handler layers.
pub type ApiResult<T> = Result<T, ApiError>;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::PartialMutation { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Transport(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
        };

        // Store-level failures carry connection details; log the source here
        // and hand the client only the stable message.
        match &self {
            ApiError::Transport(e) => tracing::error!("store error: {e:?}"),
            ApiError::Storage(e) => tracing::error!("storage error: {e}"),
            ApiError::PartialMutation {
                user_id,
                content_type,
                source,
            } => tracing::error!(
                "partial access mutation: user={user_id} type={content_type} source={source:?}"
            ),
            _ => {}
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
