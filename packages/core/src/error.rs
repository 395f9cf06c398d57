//! Error taxonomy shared by the repositories, services and HTTP boundary.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

/// Every failure the core can surface.
///
/// The set of kinds is closed so callers branch on [`AppError::kind`]
/// rather than on message text; the payload is a human-readable detail.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AppError {
    /// Missing required field or out-of-domain input. Caller-fixable.
    #[error("validation error: {0}")]
    Validation(String),

    /// No row matched the requested key.
    #[error("not found: {0}")]
    NotFound(String),

    /// Underlying store failure (connection, constraint, decode).
    #[error("persistence error: {0}")]
    Persistence(String),
}

/// Fieldless discriminant of [`AppError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Persistence,
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Validation(_) => ErrorKind::Validation,
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::Persistence(_) => ErrorKind::Persistence,
        }
    }

    pub fn detail(&self) -> &str {
        match self {
            AppError::Validation(msg) | AppError::NotFound(msg) | AppError::Persistence(msg) => {
                msg
            }
        }
    }

    /// Prefix the detail with `context`, keeping the kind.
    pub fn context(self, context: impl std::fmt::Display) -> Self {
        match self {
            AppError::Validation(msg) => AppError::Validation(format!("{}: {}", context, msg)),
            AppError::NotFound(msg) => AppError::NotFound(format!("{}: {}", context, msg)),
            AppError::Persistence(msg) => AppError::Persistence(format!("{}: {}", context, msg)),
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => AppError::NotFound("no matching row".to_string()),
            other => AppError::Persistence(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self.kind() {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Persistence => {
                tracing::error!("Persistence failure: {}", self.detail());
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(json!({ "error": self.detail() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_preserves_kind() {
        let err = AppError::not_found("device abc").context("updating device abc");
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.detail(), "updating device abc: device abc");
    }

    #[test]
    fn row_not_found_maps_to_not_found() {
        let err: AppError = sqlx::Error::RowNotFound.into();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn pool_closed_maps_to_persistence() {
        let err: AppError = sqlx::Error::PoolClosed.into();
        assert_eq!(err.kind(), ErrorKind::Persistence);
    }

    #[test]
    fn status_codes_follow_kind() {
        assert_eq!(
            AppError::validation("x").into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::not_found("x").into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::persistence("x").into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
