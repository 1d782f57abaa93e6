//! Application Error Types
//!
//! Centralized error handling with Axum integration. Every error renders as
//! the API envelope `{ "success": false, "errorMessage": "..." }`.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// A unique or check constraint rejected a write.
    #[error("Constraint violation: {constraint}")]
    ConstraintViolation { constraint: String },

    /// A foreign key pointed at a row that does not exist.
    #[error("Missing reference: {constraint}")]
    MissingReference { constraint: String },

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

impl AppError {
    /// Map a sqlx error, turning unique/check violations into
    /// [`AppError::ConstraintViolation`] and foreign key violations into
    /// [`AppError::MissingReference`] so callers can recover from them.
    pub fn from_write(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err)
                if db_err.is_unique_violation() || db_err.is_check_violation() =>
            {
                AppError::ConstraintViolation {
                    constraint: db_err.constraint().unwrap_or("unknown").to_string(),
                }
            }
            sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
                AppError::MissingReference {
                    constraint: db_err.constraint().unwrap_or("unknown").to_string(),
                }
            }
            _ => AppError::Database(err),
        }
    }

    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) | AppError::MissingReference { .. } => StatusCode::NOT_FOUND,
            AppError::BadRequest(_)
            | AppError::Validation(_)
            | AppError::ConstraintViolation { .. } => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Internal(_) | AppError::Database(_) | AppError::Redis(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message safe to show to the caller.
    pub fn public_message(&self) -> String {
        match self {
            AppError::NotFound(msg)
            | AppError::BadRequest(msg)
            | AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::Validation(msg) => msg.clone(),
            AppError::ConstraintViolation { .. } => "This record already exists.".into(),
            AppError::MissingReference { .. } => "The referenced record does not exist.".into(),
            AppError::Internal(_) | AppError::Database(_) | AppError::Redis(_) => {
                "Internal server error".into()
            }
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

/// Error response body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub success: bool,
    pub error_message: String,
}

/// Field-level validation error
#[derive(Debug, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        match &self {
            AppError::Internal(msg) => tracing::error!("Internal error: {}", msg),
            AppError::Database(e) => tracing::error!("Database error: {}", e),
            AppError::Redis(e) => tracing::error!("Redis error: {}", e),
            other => tracing::debug!(status = status.as_u16(), "Request failed: {}", other),
        }

        let body = ErrorResponse {
            success: false,
            error_message: self.public_message(),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(AppError::NotFound("x".into()), StatusCode::NOT_FOUND ; "not found")]
    #[test_case(AppError::Validation("x".into()), StatusCode::BAD_REQUEST ; "validation")]
    #[test_case(AppError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED ; "unauthorized")]
    #[test_case(AppError::Forbidden("x".into()), StatusCode::FORBIDDEN ; "forbidden")]
    #[test_case(AppError::ConstraintViolation { constraint: "c".into() }, StatusCode::BAD_REQUEST ; "constraint")]
    #[test_case(AppError::MissingReference { constraint: "tweets_user_id_fkey".into() }, StatusCode::NOT_FOUND ; "missing reference")]
    #[test_case(AppError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR ; "internal")]
    fn test_status_mapping(err: AppError, expected: StatusCode) {
        assert_eq!(err.status(), expected);
    }

    #[test]
    fn test_internal_message_is_hidden() {
        let err = AppError::Internal("connection string leaked".into());
        assert_eq!(err.public_message(), "Internal server error");
    }

    #[test]
    fn test_error_body_uses_envelope_shape() {
        let body = ErrorResponse {
            success: false,
            error_message: "This username is already taken.".into(),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["errorMessage"], "This username is already taken.");
    }
}
