use std::borrow::Cow;

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// SQLSTATE raised on a unique constraint violation
pub const UNIQUE_VIOLATION: &str = "23505";
/// SQLSTATE raised on a foreign key violation
pub const FOREIGN_KEY_VIOLATION: &str = "23503";
/// SQLSTATE raised on a check constraint violation
pub const CHECK_VIOLATION: &str = "23514";

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Failure reported by a non-sqlx store backend, tagged with its SQLSTATE if any
    #[error("Store error ({code:?}): {message}")]
    Store {
        code: Option<String>,
        message: String,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// The statement ran but matched no rows
    #[error("{0}")]
    Unfulfilled(String),

    /// Path, query or body that could not be extracted into the handler's types
    #[error("Rejected request: {0}")]
    Rejected(String),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Rejected(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::Rejected(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Rejected(rejection.body_text())
    }
}

impl AppError {
    /// SQLSTATE code carried by the underlying store error, if any.
    pub fn sqlstate(&self) -> Option<Cow<'_, str>> {
        match self {
            AppError::Database(e) => e.as_database_error().and_then(|db| db.code()),
            AppError::Store { code, .. } => code.as_deref().map(Cow::Borrowed),
            _ => None,
        }
    }
}

/// Status code and client-facing message derived from a store error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub status: bool,
    pub status_code: StatusCode,
    pub message: &'static str,
}

/// Maps a SQLSTATE code to the response a client sees.
///
/// Codes outside the three constraint classes, and errors with no code at all
/// (pool timeouts, I/O, decoding), all collapse to a generic 500.
pub fn classify(code: Option<&str>) -> Classification {
    let (status_code, message) = match code {
        Some(UNIQUE_VIOLATION) => (
            StatusCode::CONFLICT,
            "A collection with the same name already exists.(duplicate key value violates unique constraint)",
        ),
        Some(FOREIGN_KEY_VIOLATION) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            "Invalid user ID provided.",
        ),
        Some(CHECK_VIOLATION) => (
            StatusCode::BAD_REQUEST,
            "A provided value violates a constraint. Please check your input values.",
        ),
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "An unexpected error occurred. Please try again later.",
        ),
    };

    Classification {
        status: false,
        status_code,
        message,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, json!({ "error": msg })),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, json!({ "error": msg })),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, json!({ "error": msg })),
            AppError::Unfulfilled(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "status": false, "message": msg }),
            ),
            AppError::Database(_) | AppError::Store { .. } => {
                let code = self.sqlstate();
                let classification = classify(code.as_deref());

                tracing::error!(
                    error = %self,
                    sqlstate = ?code,
                    status = classification.status_code.as_u16(),
                    "Store operation failed"
                );

                classified(classification)
            }
            // Malformed input carries no SQLSTATE and lands in the generic class
            AppError::Rejected(reason) => {
                tracing::warn!(reason = %reason, "Request rejected");
                classified(classify(None))
            }
        };

        (status, Json(body)).into_response()
    }
}

fn classified(classification: Classification) -> (StatusCode, serde_json::Value) {
    (
        classification.status_code,
        json!({
            "status": classification.status,
            "message": classification.message
        }),
    )
}

pub type AppResult<T> = Result<T, AppError>;
