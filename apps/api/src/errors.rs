use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// Every variant is scoped to the one request that raised it; nothing here is
/// fatal to the process.
#[derive(Debug, Error)]
pub enum AppError {
    /// Input rejected before any collaborator was called.
    #[error("{0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// A collaborator (database, storage, auth) call failed.
    #[error("{0}")]
    Dependency(String),

    /// The dependent write failed after the primary write succeeded.
    #[error("{}", consistency_message(.application_id, .cause, .rollback_failure.as_deref()))]
    Consistency {
        application_id: Uuid,
        cause: String,
        rollback_failure: Option<String>,
    },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Wraps a collaborator failure with the operation that was attempted.
    pub fn dependency(context: &str, cause: impl std::fmt::Display) -> Self {
        AppError::Dependency(format!("{context}: {cause}"))
    }
}

fn consistency_message(application_id: &Uuid, cause: &str, rollback_failure: Option<&str>) -> String {
    match rollback_failure {
        None => format!("Failed to save work experiences: {cause}. The application was rolled back"),
        Some(rollback) => format!(
            "Failed to save work experiences: {cause}. Rolling back application {application_id} also failed: {rollback}"
        ),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone()),
            AppError::Dependency(msg) => {
                tracing::error!("Dependency error: {msg}");
                (StatusCode::BAD_GATEWAY, "DEPENDENCY_ERROR", msg.clone())
            }
            AppError::Consistency { .. } => {
                let msg = self.to_string();
                tracing::error!("Consistency error: {msg}");
                (StatusCode::INTERNAL_SERVER_ERROR, "CONSISTENCY_ERROR", msg)
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
