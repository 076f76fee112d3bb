// src/error.rs
use std::collections::BTreeMap;

use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use serde_json::json;
use thiserror::Error;

/// Field name -> list of messages, rendered under `errors` in the failure envelope.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("validation failed: {message}")]
    ValidationError { message: String, errors: FieldErrors },
    #[error("upstream error: {0}")]
    Upstream(String),
    #[error("rate limited: {0}")]
    RateLimited(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        AppError::Unauthorized(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        AppError::Forbidden(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        AppError::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        AppError::Conflict(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::ValidationError { message: msg.into(), errors: FieldErrors::new() }
    }

    /// 422 listing every offending field.
    pub fn invalid_fields(errors: FieldErrors) -> Self {
        let message = match errors.len() {
            1 => "The given data was invalid (1 field).".to_string(),
            n => format!("The given data was invalid ({n} fields)."),
        };
        AppError::ValidationError { message, errors }
    }

    pub fn upstream(msg: impl Into<String>) -> Self {
        AppError::Upstream(msg.into())
    }

    pub fn rate_limited(msg: impl Into<String>) -> Self {
        AppError::RateLimited(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::DatabaseError(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::ValidationError { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match self {
            AppError::DatabaseError(e) => {
                tracing::error!(error = %e, "Database error");
                json!({ "success": false, "message": "Database error occurred" })
            }
            AppError::Internal(msg) => {
                tracing::error!(%msg, "Internal error");
                json!({ "success": false, "message": "Internal server error" })
            }
            AppError::ValidationError { message, errors } if !errors.is_empty() => {
                json!({ "success": false, "message": message, "errors": errors })
            }
            AppError::ValidationError { message, .. } => {
                json!({ "success": false, "message": message })
            }
            AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg)
            | AppError::Upstream(msg)
            | AppError::RateLimited(msg) => json!({ "success": false, "message": msg }),
        };

        (status, Json(body)).into_response()
    }
}

/// Maps constraint violations from a write: unique (23505) to 409 with `message`,
/// foreign key (23503) to 422. Anything else passes through.
pub fn map_constraint_violation(err: sqlx::Error, message: &str) -> AppError {
    match err {
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505") => {
            AppError::conflict(message)
        }
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23503") => {
            AppError::validation("Referenced record does not exist")
        }
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(resp: Response) -> serde_json::Value {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn not_found_uses_failure_envelope() {
        let resp = AppError::not_found("Game not found").into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body = body_json(resp).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Game not found");
        assert!(body.get("errors").is_none());
    }

    #[tokio::test]
    async fn invalid_fields_lists_each_field() {
        let mut errors = FieldErrors::new();
        errors.entry("limit".into()).or_default().push("must be between 1 and 50".into());
        errors.entry("sort".into()).or_default().push("is not a valid sort column".into());

        let resp = AppError::invalid_fields(errors).into_response();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(resp).await;
        assert_eq!(body["errors"]["limit"][0], "must be between 1 and 50");
        assert_eq!(body["errors"]["sort"][0], "is not a valid sort column");
    }

    #[tokio::test]
    async fn database_errors_hide_details() {
        let resp = AppError::from(sqlx::Error::RowNotFound).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(resp).await;
        assert_eq!(body["message"], "Database error occurred");
    }
}
