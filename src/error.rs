use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;
use utoipa::ToSchema;
use validator::ValidationErrors;

pub type ApiResult<T> = Result<T, ApiError>;

/// ErrorBody
///
/// The single error shape returned by every failing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS)]
#[ts(export)]
pub struct ErrorBody {
    pub errors: Vec<String>,
}

impl ErrorBody {
    pub fn new(errors: Vec<String>) -> Self {
        Self { errors }
    }

    pub fn single(message: impl Into<String>) -> Self {
        Self {
            errors: vec![message.into()],
        }
    }
}

/// ApiError
///
/// Every handler returns `Result<_, ApiError>`. Client-side failures map to
/// 4xx with a readable message, everything else is logged and reported as a
/// generic 500 so no persistence detail leaks to the caller.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Input failed to deserialize or violated a declared rule.
    #[error("validation failed: {0:?}")]
    Validation(Vec<String>),

    /// Well-formed input that conflicts with stored state (duplicate email, category name).
    #[error("{0}")]
    Conflict(&'static str),

    #[error("{0}")]
    BadRequest(String),

    /// No bearer token at all. Answered with an empty 401.
    #[error("missing bearer token")]
    Unauthenticated,

    /// A token was supplied but did not verify.
    #[error("unauthorized")]
    Unauthorized,

    #[error("insufficient privileges")]
    Forbidden,

    /// Absent, or present but not owned by the requester.
    #[error("{0}")]
    NotFound(&'static str),

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("password hashing failed: {0}")]
    PasswordHash(String),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |err| {
                    let detail = err
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| err.code.to_string());
                    format!("{field}: {detail}")
                })
            })
            .collect();
        // field_errors() is a HashMap; keep the output stable for clients.
        messages.sort();
        ApiError::Validation(messages)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::Conflict(_) | Self::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Unauthenticated | Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Database(_)
            | Self::Migration(_)
            | Self::Token(_)
            | Self::PasswordHash(_)
            | Self::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            Self::Unauthenticated => return status.into_response(),
            Self::Validation(errors) => ErrorBody::new(errors),
            Self::Conflict(msg) | Self::NotFound(msg) => ErrorBody::single(msg),
            Self::BadRequest(msg) => ErrorBody::single(msg),
            Self::Unauthorized => ErrorBody::single("Unauthorized"),
            Self::Forbidden => ErrorBody::single("Insufficient privileges"),
            internal => {
                tracing::error!(error = %internal, "request failed");
                ErrorBody::single("Internal server error")
            }
        };
        (status, Json(body)).into_response()
    }
}

/// Unique-constraint violations surface as 400 Conflict instead of a 500.
pub fn conflict_on_unique(err: sqlx::Error, message: &'static str) -> ApiError {
    match err.as_database_error() {
        Some(db) if db.is_unique_violation() => ApiError::Conflict(message),
        _ => ApiError::Database(err),
    }
}
