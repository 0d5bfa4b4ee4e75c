//! Request validation extractors.
//!
//! `ValidatedJson`, `ValidatedQuery` and `ValidatedPath` wrap the stock axum
//! extractors. Payloads are deserialized (unknown fields are dropped),
//! sanitized, then checked against their `#[validate]` rules. Any failure
//! short-circuits the request with a 400 and a list of field messages before
//! the handler runs.

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::ApiError;

/// In-place normalisation applied before validation rules run.
pub trait Sanitize {
    fn sanitize(&mut self);
}

/// Trims surrounding whitespace and HTML-escapes the remainder.
pub fn sanitize_text(raw: &str) -> String {
    escape_html(raw.trim())
}

/// Replaces the characters that are significant in HTML with entities.
pub fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            '/' => escaped.push_str("&#x2F;"),
            '\\' => escaped.push_str("&#x5C;"),
            '`' => escaped.push_str("&#96;"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn check<T: Sanitize + Validate>(mut value: T) -> Result<T, ApiError> {
    value.sanitize();
    value.validate()?;
    Ok(value)
}

/// ValidatedJson
///
/// JSON body extractor. Must be the last handler argument, so it runs after
/// the auth extractors.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Sanitize + Validate,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::Validation(vec![rejection.body_text()]))?;
        check(value).map(Self)
    }
}

/// ValidatedQuery
///
/// Query-string extractor. Missing parameters take the struct's defaults.
#[derive(Debug, Clone)]
pub struct ValidatedQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ValidatedQuery<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Sanitize + Validate,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::Validation(vec![rejection.body_text()]))?;
        check(value).map(Self)
    }
}

/// ValidatedPath
///
/// Path extractor whose parse failures use the API's error shape instead of
/// axum's plain-text rejection.
#[derive(Debug, Clone)]
pub struct ValidatedPath<T>(pub T);

impl<S, T> FromRequestParts<S> for ValidatedPath<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Path::<T>::from_request_parts(parts, state)
            .await
            .map(|Path(value)| Self(value))
            .map_err(|rejection| ApiError::Validation(vec![rejection.body_text()]))
    }
}
