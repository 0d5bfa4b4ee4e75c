//! HTTP handlers, one module per resource.
//!
//! Every handler returns `Result<_, ApiError>`; validation and auth happen in
//! the extractors before the body runs.

pub mod articles;
pub mod auth;
pub mod categories;
pub mod comments;

use chrono::Utc;

/// Current unix time in seconds, the unit every `created_at` is stored in.
pub(crate) fn now_epoch() -> i64 {
    Utc::now().timestamp()
}
