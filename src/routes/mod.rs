/// Router Module Index
///
/// One router per resource. Access control is not a layer here: each handler
/// states what it needs through its extractors (`AuthUser`, `AdminUser`), so
/// public and protected methods can share a path.

/// `/auth/login`, `/auth/register`.
pub mod auth;

pub mod articles;
pub mod categories;
pub mod comments;
