use crate::{AppState, handlers::auth};
use axum::{Router, routing::post};

/// Credential exchange. Both endpoints are public and answer with a bearer token.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(auth::login))
        .route("/auth/register", post(auth::register))
}
