use crate::{AppState, handlers::comments};
use axum::{
    Router,
    routing::{delete, get},
};

/// Comment Router
///
/// Comments are addressed through their article. Listing is public, posting
/// needs a token, deleting is limited to the author.
pub fn comment_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/comments/{article_id}",
            get(comments::list_comments).post(comments::create_comment),
        )
        .route(
            "/comments/{article_id}/{comment_id}",
            delete(comments::delete_comment),
        )
}
