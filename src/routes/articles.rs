use crate::{AppState, handlers::articles};
use axum::{Router, routing::get};

/// Article Router
///
/// Reads are public. `POST` needs a bearer token; `PATCH` and `DELETE` also
/// need the caller to be the publisher.
pub fn article_routes() -> Router<AppState> {
    Router::new()
        // GET /articles?page=&page_size=
        // POST /articles
        .route(
            "/articles",
            get(articles::list_articles).post(articles::create_article),
        )
        // GET /articles/search?title=&text=&category_id=&publisher_id=&min_date=&max_date=
        .route("/articles/search", get(articles::search_articles))
        .route(
            "/articles/{id}",
            get(articles::get_article)
                .patch(articles::update_article)
                .delete(articles::delete_article),
        )
}
