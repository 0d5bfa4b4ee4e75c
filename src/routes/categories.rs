use crate::{AppState, handlers::categories};
use axum::{Router, routing::get};

/// Category Router
///
/// Reads are public, every write requires the admin role.
pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/categories",
            get(categories::list_categories).post(categories::create_category),
        )
        .route("/categories/search", get(categories::search_categories))
        .route(
            "/categories/{id}",
            get(categories::get_category)
                .patch(categories::update_category)
                .delete(categories::delete_category),
        )
}
