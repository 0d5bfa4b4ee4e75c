use axum::{
    Json, Router,
    extract::FromRef,
    http::{HeaderName, StatusCode},
    response::IntoResponse,
    routing::get,
};
use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod password;
pub mod repository;
pub mod search;
pub mod validation;

// One router per resource; access rules live in the handlers' extractors.
pub mod routes;
use routes::{articles, auth as auth_routes, categories, comments};

// --- Public Re-exports ---

pub use cache::ResponseCache;
pub use config::AppConfig;
pub use error::{ApiError, ApiResult};
pub use repository::{RepositoryState, SqliteRepository};

/// ApiDoc
///
/// OpenAPI document for every handler and DTO, served at
/// `/api-docs/openapi.json` and browsable under `/swagger-ui`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::login, handlers::auth::register,
        handlers::articles::list_articles, handlers::articles::search_articles,
        handlers::articles::create_article, handlers::articles::get_article,
        handlers::articles::update_article, handlers::articles::delete_article,
        handlers::categories::list_categories, handlers::categories::search_categories,
        handlers::categories::create_category, handlers::categories::get_category,
        handlers::categories::update_category, handlers::categories::delete_category,
        handlers::comments::list_comments, handlers::comments::create_comment,
        handlers::comments::delete_comment,
    ),
    components(
        schemas(
            models::UserRef, models::Category, models::ArticleResponse, models::CommentResponse,
            models::AuthResponse, models::LoginRequest, models::RegisterRequest,
            models::CreateArticleRequest, models::UpdateArticleRequest, models::CategoryRequest,
            models::UpdateCategoryRequest, models::CreateCommentRequest, error::ErrorBody,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "auth", description = "Login and registration"),
        (name = "articles", description = "Articles and article search"),
        (name = "categories", description = "Categories (writes are admin only)"),
        (name = "comments", description = "Comments on articles")
    )
)]
pub struct ApiDoc;

/// Registers the `bearer` scheme referenced by the protected paths.
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// AppState
///
/// Everything a handler can reach, built once in `main` and cloned per
/// request. Each field is an `Arc` or cheap to clone.
#[derive(Clone)]
pub struct AppState {
    /// Persistence, behind the `Repository` trait.
    pub repo: RepositoryState,
    /// Listing/search response cache.
    pub cache: ResponseCache,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(repo: RepositoryState, cache: ResponseCache, config: AppConfig) -> Self {
        Self {
            repo,
            cache,
            config,
        }
    }
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for ResponseCache {
    fn from_ref(app_state: &AppState) -> ResponseCache {
        app_state.cache.clone()
    }
}

// Needed by the `AuthUser`/`AdminUser` extractors for the token secret.
impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(error::ErrorBody::single("Not Found")),
    )
}

/// create_router
///
/// Assembles every resource router, the docs and the health check, then wraps
/// the whole app in the request-id, tracing and CORS layers.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // GET /health
        .route("/health", get(|| async { "ok" }))
        .merge(auth_routes::auth_routes())
        .merge(articles::article_routes())
        .merge(categories::category_routes())
        .merge(comments::comment_routes())
        .fallback(not_found)
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(
                    x_request_id.clone(),
                    MakeRequestUuid,
                ))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span for one request: method, uri and the `x-request-id` set by the layer
/// above, so every log line of a request can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
