use axum::{Json, extract::State, http::StatusCode};

use super::now_epoch;
use crate::{
    AppState,
    auth::AuthUser,
    error::{ApiError, ApiResult, ErrorBody},
    models::{
        Article, ArticleResponse, ArticleSearchParams, CreateArticleRequest, ListResponse,
        NewArticle, PageParams, UpdateArticleRequest,
    },
    search::{Filter, article_filter},
    validation::{ValidatedJson, ValidatedPath, ValidatedQuery},
};

const ARTICLE_NOT_FOUND: &str = "Article not found";

/// Loads an article for a write by `user`. Missing and foreign articles both
/// come back as 404; only the log tells them apart.
async fn owned_article(state: &AppState, user: &AuthUser, id: i64) -> ApiResult<Article> {
    let article = state
        .repo
        .get_article(id)
        .await?
        .ok_or(ApiError::NotFound(ARTICLE_NOT_FOUND))?;

    if article.publisher_id != user.id {
        tracing::warn!(
            article_id = id,
            user_id = user.id,
            owner_id = article.publisher_id,
            "article write refused: not the publisher"
        );
        return Err(ApiError::NotFound(ARTICLE_NOT_FOUND));
    }
    Ok(article)
}

/// list_articles
///
/// [Public Route] Every article, oldest first, one page at a time.
#[utoipa::path(
    get,
    path = "/articles",
    tag = "articles",
    params(PageParams),
    responses(
        (status = 200, description = "Page of articles", body = ListResponse<ArticleResponse>),
        (status = 400, description = "Invalid paging", body = ErrorBody)
    )
)]
pub async fn list_articles(
    State(state): State<AppState>,
    ValidatedQuery(params): ValidatedQuery<PageParams>,
) -> ApiResult<Json<ListResponse<ArticleResponse>>> {
    let page = params.pagination();
    let repo = state.repo.clone();
    let list = state
        .cache
        .get_or_load("articles.list", &params, || async move {
            let rows = repo.search_articles(&Filter::new(), page).await?;
            Ok(rows.map(ArticleResponse::from))
        })
        .await?;
    Ok(Json(list))
}

/// search_articles
///
/// [Public Route] Filters combine with AND; absent filters are skipped.
#[utoipa::path(
    get,
    path = "/articles/search",
    tag = "articles",
    params(ArticleSearchParams),
    responses(
        (status = 200, description = "Matching articles", body = ListResponse<ArticleResponse>),
        (status = 400, description = "Invalid filter", body = ErrorBody)
    )
)]
pub async fn search_articles(
    State(state): State<AppState>,
    ValidatedQuery(params): ValidatedQuery<ArticleSearchParams>,
) -> ApiResult<Json<ListResponse<ArticleResponse>>> {
    let filter = article_filter(&params, now_epoch());
    let page = params.pagination();
    let repo = state.repo.clone();
    let list = state
        .cache
        .get_or_load("articles.search", &params, || async move {
            let rows = repo.search_articles(&filter, page).await?;
            Ok(rows.map(ArticleResponse::from))
        })
        .await?;
    Ok(Json(list))
}

/// create_article
///
/// [Authenticated Route] Publishes an article under the caller's account in
/// an existing category.
#[utoipa::path(
    post,
    path = "/articles",
    tag = "articles",
    request_body = CreateArticleRequest,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Created", body = ArticleResponse),
        (status = 400, description = "Invalid input", body = ErrorBody),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Unknown category", body = ErrorBody)
    )
)]
pub async fn create_article(
    user: AuthUser,
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreateArticleRequest>,
) -> ApiResult<Json<ArticleResponse>> {
    if state.repo.get_category(payload.category_id).await?.is_none() {
        return Err(ApiError::NotFound("Category not found"));
    }
    // A valid token for a since-deleted account.
    if state.repo.get_user(user.id).await?.is_none() {
        return Err(ApiError::Unauthorized);
    }

    let article = state
        .repo
        .create_article(NewArticle {
            title: payload.title,
            text: payload.text,
            created_at: now_epoch(),
            category_id: payload.category_id,
            publisher_id: user.id,
        })
        .await?;

    tracing::info!(article_id = article.id, user_id = user.id, "article created");
    Ok(Json(article.into()))
}

#[utoipa::path(
    get,
    path = "/articles/{id}",
    tag = "articles",
    params(("id" = i64, Path, description = "Article id")),
    responses(
        (status = 200, description = "Article", body = ArticleResponse),
        (status = 404, description = "Not found", body = ErrorBody)
    )
)]
pub async fn get_article(
    State(state): State<AppState>,
    ValidatedPath(id): ValidatedPath<i64>,
) -> ApiResult<Json<ArticleResponse>> {
    let article = state
        .repo
        .get_article(id)
        .await?
        .ok_or(ApiError::NotFound(ARTICLE_NOT_FOUND))?;
    Ok(Json(article.into()))
}

/// update_article
///
/// [Owner Route] Merges the supplied fields into the article. Category and
/// publisher cannot change.
#[utoipa::path(
    patch,
    path = "/articles/{id}",
    tag = "articles",
    params(("id" = i64, Path, description = "Article id")),
    request_body = UpdateArticleRequest,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Updated", body = ArticleResponse),
        (status = 400, description = "Invalid input", body = ErrorBody),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Not found or not the publisher", body = ErrorBody)
    )
)]
pub async fn update_article(
    user: AuthUser,
    State(state): State<AppState>,
    ValidatedPath(id): ValidatedPath<i64>,
    ValidatedJson(payload): ValidatedJson<UpdateArticleRequest>,
) -> ApiResult<Json<ArticleResponse>> {
    let mut article = owned_article(&state, &user, id).await?;

    if let Some(title) = payload.title {
        article.title = title;
    }
    if let Some(text) = payload.text {
        article.text = text;
    }
    state.repo.save_article(&article).await?;

    tracing::info!(article_id = id, user_id = user.id, "article updated");
    Ok(Json(article.into()))
}

/// delete_article
///
/// [Owner Route] Removes the article and, through the foreign key, its comments.
#[utoipa::path(
    delete,
    path = "/articles/{id}",
    tag = "articles",
    params(("id" = i64, Path, description = "Article id")),
    security(("bearer" = [])),
    responses(
        (status = 204, description = "Deleted"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Not found or not the publisher", body = ErrorBody)
    )
)]
pub async fn delete_article(
    user: AuthUser,
    State(state): State<AppState>,
    ValidatedPath(id): ValidatedPath<i64>,
) -> ApiResult<StatusCode> {
    let article = owned_article(&state, &user, id).await?;

    if !state.repo.delete_article(article.id).await? {
        return Err(ApiError::NotFound(ARTICLE_NOT_FOUND));
    }

    tracing::info!(article_id = id, user_id = user.id, "article deleted");
    Ok(StatusCode::NO_CONTENT)
}
