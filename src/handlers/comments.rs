use axum::{Json, extract::State, http::StatusCode};

use super::now_epoch;
use crate::{
    AppState,
    auth::AuthUser,
    error::{ApiError, ApiResult, ErrorBody},
    models::{CommentResponse, CreateCommentRequest, ListResponse, NewComment, PageParams},
    validation::{ValidatedJson, ValidatedPath, ValidatedQuery},
};

const ARTICLE_NOT_FOUND: &str = "Article not found";
const COMMENT_NOT_FOUND: &str = "Comment not found";

/// list_comments
///
/// [Public Route] Comments of one article, oldest first.
#[utoipa::path(
    get,
    path = "/comments/{article_id}",
    tag = "comments",
    params(("article_id" = i64, Path, description = "Article id"), PageParams),
    responses(
        (status = 200, description = "Page of comments", body = ListResponse<CommentResponse>),
        (status = 404, description = "Unknown article", body = ErrorBody)
    )
)]
pub async fn list_comments(
    State(state): State<AppState>,
    ValidatedPath(article_id): ValidatedPath<i64>,
    ValidatedQuery(params): ValidatedQuery<PageParams>,
) -> ApiResult<Json<ListResponse<CommentResponse>>> {
    if state.repo.get_article(article_id).await?.is_none() {
        return Err(ApiError::NotFound(ARTICLE_NOT_FOUND));
    }

    let page = params.pagination();
    let repo = state.repo.clone();
    let list = state
        .cache
        .get_or_load("comments.list", &(article_id, &params), || async move {
            let rows = repo.list_comments(article_id, page).await?;
            Ok(rows.map(CommentResponse::from))
        })
        .await?;
    Ok(Json(list))
}

#[utoipa::path(
    post,
    path = "/comments/{article_id}",
    tag = "comments",
    params(("article_id" = i64, Path, description = "Article id")),
    request_body = CreateCommentRequest,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Created", body = CommentResponse),
        (status = 400, description = "Invalid input", body = ErrorBody),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Unknown article", body = ErrorBody)
    )
)]
pub async fn create_comment(
    user: AuthUser,
    State(state): State<AppState>,
    ValidatedPath(article_id): ValidatedPath<i64>,
    ValidatedJson(payload): ValidatedJson<CreateCommentRequest>,
) -> ApiResult<Json<CommentResponse>> {
    if state.repo.get_article(article_id).await?.is_none() {
        return Err(ApiError::NotFound(ARTICLE_NOT_FOUND));
    }
    if state.repo.get_user(user.id).await?.is_none() {
        return Err(ApiError::Unauthorized);
    }

    let comment = state
        .repo
        .create_comment(NewComment {
            text: payload.text,
            created_at: now_epoch(),
            article_id,
            user_id: user.id,
        })
        .await?;

    tracing::info!(comment_id = comment.id, article_id, user_id = user.id, "comment created");
    Ok(Json(comment.into()))
}

/// delete_comment
///
/// [Author Route] Only the comment's author may delete it. A comment under a
/// different article, or by someone else, is reported as missing.
#[utoipa::path(
    delete,
    path = "/comments/{article_id}/{comment_id}",
    tag = "comments",
    params(
        ("article_id" = i64, Path, description = "Article id"),
        ("comment_id" = i64, Path, description = "Comment id")
    ),
    security(("bearer" = [])),
    responses(
        (status = 204, description = "Deleted"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Not found or not the author", body = ErrorBody)
    )
)]
pub async fn delete_comment(
    user: AuthUser,
    State(state): State<AppState>,
    ValidatedPath((article_id, comment_id)): ValidatedPath<(i64, i64)>,
) -> ApiResult<StatusCode> {
    let comment = state
        .repo
        .get_comment(article_id, comment_id)
        .await?
        .ok_or(ApiError::NotFound(COMMENT_NOT_FOUND))?;

    if comment.user_id != user.id {
        tracing::warn!(
            comment_id,
            user_id = user.id,
            author_id = comment.user_id,
            "comment delete refused: not the author"
        );
        return Err(ApiError::NotFound(COMMENT_NOT_FOUND));
    }

    if !state.repo.delete_comment(comment.id).await? {
        return Err(ApiError::NotFound(COMMENT_NOT_FOUND));
    }

    tracing::info!(comment_id, article_id, user_id = user.id, "comment deleted");
    Ok(StatusCode::NO_CONTENT)
}
