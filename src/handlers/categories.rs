use axum::{Json, extract::State, http::StatusCode};

use crate::{
    AppState,
    auth::AdminUser,
    error::{ApiError, ApiResult, ErrorBody},
    models::{
        Category, CategoryRequest, CategorySearchParams, ListResponse, PageParams,
        UpdateCategoryRequest,
    },
    search::{Filter, category_filter},
    validation::{ValidatedJson, ValidatedPath, ValidatedQuery},
};

const CATEGORY_NOT_FOUND: &str = "Category not found";
const CATEGORY_EXISTS: &str = "Category already exists";

#[utoipa::path(
    get,
    path = "/categories",
    tag = "categories",
    params(PageParams),
    responses(
        (status = 200, description = "Page of categories", body = ListResponse<Category>),
        (status = 400, description = "Invalid paging", body = ErrorBody)
    )
)]
pub async fn list_categories(
    State(state): State<AppState>,
    ValidatedQuery(params): ValidatedQuery<PageParams>,
) -> ApiResult<Json<ListResponse<Category>>> {
    let page = params.pagination();
    let repo = state.repo.clone();
    let list = state
        .cache
        .get_or_load("categories.list", &params, || async move {
            Ok(repo.search_categories(&Filter::new(), page).await?)
        })
        .await?;
    Ok(Json(list))
}

#[utoipa::path(
    get,
    path = "/categories/search",
    tag = "categories",
    params(CategorySearchParams),
    responses(
        (status = 200, description = "Matching categories", body = ListResponse<Category>),
        (status = 400, description = "Invalid filter", body = ErrorBody)
    )
)]
pub async fn search_categories(
    State(state): State<AppState>,
    ValidatedQuery(params): ValidatedQuery<CategorySearchParams>,
) -> ApiResult<Json<ListResponse<Category>>> {
    let filter = category_filter(&params);
    let page = params.pagination();
    let repo = state.repo.clone();
    let list = state
        .cache
        .get_or_load("categories.search", &params, || async move {
            Ok(repo.search_categories(&filter, page).await?)
        })
        .await?;
    Ok(Json(list))
}

/// create_category
///
/// [Admin Route] Names are unique; a duplicate is rejected with 400.
#[utoipa::path(
    post,
    path = "/categories",
    tag = "categories",
    request_body = CategoryRequest,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Created", body = Category),
        (status = 400, description = "Invalid input or duplicate name", body = ErrorBody),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not an admin", body = ErrorBody)
    )
)]
pub async fn create_category(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CategoryRequest>,
) -> ApiResult<Json<Category>> {
    if state.repo.find_category_by_name(&payload.name).await?.is_some() {
        return Err(ApiError::Conflict(CATEGORY_EXISTS));
    }

    let category = state.repo.create_category(&payload.name).await?;

    tracing::info!(category_id = category.id, user_id = admin.id, "category created");
    Ok(Json(category))
}

#[utoipa::path(
    get,
    path = "/categories/{id}",
    tag = "categories",
    params(("id" = i64, Path, description = "Category id")),
    responses(
        (status = 200, description = "Category", body = Category),
        (status = 404, description = "Not found", body = ErrorBody)
    )
)]
pub async fn get_category(
    State(state): State<AppState>,
    ValidatedPath(id): ValidatedPath<i64>,
) -> ApiResult<Json<Category>> {
    state
        .repo
        .get_category(id)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound(CATEGORY_NOT_FOUND))
}

/// update_category
///
/// [Admin Route] Renames a category. Omitting `name` is a no-op that echoes
/// the current record.
#[utoipa::path(
    patch,
    path = "/categories/{id}",
    tag = "categories",
    params(("id" = i64, Path, description = "Category id")),
    request_body = UpdateCategoryRequest,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Updated", body = Category),
        (status = 400, description = "Invalid input or duplicate name", body = ErrorBody),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not an admin", body = ErrorBody),
        (status = 404, description = "Not found", body = ErrorBody)
    )
)]
pub async fn update_category(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    ValidatedPath(id): ValidatedPath<i64>,
    ValidatedJson(payload): ValidatedJson<UpdateCategoryRequest>,
) -> ApiResult<Json<Category>> {
    let mut category = state
        .repo
        .get_category(id)
        .await?
        .ok_or(ApiError::NotFound(CATEGORY_NOT_FOUND))?;

    if let Some(name) = payload.name {
        if let Some(existing) = state.repo.find_category_by_name(&name).await? {
            if existing.id != category.id {
                return Err(ApiError::Conflict(CATEGORY_EXISTS));
            }
        }
        category.name = name;
        state.repo.save_category(&category).await?;
        tracing::info!(category_id = id, user_id = admin.id, "category renamed");
    }

    Ok(Json(category))
}

/// delete_category
///
/// [Admin Route] Cascades to the category's articles and their comments.
#[utoipa::path(
    delete,
    path = "/categories/{id}",
    tag = "categories",
    params(("id" = i64, Path, description = "Category id")),
    security(("bearer" = [])),
    responses(
        (status = 204, description = "Deleted"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not an admin", body = ErrorBody),
        (status = 404, description = "Not found", body = ErrorBody)
    )
)]
pub async fn delete_category(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    ValidatedPath(id): ValidatedPath<i64>,
) -> ApiResult<StatusCode> {
    if !state.repo.delete_category(id).await? {
        return Err(ApiError::NotFound(CATEGORY_NOT_FOUND));
    }

    tracing::info!(category_id = id, user_id = admin.id, "category deleted");
    Ok(StatusCode::NO_CONTENT)
}
