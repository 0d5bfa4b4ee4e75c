use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::search::{Pagination, clamp_page_size};
use crate::validation::{Sanitize, sanitize_text};

// --- Roles ---

/// Role
///
/// Stored as a small integer. Authorization compares the numeric value, so a
/// higher discriminant always means more privileges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "i16", try_from = "i16")]
pub enum Role {
    User = 0,
    Admin = 1,
}

impl From<Role> for i16 {
    fn from(role: Role) -> i16 {
        role as i16
    }
}

impl TryFrom<i16> for Role {
    type Error = String;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Role::User),
            1 => Ok(Role::Admin),
            other => Err(format!("unknown role {other}")),
        }
    }
}

// --- Persisted records (mapped to tables) ---

/// User
///
/// Row of the `users` table. Carries the password hash, so it is never
/// serialized; responses use `UserRef`.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: i16,
}

/// Input for inserting a user. `password` must already be hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema, TS)]
#[ts(export)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

/// Article
///
/// Row of `articles` joined with its category and publisher names, which is
/// everything the article DTO needs in one query.
#[derive(Debug, Clone, FromRow)]
pub struct Article {
    pub id: i64,
    pub title: String,
    pub text: String,
    pub created_at: i64,
    pub category_id: i64,
    pub category_name: String,
    pub publisher_id: i64,
    pub publisher_name: String,
}

#[derive(Debug, Clone)]
pub struct NewArticle {
    pub title: String,
    pub text: String,
    pub created_at: i64,
    pub category_id: i64,
    pub publisher_id: i64,
}

/// Comment row joined with the author's name.
#[derive(Debug, Clone, FromRow)]
pub struct Comment {
    pub id: i64,
    pub text: String,
    pub created_at: i64,
    pub article_id: i64,
    pub user_id: i64,
    pub user_name: String,
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub text: String,
    pub created_at: i64,
    pub article_id: i64,
    pub user_id: i64,
}

// --- Response DTOs ---

/// `{id, name}` pair used wherever a related entity is referenced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema, TS)]
#[ts(export)]
pub struct UserRef {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema, TS)]
#[ts(export)]
pub struct ArticleResponse {
    pub id: i64,
    pub title: String,
    pub text: String,
    pub created_at: i64,
    pub category: Category,
    pub publisher: UserRef,
}

impl From<Article> for ArticleResponse {
    fn from(article: Article) -> Self {
        Self {
            id: article.id,
            title: article.title,
            text: article.text,
            created_at: article.created_at,
            category: Category {
                id: article.category_id,
                name: article.category_name,
            },
            publisher: UserRef {
                id: article.publisher_id,
                name: article.publisher_name,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema, TS)]
#[ts(export)]
pub struct CommentResponse {
    pub id: i64,
    pub text: String,
    pub created_at: i64,
    pub user: UserRef,
}

impl From<Comment> for CommentResponse {
    fn from(comment: Comment) -> Self {
        Self {
            id: comment.id,
            text: comment.text,
            created_at: comment.created_at,
            user: UserRef {
                id: comment.user_id,
                name: comment.user_name,
            },
        }
    }
}

/// ListResponse
///
/// Paginated listing. `count` is the total number of rows matching the
/// filter, `result` only holds the requested page.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS)]
#[ts(export)]
pub struct ListResponse<T> {
    pub count: i64,
    pub result: Vec<T>,
}

impl<T> ListResponse<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> ListResponse<U> {
        ListResponse {
            count: self.count,
            result: self.result.into_iter().map(f).collect(),
        }
    }
}

/// Issued on successful login or registration.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS)]
#[ts(export)]
pub struct AuthResponse {
    pub token: String,
    /// Token expiry as unix epoch seconds.
    pub expires_at: i64,
    pub user: UserRef,
}

// --- Request payloads ---

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub password: String,
}

impl Sanitize for LoginRequest {
    fn sanitize(&mut self) {
        self.email = self.email.trim().to_ascii_lowercase();
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, max = 100, message = "must be between 1 and 100 characters"))]
    pub name: String,
    #[validate(length(min = 8, max = 128, message = "must be between 8 and 128 characters"))]
    pub password: String,
}

impl Sanitize for RegisterRequest {
    fn sanitize(&mut self) {
        self.email = self.email.trim().to_ascii_lowercase();
        self.name = sanitize_text(&self.name);
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateArticleRequest {
    #[validate(length(min = 1, max = 255, message = "must be between 1 and 255 characters"))]
    pub title: String,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub text: String,
    #[validate(range(min = 1, message = "must be a positive integer"))]
    pub category_id: i64,
}

impl Sanitize for CreateArticleRequest {
    fn sanitize(&mut self) {
        self.title = sanitize_text(&self.title);
        self.text = sanitize_text(&self.text);
    }
}

/// Partial update: only the supplied fields are merged into the article.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateArticleRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 255, message = "must be between 1 and 255 characters"))]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "must not be empty"))]
    pub text: Option<String>,
}

impl Sanitize for UpdateArticleRequest {
    fn sanitize(&mut self) {
        self.title = self.title.as_deref().map(sanitize_text);
        self.text = self.text.as_deref().map(sanitize_text);
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CategoryRequest {
    #[validate(length(min = 1, max = 100, message = "must be between 1 and 100 characters"))]
    pub name: String,
}

impl Sanitize for CategoryRequest {
    fn sanitize(&mut self) {
        self.name = sanitize_text(&self.name);
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateCategoryRequest {
    #[validate(length(min = 1, max = 100, message = "must be between 1 and 100 characters"))]
    pub name: Option<String>,
}

impl Sanitize for UpdateCategoryRequest {
    fn sanitize(&mut self) {
        self.name = self.name.as_deref().map(sanitize_text);
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateCommentRequest {
    #[validate(length(min = 1, max = 2000, message = "must be between 1 and 2000 characters"))]
    pub text: String,
}

impl Sanitize for CreateCommentRequest {
    fn sanitize(&mut self) {
        self.text = sanitize_text(&self.text);
    }
}

// --- Query parameters ---

pub const DEFAULT_PAGE_SIZE: i64 = 25;

/// PageParams
///
/// `page` and `page_size` for the plain listing endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, IntoParams)]
#[serde(default)]
#[into_params(parameter_in = Query)]
pub struct PageParams {
    /// 1-based page number.
    #[validate(range(min = 1, message = "must be a positive integer"))]
    pub page: i64,
    /// Clamped to [1, 100].
    pub page_size: i64,
}

impl Default for PageParams {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageParams {
    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.page, self.page_size)
    }
}

// Clamping here keeps cache keys identical for equivalent requests.
impl Sanitize for PageParams {
    fn sanitize(&mut self) {
        self.page_size = clamp_page_size(self.page_size);
    }
}

/// ArticleSearchParams
///
/// Every filter defaults to its "absent" value: empty text or zero.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, IntoParams)]
#[serde(default)]
#[into_params(parameter_in = Query)]
pub struct ArticleSearchParams {
    /// Case-insensitive substring of the title.
    pub title: String,
    /// Case-insensitive substring of the body.
    pub text: String,
    #[validate(range(min = 0, message = "must not be negative"))]
    pub category_id: i64,
    #[validate(range(min = 0, message = "must not be negative"))]
    pub publisher_id: i64,
    /// Inclusive lower bound on creation time, epoch seconds.
    #[validate(range(min = 0, message = "must not be negative"))]
    pub min_date: i64,
    /// Inclusive upper bound on creation time, epoch seconds.
    #[validate(range(min = 0, message = "must not be negative"))]
    pub max_date: i64,
    #[validate(range(min = 1, message = "must be a positive integer"))]
    pub page: i64,
    pub page_size: i64,
}

impl Default for ArticleSearchParams {
    fn default() -> Self {
        Self {
            title: String::new(),
            text: String::new(),
            category_id: 0,
            publisher_id: 0,
            min_date: 0,
            max_date: 0,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ArticleSearchParams {
    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.page, self.page_size)
    }
}

impl Sanitize for ArticleSearchParams {
    fn sanitize(&mut self) {
        self.title = sanitize_text(&self.title);
        self.text = sanitize_text(&self.text);
        self.page_size = clamp_page_size(self.page_size);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, IntoParams)]
#[serde(default)]
#[into_params(parameter_in = Query)]
pub struct CategorySearchParams {
    /// Case-insensitive substring of the name.
    pub name: String,
    #[validate(range(min = 1, message = "must be a positive integer"))]
    pub page: i64,
    pub page_size: i64,
}

impl Default for CategorySearchParams {
    fn default() -> Self {
        Self {
            name: String::new(),
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl CategorySearchParams {
    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.page, self.page_size)
    }
}

impl Sanitize for CategorySearchParams {
    fn sanitize(&mut self) {
        self.name = sanitize_text(&self.name);
        self.page_size = clamp_page_size(self.page_size);
    }
}
