use std::{str::FromStr, sync::Arc, time::Duration};

use async_trait::async_trait;
use sqlx::{
    QueryBuilder, Sqlite, SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};

use crate::{
    models::{Article, Category, Comment, ListResponse, NewArticle, NewComment, NewUser, User},
    search::{Filter, Pagination},
};

pub type RepoResult<T> = Result<T, sqlx::Error>;

/// Repository Trait
///
/// Abstract contract for all persistence operations. Handlers only see this
/// trait, through `RepositoryState`.
///
/// Mutations follow load-then-save: callers fetch a record, check ownership
/// themselves, and pass the modified record back to a `save_*` method.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    async fn get_user(&self, id: i64) -> RepoResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>>;
    async fn create_user(&self, user: NewUser) -> RepoResult<User>;

    // --- Categories ---
    async fn search_categories(
        &self,
        filter: &Filter,
        page: Pagination,
    ) -> RepoResult<ListResponse<Category>>;
    async fn get_category(&self, id: i64) -> RepoResult<Option<Category>>;
    // Exact, case-sensitive match used for the uniqueness check.
    async fn find_category_by_name(&self, name: &str) -> RepoResult<Option<Category>>;
    async fn create_category(&self, name: &str) -> RepoResult<Category>;
    async fn save_category(&self, category: &Category) -> RepoResult<()>;
    async fn delete_category(&self, id: i64) -> RepoResult<bool>;

    // --- Articles ---
    async fn search_articles(
        &self,
        filter: &Filter,
        page: Pagination,
    ) -> RepoResult<ListResponse<Article>>;
    async fn get_article(&self, id: i64) -> RepoResult<Option<Article>>;
    async fn create_article(&self, article: NewArticle) -> RepoResult<Article>;
    // Persists title and text; relations are immutable after creation.
    async fn save_article(&self, article: &Article) -> RepoResult<()>;
    async fn delete_article(&self, id: i64) -> RepoResult<bool>;

    // --- Comments ---
    async fn list_comments(
        &self,
        article_id: i64,
        page: Pagination,
    ) -> RepoResult<ListResponse<Comment>>;
    // Scoped to the article: a comment id under a different article is None.
    async fn get_comment(&self, article_id: i64, id: i64) -> RepoResult<Option<Comment>>;
    async fn create_comment(&self, comment: NewComment) -> RepoResult<Comment>;
    async fn delete_comment(&self, id: i64) -> RepoResult<bool>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

const ARTICLE_SELECT: &str = r#"
    SELECT
        a.id, a.title, a.text, a.created_at,
        c.id AS category_id, c.name AS category_name,
        u.id AS publisher_id, u.name AS publisher_name
    FROM articles a
    JOIN categories c ON c.id = a.category_id
    JOIN users u ON u.id = a.publisher_id"#;

const ARTICLE_COUNT: &str = "SELECT COUNT(*) FROM articles a";

const COMMENT_SELECT: &str = r#"
    SELECT
        m.id, m.text, m.created_at, m.article_id,
        u.id AS user_id, u.name AS user_name
    FROM comments m
    JOIN users u ON u.id = m.user_id"#;

/// SqliteRepository
///
/// The concrete implementation of the `Repository` trait, backed by SQLite.
pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// connect
    ///
    /// Opens a pool for `database_url`, creating the database file if needed
    /// and enforcing foreign keys. An in-memory database lives only as long
    /// as its connection, so it gets exactly one that is never recycled.
    pub async fn connect(database_url: &str) -> RepoResult<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool_options = if database_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };

        let pool = pool_options.connect_with(options).await?;
        Ok(Self::new(pool))
    }

    /// Applies the embedded schema migrations from `./migrations`.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn count(&self, base: &str, filter: &Filter) -> RepoResult<i64> {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(base);
        filter.push_where(&mut builder);
        builder.build_query_scalar::<i64>().fetch_one(&self.pool).await
    }
}

#[async_trait]
impl Repository for SqliteRepository {
    async fn get_user(&self, id: i64) -> RepoResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT id, name, email, password, role FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        sqlx::query_as::<_, User>(
            "SELECT id, name, email, password, role FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
    }

    /// create_user
    ///
    /// A duplicate email fails with the database's unique violation, which the
    /// handler turns into a 400.
    async fn create_user(&self, user: NewUser) -> RepoResult<User> {
        let role = i16::from(user.role);
        let id = sqlx::query("INSERT INTO users (name, email, password, role) VALUES (?, ?, ?, ?)")
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password)
            .bind(role)
            .execute(&self.pool)
            .await?
            .last_insert_rowid();

        Ok(User {
            id,
            name: user.name,
            email: user.email,
            password: user.password,
            role,
        })
    }

    /// search_categories
    ///
    /// Counts and fetches with the same filter; ordering is by id so pages are stable.
    async fn search_categories(
        &self,
        filter: &Filter,
        page: Pagination,
    ) -> RepoResult<ListResponse<Category>> {
        let count = self.count("SELECT COUNT(*) FROM categories c", filter).await?;

        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT c.id, c.name FROM categories c");
        filter.push_where(&mut builder);
        builder.push(" ORDER BY c.id ASC");
        page.push_limit(&mut builder);

        let result = builder
            .build_query_as::<Category>()
            .fetch_all(&self.pool)
            .await?;
        Ok(ListResponse { count, result })
    }

    async fn get_category(&self, id: i64) -> RepoResult<Option<Category>> {
        sqlx::query_as::<_, Category>("SELECT id, name FROM categories WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn find_category_by_name(&self, name: &str) -> RepoResult<Option<Category>> {
        sqlx::query_as::<_, Category>("SELECT id, name FROM categories WHERE name = ? LIMIT 1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
    }

    async fn create_category(&self, name: &str) -> RepoResult<Category> {
        let id = sqlx::query("INSERT INTO categories (name) VALUES (?)")
            .bind(name)
            .execute(&self.pool)
            .await?
            .last_insert_rowid();
        Ok(Category {
            id,
            name: name.to_string(),
        })
    }

    async fn save_category(&self, category: &Category) -> RepoResult<()> {
        sqlx::query("UPDATE categories SET name = ? WHERE id = ?")
            .bind(&category.name)
            .bind(category.id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_category(&self, id: i64) -> RepoResult<bool> {
        let res = sqlx::query("DELETE FROM categories WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    /// search_articles
    ///
    /// Builds `SELECT ... [WHERE clause AND clause ...] ORDER BY LIMIT OFFSET`
    /// from the filter. The count uses the same WHERE so `count` reflects the
    /// whole filtered set, not the page.
    async fn search_articles(
        &self,
        filter: &Filter,
        page: Pagination,
    ) -> RepoResult<ListResponse<Article>> {
        let count = self.count(ARTICLE_COUNT, filter).await?;

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(ARTICLE_SELECT);
        filter.push_where(&mut builder);
        builder.push(" ORDER BY a.id ASC");
        page.push_limit(&mut builder);

        let result = builder
            .build_query_as::<Article>()
            .fetch_all(&self.pool)
            .await?;
        Ok(ListResponse { count, result })
    }

    async fn get_article(&self, id: i64) -> RepoResult<Option<Article>> {
        sqlx::query_as::<_, Article>(&format!("{ARTICLE_SELECT} WHERE a.id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    /// create_article
    ///
    /// Inserts, then reads the row back through the join so the caller gets
    /// category and publisher names in one record.
    async fn create_article(&self, article: NewArticle) -> RepoResult<Article> {
        let id = sqlx::query(
            "INSERT INTO articles (title, text, created_at, category_id, publisher_id) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&article.title)
        .bind(&article.text)
        .bind(article.created_at)
        .bind(article.category_id)
        .bind(article.publisher_id)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        self.get_article(id).await?.ok_or(sqlx::Error::RowNotFound)
    }

    async fn save_article(&self, article: &Article) -> RepoResult<()> {
        sqlx::query("UPDATE articles SET title = ?, text = ? WHERE id = ?")
            .bind(&article.title)
            .bind(&article.text)
            .bind(article.id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_article(&self, id: i64) -> RepoResult<bool> {
        let res = sqlx::query("DELETE FROM articles WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn list_comments(
        &self,
        article_id: i64,
        page: Pagination,
    ) -> RepoResult<ListResponse<Comment>> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM comments WHERE article_id = ?")
            .bind(article_id)
            .fetch_one(&self.pool)
            .await?;

        let result = sqlx::query_as::<_, Comment>(&format!(
            "{COMMENT_SELECT} WHERE m.article_id = ? ORDER BY m.id ASC LIMIT ? OFFSET ?"
        ))
        .bind(article_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(ListResponse { count, result })
    }

    async fn get_comment(&self, article_id: i64, id: i64) -> RepoResult<Option<Comment>> {
        sqlx::query_as::<_, Comment>(&format!(
            "{COMMENT_SELECT} WHERE m.id = ? AND m.article_id = ?"
        ))
        .bind(id)
        .bind(article_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn create_comment(&self, comment: NewComment) -> RepoResult<Comment> {
        let id = sqlx::query(
            "INSERT INTO comments (text, created_at, article_id, user_id) VALUES (?, ?, ?, ?)",
        )
        .bind(&comment.text)
        .bind(comment.created_at)
        .bind(comment.article_id)
        .bind(comment.user_id)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        self.get_comment(comment.article_id, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    async fn delete_comment(&self, id: i64) -> RepoResult<bool> {
        let res = sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}
