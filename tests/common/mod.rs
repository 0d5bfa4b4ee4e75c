#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use blog_api::{
    AppConfig, AppState, ResponseCache, SqliteRepository, create_router,
    auth::issue_token,
    models::{NewUser, Role, User},
    password::hash_password,
    repository::{Repository, RepositoryState},
};
use serde_json::Value;
use tower::ServiceExt;

pub const PASSWORD: &str = "correct-horse-battery";

/// In-process application backed by a fresh in-memory database.
pub struct TestApp {
    pub router: Router,
    pub repo: Arc<SqliteRepository>,
    pub config: AppConfig,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_cache(ResponseCache::disabled()).await
    }

    pub async fn with_cache(cache: ResponseCache) -> Self {
        let config = AppConfig::default();
        let repo = Arc::new(
            SqliteRepository::connect(&config.database_url)
                .await
                .expect("Failed to open in-memory database"),
        );
        repo.migrate().await.expect("Failed to run migrations");

        let state = AppState::new(repo.clone() as RepositoryState, cache, config.clone());
        TestApp {
            router: create_router(state),
            repo,
            config,
        }
    }

    pub async fn seed_user(&self, name: &str, email: &str, role: Role) -> User {
        self.repo
            .create_user(NewUser {
                name: name.to_string(),
                email: email.to_string(),
                password: hash_password(PASSWORD).expect("hash"),
                role,
            })
            .await
            .expect("Failed to seed user")
    }

    pub fn token_for(&self, user: &User) -> String {
        let role = Role::try_from(user.role).expect("seeded role");
        issue_token(user.id, role, &self.config.token_secret)
            .expect("Failed to sign token")
            .token
    }

    /// Seeds a user and returns it with a valid token.
    pub async fn login_as(&self, name: &str, email: &str, role: Role) -> (User, String) {
        let user = self.seed_user(name, email, role).await;
        let token = self.token_for(&user);
        (user, token)
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Router failed");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read body");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::String(
                String::from_utf8_lossy(&bytes).into_owned(),
            ))
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, None, None).await
    }
}
