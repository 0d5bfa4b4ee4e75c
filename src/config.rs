use std::env;

use thiserror::Error;

/// Fallback signing secret for local development and tests.
const LOCAL_TOKEN_SECRET: &str = "super-secure-test-secret-value-local";

const DEFAULT_DATABASE_URL: &str = "sqlite://blog.db";
const DEFAULT_PORT: u16 = 3000;

/// AppConfig
///
/// Holds the application's entire configuration state. It is loaded once at
/// startup, never mutated afterwards, and handed to the handlers and the
/// `AuthUser` extractor through `FromRef<AppState>`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Selects the log format and how strict loading is.
    pub env: Env,
    // TCP port the HTTP server listens on.
    pub port: u16,
    // sqlx connection string for the SQLite database.
    pub database_url: String,
    // Shared secret used to sign and verify bearer tokens (HS256).
    pub token_secret: String,
    // Disables the response cache entirely (used by the test-suite).
    pub skip_cache: bool,
}

/// Env
///
/// Runtime context. `Local` prints human-readable logs and tolerates a
/// missing token secret, `Production` emits JSON logs and fails fast.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Env {
    Local,
    Production,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set in production")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

impl Default for AppConfig {
    /// Safe values for test scaffolding: local env, in-memory database, cache off.
    fn default() -> Self {
        Self {
            env: Env::Local,
            port: DEFAULT_PORT,
            database_url: "sqlite::memory:".to_string(),
            token_secret: LOCAL_TOKEN_SECRET.to_string(),
            skip_cache: true,
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from the process environment. Call
    /// `dotenv::dotenv()` first if a `.env` file should be honoured.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// from_lookup
    ///
    /// Builds the configuration from an arbitrary variable source, so tests do
    /// not have to mutate the real environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = match lookup("APP_ENV").as_deref() {
            Some("production") => Env::Production,
            _ => Env::Local,
        };

        // The production secret is mandatory, locally a fixed fallback is fine.
        let token_secret = match (env, lookup("TOKEN_SECRET")) {
            (_, Some(secret)) if !secret.is_empty() => secret,
            (Env::Production, _) => return Err(ConfigError::Missing("TOKEN_SECRET")),
            (Env::Local, _) => LOCAL_TOKEN_SECRET.to_string(),
        };

        let port = match lookup("PORT") {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                value: raw.clone(),
            })?,
            None => DEFAULT_PORT,
        };

        let skip_cache = lookup("SKIP_CACHE")
            .map(|raw| matches!(raw.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes"))
            .unwrap_or(false);

        let database_url =
            lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

        Ok(Self {
            env,
            port,
            database_url,
            token_secret,
            skip_cache,
        })
    }
}
