use std::{
    future::Future,
    sync::Arc,
    time::{Duration, Instant},
};

use dashmap::DashMap;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::error::ApiError;

/// Lifetime of a cached response. Writes do not purge entries, so listings
/// can lag behind by up to this long.
pub const RESPONSE_TTL: Duration = Duration::from_secs(60);

const MAX_ENTRIES: usize = 10_000;

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// ResponseCache
///
/// Short-lived cache for listing and search responses, keyed by a route name
/// plus the validated query parameters. Cloning is cheap; all clones share
/// the same entries.
#[derive(Clone)]
pub struct ResponseCache {
    entries: Arc<DashMap<String, CacheEntry>>,
    ttl: Duration,
    enabled: bool,
}

impl ResponseCache {
    pub fn new(ttl: Duration, enabled: bool) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            ttl,
            enabled,
        }
    }

    /// A cache that never stores anything.
    pub fn disabled() -> Self {
        Self::new(RESPONSE_TTL, false)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Number of stored entries, expired ones included until they are swept.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn key<P: Serialize>(route: &str, params: &P) -> Result<String, ApiError> {
        Ok(format!("{route}:{}", serde_json::to_string(params)?))
    }

    /// get_or_load
    ///
    /// Returns the cached response for `(route, params)` or runs `load`,
    /// storing its result on success. Errors are never cached. When the cache
    /// is disabled `load` always runs.
    pub async fn get_or_load<T, P, F, Fut>(
        &self,
        route: &str,
        params: &P,
        load: F,
    ) -> Result<T, ApiError>
    where
        T: Serialize + DeserializeOwned,
        P: Serialize,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        if !self.enabled {
            return load().await;
        }

        let key = Self::key(route, params)?;
        // The shard guard must be released before anything awaits.
        let hit = self
            .entries
            .get(&key)
            .filter(|entry| !entry.is_expired())
            .map(|entry| entry.value.clone());
        if let Some(value) = hit {
            tracing::debug!(%key, "response cache hit");
            return Ok(serde_json::from_value(value)?);
        }

        let value = load().await?;
        self.store(key, serde_json::to_value(&value)?);
        Ok(value)
    }

    fn store(&self, key: String, value: Value) {
        if self.entries.len() >= MAX_ENTRIES {
            self.entries.retain(|_, entry| !entry.is_expired());
            if self.entries.len() >= MAX_ENTRIES {
                tracing::debug!(%key, "response cache full, not storing");
                return;
            }
        }
        self.entries.insert(
            key,
            CacheEntry {
                value,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }
}
