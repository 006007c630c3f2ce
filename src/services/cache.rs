use std::collections::HashMap;
use std::fmt::Display;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::{
    error::AppResult,
    models::{CacheStats, ProductId, RecommendationResult, Subject, UserId},
};

/// Default lifetime of a cached recommendation result
pub const DEFAULT_TTL: Duration = Duration::from_secs(30 * 60);

/// Cache key for a recommendation subject
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Product(ProductId),
    User(UserId),
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::Product(id) => write!(f, "product_{}", id),
            CacheKey::User(id) => write!(f, "user_{}", id),
        }
    }
}

impl From<Subject> for CacheKey {
    fn from(subject: Subject) -> Self {
        match subject {
            Subject::Product(id) => CacheKey::Product(id),
            Subject::User(id) => CacheKey::User(id),
        }
    }
}

/// Storage behind the recommendation cache
///
/// Stores own expiry: `get` must not return an entry older than the store's TTL.
#[async_trait::async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &CacheKey) -> AppResult<Option<RecommendationResult>>;

    /// Stores `payload`, replacing whatever was under `key`
    async fn set(&self, key: &CacheKey, payload: &RecommendationResult) -> AppResult<()>;

    /// Removes every entry and returns how many were removed
    async fn clear(&self) -> AppResult<usize>;

    /// Number of entries currently held
    async fn len(&self) -> AppResult<usize>;
}

/// A cached payload and when it was written
#[derive(Debug, Clone)]
struct CacheEntry {
    payload: RecommendationResult,
    stored_at: Instant,
}

/// Process-local cache store
///
/// Entries older than the TTL are invisible to `get` and `len`, and are
/// swept out of the map on every `set`, so the map holds at most the keys
/// written within one TTL window.
pub struct MemoryStore {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl MemoryStore {
    /// Creates an empty store whose entries live for `ttl`
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    fn is_fresh(&self, entry: &CacheEntry) -> bool {
        entry.stored_at.elapsed() < self.ttl
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

#[async_trait::async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &CacheKey) -> AppResult<Option<RecommendationResult>> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(&key.to_string())
            .filter(|entry| self.is_fresh(entry))
            .map(|entry| entry.payload.clone()))
    }

    async fn set(&self, key: &CacheKey, payload: &RecommendationResult) -> AppResult<()> {
        let entry = CacheEntry {
            payload: payload.clone(),
            stored_at: Instant::now(),
        };

        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, existing| self.is_fresh(existing));
        let swept = before - entries.len();
        if swept > 0 {
            tracing::debug!(swept, "Dropped expired cache entries");
        }
        entries.insert(key.to_string(), entry);
        Ok(())
    }

    async fn clear(&self) -> AppResult<usize> {
        let mut entries = self.entries.write().await;
        let removed = entries.values().filter(|entry| self.is_fresh(entry)).count();
        entries.clear();
        Ok(removed)
    }

    async fn len(&self) -> AppResult<usize> {
        let entries = self.entries.read().await;
        Ok(entries.values().filter(|entry| self.is_fresh(entry)).count())
    }
}

/// Recommendation cache with hit/miss accounting
///
/// Constructed explicitly and handed to the gateway, so every gateway (and
/// every test) owns its own counters.
pub struct RecommendationCache {
    store: Arc<dyn CacheStore>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl RecommendationCache {
    /// Wraps `store` with zeroed hit and miss counters
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self {
            store,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// In-memory cache with the given entry lifetime
    ///
    /// Used by tests and single-instance deployments.
    pub fn in_memory(ttl: Duration) -> Self {
        Self::new(Arc::new(MemoryStore::new(ttl)))
    }

    /// Returns a fresh entry for `key`, counting a hit or a miss
    ///
    /// A store failure or an undecodable entry counts as a miss.
    pub async fn lookup(&self, key: &CacheKey) -> Option<RecommendationResult> {
        let found = match self.store.get(key).await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Cache read failed, treating as miss");
                None
            }
        };

        match found {
            Some(payload) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(key = %key, "Cache hit");
                Some(payload)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(key = %key, "Cache miss");
                None
            }
        }
    }

    /// Stores a freshly computed result; failures are logged and dropped
    pub async fn store(&self, key: &CacheKey, payload: &RecommendationResult) {
        if let Err(e) = self.store.set(key, payload).await {
            tracing::warn!(key = %key, error = %e, "Cache write failed");
        }
    }

    /// Snapshot of the counters and the number of live entries
    ///
    /// `hit_rate` is `hits / (hits + misses)`, or 0 before any lookup. If the
    /// store cannot report its size, `cache_size` is 0 and a warning is logged.
    pub async fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let cache_size = self.store.len().await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Could not read cache size");
            0
        });
        let lookups = hits + misses;
        let hit_rate = if lookups == 0 {
            0.0
        } else {
            hits as f64 / lookups as f64
        };

        CacheStats {
            hits,
            misses,
            cache_size,
            hit_rate,
        }
    }

    /// Drops every entry and resets the counters
    ///
    /// Returns how many live entries were removed.
    pub async fn clear(&self) -> AppResult<usize> {
        let removed = self.store.clear().await?;
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        tracing::info!(removed, "Recommendation cache cleared");
        Ok(removed)
    }
}

/// Serves `$key` from `$cache`, or awaits `$block`, stores its value and returns it.
///
/// `$block` must be a future yielding `AppResult<RecommendationResult>`; its
/// error is propagated with `?` and nothing is cached.
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $block:expr) => {{
        match $cache.lookup(&$key).await {
            Some(hit) => hit,
            None => {
                let value = $block.await?;
                $cache.store(&$key, &value).await;
                value
            }
        }
    }};
}
