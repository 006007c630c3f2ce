use redis::AsyncCommands;
use redis::Client;

use crate::error::AppError;
use crate::error::AppResult;
use crate::models::RecommendationResult;
use crate::services::cache::{CacheKey, CacheStore};

/// Namespace for every recommendation key written to Redis
pub const KEY_PREFIX: &str = "recs:";

/// Creates a Redis client for caching
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// Recommendation cache store shared across instances through Redis
///
/// Expiry is delegated to Redis (`SET EX`). Writes complete before `set`
/// returns, so a lookup issued after a store sees the entry and a `clear`
/// issued after a store removes it.
#[derive(Clone)]
pub struct RedisStore {
    redis_client: Client,
    ttl_secs: u64,
}

impl RedisStore {
    /// Creates a store whose entries expire after `ttl_secs`
    pub fn new(redis_client: Client, ttl_secs: u64) -> Self {
        Self {
            redis_client,
            ttl_secs,
        }
    }

    fn redis_key(key: &CacheKey) -> String {
        format!("{}{}", KEY_PREFIX, key)
    }

    async fn keys(&self) -> AppResult<Vec<String>> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let keys: Vec<String> = conn.keys(format!("{}*", KEY_PREFIX)).await?;
        Ok(keys)
    }
}

#[async_trait::async_trait]
impl CacheStore for RedisStore {
    async fn get(&self, key: &CacheKey) -> AppResult<Option<RecommendationResult>> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let cached: Option<String> = conn.get(Self::redis_key(key)).await?;

        match cached {
            Some(json) => {
                let payload = serde_json::from_str(&json).map_err(|e| {
                    AppError::Internal(format!("Cache deserialization error: {}", e))
                })?;
                Ok(Some(payload))
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &CacheKey, payload: &RecommendationResult) -> AppResult<()> {
        let value = serde_json::to_string(payload)
            .map_err(|e| AppError::Internal(format!("Cache serialization error: {}", e)))?;

        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let _: () = conn.set_ex(Self::redis_key(key), value, self.ttl_secs).await?;
        Ok(())
    }

    async fn clear(&self) -> AppResult<usize> {
        let keys = self.keys().await?;
        if keys.is_empty() {
            return Ok(0);
        }

        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let removed: usize = conn.del(keys).await?;
        Ok(removed)
    }

    async fn len(&self) -> AppResult<usize> {
        Ok(self.keys().await?.len())
    }
}
