use redis::aio::ConnectionManager;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur with cache operations
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    RedisError(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Cache miss: {0}")]
    CacheMiss(String),
}

/// Two-tier TTL cache for per-user read models.
///
/// L1 is an in-process moka cache, L2 is Redis shared across instances. All
/// entries are keyed by opaque per-user keys and expire on their own; nothing
/// in the service holds cross-request state outside this type.
pub struct CacheManager {
    redis: Arc<tokio::sync::Mutex<ConnectionManager>>,
    l1: moka::future::Cache<String, Vec<u8>>,
    ttl_secs: u64,
}

impl CacheManager {
    pub async fn new(redis_url: &str, l1_size: u64, ttl_secs: u64) -> Result<Self, CacheError> {
        let client = redis::Client::open(redis_url)?;
        let redis = ConnectionManager::new(client).await?;

        let l1 = moka::future::CacheBuilder::new(l1_size)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Ok(Self {
            redis: Arc::new(tokio::sync::Mutex::new(redis)),
            l1,
            ttl_secs,
        })
    }

    /// Get a value, L1 first, then Redis (re-populating L1 on a hit).
    pub async fn get<T>(&self, key: &str) -> Result<T, CacheError>
    where
        T: for<'de> Deserialize<'de>,
    {
        if let Some(bytes) = self.l1.get(key).await {
            tracing::trace!("L1 cache hit: {}", key);
            return Ok(serde_json::from_slice(&bytes)?);
        }

        let mut conn = self.redis.lock().await;
        let value: Option<String> = redis::cmd("GET").arg(key).query_async(&mut *conn).await?;
        drop(conn);

        match value {
            Some(json) => {
                tracing::trace!("L2 cache hit: {}", key);
                self.l1.insert(key.to_string(), json.as_bytes().to_vec()).await;
                Ok(serde_json::from_str(&json)?)
            }
            None => Err(CacheError::CacheMiss(key.to_string())),
        }
    }

    /// Set a value in both tiers with the configured TTL.
    pub async fn set<T>(&self, key: &str, value: &T) -> Result<(), CacheError>
    where
        T: Serialize,
    {
        let json = serde_json::to_string(value)?;

        self.l1.insert(key.to_string(), json.as_bytes().to_vec()).await;

        let mut conn = self.redis.lock().await;
        redis::cmd("SETEX")
            .arg(key)
            .arg(self.ttl_secs)
            .arg(json)
            .query_async::<()>(&mut *conn)
            .await?;

        Ok(())
    }

    /// Drop a key from both tiers.
    pub async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.l1.invalidate(key).await;
        let mut conn = self.redis.lock().await;
        redis::cmd("DEL").arg(key).query_async::<()>(&mut *conn).await?;
        Ok(())
    }
}

/// Cache key builder.
///
/// Only the default first page of a user's match list is cached; every write
/// that can change either party's list deletes both users' keys.
pub struct CacheKey;

impl CacheKey {
    pub fn matches(user_id: &uuid::Uuid) -> String {
        format!("matches:{}", user_id)
    }

    pub fn saved(user_id: &uuid::Uuid) -> String {
        format!("saved:{}", user_id)
    }
}
