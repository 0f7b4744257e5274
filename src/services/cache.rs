use crate::models::{BriefProfile, ProjectRequest, ServiceProvider};
use crate::services::directory::{DirectoryError, ProfileDirectory};
use async_trait::async_trait;
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

/// Two-tier cache manager
///
/// L1 is an in-process moka cache. L2 is Redis, shared across instances,
/// and optional: without a Redis URL the manager runs L1 only.
pub struct CacheManager {
    redis: Option<Arc<tokio::sync::Mutex<ConnectionManager>>>,
    l1_cache: moka::future::Cache<String, Vec<u8>>,
    ttl_secs: u64,
}

impl CacheManager {
    pub async fn new(redis_url: Option<&str>, l1_size: u64, ttl_secs: u64) -> Result<Self, CacheError> {
        let redis = match redis_url {
            Some(url) => {
                let client = redis::Client::open(url)?;
                let manager = ConnectionManager::new(client).await?;
                Some(Arc::new(tokio::sync::Mutex::new(manager)))
            }
            None => None,
        };

        Ok(Self {
            redis,
            l1_cache: Self::build_l1(l1_size, ttl_secs),
            ttl_secs,
        })
    }

    /// L1-only cache
    pub fn in_process(l1_size: u64, ttl_secs: u64) -> Self {
        Self {
            redis: None,
            l1_cache: Self::build_l1(l1_size, ttl_secs),
            ttl_secs,
        }
    }

    fn build_l1(l1_size: u64, ttl_secs: u64) -> moka::future::Cache<String, Vec<u8>> {
        moka::future::CacheBuilder::new(l1_size)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build()
    }

    pub fn has_l2(&self) -> bool {
        self.redis.is_some()
    }

    /// Get a value from cache (L1 first, then L2)
    pub async fn get<T>(&self, key: &str) -> Result<T, CacheError>
    where
        T: for<'de> Deserialize<'de>,
    {
        if let Some(bytes) = self.l1_cache.get(key).await {
            tracing::trace!("L1 cache hit: {}", key);
            return Ok(serde_json::from_slice(&bytes)?);
        }

        if let Some(redis) = &self.redis {
            let mut conn = redis.lock().await;
            let value: Option<String> = redis::cmd("GET").arg(key).query_async(&mut *conn).await?;
            drop(conn);

            if let Some(json) = value {
                tracing::trace!("L2 cache hit: {}", key);
                self.l1_cache.insert(key.to_string(), json.as_bytes().to_vec()).await;
                return Ok(serde_json::from_str(&json)?);
            }
        }

        tracing::trace!("Cache miss: {}", key);
        Err(CacheError::CacheMiss(key.to_string()))
    }

    /// Set a value in every configured tier
    pub async fn set<T>(&self, key: &str, value: &T) -> Result<(), CacheError>
    where
        T: Serialize,
    {
        let json = serde_json::to_string(value)?;
        self.l1_cache.insert(key.to_string(), json.as_bytes().to_vec()).await;

        if let Some(redis) = &self.redis {
            let mut conn = redis.lock().await;
            redis::cmd("SETEX")
                .arg(key)
                .arg(self.ttl_secs)
                .arg(json)
                .query_async::<()>(&mut *conn)
                .await?;
        }

        tracing::trace!("Cache set: {}", key);
        Ok(())
    }
}

/// Cache key builder
pub struct CacheKey;

impl CacheKey {
    pub fn profile(user_id: &str) -> String {
        format!("profile:{}", user_id)
    }

    pub fn request(request_id: &str) -> String {
        format!("request:{}", request_id)
    }

    pub fn provider(provider_id: &str) -> String {
        format!("provider:{}", provider_id)
    }
}

/// Read-through cache in front of another directory
///
/// Single-record lookups are cached; listings always go to the source so
/// ranking sees current open requests and providers. Cache failures fall
/// through to the source.
pub struct CachedDirectory<D> {
    inner: D,
    cache: Arc<CacheManager>,
}

impl<D: ProfileDirectory> CachedDirectory<D> {
    pub fn new(inner: D, cache: Arc<CacheManager>) -> Self {
        Self { inner, cache }
    }

    async fn read_through<T, F>(&self, key: String, fetch: F) -> Result<T, DirectoryError>
    where
        T: Serialize + for<'de> Deserialize<'de>,
        F: std::future::Future<Output = Result<T, DirectoryError>>,
    {
        match self.cache.get::<T>(&key).await {
            Ok(hit) => return Ok(hit),
            Err(CacheError::CacheMiss(_)) => {}
            Err(e) => tracing::warn!("Cache read failed for {}: {}", key, e),
        }

        let value = fetch.await?;
        if let Err(e) = self.cache.set(&key, &value).await {
            tracing::warn!("Cache write failed for {}: {}", key, e);
        }
        Ok(value)
    }
}

#[async_trait]
impl<D: ProfileDirectory> ProfileDirectory for CachedDirectory<D> {
    async fn brief_profile(&self, user_id: &str) -> Result<BriefProfile, DirectoryError> {
        self.read_through(CacheKey::profile(user_id), self.inner.brief_profile(user_id))
            .await
    }

    async fn request(&self, request_id: &str) -> Result<ProjectRequest, DirectoryError> {
        self.read_through(CacheKey::request(request_id), self.inner.request(request_id))
            .await
    }

    async fn open_requests(&self) -> Result<Vec<ProjectRequest>, DirectoryError> {
        self.inner.open_requests().await
    }

    async fn provider(&self, provider_id: &str) -> Result<ServiceProvider, DirectoryError> {
        self.read_through(CacheKey::provider(provider_id), self.inner.provider(provider_id))
            .await
    }

    async fn providers(&self) -> Result<Vec<ServiceProvider>, DirectoryError> {
        self.inner.providers().await
    }
}
