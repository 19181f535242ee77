//! Cache-aside accessor.
//!
//! [`CacheStore`] wraps a key-value backend with TTL support. The store is
//! optional everywhere: [`connect`] returns `None` when no backend is
//! configured or reachable, and [`CacheAside`] treats both a missing store and
//! any [`CacheError`] as a miss so requests fall through to persistence.

mod memory;
mod redis_store;

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::{CacheBackend, CacheConfig};
use crate::db::Record;
use crate::health::Backend;

pub use self::memory::MemoryCache;
pub use self::redis_store::RedisCache;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache connection error: {0}")]
    Connection(String),

    #[error("Cache command failed: {0}")]
    Command(String),
}

#[async_trait]
pub trait CacheStore: Backend {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;

    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    async fn exists(&self, key: &str) -> Result<bool, CacheError>;
}

/// Build the configured cache store. Any failure degrades to `None`.
pub async fn connect(config: &CacheConfig) -> Option<Arc<dyn CacheStore>> {
    match config.backend {
        CacheBackend::None => {
            info!("cache disabled");
            None
        }
        CacheBackend::Memory => {
            info!("using in-process cache");
            Some(Arc::new(MemoryCache::new()))
        }
        CacheBackend::Redis => match RedisCache::connect(config).await {
            Ok(cache) => {
                info!("cache initialized");
                Some(Arc::new(cache))
            }
            Err(e) => {
                warn!(error = %e, "cache initialization failed, continuing without cache");
                None
            }
        },
    }
}

pub fn cache_key(prefix: &str, id: Uuid) -> String {
    format!("{}:{}", prefix, id)
}

/// Typed cache-aside view over an optional store for one record type.
pub struct CacheAside<T> {
    store: Option<Arc<dyn CacheStore>>,
    ttl: Duration,
    _record: PhantomData<fn() -> T>,
}

impl<T> Clone for CacheAside<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            ttl: self.ttl,
            _record: PhantomData,
        }
    }
}

impl<T: Record> CacheAside<T> {
    pub fn new(store: Option<Arc<dyn CacheStore>>, ttl: Duration) -> Self {
        Self {
            store,
            ttl,
            _record: PhantomData,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.store.is_some()
    }

    pub async fn get(&self, id: Uuid) -> Option<T> {
        let store = self.store.as_ref()?;
        let key = cache_key(T::CACHE_PREFIX, id);

        match store.get(&key).await {
            Ok(Some(raw)) => match serde_json::from_str::<T>(&raw) {
                Ok(record) => {
                    debug!(key = %key, "cache hit");
                    Some(record)
                }
                Err(e) => {
                    warn!(key = %key, error = %e, "discarding undecodable cache entry");
                    None
                }
            },
            Ok(None) => {
                debug!(key = %key, "cache miss");
                None
            }
            Err(e) => {
                warn!(key = %key, error = %e, "cache read failed");
                None
            }
        }
    }

    pub async fn put(&self, record: &T) {
        let Some(store) = self.store.as_ref() else {
            return;
        };
        let key = cache_key(T::CACHE_PREFIX, record.id());

        let value = match serde_json::to_string(record) {
            Ok(value) => value,
            Err(e) => {
                warn!(key = %key, error = %e, "failed to serialize record for cache");
                return;
            }
        };

        if let Err(e) = store.set(&key, &value, self.ttl).await {
            warn!(key = %key, error = %e, "cache write failed");
        }
    }

    pub async fn invalidate(&self, id: Uuid) {
        let Some(store) = self.store.as_ref() else {
            return;
        };
        let key = cache_key(T::CACHE_PREFIX, id);

        if let Err(e) = store.delete(&key).await {
            warn!(key = %key, error = %e, "cache invalidation failed");
        }
    }
}
