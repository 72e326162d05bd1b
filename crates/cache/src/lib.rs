//! Result cache with per-entry TTL
//!
//! `ResultCache` is best-effort: a failing backend reads as a miss and a
//! failed write is only logged.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

pub mod fingerprint;
pub mod memory;

pub use fingerprint::{derive_key, fingerprint, fingerprint_with_tools, normalize};
pub use memory::MemoryCache;

/// Cache backend errors
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("cache unavailable: {0}")]
    Unavailable(String),

    #[error("cache encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CacheError>;

/// Key/value store with expiry
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Value for `key`, `None` when absent or expired
    async fn get(&self, key: &str) -> Result<Option<String>>;
    /// Store `value` under `key`, replacing any previous entry
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()>;
}

/// Typed, failure-tolerant view over a `CacheBackend`
#[derive(Clone)]
pub struct ResultCache {
    backend: Arc<dyn CacheBackend>,
}

impl ResultCache {
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self { backend }
    }

    /// In-memory cache
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryCache::new()))
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.backend.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!("Cache miss: {}", key);
                return None;
            }
            Err(e) => {
                warn!("Cache read failed for {}, treating as miss: {}", key, e);
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => {
                debug!("Cache hit: {}", key);
                Some(value)
            }
            Err(e) => {
                warn!("Discarding undecodable cache entry {}: {}", key, e);
                None
            }
        }
    }

    pub async fn put<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Failed to encode cache entry {}: {}", key, e);
                return;
            }
        };

        if let Err(e) = self.backend.set(key, raw, ttl).await {
            warn!("Cache write failed for {}: {}", key, e);
        }
    }
}
