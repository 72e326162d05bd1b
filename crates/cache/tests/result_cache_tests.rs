//! ResultCache behaviour over healthy and failing backends

use async_trait::async_trait;
use agentdesk_cache::{CacheBackend, CacheError, MemoryCache, ResultCache};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Payload {
    answer: String,
    tools: Vec<String>,
}

fn payload() -> Payload {
    Payload {
        answer: "5".to_string(),
        tools: vec!["calculator".to_string()],
    }
}

/// Backend that is always down
#[derive(Default)]
struct DownBackend {
    writes: AtomicUsize,
}

#[async_trait]
impl CacheBackend for DownBackend {
    async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
        Err(CacheError::Unavailable("connection refused".to_string()))
    }

    async fn set(&self, _key: &str, _value: String, _ttl: Duration) -> Result<(), CacheError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        Err(CacheError::Unavailable("connection refused".to_string()))
    }
}

#[tokio::test]
async fn test_put_then_get_typed() {
    let cache = ResultCache::in_memory();
    cache.put("k", &payload(), Duration::from_secs(60)).await;

    let cached: Option<Payload> = cache.get("k").await;
    assert_eq!(cached, Some(payload()));
}

#[tokio::test]
async fn test_expired_entry_reads_as_miss() {
    let cache = ResultCache::in_memory();
    cache.put("k", &payload(), Duration::from_millis(20)).await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    let cached: Option<Payload> = cache.get("k").await;
    assert!(cached.is_none());
}

#[tokio::test]
async fn test_unavailable_backend_degrades_to_miss() {
    let backend = Arc::new(DownBackend::default());
    let cache = ResultCache::new(backend.clone());

    // Neither call may panic or surface the error
    cache.put("k", &payload(), Duration::from_secs(60)).await;
    let cached: Option<Payload> = cache.get("k").await;

    assert!(cached.is_none());
    assert_eq!(backend.writes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_undecodable_entry_reads_as_miss() {
    let backend = Arc::new(MemoryCache::new());
    backend
        .set("k", "not json".to_string(), Duration::from_secs(60))
        .await
        .unwrap();
    let cache = ResultCache::new(backend);

    let cached: Option<Payload> = cache.get("k").await;
    assert!(cached.is_none());
}

#[tokio::test]
async fn test_shared_backend_between_clones() {
    let cache = ResultCache::in_memory();
    let clone = cache.clone();
    cache.put("k", &payload(), Duration::from_secs(60)).await;

    let cached: Option<Payload> = clone.get("k").await;
    assert_eq!(cached, Some(payload()));
}
