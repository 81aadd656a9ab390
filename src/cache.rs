use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use moka::policy::EvictionPolicy;
use thiserror::Error;
use tokio::time::Instant;

use crate::config::CacheConfig;

/// Why an entry was not stored. Callers log this and carry on.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CacheRejection {
    #[error("entry of {size} bytes exceeds the {limit} byte entry limit")]
    EntryTooLarge { size: usize, limit: usize },
}

struct StoredEntry {
    value: Vec<u8>,
    stored_at: Instant,
}

fn entry_size(key: &str, value: &[u8]) -> usize {
    key.len() + value.len()
}

/// Bounded, time-expiring key to bytes store shared by all in-flight requests.
///
/// Entries expire purely by age: a hit never refreshes the TTL. The total
/// ceiling is enforced by weight (key plus value bytes) with least recently
/// used entries evicted first.
pub struct CacheStore {
    entries: Cache<String, Arc<StoredEntry>>,
    ttl: Duration,
    max_entry_bytes: usize,
}

impl CacheStore {
    #[must_use]
    pub fn new(ttl: Duration, max_total_bytes: usize, max_entry_bytes: usize) -> Self {
        let entries = Cache::builder()
            .max_capacity(max_total_bytes as u64)
            .weigher(|key: &String, entry: &Arc<StoredEntry>| {
                u32::try_from(entry_size(key, &entry.value)).unwrap_or(u32::MAX)
            })
            .time_to_live(ttl)
            .eviction_policy(EvictionPolicy::lru())
            .build();

        Self {
            entries,
            ttl,
            max_entry_bytes: max_entry_bytes.min(max_total_bytes),
        }
    }

    #[must_use]
    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(
            config.ttl(),
            config.max_size_bytes(),
            config.max_entry_bytes(),
        )
    }

    /// Returns the stored bytes if the key exists and has not expired.
    #[tracing::instrument(name = "query_cache", level = "debug", skip(self))]
    pub async fn get(&self, key: &str) -> Option<Vec<u8>> {
        match self.entries.get(key).await {
            Some(entry) if entry.stored_at.elapsed() < self.ttl => {
                tracing::debug!("Key found and still fresh");
                Some(entry.value.clone())
            }
            Some(_) => {
                tracing::debug!("Key found but expired");
                self.entries.invalidate(key).await;
                None
            }
            None => {
                tracing::debug!("Key not found");
                None
            }
        }
    }

    /// Stores `value` under `key`, replacing any previous entry.
    #[tracing::instrument(name = "put_cache", level = "debug", skip(self, value), fields(size = value.len()))]
    pub async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), CacheRejection> {
        let size = entry_size(key, &value);
        if size > self.max_entry_bytes {
            tracing::debug!(limit = self.max_entry_bytes, "Entry rejected as oversized");
            return Err(CacheRejection::EntryTooLarge {
                size,
                limit: self.max_entry_bytes,
            });
        }

        let entry = StoredEntry {
            value,
            stored_at: Instant::now(),
        };
        self.entries.insert(key.to_string(), Arc::new(entry)).await;
        // apply the size ceiling now rather than on the next maintenance tick
        self.entries.run_pending_tasks().await;
        Ok(())
    }

    /// Number of stored entries.
    pub async fn len(&self) -> usize {
        self.entries.run_pending_tasks().await;
        usize::try_from(self.entries.entry_count()).unwrap_or(usize::MAX)
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Bytes currently accounted against the size ceiling.
    pub async fn total_bytes(&self) -> usize {
        self.entries.run_pending_tasks().await;
        usize::try_from(self.entries.weighted_size()).unwrap_or(usize::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> CacheStore {
        CacheStore::new(Duration::from_secs(600), 1024, 256)
    }

    #[tokio::test]
    async fn test_set_then_get_returns_same_bytes() {
        let cache = store();
        cache.set("weather:1,2:x", b"payload".to_vec()).await.unwrap();
        assert_eq!(cache.get("weather:1,2:x").await, Some(b"payload".to_vec()));
    }

    #[tokio::test]
    async fn test_missing_key_is_a_miss() {
        let cache = store();
        assert_eq!(cache.get("nope").await, None);
        assert!(cache.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_after_ttl() {
        let cache = store();
        cache.set("k", b"v".to_vec()).await.unwrap();

        tokio::time::advance(Duration::from_secs(599)).await;
        assert_eq!(cache.get("k").await, Some(b"v".to_vec()));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(cache.get("k").await, None);
        assert!(cache.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hit_does_not_refresh_ttl() {
        let cache = store();
        cache.set("k", b"v".to_vec()).await.unwrap();

        for _ in 0..5 {
            tokio::time::advance(Duration::from_secs(100)).await;
            assert!(cache.get("k").await.is_some());
        }
        tokio::time::advance(Duration::from_secs(100)).await;
        assert_eq!(cache.get("k").await, None);
    }

    #[tokio::test]
    async fn test_oversized_entry_is_rejected() {
        let cache = store();
        let result = cache.set("big", vec![0u8; 300]).await;
        assert!(matches!(result, Err(CacheRejection::EntryTooLarge { .. })));
        assert_eq!(cache.get("big").await, None);
        assert_eq!(cache.total_bytes().await, 0);
    }

    #[tokio::test]
    async fn test_total_ceiling_evicts_least_recently_used() {
        let cache = store();
        for i in 0..5 {
            // 1 byte key + 199 bytes value
            cache.set(&i.to_string(), vec![i; 199]).await.unwrap();
        }
        assert_eq!(cache.total_bytes().await, 1000);

        cache.set("5", vec![5; 199]).await.unwrap();
        assert!(cache.total_bytes().await <= 1024);
        assert_eq!(cache.get("0").await, None);
        assert_eq!(cache.get("5").await, Some(vec![5; 199]));
        assert_eq!(cache.get("4").await, Some(vec![4; 199]));
    }

    #[tokio::test]
    async fn test_overwrite_replaces_accounting() {
        let cache = store();
        cache.set("k", vec![1; 100]).await.unwrap();
        cache.set("k", vec![2; 50]).await.unwrap();
        assert_eq!(cache.len().await, 1);
        assert_eq!(cache.total_bytes().await, 51);
        assert_eq!(cache.get("k").await, Some(vec![2; 50]));
    }

    #[tokio::test]
    async fn test_concurrent_writers_and_readers() {
        let cache = Arc::new(CacheStore::new(Duration::from_secs(60), 1 << 20, 1024));
        let mut handles = Vec::new();
        for i in 0..16u8 {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move {
                let key = format!("key-{i}");
                cache.set(&key, vec![i; 32]).await.unwrap();
                cache.get(&key).await
            }));
        }
        for (i, handle) in handles.into_iter().enumerate() {
            let value = handle.await.unwrap();
            assert_eq!(value, Some(vec![i as u8; 32]));
        }
        assert_eq!(cache.len().await, 16);
    }
}
