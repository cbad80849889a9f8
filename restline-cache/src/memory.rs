//! In-memory cache store.

use crate::error::CacheResult;
use crate::traits::{Cache, CacheExpiry, deadline};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::time::Duration;
use tracing::trace;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Option<DateTime<Utc>>,
    sliding: Option<Duration>,
}

impl Entry {
    fn new(value: String, expiry: CacheExpiry) -> Self {
        match expiry {
            CacheExpiry::Never => Self {
                value,
                expires_at: None,
                sliding: None,
            },
            CacheExpiry::AbsoluteAt(at) => Self {
                value,
                expires_at: Some(at),
                sliding: None,
            },
            CacheExpiry::Sliding(window) => Self {
                value,
                expires_at: Some(deadline(window)),
                sliding: Some(window),
            },
        }
    }

    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// Process-local cache backed by a concurrent map.
///
/// Expired entries are dropped lazily when they are fetched. Sliding entries
/// have their deadline pushed forward on every successful fetch.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: DashMap<String, Entry>,
}

impl MemoryCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, expired or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn fetch(&self, key: &str) -> CacheResult<Option<String>> {
        let now = Utc::now();
        let expired = match self.entries.get_mut(key) {
            Some(mut entry) if !entry.is_expired(now) => {
                if let Some(window) = entry.sliding {
                    entry.expires_at = Some(deadline(window));
                }
                trace!(key, "Cache hit");
                return Ok(Some(entry.value.clone()));
            }
            Some(_) => true,
            None => false,
        };

        if expired
            && self
                .entries
                .remove_if(key, |_, entry| entry.is_expired(now))
                .is_some()
        {
            trace!(key, "Cache entry expired");
        }
        Ok(None)
    }

    async fn store(&self, key: &str, value: String, expiry: CacheExpiry) -> CacheResult<()> {
        trace!(key, ?expiry, "Cache store");
        self.entries.insert(key.to_string(), Entry::new(value, expiry));
        Ok(())
    }

    async fn remove(&self, key: &str) -> CacheResult<()> {
        self.entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    #[tokio::test]
    async fn test_store_and_fetch() {
        let cache = MemoryCache::new();
        cache
            .store("greeting", "hello".to_string(), CacheExpiry::Never)
            .await
            .unwrap();

        assert_eq!(cache.fetch("greeting").await.unwrap().as_deref(), Some("hello"));
        assert_eq!(cache.fetch("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_absolute_expiry_in_the_past_is_dropped() {
        let cache = MemoryCache::new();
        let past = Utc::now() - ChronoDuration::seconds(1);
        cache
            .store("stale", "value".to_string(), CacheExpiry::AbsoluteAt(past))
            .await
            .unwrap();

        assert_eq!(cache.fetch("stale").await.unwrap(), None);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_sliding_expiry_refreshes_on_read() {
        let cache = MemoryCache::new();
        cache
            .store("session", "abc".to_string(), CacheExpiry::Sliding(Duration::from_secs(60)))
            .await
            .unwrap();

        let first = cache.entries.get("session").unwrap().expires_at.unwrap();
        assert!(cache.fetch("session").await.unwrap().is_some());
        let second = cache.entries.get("session").unwrap().expires_at.unwrap();
        assert!(second >= first);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_fetch_of_expired_entry_keeps_concurrent_store() {
        let cache = std::sync::Arc::new(MemoryCache::new());
        let past = Utc::now() - ChronoDuration::seconds(1);

        for round in 0..200 {
            cache
                .store("token", "old".to_string(), CacheExpiry::AbsoluteAt(past))
                .await
                .unwrap();

            let reader = cache.clone();
            let fetch = tokio::spawn(async move { reader.fetch("token").await });
            let writer = cache.clone();
            let store = tokio::spawn(async move {
                writer
                    .store("token", format!("new-{round}"), CacheExpiry::Never)
                    .await
            });
            fetch.await.unwrap().unwrap();
            store.await.unwrap().unwrap();

            assert_eq!(
                cache.fetch("token").await.unwrap(),
                Some(format!("new-{round}"))
            );
        }
    }

    #[tokio::test]
    async fn test_remove() {
        let cache = MemoryCache::new();
        cache.store("k", "v".to_string(), CacheExpiry::Never).await.unwrap();
        cache.remove("k").await.unwrap();
        assert_eq!(cache.len(), 0);
    }
}
