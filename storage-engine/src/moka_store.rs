use async_trait::async_trait;
use moka::future::Cache;
use reel::clock::{Clock, SystemClock};
use reel::domain::CacheEntry;
use reel::ports::CacheStore;
use serde_json::Value;
use shared::Result;
use shared::config::{CacheSettings, MAX_CACHE_TTL};
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Moka-based in-memory cache store
///
/// Physical expiry is moka's own `time_to_live`; the logical TTL is checked on
/// every read against the store's clock.
pub struct MokaCacheStore {
    cache: Cache<String, CacheEntry>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl MokaCacheStore {
    pub fn new(settings: &CacheSettings) -> Self {
        Self::with_clock(settings.ttl, settings.physical_ttl, Arc::new(SystemClock))
    }

    /// Create a store stamping entries from `clock`
    ///
    /// Physical expiry is capped at [`MAX_CACHE_TTL`].
    pub fn with_clock(ttl: Duration, physical_ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        let cache = Cache::builder()
            .name("upstream-responses")
            .time_to_live(physical_ttl.max(ttl).min(MAX_CACHE_TTL))
            .build();

        Self { cache, ttl, clock }
    }
}

#[async_trait]
impl CacheStore for MokaCacheStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let Some(entry) = self.cache.get(key).await else {
            return Ok(None);
        };

        if entry.is_stale(self.ttl, self.clock.now()) {
            debug!("Entry '{}' is past its TTL", key);
            return Ok(None);
        }

        Ok(Some(entry.payload))
    }

    async fn put(&self, key: &str, payload: Value) -> Result<()> {
        let entry = CacheEntry::new(key, payload, self.clock.now());
        self.cache.insert(key.to_string(), entry).await;
        Ok(())
    }
}

impl Debug for MokaCacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MokaCacheStore")
            .field("entry_count", &self.cache.entry_count())
            .field("ttl", &self.ttl)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;
    use reel::clock::ManualClock;
    use serde_json::json;
    use tokio::task::JoinSet;
    use tokio::time::sleep;

    const HOUR: Duration = Duration::from_secs(3600);
    const DAY: Duration = Duration::from_secs(24 * 3600);

    fn store() -> (MokaCacheStore, ManualClock) {
        let clock = ManualClock::default();
        (MokaCacheStore::with_clock(HOUR, DAY, Arc::new(clock.clone())), clock)
    }

    #[tokio::test]
    async fn test_moka_store_put_and_get() {
        let (store, _clock) = store();

        store.put("genres", json!({"items": ["hanh-dong"]})).await.unwrap();

        assert_eq!(
            store.get("genres").await.unwrap(),
            Some(json!({"items": ["hanh-dong"]}))
        );
    }

    #[tokio::test]
    async fn test_moka_store_get_nonexistent() {
        let (store, _clock) = store();
        assert_eq!(store.get("nonexistent").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_moka_store_overwrite() {
        let (store, _clock) = store();

        store.put("key", json!("value1")).await.unwrap();
        store.put("key", json!("value2")).await.unwrap();

        assert_eq!(store.get("key").await.unwrap(), Some(json!("value2")));
    }

    #[tokio::test]
    async fn test_moka_store_logical_ttl() {
        let (store, clock) = store();
        store.put("genres", json!([1, 2, 3])).await.unwrap();

        clock.advance(TimeDelta::minutes(60));
        assert_eq!(store.get("genres").await.unwrap(), Some(json!([1, 2, 3])));

        clock.advance(TimeDelta::minutes(1));
        assert_eq!(store.get("genres").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_moka_store_rewrite_refreshes_timestamp() {
        let (store, clock) = store();
        store.put("genres", json!("same")).await.unwrap();

        clock.advance(TimeDelta::minutes(50));
        store.put("genres", json!("same")).await.unwrap();
        clock.advance(TimeDelta::minutes(50));

        assert_eq!(store.get("genres").await.unwrap(), Some(json!("same")));
    }

    #[tokio::test]
    async fn test_moka_store_caps_huge_expiry() {
        let clock = ManualClock::default();
        let store = MokaCacheStore::with_clock(
            HOUR,
            Duration::from_secs(9_000_000 * 3600),
            Arc::new(clock),
        );

        store.put("genres", json!([])).await.unwrap();
        assert_eq!(store.get("genres").await.unwrap(), Some(json!([])));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_moka_store_concurrent_puts_on_distinct_keys() {
        let (store, _clock) = store();
        let store = Arc::new(store);

        let mut tasks = JoinSet::new();
        for page in 0..64 {
            let store = store.clone();
            tasks.spawn(async move {
                store
                    .put(&format!("genre:hanh-dong?page={}", page), json!({ "page": page }))
                    .await
            });
        }
        while let Some(result) = tasks.join_next().await {
            result.unwrap().unwrap();
        }

        for page in 0..64 {
            assert_eq!(
                store.get(&format!("genre:hanh-dong?page={}", page)).await.unwrap(),
                Some(json!({ "page": page }))
            );
        }
    }

    #[tokio::test]
    async fn test_moka_store_physical_expiry() {
        // Frozen clock: only moka's own expiry can remove the entry.
        let clock = ManualClock::default();
        let store = MokaCacheStore::with_clock(
            Duration::from_millis(50),
            Duration::from_millis(100),
            Arc::new(clock),
        );

        store.put("key", json!("value")).await.unwrap();
        assert!(store.get("key").await.unwrap().is_some());

        sleep(Duration::from_millis(150)).await;

        assert_eq!(store.get("key").await.unwrap(), None);
    }
}
