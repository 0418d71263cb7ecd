use crate::planes::data::operation::CachedFetch;
use crate::ports::{CacheStore, Upstream};
use crate::query::{QueryParams, cache_key};
use async_trait::async_trait;
use serde_json::Value;
use shared::Result;
use std::sync::Arc;
use tracing::{debug, warn};

/// Read-through cache in front of the upstream API
///
/// A fresh entry is returned without touching upstream. On a miss the upstream
/// response is stored under the cache key and returned. Store and upstream
/// failures are returned as-is: no retry, no stale fallback. Concurrent misses
/// on the same key may each call upstream; the last write wins.
#[derive(Clone)]
pub struct ReadThroughFetcher {
    store: Arc<dyn CacheStore>,
    upstream: Arc<dyn Upstream>,
}

impl ReadThroughFetcher {
    pub fn new(store: Arc<dyn CacheStore>, upstream: Arc<dyn Upstream>) -> Self {
        Self { store, upstream }
    }
}

#[async_trait]
impl CachedFetch for ReadThroughFetcher {
    async fn fetch(
        &self,
        path: &str,
        params: &QueryParams,
        key_prefix: Option<&str>,
    ) -> Result<Value> {
        let query = params.to_query_string();
        let key = cache_key(path, key_prefix, params);

        if let Some(payload) = self.store.get(&key).await? {
            debug!("Cache hit for '{}'", key);
            return Ok(payload);
        }

        debug!("Cache miss for '{}', fetching {}{}", key, path, query);
        let payload = match self.upstream.get_json(&format!("{}{}", path, query)).await {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Upstream fetch for '{}' failed: {}", key, e);
                return Err(e);
            }
        };

        self.store.put(&key, payload.clone()).await?;
        debug!("Cached '{}'", key);

        Ok(payload)
    }
}

impl std::fmt::Debug for ReadThroughFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadThroughFetcher").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, ManualClock};
    use crate::domain::CacheEntry;
    use chrono::TimeDelta;
    use serde_json::json;
    use shared::Error;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    /// HashMap-backed store applying the same logical TTL rule as the real backends.
    struct TestStore {
        entries: Mutex<HashMap<String, CacheEntry>>,
        clock: ManualClock,
        ttl: Duration,
        fail: AtomicBool,
    }

    impl TestStore {
        fn new(clock: ManualClock) -> Self {
            Self {
                entries: Mutex::new(HashMap::new()),
                clock,
                ttl: Duration::from_secs(60 * 60),
                fail: AtomicBool::new(false),
            }
        }

        fn entry(&self, key: &str) -> Option<CacheEntry> {
            self.entries.lock().unwrap().get(key).cloned()
        }

        fn keys(&self) -> Vec<String> {
            let mut keys: Vec<String> = self.entries.lock().unwrap().keys().cloned().collect();
            keys.sort();
            keys
        }
    }

    #[async_trait]
    impl CacheStore for TestStore {
        async fn get(&self, key: &str) -> Result<Option<Value>> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(Error::Store("connection refused".to_string()));
            }
            let now = self.clock.now();
            Ok(self
                .entries
                .lock()
                .unwrap()
                .get(key)
                .filter(|entry| !entry.is_stale(self.ttl, now))
                .map(|entry| entry.payload.clone()))
        }

        async fn put(&self, key: &str, payload: Value) -> Result<()> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(Error::Store("connection refused".to_string()));
            }
            let entry = CacheEntry::new(key, payload, self.clock.now());
            self.entries.lock().unwrap().insert(key.to_string(), entry);
            Ok(())
        }
    }

    /// Records every requested URL and echoes it back in the body.
    #[derive(Default)]
    struct RecordingUpstream {
        requests: Mutex<Vec<String>>,
        fail_with_status: Option<u16>,
    }

    impl RecordingUpstream {
        fn requests(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Upstream for RecordingUpstream {
        async fn get_json(&self, path_and_query: &str) -> Result<Value> {
            let mut requests = self.requests.lock().unwrap();
            requests.push(path_and_query.to_string());
            if let Some(status) = self.fail_with_status {
                return Err(Error::UpstreamStatus {
                    status,
                    message: "upstream exploded".to_string(),
                });
            }
            Ok(json!({ "url": path_and_query, "call": requests.len() }))
        }
    }

    fn fixture() -> (ReadThroughFetcher, Arc<TestStore>, Arc<RecordingUpstream>, ManualClock) {
        let clock = ManualClock::default();
        let store = Arc::new(TestStore::new(clock.clone()));
        let upstream = Arc::new(RecordingUpstream::default());
        let fetcher = ReadThroughFetcher::new(store.clone(), upstream.clone());
        (fetcher, store, upstream, clock)
    }

    #[tokio::test]
    async fn test_second_fetch_within_ttl_is_served_from_cache() {
        let (fetcher, store, upstream, clock) = fixture();

        let first = fetcher
            .fetch("/the-loai", &QueryParams::new(), Some("genres"))
            .await
            .unwrap();
        clock.advance(TimeDelta::minutes(59));
        let second = fetcher
            .fetch("/the-loai", &QueryParams::new(), Some("genres"))
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(upstream.requests(), vec!["/the-loai".to_string()]);
        assert_eq!(store.keys(), vec!["genres".to_string()]);
        assert_eq!(store.entry("genres").unwrap().payload, first);
    }

    #[tokio::test]
    async fn test_distinct_pages_are_distinct_entries() {
        let (fetcher, store, upstream, _clock) = fixture();
        let path = "/v1/api/the-loai/hanh-dong";

        fetcher
            .fetch(path, &QueryParams::new().with("page", Some(1)), Some("genre:hanh-dong"))
            .await
            .unwrap();
        fetcher
            .fetch(path, &QueryParams::new().with("page", Some(2)), Some("genre:hanh-dong"))
            .await
            .unwrap();

        assert_eq!(
            store.keys(),
            vec!["genre:hanh-dong?page=1".to_string(), "genre:hanh-dong?page=2".to_string()]
        );
        assert_eq!(
            upstream.requests(),
            vec![format!("{}?page=1", path), format!("{}?page=2", path)]
        );
    }

    #[tokio::test]
    async fn test_stale_entry_is_refetched_and_overwritten() {
        let (fetcher, store, upstream, clock) = fixture();

        fetcher
            .fetch("/the-loai", &QueryParams::new(), Some("genres"))
            .await
            .unwrap();
        let first_written = store.entry("genres").unwrap().fetched_at;

        clock.advance(TimeDelta::minutes(61));
        let refreshed = fetcher
            .fetch("/the-loai", &QueryParams::new(), Some("genres"))
            .await
            .unwrap();

        assert_eq!(upstream.requests().len(), 2);
        assert_eq!(refreshed["call"], json!(2));
        let entry = store.entry("genres").unwrap();
        assert_eq!(entry.payload, refreshed);
        assert_eq!(entry.fetched_at - first_written, TimeDelta::minutes(61));
    }

    #[tokio::test]
    async fn test_empty_params_share_a_key() {
        let (fetcher, _store, upstream, _clock) = fixture();

        fetcher
            .fetch(
                "/x",
                &QueryParams::new().with("a", Some(1)).with("b", Some("")),
                None,
            )
            .await
            .unwrap();
        fetcher
            .fetch("/x", &QueryParams::new().with("a", Some(1)), None)
            .await
            .unwrap();

        assert_eq!(upstream.requests(), vec!["/x?a=1".to_string()]);
    }

    #[tokio::test]
    async fn test_upstream_failure_writes_nothing() {
        let clock = ManualClock::default();
        let store = Arc::new(TestStore::new(clock));
        let upstream = Arc::new(RecordingUpstream {
            fail_with_status: Some(503),
            ..Default::default()
        });
        let fetcher = ReadThroughFetcher::new(store.clone(), upstream.clone());

        let result = fetcher
            .fetch("/phim/abc", &QueryParams::new(), Some("movie:abc"))
            .await;

        assert!(matches!(
            result.unwrap_err(),
            Error::UpstreamStatus { status: 503, .. }
        ));
        assert!(store.keys().is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_is_not_a_miss() {
        let (fetcher, store, upstream, _clock) = fixture();
        store.fail.store(true, Ordering::SeqCst);

        let result = fetcher
            .fetch("/the-loai", &QueryParams::new(), Some("genres"))
            .await;

        assert!(matches!(result.unwrap_err(), Error::Store(_)));
        assert!(upstream.requests().is_empty());
    }
}
