use async_trait::async_trait;
use reel::clock::{Clock, SystemClock};
use reel::domain::CacheEntry;
use reel::ports::CacheStore;
use serde_json::Value;
use shared::config::CacheSettings;
use shared::{Error, Result};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

const ENTRIES_TREE: &str = "cache_entries";

/// Shortest period accepted by [`SledCacheStore::spawn_sweeper`]
pub const MIN_SWEEP_INTERVAL: Duration = Duration::from_millis(10);

/// Sled-based durable cache store
///
/// Each entry is one JSON document keyed by the cache key, so every put is a
/// single atomic upsert. Entries older than the physical TTL are reclaimed by
/// [`SledCacheStore::sweep_expired`] (run periodically by
/// [`SledCacheStore::spawn_sweeper`]) and removed lazily when read.
pub struct SledCacheStore {
    tree: sled::Tree,
    ttl: Duration,
    physical_ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl SledCacheStore {
    /// Open the store under `settings.data_dir`
    /// Creates the directory if it doesn't exist
    pub fn open(settings: &CacheSettings) -> Result<Self> {
        Self::open_with_clock(
            settings.data_dir.join("cache.sled"),
            settings.ttl,
            settings.physical_ttl,
            Arc::new(SystemClock),
        )
    }

    pub fn open_with_clock(
        path: impl AsRef<Path>,
        ttl: Duration,
        physical_ttl: Duration,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Store(format!("Failed to create directory: {}", e)))?;
        }

        let db = sled::open(path)
            .map_err(|e| Error::Store(format!("Failed to open Sled database: {}", e)))?;
        let tree = db
            .open_tree(ENTRIES_TREE)
            .map_err(|e| Error::Store(format!("Failed to open cache tree: {}", e)))?;

        Ok(Self {
            tree,
            ttl,
            physical_ttl: physical_ttl.max(ttl),
            clock,
        })
    }

    /// Number of entries physically present, fresh or not
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Remove every entry older than the physical TTL. Returns how many were removed.
    ///
    /// An entry rewritten while the sweep runs is left alone.
    pub fn sweep_expired(&self) -> Result<usize> {
        let now = self.clock.now();
        let mut removed = 0;

        for item in self.tree.iter() {
            let (key, raw) =
                item.map_err(|e| Error::Store(format!("Failed to iterate cache: {}", e)))?;

            let expired = match decode(&raw) {
                Ok(entry) => entry.is_stale(self.physical_ttl, now),
                Err(e) => {
                    warn!("Dropping undecodable cache entry: {}", e);
                    true
                }
            };
            if !expired {
                continue;
            }

            let swapped = self
                .tree
                .compare_and_swap(&key, Some(raw), None::<&[u8]>)
                .map_err(|e| Error::Store(format!("Failed to remove entry: {}", e)))?;
            if swapped.is_ok() {
                removed += 1;
            }
        }

        Ok(removed)
    }

    /// Run [`Self::sweep_expired`] every `interval` on the current tokio runtime
    ///
    /// Each sweep runs on the blocking pool. A zero interval is raised to
    /// [`MIN_SWEEP_INTERVAL`].
    pub fn spawn_sweeper(self: Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let interval = if interval < MIN_SWEEP_INTERVAL {
            warn!(
                "Cache sweep interval {:?} is too short, using {:?}",
                interval, MIN_SWEEP_INTERVAL
            );
            MIN_SWEEP_INTERVAL
        } else {
            interval
        };

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately; skip it so startup isn't a sweep.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let store = Arc::clone(&self);
                match tokio::task::spawn_blocking(move || store.sweep_expired()).await {
                    Ok(Ok(0)) => debug!("Cache sweep found nothing to reclaim"),
                    Ok(Ok(n)) => info!("Cache sweep reclaimed {} expired entries", n),
                    Ok(Err(e)) => warn!("Cache sweep failed: {}", e),
                    Err(e) => warn!("Cache sweep task failed: {}", e),
                }
            }
        })
    }
}

#[async_trait]
impl CacheStore for SledCacheStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let raw = self
            .tree
            .get(key.as_bytes())
            .map_err(|e| Error::Store(format!("Failed to get entry: {}", e)))?;

        let Some(raw) = raw else {
            return Ok(None);
        };
        let entry = decode(&raw)?;
        let now = self.clock.now();

        if entry.is_stale(self.physical_ttl, now) {
            debug!("Entry '{}' is past physical expiry, removing", key);
            // A concurrent rewrite wins over this removal.
            let _ = self
                .tree
                .compare_and_swap(key.as_bytes(), Some(raw), None::<&[u8]>)
                .map_err(|e| Error::Store(format!("Failed to remove entry: {}", e)))?;
            return Ok(None);
        }

        if entry.is_stale(self.ttl, now) {
            debug!("Entry '{}' is past its TTL", key);
            return Ok(None);
        }

        Ok(Some(entry.payload))
    }

    async fn put(&self, key: &str, payload: Value) -> Result<()> {
        let entry = CacheEntry::new(key, payload, self.clock.now());
        let raw = serde_json::to_vec(&entry)
            .map_err(|e| Error::Store(format!("Failed to serialize entry: {}", e)))?;

        self.tree
            .insert(key.as_bytes(), raw)
            .map_err(|e| Error::Store(format!("Failed to save entry: {}", e)))?;

        Ok(())
    }
}

fn decode(raw: &[u8]) -> Result<CacheEntry> {
    serde_json::from_slice(raw)
        .map_err(|e| Error::Store(format!("Failed to deserialize entry: {}", e)))
}

impl std::fmt::Debug for SledCacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SledCacheStore")
            .field("entries", &self.tree.len())
            .field("ttl", &self.ttl)
            .field("physical_ttl", &self.physical_ttl)
            .finish()
    }
}
