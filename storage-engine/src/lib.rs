pub mod moka_store;
pub mod sled_store;

pub use moka_store::MokaCacheStore;
pub use sled_store::SledCacheStore;

use reel::ports::CacheStore;
use shared::Result;
use shared::config::{CacheBackend, CacheSettings};
use std::sync::Arc;
use tracing::info;

/// Open the cache store selected by `settings.backend`.
///
/// The sled backend starts its expiry sweeper, so this must run inside a tokio runtime.
pub fn open_store(settings: &CacheSettings) -> Result<Arc<dyn CacheStore>> {
    match settings.backend {
        CacheBackend::Memory => {
            info!(
                "Using in-memory cache store (ttl {}m, physical expiry {}s)",
                settings.ttl_minutes(),
                settings.physical_ttl.as_secs()
            );
            Ok(Arc::new(MokaCacheStore::new(settings)))
        }
        CacheBackend::Sled => {
            let store = Arc::new(SledCacheStore::open(settings)?);
            info!(
                "Using sled cache store at {} (ttl {}m, physical expiry {}s, {} entries on disk)",
                settings.data_dir.display(),
                settings.ttl_minutes(),
                settings.physical_ttl.as_secs(),
                store.len()
            );
            store.clone().spawn_sweeper(settings.sweep_interval);
            Ok(store)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_open_memory_store() {
        let settings = CacheSettings {
            backend: CacheBackend::Memory,
            ..CacheSettings::default()
        };

        let store = open_store(&settings).unwrap();
        store.put("genres", json!(["hanh-dong"])).await.unwrap();

        assert_eq!(store.get("genres").await.unwrap(), Some(json!(["hanh-dong"])));
    }

    #[tokio::test]
    async fn test_open_sled_store_creates_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let settings = CacheSettings {
            backend: CacheBackend::Sled,
            data_dir: dir.path().join("nested").join("data"),
            ..CacheSettings::default()
        };

        let store = open_store(&settings).unwrap();
        store.put("countries", json!([])).await.unwrap();

        assert!(settings.data_dir.join("cache.sled").exists());
        assert_eq!(store.get("countries").await.unwrap(), Some(json!([])));
    }
}
