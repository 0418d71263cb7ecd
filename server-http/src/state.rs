use reel::{Catalog, PhimApiClient, ReadThroughFetcher};
use shared::config::Config;
use std::sync::Arc;

/// Server state shared across handlers
#[derive(Clone, Debug)]
pub struct AppState {
    pub catalog: Arc<Catalog>,
}

impl AppState {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog: Arc::new(catalog),
        }
    }

    /// Wire the cache store, upstream client and catalog from configuration
    pub fn from_config(config: &Config) -> shared::Result<Self> {
        let store = storage_engine::open_store(&config.cache)?;
        let upstream = Arc::new(PhimApiClient::new(&config.upstream)?);
        tracing::info!(
            "Upstream API at {} (timeout {} ms)",
            upstream.base_url(),
            config.upstream.timeout.as_millis()
        );

        let fetcher = Arc::new(ReadThroughFetcher::new(store, upstream));
        Ok(Self::new(Catalog::new(fetcher)))
    }
}
