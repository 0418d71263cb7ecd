#![deny(clippy::all)]

use async_trait::async_trait;
use serde_json::Value;
use shared::Result;

// Ports are the pluggable extension points for storage backends and upstream sources

/// Port for the cache store
///
/// Implementations stamp `fetched_at` themselves and treat entries older than
/// the configured logical TTL as absent. Store failures are returned as errors,
/// never as misses.
#[async_trait]
pub trait CacheStore: Send + Sync + 'static {
    async fn get(&self, key: &str) -> Result<Option<Value>>;
    async fn put(&self, key: &str, payload: Value) -> Result<()>;
}

/// Port for the upstream metadata API
#[async_trait]
pub trait Upstream: Send + Sync + 'static {
    /// GET `path_and_query` relative to the upstream base URL and return the parsed body.
    async fn get_json(&self, path_and_query: &str) -> Result<Value>;
}
