use crate::query::QueryParams;
use async_trait::async_trait;
use serde_json::Value;
use shared::Result;

/// Serves an upstream request from cache when fresh, fetching and storing it otherwise.
#[async_trait]
pub trait CachedFetch: Send + Sync + 'static {
    async fn fetch(&self, path: &str, params: &QueryParams, key_prefix: Option<&str>)
    -> Result<Value>;
}
