use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// One cached upstream response.
///
/// `fetched_at` is stamped by the store that writes the entry; callers only
/// hand over the key and payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: String,
    pub payload: Value,
    pub fetched_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(key: impl Into<String>, payload: Value, fetched_at: DateTime<Utc>) -> Self {
        Self {
            key: key.into(),
            payload,
            fetched_at,
        }
    }

    /// Time elapsed since the entry was written. Negative when the clock moved backwards.
    pub fn age(&self, now: DateTime<Utc>) -> TimeDelta {
        now.signed_duration_since(self.fetched_at)
    }

    /// An entry is stale once its age strictly exceeds `ttl`; an entry exactly
    /// `ttl` old is still served.
    pub fn is_stale(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        match TimeDelta::from_std(ttl) {
            Ok(ttl) => self.age(now) > ttl,
            // A TTL too large for chrono never expires.
            Err(_) => false,
        }
    }
}
