//! HTTP client for the upstream movie metadata API.

use crate::ports::Upstream;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use shared::config::UpstreamSettings;
use shared::{Error, Result};
use std::time::Duration;
use tracing::debug;

/// Client for the phimapi.com JSON API
///
/// Every request carries the configured timeout. Non-2xx responses, timeouts
/// and transport failures become errors; nothing is retried.
#[derive(Debug, Clone)]
pub struct PhimApiClient {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl PhimApiClient {
    pub fn new(settings: &UpstreamSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self::with_client(client, settings))
    }

    /// Create a PhimApiClient with a custom HTTP client
    pub fn with_client(client: Client, settings: &UpstreamSettings) -> Self {
        Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            timeout: settings.timeout,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn map_error(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::UpstreamTimeout(self.timeout.as_millis() as u64)
        } else {
            Error::Upstream(err.to_string())
        }
    }
}

#[async_trait]
impl Upstream for PhimApiClient {
    async fn get_json(&self, path_and_query: &str) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path_and_query);
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.map_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::UpstreamStatus {
                status: status.as_u16(),
                message: error_message(status, &body),
            });
        }

        response.json::<Value>().await.map_err(|e| self.map_error(e))
    }
}

/// Prefers the `message` field of a JSON error body, then the status reason.
fn error_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Upstream request failed")
                .to_string()
        })
}
