//! HTTP transport over reqwest.
//!
//! The production [`Transport`]: builds URLs against the configured
//! API base, attaches the environment identity header to every
//! request, and hands back parsed JSON responses regardless of
//! status — classification stays with the managers.

use crate::error::{SyncError, SyncResult};
use crate::transport::{ApiRequest, ApiResponse, Method, Transport};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Header carrying the environment identity on every request.
pub const ENVIRONMENT_HEADER: &str = "x-opsdeck-environment";

/// Configuration for the HTTP transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the orchestration API, e.g. `https://deck.example.com/api`.
    pub base_url: String,
    /// Environment identity sent with every request.
    pub environment: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8600/api".to_string(),
            environment: "default".to_string(),
            timeout_secs: 30,
        }
    }
}

/// reqwest-backed transport.
pub struct HttpTransport {
    config: ApiConfig,
    client: Client,
}

impl HttpTransport {
    /// Creates a transport for the given API.
    pub fn new(config: ApiConfig) -> SyncResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SyncError::Network(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { config, client })
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> SyncResult<ApiResponse> {
        let url = self.url(&request.path);
        debug!("{} {url}", request.method.as_str());

        let mut builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
            Method::Patch => self.client.patch(&url),
            Method::Delete => self.client.delete(&url),
        };
        builder = builder.header(ENVIRONMENT_HEADER, &self.config.environment);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| SyncError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| SyncError::Network(e.to_string()))?;
        // Error bodies are not guaranteed to be JSON; keep the raw
        // text in that case so the message survives classification.
        let body = if text.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };

        Ok(ApiResponse { status, body })
    }
}
