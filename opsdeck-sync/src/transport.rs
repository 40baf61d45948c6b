//! Transport layer abstraction.
//!
//! The sync core never talks HTTP directly; it hands an [`ApiRequest`]
//! to an injected [`Transport`] and gets an [`ApiResponse`] back.
//! Transport errors are network-level only — an HTTP error status is
//! a response, classified by the caller. This keeps the core agnostic
//! to the concrete client and lets tests substitute a deterministic
//! transport.

use crate::error::{SyncError, SyncResult};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// HTTP conventions observed by the managers: GET for queries,
/// POST/PATCH/DELETE for commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Patch,
    Delete,
}

impl Method {
    /// The wire name of the method.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

/// A request a manager built from query params or a command payload.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path relative to the API base URL, no leading slash.
    pub path: String,
    /// Query-string pairs, already ordered.
    pub query: Vec<(String, String)>,
    /// JSON body, if any. `None` sends an empty body.
    pub body: Option<Value>,
}

impl ApiRequest {
    /// A GET request.
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    /// A POST request with an empty body.
    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    /// A PATCH request with an empty body.
    #[must_use]
    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::Patch, path)
    }

    /// A DELETE request.
    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    /// Appends a query-string pair (builder style).
    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Sets the JSON body (builder style).
    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// A response as seen by the sync core.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    /// Parsed JSON body; `Null` for empty bodies.
    pub body: Value,
}

impl ApiResponse {
    /// A successful response.
    #[must_use]
    pub fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    /// An error response.
    #[must_use]
    pub fn error(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            body: serde_json::json!({ "message": message.into() }),
        }
    }

    /// Whether the status is 2xx.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Decodes the body into a domain type.
    pub fn decode<T: DeserializeOwned>(&self) -> SyncResult<T> {
        serde_json::from_value(self.body.clone()).map_err(SyncError::from)
    }

    /// The human-facing message of an error response: the body's
    /// `message` field when present, otherwise the raw body.
    #[must_use]
    pub fn error_message(&self) -> String {
        self.body
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| self.body.to_string())
    }
}

/// An injected request/response function.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends a request. `Err` means transport failure with no
    /// response; HTTP error statuses come back as `Ok`.
    async fn send(&self, request: ApiRequest) -> SyncResult<ApiResponse>;
}

/// A mock transport for testing.
pub mod mock {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Answers requests from a scripted queue, falling back to a
    /// default result, and records everything it was asked to send.
    #[derive(Default)]
    pub struct MockTransport {
        script: Mutex<VecDeque<SyncResult<ApiResponse>>>,
        fallback: Mutex<Option<SyncResult<ApiResponse>>>,
        sent: Mutex<Vec<ApiRequest>>,
        latency: Mutex<Option<Duration>>,
    }

    impl MockTransport {
        /// Creates a transport with an empty script and no fallback.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Creates a transport that always answers with `response`.
        #[must_use]
        pub fn always(response: ApiResponse) -> Self {
            let transport = Self::new();
            transport.set_fallback(Ok(response));
            transport
        }

        /// Queues the next result to hand out.
        pub fn enqueue(&self, result: SyncResult<ApiResponse>) {
            self.script.lock().unwrap().push_back(result);
        }

        /// Sets the result used when the script runs dry.
        pub fn set_fallback(&self, result: SyncResult<ApiResponse>) {
            *self.fallback.lock().unwrap() = Some(result);
        }

        /// Delays every answer, to simulate a slow network.
        pub fn set_latency(&self, latency: Duration) {
            *self.latency.lock().unwrap() = Some(latency);
        }

        /// Every request sent so far, in order.
        pub fn sent(&self) -> Vec<ApiRequest> {
            self.sent.lock().unwrap().clone()
        }

        /// Number of requests sent so far.
        pub fn sent_count(&self) -> usize {
            self.sent.lock().unwrap().len()
        }

        /// Requests sent to the given path, in order.
        pub fn sent_to(&self, path: &str) -> Vec<ApiRequest> {
            self.sent
                .lock()
                .unwrap()
                .iter()
                .filter(|r| r.path == path)
                .cloned()
                .collect()
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn send(&self, request: ApiRequest) -> SyncResult<ApiResponse> {
            self.sent.lock().unwrap().push(request);

            let latency = *self.latency.lock().unwrap();
            if let Some(latency) = latency {
                tokio::time::sleep(latency).await;
            }

            let scripted = self.script.lock().unwrap().pop_front();
            match scripted {
                Some(result) => result,
                None => self
                    .fallback
                    .lock()
                    .unwrap()
                    .clone()
                    .unwrap_or_else(|| Err(SyncError::Network("no scripted response".into()))),
            }
        }
    }
}
