//! HTTP client for contract testing
//!
//! Provides the [`Transport`] seam the executor dispatches through, and its
//! reqwest-backed implementation.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Method};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::error::Error as StdError;
use std::io;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::models::HttpMethod;

/// Transport-level errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    #[error("Timeout after {0} seconds")]
    Timeout(u64),

    #[error("Connection refused to {0}")]
    ConnectionRefused(String),

    #[error("Connection to {0} closed before the response completed")]
    ConnectionClosed(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),
}

impl TransportError {
    /// Only connection failures and timeouts are worth another attempt
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TransportError::Timeout(_)
                | TransportError::ConnectionRefused(_)
                | TransportError::ConnectionClosed(_)
        )
    }
}

/// Lowercased fragments of hyper and OS messages for a dropped connection
const DROPPED_CONNECTION_MARKERS: &[&str] = &[
    "connection closed",
    "connection reset",
    "connection aborted",
    "broken pipe",
    "unexpected eof",
];

/// Whether a failed send or body read came from the peer dropping the
/// connection
///
/// reqwest only reports "error sending request", so the cause chain is
/// walked for the underlying io or hyper error.
fn is_dropped_connection(err: &reqwest::Error) -> bool {
    let mut cause = err.source();
    while let Some(inner) = cause {
        if let Some(io_err) = inner.downcast_ref::<io::Error>() {
            if matches!(
                io_err.kind(),
                io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::BrokenPipe
                    | io::ErrorKind::UnexpectedEof
            ) {
                return true;
            }
        }

        let message = inner.to_string().to_ascii_lowercase();
        if DROPPED_CONNECTION_MARKERS
            .iter()
            .any(|marker| message.contains(marker))
        {
            return true;
        }

        cause = inner.source();
    }
    false
}

/// Sends a fully formed request and returns the raw response
///
/// Implementations are shared across worker tasks and must be safe for
/// concurrent use.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// HTTP client for testing
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    timeout_secs: u64,
}

impl HttpClient {
    /// Create a new HTTP client
    pub fn new() -> Result<Self> {
        Self::with_timeout(30)
    }

    /// Create client with custom timeout
    pub fn with_timeout(timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            timeout_secs,
        })
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }

    fn method(method: HttpMethod) -> Method {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Delete => Method::DELETE,
            HttpMethod::Patch => Method::PATCH,
        }
    }
}

#[async_trait]
impl Transport for HttpClient {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        debug!("Sending {} request to {}", request.method, request.url);

        let mut req_builder = self
            .client
            .request(Self::method(request.method), &request.url);

        for (key, value) in &request.headers {
            req_builder = req_builder.header(key.as_str(), value.as_str());
        }

        if !request.query.is_empty() {
            req_builder = req_builder.query(&request.query);
        }

        if let Some(body) = &request.json {
            req_builder = req_builder.json(body);
        }

        let start = std::time::Instant::now();

        let response = req_builder.send().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout(self.timeout_secs)
            } else if e.is_connect() {
                TransportError::ConnectionRefused(request.url.clone())
            } else if is_dropped_connection(&e) {
                TransportError::ConnectionClosed(request.url.clone())
            } else {
                TransportError::RequestFailed(e.to_string())
            }
        })?;

        let status = response.status();

        let mut response_headers = HashMap::new();
        for (key, value) in response.headers().iter() {
            if let Ok(v) = value.to_str() {
                response_headers.insert(key.to_string(), v.to_string());
            }
        }

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout(self.timeout_secs)
            } else if is_dropped_connection(&e) {
                TransportError::ConnectionClosed(request.url.clone())
            } else {
                TransportError::RequestFailed(format!("Failed to read response body: {e}"))
            }
        })?;

        let duration_ms = start.elapsed().as_millis() as u64;

        debug!(
            "Response: {} {} in {}ms",
            status.as_u16(),
            status.canonical_reason().unwrap_or(""),
            duration_ms
        );

        Ok(HttpResponse {
            status_code: status.as_u16(),
            headers: response_headers,
            body,
            duration_ms,
        })
    }
}

/// HTTP request builder
#[derive(Clone, Debug, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: BTreeMap<String, String>,
    pub json: Option<Value>,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            query: Vec::new(),
            headers: BTreeMap::new(),
            json: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn headers(mut self, headers: BTreeMap<String, String>) -> Self {
        self.headers.extend(headers);
        self
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.json = Some(body);
        self
    }
}

/// HTTP response
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HttpResponse {
    pub status_code: u16,
    pub headers: HashMap<String, String>,
    pub body: String,
    pub duration_ms: u64,
}

impl HttpResponse {
    pub fn new(status_code: u16, body: impl Into<String>) -> Self {
        Self {
            status_code,
            headers: HashMap::new(),
            body: body.into(),
            duration_ms: 0,
        }
    }
}
