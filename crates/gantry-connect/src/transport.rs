//! HTTP transport seam
//!
//! The request engine talks to the network through this trait so tests can
//! substitute a scripted transport for the real client.

use async_trait::async_trait;
use reqwest::Client;

pub use reqwest::{Method, StatusCode};

use crate::error::Result;

/// A fully-formed outbound request
#[derive(Debug, Clone)]
pub struct TransportRequest {
    /// HTTP method
    pub method: Method,
    /// Absolute URL, query string included
    pub url: String,
    /// Header name/value pairs
    pub headers: Vec<(String, String)>,
    /// JSON request body, when the verb carries one
    pub body: Option<serde_json::Value>,
}

impl TransportRequest {
    /// Build a bodiless request
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Attach header pairs
    pub fn with_headers(mut self, headers: Vec<(String, String)>) -> Self {
        self.headers = headers;
        self
    }

    /// Attach a JSON body
    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Raw response: status plus the unparsed body bytes
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// HTTP status
    pub status: StatusCode,
    /// Response body, untouched by any decompression
    pub body: Vec<u8>,
}

impl TransportResponse {
    /// Whether the status is 2xx
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Canonical reason phrase for the status
    pub fn status_text(&self) -> &'static str {
        self.status.canonical_reason().unwrap_or("Unknown Status")
    }
}

/// Capability to send one HTTP request and collect the response
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send the request, returning the raw response
    ///
    /// Non-2xx statuses are returned as responses, not errors; only
    /// transport-level failures (DNS, TLS, connection) error here.
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse>;
}

/// Production transport over a shared `reqwest` client
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Create a transport with a fresh client
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse> {
        let mut builder = self.client.request(request.method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.bytes().await?.to_vec();

        Ok(TransportResponse { status, body })
    }
}
