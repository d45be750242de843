//! Transport layer for the oneM2M HTTP binding.
//!
//! Two directions:
//! - **Outbound**: the [`Transport`] trait sends one fully-built HTTP request and
//!   returns the completed response. [`HttpTransport`] is the reqwest-backed
//!   implementation; tests substitute their own.
//! - **Inbound**: [`TcpServer`] serves an Axum router until cancelled, used by
//!   the notification listener.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐        ┌──────────────────┐
//! │  OneM2MRequest   │        │ NotificationList.│
//! └────────┬─────────┘        └────────┬─────────┘
//!          │ HttpRequest               │ Router
//!          ▼                           ▼
//! ┌──────────────────┐        ┌──────────────────┐
//! │  dyn Transport   │        │    TcpServer     │
//! │ (reqwest/mock)   │        │ (axum + tokio)   │
//! └──────────────────┘        └──────────────────┘
//! ```

mod http_client;
mod tcp;

pub use http_client::HttpTransport;
pub use tcp::TcpServer;

use http::{HeaderMap, Method, StatusCode};

use crate::error::Result;

/// A fully-resolved outbound HTTP request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// HTTP method
    pub method: Method,
    /// Absolute request URI, query string included
    pub uri: String,
    /// Request headers
    pub headers: HeaderMap,
    /// Serialized body, if any
    pub body: Option<String>,
}

/// A completed HTTP response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Body text
    pub body: String,
}

impl HttpResponse {
    /// Create a response with empty headers and body
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: String::new(),
        }
    }

    /// Builder-style header insert; invalid names or values are skipped.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            http::header::HeaderName::from_bytes(name.as_bytes()),
            http::HeaderValue::from_str(value),
        ) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Builder-style body
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Header value as text
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Outbound transport: one blocking HTTP exchange per call.
///
/// Implementations must not retry; failures propagate to the caller.
pub trait Transport: Send + Sync {
    /// Send the request and wait for the complete response.
    fn send(&self, request: HttpRequest) -> Result<HttpResponse>;

    /// Transport name for logging.
    fn name(&self) -> &'static str;
}

impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        (**self).send(request)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}
