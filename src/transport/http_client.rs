//! reqwest-backed blocking transport.

use std::time::Duration;

use reqwest::blocking::Client;

use super::{HttpRequest, HttpResponse, Transport};
use crate::error::Result;

/// Blocking HTTP transport. Each call opens its own exchange; no retries.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Create a transport with the given request timeout
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// Create a transport with a 30 second timeout
    pub fn with_default_timeout() -> Result<Self> {
        Self::new(Duration::from_secs(30))
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        tracing::debug!(method = %request.method, uri = %request.uri, "Sending oneM2M request");

        let mut builder = self
            .client
            .request(request.method, &request.uri)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send()?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text()?;

        tracing::debug!(%status, "Received oneM2M response");

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }

    fn name(&self) -> &'static str {
        "HTTP/reqwest"
    }
}
