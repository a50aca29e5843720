use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use std::time::Duration;

use super::{OutboundRequest, OutboundResponse, Transport, TransportError};

/// `reqwest`-backed transport. One instance per timeout policy.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// `connect_timeout` bounds connection setup; `timeout`, when given, bounds
    /// the whole exchange including the body read.
    pub fn new(connect_timeout: Duration, timeout: Option<Duration>) -> Result<Self, TransportError> {
        let mut builder = Client::builder().connect_timeout(connect_timeout);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder
            .build()
            .map_err(|e| TransportError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: OutboundRequest) -> Result<OutboundResponse, TransportError> {
        let OutboundRequest {
            method,
            url,
            headers,
            bearer,
            body,
        } = request;

        let mut builder = self.client.request(method.clone(), &url);
        for (name, value) in &headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(token) = &bearer {
            builder = builder.bearer_auth(token.expose_secret());
        }
        if let Some(body) = &body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            tracing::error!(method = %method, url = %url, error = %e, "Outbound request failed");
            TransportError(e.to_string())
        })?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| {
            tracing::error!(method = %method, url = %url, status, error = %e, "Failed to read response body");
            TransportError(e.to_string())
        })?;

        tracing::debug!(method = %method, url = %url, status, "Outbound request completed");

        Ok(OutboundResponse { status, body })
    }
}
