//! Outbound call seam shared by every provider client.
//!
//! A provider client describes one request (`OutboundRequest`), hands it to a
//! `Transport`, and gets back the status plus the raw body. Parsing the body
//! and translating errors stays with the provider, so the transport can be
//! swapped for a recording double in tests.

pub mod http;
#[cfg(test)]
pub(crate) mod mock;

use async_trait::async_trait;
use reqwest::Method;
use secrecy::Secret;
use serde_json::Value;
use thiserror::Error;

pub use http::HttpTransport;

/// Failure to complete the exchange: connection, TLS, timeout or body read.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

/// A single outbound HTTP request.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub bearer: Option<Secret<String>>,
    pub body: Option<Value>,
}

impl OutboundRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            bearer: None,
            body: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn bearer(mut self, token: Secret<String>) -> Self {
        self.bearer = Some(token);
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Status and raw body of a completed exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundResponse {
    pub status: u16,
    pub body: String,
}

/// Response body after an attempt to read it as JSON.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponsePayload {
    Json(Value),
    Raw(String),
}

impl OutboundResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Status codes the providers use for failures (4xx and 5xx).
    pub fn is_error(&self) -> bool {
        self.status >= 400
    }

    pub fn json(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_str(&self.body)
    }

    pub fn payload(&self) -> ResponsePayload {
        match self.json() {
            Ok(value) => ResponsePayload::Json(value),
            Err(_) => ResponsePayload::Raw(self.body.clone()),
        }
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: OutboundRequest) -> Result<OutboundResponse, TransportError>;
}
