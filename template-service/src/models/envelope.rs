//! Uniform JSON envelope returned by every proxy endpoint.
//!
//! The HTTP status is always 200; the logical outcome travels in `success`.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::services::ProxyError;

pub const JSON_CONTENT_TYPE: &str = "application/json; charset=UTF-8";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProxyEnvelope {
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(rename = "statusCode", default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    #[serde(rename = "responseBody", default, skip_serializing_if = "Option::is_none")]
    pub response_body: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_content: Option<String>,
}

impl ProxyEnvelope {
    /// Successful outcome carrying the JSON payload under `data`.
    pub fn with_data(status_code: u16, data: Value) -> Self {
        Self {
            success: true,
            status_code: Some(status_code),
            data: Some(data),
            ..Default::default()
        }
    }

    /// Successful outcome whose upstream body was not JSON.
    pub fn with_raw_body(status_code: u16, body: String) -> Self {
        Self {
            success: true,
            status_code: Some(status_code),
            response_body: Some(body),
            ..Default::default()
        }
    }

    /// Successful outcome carrying an HTML document.
    pub fn with_html(html: String) -> Self {
        Self {
            success: true,
            html_content: Some(html),
            ..Default::default()
        }
    }

    pub fn status(mut self, status_code: u16) -> Self {
        self.status_code = Some(status_code);
        self
    }

    pub fn failure(error: &ProxyError) -> Self {
        let mut message = error.to_string();
        if message.trim().is_empty() {
            message = error.kind().to_string();
        }

        let (status_code, response_body) = match error {
            ProxyError::Upstream { status, body, .. } => (Some(*status), body.clone()),
            _ => (None, None),
        };

        Self {
            success: false,
            error: Some(message),
            status_code,
            response_body,
            ..Default::default()
        }
    }
}

impl From<ProxyError> for ProxyEnvelope {
    fn from(error: ProxyError) -> Self {
        if error.is_short_circuit() {
            tracing::warn!(kind = error.kind(), error = %error, "Request rejected");
        } else {
            tracing::error!(kind = error.kind(), error = %error, "Proxy call failed");
        }
        Self::failure(&error)
    }
}

impl<T> From<Result<T, ProxyError>> for ProxyEnvelope
where
    T: Into<ProxyEnvelope>,
{
    fn from(result: Result<T, ProxyError>) -> Self {
        match result {
            Ok(value) => value.into(),
            Err(error) => error.into(),
        }
    }
}

impl IntoResponse for ProxyEnvelope {
    fn into_response(self) -> Response {
        let body = match serde_json::to_vec(&self) {
            Ok(body) => body,
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize response envelope");
                br#"{"success":false,"error":"Failed to serialize response"}"#.to_vec()
            }
        };

        (
            StatusCode::OK,
            [(header::CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE))],
            body,
        )
            .into_response()
    }
}
