//! SendGrid template API client.

use reqwest::Url;
use serde_json::{json, Map, Value};
use std::sync::Arc;

use super::credentials::{Credential, CredentialProvider};
use super::error::ProxyError;
use super::metrics::record_upstream_call;
use super::upstream::{OutboundRequest, OutboundResponse, ResponsePayload, Transport};
use crate::models::{ProxyEnvelope, RequestParams};

const PROVIDER: &str = "sendgrid";
const DEFAULT_ERROR: &str = "SendGrid API error";
const DEFAULT_HTML_CONTENT: &str = "<!doctype><html><body></body></html>";
const DEFAULT_EDITOR: &str = "code";
const MISSING_KEY: &str = "SendGrid API key is not configured. Please set it in sendgrid.properties file or SENDGRID_API_KEY environment variable.";

/// A template version to create, as submitted by the browser.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTemplateVersion {
    pub template_id: String,
    pub name: String,
    pub active: i64,
    pub html_content: String,
    pub generate_plain_content: bool,
    pub subject: String,
    pub updated_at: Option<String>,
    pub editor: String,
}

impl NewTemplateVersion {
    pub fn from_params(params: &RequestParams) -> Result<Self, ProxyError> {
        let template_id = params
            .required("template_id", "Template ID is required")?
            .to_string();
        if matches!(template_id.as_str(), "." | "..") {
            return Err(ProxyError::InvalidInput(format!(
                "Invalid template ID: {}",
                template_id
            )));
        }
        let name = params.required("name", "Version name is required")?.to_string();

        let active = match params.non_blank("active") {
            Some(raw) => raw.parse::<i64>().map_err(|_| {
                ProxyError::InvalidInput(format!("Invalid value for active: {}", raw))
            })?,
            None => 1,
        };

        Ok(Self {
            template_id,
            name,
            active,
            html_content: params
                .get("html_content")
                .unwrap_or(DEFAULT_HTML_CONTENT)
                .to_string(),
            generate_plain_content: matches!(params.get("generate_plain_content"), Some("true" | "1")),
            subject: params.get("subject").unwrap_or_default().to_string(),
            updated_at: params.non_blank("updated_at").map(str::to_string),
            editor: params.get("editor").unwrap_or(DEFAULT_EDITOR).to_string(),
        })
    }

    /// Body of `POST /v3/templates/{id}/versions`.
    pub fn payload(&self) -> Value {
        let mut body = Map::new();
        body.insert("template_id".into(), json!(self.template_id));
        body.insert("active".into(), json!(self.active));
        body.insert("name".into(), json!(self.name));
        body.insert("html_content".into(), json!(self.html_content));
        body.insert(
            "generate_plain_content".into(),
            json!(self.generate_plain_content),
        );
        body.insert("subject".into(), json!(self.subject));
        if let Some(updated_at) = &self.updated_at {
            body.insert("updated_at".into(), json!(updated_at));
        }
        body.insert("editor".into(), json!(self.editor));
        Value::Object(body)
    }
}

#[derive(Clone)]
pub struct SendGridClient {
    transport: Arc<dyn Transport>,
    credentials: Arc<dyn CredentialProvider>,
    base_url: String,
}

impl SendGridClient {
    pub fn new(
        transport: Arc<dyn Transport>,
        credentials: Arc<dyn CredentialProvider>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            credentials,
            base_url: base_url.into(),
        }
    }

    /// Dynamic templates visible to the configured key.
    pub async fn list_templates(&self) -> Result<ProxyEnvelope, ProxyError> {
        let request =
            OutboundRequest::get(format!("{}/v3/templates?generations=dynamic", self.base_url));
        let response = self.send(request).await?;

        let templates = response
            .json()
            .map_err(|e| e.to_string())
            .and_then(|body| match body.get("templates") {
                Some(templates @ Value::Array(_)) => Ok(templates.clone()),
                _ => Err("missing templates array".to_string()),
            });

        match templates {
            Ok(templates) => {
                record_upstream_call(PROVIDER, "success");
                tracing::info!(status = response.status, "Fetched SendGrid templates");
                Ok(ProxyEnvelope::with_data(response.status, templates))
            }
            Err(e) => {
                let error = ProxyError::Parse(format!("Error parsing template list: {}", e));
                record_upstream_call(PROVIDER, error.outcome());
                tracing::error!(error = %e, "Unusable SendGrid template list");
                Err(error)
            }
        }
    }

    pub async fn create_version(
        &self,
        version: &NewTemplateVersion,
    ) -> Result<ProxyEnvelope, ProxyError> {
        let request = OutboundRequest::post(self.versions_url(&version.template_id)?)
            .json(version.payload());
        let response = self.send(request).await?;

        record_upstream_call(PROVIDER, "success");
        tracing::info!(
            template_id = %version.template_id,
            status = response.status,
            "Created SendGrid template version"
        );

        Ok(match response.payload() {
            ResponsePayload::Json(data) => ProxyEnvelope::with_data(response.status, data),
            ResponsePayload::Raw(body) => ProxyEnvelope::with_raw_body(response.status, body),
        })
    }

    /// `{base}/v3/templates/{id}/versions` with the id percent-encoded as a
    /// single path segment.
    fn versions_url(&self, template_id: &str) -> Result<String, ProxyError> {
        let invalid_base = || {
            ProxyError::Configuration(format!("Invalid SendGrid base URL: {}", self.base_url))
        };

        let mut url = Url::parse(&self.base_url).map_err(|_| invalid_base())?;
        url.path_segments_mut()
            .map_err(|_| invalid_base())?
            .pop_if_empty()
            .extend(["v3", "templates", template_id, "versions"]);

        Ok(url.into())
    }

    /// Authenticate, send, and turn error statuses into `ProxyError::Upstream`.
    async fn send(&self, request: OutboundRequest) -> Result<OutboundResponse, ProxyError> {
        let api_key = self.credentials.resolve(Credential::SendGrid).ok_or_else(|| {
            tracing::warn!("SendGrid API key missing");
            ProxyError::Configuration(MISSING_KEY.to_string())
        })?;

        let request = request
            .header("Content-Type", "application/json")
            .bearer(api_key);

        let response = self.transport.execute(request).await.map_err(|e| {
            let error = ProxyError::Transport(format!("Error calling SendGrid API: {}", e));
            record_upstream_call(PROVIDER, error.outcome());
            error
        })?;

        if response.is_error() {
            let message = sendgrid_error_message(&response.body);
            tracing::warn!(status = response.status, error = %message, "SendGrid rejected request");
            let error = ProxyError::Upstream {
                status: response.status,
                message,
                body: Some(response.body),
            };
            record_upstream_call(PROVIDER, error.outcome());
            return Err(error);
        }

        Ok(response)
    }
}

/// Human-readable message from a SendGrid error body.
pub fn sendgrid_error_message(body: &str) -> String {
    let fallback = || {
        if body.is_empty() {
            DEFAULT_ERROR.to_string()
        } else {
            body.to_string()
        }
    };

    let parsed: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(_) => return fallback(),
    };
    let Some(object) = parsed.as_object() else {
        return fallback();
    };

    if let Some(errors) = object.get("errors") {
        let Some(first) = errors.as_array().and_then(|errors| errors.first()) else {
            return DEFAULT_ERROR.to_string();
        };
        let Some(first) = first.as_object() else {
            return fallback();
        };

        if let Some(message) = first.get("message") {
            return match message.as_str() {
                Some(message) => message.to_string(),
                None => fallback(),
            };
        }
        if let Some(field) = first.get("field") {
            return match field.as_str() {
                Some(field) => format!("Error in field '{}': Invalid value", field),
                None => fallback(),
            };
        }
        return DEFAULT_ERROR.to_string();
    }

    match object.get("message") {
        Some(Value::String(message)) => message.clone(),
        Some(_) => fallback(),
        None => DEFAULT_ERROR.to_string(),
    }
}
