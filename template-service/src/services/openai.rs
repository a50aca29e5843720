//! OpenAI chat completions client used to draft email HTML.

use serde_json::{json, Value};
use std::sync::Arc;

use super::credentials::{Credential, CredentialProvider};
use super::error::ProxyError;
use super::metrics::record_upstream_call;
use super::upstream::{OutboundRequest, Transport};

const PROVIDER: &str = "openai";
const DEFAULT_ERROR: &str = "OpenAI API error";
const MISSING_KEY: &str = "OpenAI API key is not configured. Please set it in sendgrid.properties file (openai.api.key) or OPENAI_API_KEY environment variable.";

pub const OPENAI_MODEL: &str = "gpt-4o-mini";

/// Properties key that overrides [`DEFAULT_SYSTEM_PROMPT`].
pub const SYSTEM_PROMPT_SETTING: &str = "openai.system.prompt";

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are an expert HTML email template designer. Generate complete, valid HTML email templates. Always return only the HTML code without any markdown formatting, explanations, or code blocks. Return pure HTML that can be used directly in email templates.";

#[derive(Clone)]
pub struct OpenAiClient {
    transport: Arc<dyn Transport>,
    credentials: Arc<dyn CredentialProvider>,
    base_url: String,
}

impl OpenAiClient {
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

    fn system_prompt(&self) -> String {
        self.credentials
            .setting(SYSTEM_PROMPT_SETTING)
            .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string())
    }

    /// Ask the model for an email body. Returns the HTML with any markdown
    /// fence removed.
    pub async fn generate_html(&self, prompt: &str) -> Result<String, ProxyError> {
        let api_key = self.credentials.resolve(Credential::OpenAi).ok_or_else(|| {
            tracing::error!("OpenAI API key is not configured");
            ProxyError::Configuration(MISSING_KEY.to_string())
        })?;

        let body = json!({
            "model": OPENAI_MODEL,
            "messages": [
                {"role": "system", "content": self.system_prompt()},
                {"role": "user", "content": prompt},
            ],
        });

        let request = OutboundRequest::post(format!("{}/v1/chat/completions", self.base_url))
            .header("Content-Type", "application/json")
            .bearer(api_key)
            .json(body);

        tracing::info!(model = OPENAI_MODEL, "Sending request to OpenAI API");

        let result = self.complete(request).await;
        record_upstream_call(
            PROVIDER,
            match &result {
                Ok(_) => "success",
                Err(e) => e.outcome(),
            },
        );
        result
    }

    async fn complete(&self, request: OutboundRequest) -> Result<String, ProxyError> {
        let response = self.transport.execute(request).await.map_err(|e| {
            tracing::error!(error = %e, "OpenAI call failed");
            ProxyError::Transport(format!("Error calling OpenAI API: {}", e))
        })?;

        tracing::info!(status = response.status, "OpenAI API responded");

        if !response.is_success() {
            return Err(ProxyError::Upstream {
                status: response.status,
                message: openai_error_message(&response.body),
                body: None,
            });
        }

        let completion = response
            .json()
            .map_err(|e| ProxyError::Parse(format!("Error parsing AI response: {}", e)))?;

        let content = completion
            .get("choices")
            .and_then(Value::as_array)
            .and_then(|choices| choices.first())
            .and_then(|choice| choice.pointer("/message/content"))
            .and_then(Value::as_str)
            .ok_or_else(|| ProxyError::Parse("No response from AI".to_string()))?;

        Ok(strip_code_fence(content).to_string())
    }
}

/// `error.message` from an OpenAI error body. A body that is not JSON, or
/// whose `error` has an unexpected shape, is returned as-is.
pub fn openai_error_message(body: &str) -> String {
    let raw = || {
        if body.is_empty() {
            DEFAULT_ERROR.to_string()
        } else {
            body.to_string()
        }
    };

    let Ok(Value::Object(object)) = serde_json::from_str::<Value>(body) else {
        return raw();
    };

    match object.get("error") {
        None => DEFAULT_ERROR.to_string(),
        Some(Value::Object(error)) => match error.get("message") {
            None => DEFAULT_ERROR.to_string(),
            Some(Value::String(message)) => message.clone(),
            Some(_) => raw(),
        },
        Some(_) => raw(),
    }
}

/// Remove a surrounding markdown code fence (```html or ```).
pub fn strip_code_fence(content: &str) -> &str {
    let mut html = content.trim();
    if let Some(rest) = html.strip_prefix("```html") {
        html = rest;
    } else if let Some(rest) = html.strip_prefix("```") {
        html = rest;
    }
    if let Some(rest) = html.strip_suffix("```") {
        html = rest;
    }
    html.trim()
}
