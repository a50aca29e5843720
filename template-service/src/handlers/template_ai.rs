use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
};

use crate::models::{ProxyEnvelope, RequestParams};
use crate::AppState;

/// Browsers opening the endpoint directly land on the form page.
pub async fn template_ai_page() -> impl IntoResponse {
    (StatusCode::FOUND, [(header::LOCATION, "/template-ai.html")])
}

/// `POST /template-ai`: draft an email from a prompt and merge it into the
/// layout.
pub async fn generate_template(
    State(state): State<AppState>,
    params: RequestParams,
) -> ProxyEnvelope {
    tracing::info!("Generating template");

    if let Err(e) = params.required("prompt", "Prompt is required") {
        return e.into();
    }
    // Sent to the model untrimmed.
    let prompt = params.get("prompt").unwrap_or_default();

    match state.openai.generate_html(prompt).await {
        Ok(html) => ProxyEnvelope::with_html(state.wrapper.wrap(&html).await),
        Err(e) => e.into(),
    }
}
