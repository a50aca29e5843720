use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
};

use crate::models::{ProxyEnvelope, RequestParams};
use crate::services::NewTemplateVersion;
use crate::AppState;

/// Browsers opening the endpoint directly land on the form page.
pub async fn template_version_page() -> impl IntoResponse {
    (StatusCode::FOUND, [(header::LOCATION, "/template-version.html")])
}

/// `POST /template-version`: create a version of an existing template.
pub async fn create_template_version(
    State(state): State<AppState>,
    params: RequestParams,
) -> ProxyEnvelope {
    tracing::info!("Creating template version");

    let version = match NewTemplateVersion::from_params(&params) {
        Ok(version) => version,
        Err(e) => return e.into(),
    };

    state.sendgrid.create_version(&version).await.into()
}
