use axum::extract::State;

use crate::models::ProxyEnvelope;
use crate::AppState;

/// `GET /templates`: dynamic templates from SendGrid.
pub async fn list_templates(State(state): State<AppState>) -> ProxyEnvelope {
    tracing::info!("Listing SendGrid templates");
    state.sendgrid.list_templates().await.into()
}
