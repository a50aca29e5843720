use axum::extract::State;

use crate::models::{ProxyEnvelope, RequestParams};
use crate::AppState;

/// `GET /page-source?url=...`
pub async fn page_source(State(state): State<AppState>, params: RequestParams) -> ProxyEnvelope {
    tracing::info!("Fetching page source");

    let url = match params.required("url", "URL parameter is required") {
        Ok(url) => url,
        Err(e) => return e.into(),
    };

    state.page_fetcher.fetch(url).await.into()
}
