use reqwest::Url;
use std::sync::Arc;
use std::time::Duration;

use super::error::ProxyError;
use super::metrics::record_upstream_call;
use super::upstream::{OutboundRequest, Transport};
use crate::models::ProxyEnvelope;

const PROVIDER: &str = "page_source";

pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Connect and overall timeout for page fetches.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Fetches arbitrary pages so the browser can import their markup.
#[derive(Clone)]
pub struct PageSourceFetcher {
    transport: Arc<dyn Transport>,
}

impl PageSourceFetcher {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub async fn fetch(&self, url: &str) -> Result<ProxyEnvelope, ProxyError> {
        let url = Url::parse(url).map_err(|e| ProxyError::InvalidInput(format!("Invalid URL: {}", e)))?;

        tracing::debug!(url = %url, "Requesting page");

        let request = OutboundRequest::get(url.as_str()).header("User-Agent", USER_AGENT);
        let response = self.transport.execute(request).await.map_err(|e| {
            tracing::error!(url = %url, error = %e, "Error fetching page source");
            record_upstream_call(PROVIDER, "transport_error");
            ProxyError::Transport(format!("Error fetching page source: {}", e))
        })?;

        if !response.is_success() {
            record_upstream_call(PROVIDER, "upstream_error");
            return Err(ProxyError::Upstream {
                status: response.status,
                message: format!("Failed to fetch page. HTTP Status: {}", response.status),
                body: None,
            });
        }

        record_upstream_call(PROVIDER, "success");
        Ok(ProxyEnvelope::with_html(response.body).status(response.status))
    }
}
