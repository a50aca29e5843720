//! Application wiring: shared state, router and server lifecycle.

use axum::{
    middleware::from_fn,
    routing::get,
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    metrics::metrics_middleware, security_headers::security_headers_middleware,
    tracing::{request_id_middleware, REQUEST_ID_HEADER},
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::TemplateServiceConfig;
use crate::handlers::{health, page_source, template_ai, template_version, templates};
use crate::services::page_source::FETCH_TIMEOUT;
use crate::services::{
    CredentialProvider, EmailWrapper, HttpTransport, LayeredCredentials, OpenAiClient,
    PageSourceFetcher, SendGridClient, Transport,
};

/// Connect timeout for SendGrid and OpenAI. Responses are not time-limited,
/// since a completion can take well over ten seconds.
const PROVIDER_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<TemplateServiceConfig>,
    pub sendgrid: Arc<SendGridClient>,
    pub openai: Arc<OpenAiClient>,
    pub page_fetcher: Arc<PageSourceFetcher>,
    pub wrapper: Arc<EmailWrapper>,
}

impl AppState {
    pub fn new(
        config: TemplateServiceConfig,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Result<Self, AppError> {
        let provider_transport: Arc<dyn Transport> =
            Arc::new(http_transport(PROVIDER_CONNECT_TIMEOUT, None)?);
        let page_transport: Arc<dyn Transport> =
            Arc::new(http_transport(FETCH_TIMEOUT, Some(FETCH_TIMEOUT))?);

        let sendgrid = SendGridClient::new(
            provider_transport.clone(),
            credentials.clone(),
            config.sendgrid.api_base_url.clone(),
        );
        let openai = OpenAiClient::new(
            provider_transport,
            credentials,
            config.openai.api_base_url.clone(),
        );
        let wrapper = EmailWrapper::new(config.assets.wrapper_template_path.clone());

        Ok(Self {
            sendgrid: Arc::new(sendgrid),
            openai: Arc::new(openai),
            page_fetcher: Arc::new(PageSourceFetcher::new(page_transport)),
            wrapper: Arc::new(wrapper),
            config: Arc::new(config),
        })
    }
}

fn http_transport(connect: Duration, total: Option<Duration>) -> Result<HttpTransport, AppError> {
    HttpTransport::new(connect, total).map_err(|e| {
        tracing::error!("Failed to build HTTP client: {}", e);
        AppError::InternalError(anyhow::anyhow!(e))
    })
}

pub fn build_router(state: AppState) -> Router {
    let static_files = ServeDir::new(&state.config.assets.static_dir);

    Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .route("/metrics", get(health::metrics_endpoint))
        .route("/page-source", get(page_source::page_source))
        .route("/templates", get(templates::list_templates))
        .route(
            "/template-ai",
            get(template_ai::template_ai_page).post(template_ai::generate_template),
        )
        .route(
            "/template-version",
            get(template_version::template_version_page)
                .post(template_version::create_template_version),
        )
        .fallback_service(static_files)
        .layer(from_fn(security_headers_middleware))
        .layer(from_fn(metrics_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build with credentials read from the configured properties file and
    /// the environment.
    pub async fn build(config: TemplateServiceConfig) -> Result<Self, AppError> {
        let credentials = Arc::new(LayeredCredentials::new(
            config.credentials.properties_path.clone(),
        ));
        Self::build_with(config, credentials).await
    }

    /// Build with an explicit credential source. Port 0 binds a random port.
    pub async fn build_with(
        config: TemplateServiceConfig,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Result<Self, AppError> {
        let addr = config.common.bind_address();
        let listener = TcpListener::bind(&addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        if !config.assets.static_dir.is_dir() {
            tracing::warn!(
                path = %config.assets.static_dir.display(),
                "Static directory not found; front end pages will 404"
            );
        }

        let router = build_router(AppState::new(config, credentials)?);

        tracing::info!("Template service listening on port {}", port);

        Ok(Self {
            port,
            listener,
            router,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Serve until Ctrl+C or SIGTERM, then drain in-flight requests.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
