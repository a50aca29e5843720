use service_core::observability::init_tracing;
use template_service::config::TemplateServiceConfig;
use template_service::services::metrics::init_metrics;
use template_service::Application;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = TemplateServiceConfig::load()?;

    init_tracing(
        "template-service",
        &config.common.log_level,
        config.common.otlp_endpoint.as_deref(),
    );
    init_metrics();

    tracing::info!(
        sendgrid = %config.sendgrid.api_base_url,
        openai = %config.openai.api_base_url,
        static_dir = %config.assets.static_dir.display(),
        "Starting template-service"
    );

    let application = Application::build(config).await?;
    application.run_until_stopped().await?;

    Ok(())
}
