#![allow(dead_code)]

use service_core::config::Config;
use std::sync::Arc;
use tempfile::TempDir;
use template_service::config::{
    AssetsConfig, CredentialsConfig, OpenAiConfig, SendGridConfig, TemplateServiceConfig,
};
use template_service::services::StaticCredentials;
use template_service::Application;
use wiremock::MockServer;

pub const SENDGRID_KEY: &str = "SG.test-key";
pub const OPENAI_KEY: &str = "sk-test-key";

pub const INDENT: &str = "                            ";

pub fn wrapper_layout() -> String {
    format!(
        "<html>\n<body>\n{INDENT}<!-- AI Code goes here Start -->\n{INDENT}<!-- AI Code goes here End-->\n</body>\n</html>\n"
    )
}

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub sendgrid: MockServer,
    pub openai: MockServer,
    pub client: reqwest::Client,
    pub assets: TempDir,
}

impl TestApp {
    /// App with both provider keys configured.
    pub async fn spawn() -> Self {
        Self::spawn_with(
            StaticCredentials::new()
                .sendgrid_key(SENDGRID_KEY)
                .openai_key(OPENAI_KEY),
        )
        .await
    }

    pub async fn spawn_with(credentials: StaticCredentials) -> Self {
        let sendgrid = MockServer::start().await;
        let openai = MockServer::start().await;

        let assets = tempfile::tempdir().expect("Failed to create temp dir");
        let static_dir = assets.path().join("static");
        std::fs::create_dir_all(&static_dir).expect("Failed to create static dir");
        std::fs::write(
            static_dir.join("index.html"),
            "<!DOCTYPE html><html><body>Template Studio</body></html>",
        )
        .expect("Failed to write index.html");
        let wrapper_path = assets.path().join("email-template-wrapper.html");
        std::fs::write(&wrapper_path, wrapper_layout()).expect("Failed to write wrapper");

        let config = TemplateServiceConfig {
            common: Config {
                host: "127.0.0.1".to_string(),
                port: 0,
                ..Config::default()
            },
            sendgrid: SendGridConfig {
                api_base_url: sendgrid.uri(),
            },
            openai: OpenAiConfig {
                api_base_url: openai.uri(),
            },
            credentials: CredentialsConfig {
                properties_path: assets.path().join("sendgrid.properties"),
            },
            assets: AssetsConfig {
                static_dir,
                wrapper_template_path: wrapper_path,
            },
        };

        let app = Application::build_with(config, Arc::new(credentials))
            .await
            .expect("Failed to build test application");
        let port = app.port();

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("Failed to build client");

        Self {
            address: format!("http://127.0.0.1:{}", port),
            port,
            sendgrid,
            openai,
            client,
            assets,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .form(form)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to execute request")
    }
}

/// Assert the proxy contract (200, JSON content type) and return the envelope.
pub async fn envelope(response: reqwest::Response) -> serde_json::Value {
    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(
        response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok()),
        Some("application/json; charset=UTF-8")
    );
    response.json().await.expect("Failed to parse JSON")
}
