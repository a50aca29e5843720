use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::path::{Path, PathBuf};

/// Directory name of this service inside the workspace.
const SERVICE_DIR: &str = "template-service";

#[derive(Debug, Clone, Deserialize)]
pub struct TemplateServiceConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub sendgrid: SendGridConfig,
    pub openai: OpenAiConfig,
    pub credentials: CredentialsConfig,
    pub assets: AssetsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SendGridConfig {
    /// Scheme and host of the SendGrid REST API, without the `/v3` prefix.
    pub api_base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiConfig {
    /// Scheme and host of the OpenAI REST API, without the `/v1` prefix.
    pub api_base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CredentialsConfig {
    /// Java-style properties file holding `sendgrid.api.key`, `openai.api.key`
    /// and `openai.system.prompt`.
    pub properties_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssetsConfig {
    /// Root of the static front end.
    pub static_dir: PathBuf,
    /// Email layout the generated HTML is merged into.
    pub wrapper_template_path: PathBuf,
}

impl TemplateServiceConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        let service_dir = service_directory()?;

        Ok(TemplateServiceConfig {
            common: common_config,
            sendgrid: SendGridConfig {
                api_base_url: trim_base_url(&get_env(
                    "SENDGRID_API_BASE_URL",
                    "https://api.sendgrid.com",
                )),
            },
            openai: OpenAiConfig {
                api_base_url: trim_base_url(&get_env(
                    "OPENAI_API_BASE_URL",
                    "https://api.openai.com",
                )),
            },
            credentials: CredentialsConfig {
                properties_path: resolve(
                    &service_dir,
                    get_env("CREDENTIALS_FILE", "resources/sendgrid.properties"),
                ),
            },
            assets: AssetsConfig {
                static_dir: resolve(&service_dir, get_env("STATIC_DIR", "static")),
                wrapper_template_path: resolve(
                    &service_dir,
                    get_env("WRAPPER_TEMPLATE", "resources/email-template-wrapper.html"),
                ),
            },
        })
    }
}

fn get_env(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn trim_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

/// Directory relative paths are resolved against, whether the binary runs from
/// the workspace root or from the service directory itself.
fn service_directory() -> Result<PathBuf, AppError> {
    let base_path = env::current_dir()?;

    if base_path.ends_with(SERVICE_DIR) || !base_path.join(SERVICE_DIR).is_dir() {
        Ok(base_path)
    } else {
        Ok(base_path.join(SERVICE_DIR))
    }
}

fn resolve(service_dir: &Path, path: String) -> PathBuf {
    let path = PathBuf::from(path);
    if path.is_absolute() {
        path
    } else {
        service_dir.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trim_base_url() {
        assert_eq!(trim_base_url("https://api.sendgrid.com/"), "https://api.sendgrid.com");
        assert_eq!(trim_base_url(" http://127.0.0.1:4000 "), "http://127.0.0.1:4000");
    }

    #[test]
    fn test_resolve_keeps_absolute_paths() {
        let dir = Path::new("/srv/template-service");
        assert_eq!(
            resolve(dir, "/etc/sendgrid.properties".to_string()),
            PathBuf::from("/etc/sendgrid.properties")
        );
        assert_eq!(
            resolve(dir, "static".to_string()),
            PathBuf::from("/srv/template-service/static")
        );
    }
}
