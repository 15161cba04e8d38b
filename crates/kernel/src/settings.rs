use std::path::PathBuf;

use anyhow::{anyhow, Context};
use serde::Deserialize;

const DEFAULT_ENV: &str = "local";
const ENV_VAR_NAME: &str = "BOOKCLUB_ENV";
const CONFIG_DIR_ENV: &str = "BOOKCLUB_CONFIG_DIR";
const ENV_PREFIX: &str = "BOOKCLUB";

/// Deployment environment the application is running in.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Local,
    Staging,
    Production,
}

impl std::str::FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "local" => Ok(Environment::Local),
            "staging" => Ok(Environment::Staging),
            "production" => Ok(Environment::Production),
            other => Err(anyhow!(
                "unsupported environment '{}'; expected local/staging/production",
                other
            )),
        }
    }
}

/// Top-level configuration structure loaded from layered sources.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: Environment,
    #[serde(default)]
    pub service: ServiceSettings,
    #[serde(default)]
    pub session: SessionSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
    #[serde(default)]
    pub stub: StubSettings,
}

impl Settings {
    /// Load configuration by layering `.env`, base file, and environment overlay.
    ///
    /// Environment variables use `__` between section and key, e.g.
    /// `BOOKCLUB_SERVICE__BASE_URL`.
    pub fn load() -> anyhow::Result<Self> {
        // Allow missing `.env` files without failing.
        let _ = dotenvy::dotenv();

        let environment = std::env::var(ENV_VAR_NAME).unwrap_or_else(|_| DEFAULT_ENV.to_string());
        let config_dir = match std::env::var(CONFIG_DIR_ENV) {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => std::env::current_dir()
                .with_context(|| "unable to resolve current directory")?
                .join("config"),
        };

        Self::load_from(&config_dir, &environment)
    }

    /// Load configuration from an explicit directory and environment name.
    pub fn load_from(config_dir: &std::path::Path, environment: &str) -> anyhow::Result<Self> {
        let parsed: Environment = environment.parse()?;

        let base_path = config_dir.join("base.toml");
        let environment_path = config_dir.join(format!("{}.toml", environment));

        let builder = config::Config::builder()
            .add_source(config::File::from(base_path).required(false))
            .add_source(config::File::from(environment_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            );

        let cfg = builder
            .build()
            .with_context(|| "failed to build configuration")?;

        let mut settings: Settings = cfg
            .try_deserialize()
            .with_context(|| "failed to deserialize configuration")?;

        // Override environment field with parsed enum variant.
        settings.environment = parsed;

        Ok(settings)
    }
}

/// Where the remote book service lives. One address serves both the
/// public listing and the admin endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceSettings {
    #[serde(default = "ServiceSettings::default_base_url")]
    pub base_url: String,
}

impl ServiceSettings {
    fn default_base_url() -> String {
        "http://localhost:5000".to_string()
    }
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            base_url: Self::default_base_url(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionSettings {
    #[serde(default = "SessionSettings::default_token_path")]
    pub token_path: PathBuf,
}

impl SessionSettings {
    fn default_token_path() -> PathBuf {
        PathBuf::from(".bookclub").join("admin_token")
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            token_path: Self::default_token_path(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelemetrySettings {
    #[serde(default)]
    pub log_format: LogFormat,
    #[serde(default = "TelemetrySettings::default_filter")]
    pub filter: String,
}

impl TelemetrySettings {
    fn default_filter() -> String {
        "info".to_string()
    }
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Pretty,
            filter: Self::default_filter(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Settings for the development stub of the book service.
#[derive(Debug, Clone, Deserialize)]
pub struct StubSettings {
    #[serde(default = "StubSettings::default_host")]
    pub host: String,
    #[serde(default = "StubSettings::default_port")]
    pub port: u16,
    #[serde(default = "StubSettings::default_admin_username")]
    pub admin_username: String,
    #[serde(default = "StubSettings::default_admin_password")]
    pub admin_password: String,
    #[serde(default = "StubSettings::default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl StubSettings {
    fn default_host() -> String {
        "127.0.0.1".to_string()
    }

    fn default_port() -> u16 {
        5000
    }

    fn default_admin_username() -> String {
        "admin".to_string()
    }

    fn default_admin_password() -> String {
        "admin123".to_string()
    }

    fn default_request_timeout_ms() -> u64 {
        15000
    }
}

impl Default for StubSettings {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
            admin_username: Self::default_admin_username(),
            admin_password: Self::default_admin_password(),
            request_timeout_ms: Self::default_request_timeout_ms(),
        }
    }
}
