use secrecy::Secret;
use serde::Deserialize;
use service_core::config::{config_dir_for, load_layered};
use service_core::error::AppError;
use std::time::Duration;

#[derive(Deserialize, Clone, Debug)]
pub struct Settings {
    pub api: ApiSettings,
    pub logging: LoggingSettings,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ApiSettings {
    pub base_url: String,
    #[serde(default)]
    pub access_token: Option<Secret<String>>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ApiSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct LoggingSettings {
    pub level: String,
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
}

fn default_timeout_secs() -> u64 {
    30
}

/// Load settings from `academy-billing/config/base.yaml` and `APP_*` variables.
pub fn get_configuration() -> Result<Settings, AppError> {
    let config_dir = config_dir_for("academy-billing")?;
    load_layered(&config_dir, "APP")
}
