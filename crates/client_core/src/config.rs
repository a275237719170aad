use std::{fs, time::Duration};

use serde::Deserialize;
use tracing::warn;

pub const CONFIG_FILE: &str = "averages.toml";
pub const DEFAULT_BASE_URL: &str = "http://localhost:8081/servicesRest/WsColegio";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewaySettings {
    pub base_url: String,
    pub request_timeout_secs: u64,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl GatewaySettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn with_base_url(mut self, base_url: impl AsRef<str>) -> Self {
        self.base_url = normalize_base_url(base_url.as_ref());
        self
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    base_url: Option<String>,
    request_timeout_secs: Option<u64>,
}

/// Defaults, then `averages.toml` in the working directory, then the environment.
pub fn load_settings() -> GatewaySettings {
    let raw = fs::read_to_string(CONFIG_FILE).ok();
    resolve_settings(raw.as_deref(), |key| std::env::var(key).ok())
}

fn resolve_settings(
    file_contents: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> GatewaySettings {
    let mut settings = GatewaySettings::default();

    if let Some(raw) = file_contents {
        match toml::from_str::<FileSettings>(raw) {
            Ok(file_cfg) => {
                if let Some(v) = file_cfg.base_url {
                    settings.base_url = v;
                }
                match file_cfg.request_timeout_secs {
                    Some(0) => warn!(file = CONFIG_FILE, "ignoring zero request_timeout_secs"),
                    Some(v) => settings.request_timeout_secs = v,
                    None => {}
                }
            }
            Err(err) => warn!(file = CONFIG_FILE, %err, "ignoring unreadable config file"),
        }
    }

    if let Some(v) = env("AVERAGES_BASE_URL") {
        settings.base_url = v;
    }
    if let Some(v) = env("APP__BASE_URL") {
        settings.base_url = v;
    }

    if let Some(v) = env("APP__REQUEST_TIMEOUT_SECS") {
        match v.parse::<u64>() {
            Ok(0) => warn!("ignoring zero APP__REQUEST_TIMEOUT_SECS"),
            Ok(parsed) => settings.request_timeout_secs = parsed,
            Err(_) => warn!(value = %v, "ignoring non-numeric APP__REQUEST_TIMEOUT_SECS"),
        }
    }

    settings.base_url = normalize_base_url(&settings.base_url);
    settings
}

pub fn normalize_base_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return DEFAULT_BASE_URL.to_string();
    }
    trimmed.to_string()
}
