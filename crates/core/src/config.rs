use anyhow::Context;
use providers::{HttpApiConfig, DEFAULT_BASE_URL};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub timing: TimingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    #[serde(default)]
    pub request_timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    pub chat_thinking_ms: u64,
    pub fallback_delay_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                base_url: DEFAULT_BASE_URL.to_string(),
                request_timeout_ms: None,
            },
            timing: TimingConfig::default(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            chat_thinking_ms: 1500,
            fallback_delay_ms: 2000,
        }
    }
}

impl ApiConfig {
    pub fn http(&self) -> HttpApiConfig {
        HttpApiConfig {
            base_url: self.base_url.clone(),
            request_timeout: self.request_timeout_ms.map(Duration::from_millis),
        }
    }
}

/// Loads defaults, then the config file, then `TERMSHEET_*` environment
/// overrides (`TERMSHEET_API__BASE_URL`, `TERMSHEET_TIMING__FALLBACK_DELAY_MS`).
pub fn load(path: Option<&str>) -> anyhow::Result<AppConfig> {
    let defaults = AppConfig::default();
    let mut settings = config::Config::builder()
        .set_default("api.base_url", defaults.api.base_url)?
        .set_default("timing.chat_thinking_ms", defaults.timing.chat_thinking_ms as i64)?
        .set_default("timing.fallback_delay_ms", defaults.timing.fallback_delay_ms as i64)?;
    if let Some(p) = path {
        settings = settings.add_source(config::File::with_name(p));
    } else {
        settings = settings.add_source(config::File::with_name("config/default").required(false));
    }
    settings = settings.add_source(
        config::Environment::with_prefix("TERMSHEET")
            .prefix_separator("_")
            .separator("__"),
    );
    let cfg = settings.build().context("building configuration")?;
    cfg.try_deserialize().context("decoding configuration")
}
