use std::{fs, path::Path, time::Duration};

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;
use transitions::MAX_TIME_SCALE;

pub const SETTINGS_FILE: &str = "audience_display.toml";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub server_url: String,
    pub display_id: Option<String>,
    pub settle_delay_ms: u64,
    pub time_scale: f64,
    pub reconnect_delay_ms: u64,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:8080".into(),
            display_id: None,
            settle_delay_ms: 100,
            time_scale: 1.0,
            reconnect_delay_ms: 1000,
            log_filter: "info".into(),
        }
    }
}

impl Settings {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }
}

/// Every key is optional; whatever is present overrides the defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    server_url: Option<String>,
    display_id: Option<String>,
    settle_delay_ms: Option<u64>,
    time_scale: Option<f64>,
    reconnect_delay_ms: Option<u64>,
    log_filter: Option<String>,
}

pub fn load_settings() -> Result<Settings> {
    load_settings_from(Path::new(SETTINGS_FILE), |key| std::env::var(key).ok())
}

/// Defaults, then the settings file if it exists, then `APP__*` variables.
pub fn load_settings_from(
    path: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> Result<Settings> {
    let mut settings = Settings::default();

    if path.exists() {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file '{}'", path.display()))?;
        let file_cfg: FileSettings = toml::from_str(&raw)
            .with_context(|| format!("invalid settings file '{}'", path.display()))?;
        apply_file(&mut settings, file_cfg);
    }

    if let Some(v) = env("APP__SERVER_URL") {
        settings.server_url = v;
    }
    if let Some(v) = env("APP__DISPLAY_ID") {
        settings.display_id = Some(v).filter(|id| !id.is_empty());
    }
    if let Some(v) = env("APP__SETTLE_DELAY_MS") {
        settings.settle_delay_ms = parse_env("APP__SETTLE_DELAY_MS", &v)?;
    }
    if let Some(v) = env("APP__TIME_SCALE") {
        settings.time_scale = parse_env("APP__TIME_SCALE", &v)?;
    }
    if let Some(v) = env("APP__RECONNECT_DELAY_MS") {
        settings.reconnect_delay_ms = parse_env("APP__RECONNECT_DELAY_MS", &v)?;
    }
    if let Some(v) = env("APP__LOG_FILTER") {
        settings.log_filter = v;
    }

    validate(&settings)?;
    Ok(settings)
}

fn apply_file(settings: &mut Settings, file_cfg: FileSettings) {
    if let Some(v) = file_cfg.server_url {
        settings.server_url = v;
    }
    if file_cfg.display_id.is_some() {
        settings.display_id = file_cfg.display_id;
    }
    if let Some(v) = file_cfg.settle_delay_ms {
        settings.settle_delay_ms = v;
    }
    if let Some(v) = file_cfg.time_scale {
        settings.time_scale = v;
    }
    if let Some(v) = file_cfg.reconnect_delay_ms {
        settings.reconnect_delay_ms = v;
    }
    if let Some(v) = file_cfg.log_filter {
        settings.log_filter = v;
    }
}

fn parse_env<T>(key: &str, raw: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|err| anyhow::anyhow!("invalid value for {key} ('{raw}'): {err}"))
}

pub fn validate(settings: &Settings) -> Result<()> {
    if settings.server_url.trim().is_empty() {
        bail!("server_url must not be empty");
    }
    if !(0.0..=MAX_TIME_SCALE).contains(&settings.time_scale) {
        bail!(
            "time_scale must be between 0 and {MAX_TIME_SCALE}, got {}",
            settings.time_scale
        );
    }
    EnvFilter::try_new(&settings.log_filter)
        .with_context(|| format!("invalid log_filter '{}'", settings.log_filter))?;
    Ok(())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
