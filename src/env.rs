use std::path::Path;
use std::str::FromStr;

use anyhow::Context;
use tracing::{info, warn};

pub fn load_environment() -> Result<(), Box<dyn std::error::Error>> {
    let is_production =
        dotenvy::var("ROCKET_PROFILE").unwrap_or("development".to_string()) == "production";

    let env_files = if is_production {
        vec!["config/common.env", "config/prod.env", ".secrets.env"]
    } else {
        vec!["config/common.env", "config/dev.env", ".secrets.env"]
    };

    for env_file in env_files {
        load_env_file(env_file)?;
    }

    Ok(())
}

fn load_env_file(path: &str) -> Result<(), Box<dyn std::error::Error>> {
    if !Path::new(path).exists() {
        warn!("Warning: Environment file {} not found, skipping", path);
        return Ok(());
    }

    dotenvy::from_filename_override(path)?;
    info!("Loaded environment from: {}", path);
    Ok(())
}

/// Settings the service reads on top of Rocket's own `ROCKET_*` figment.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// `None` starts the server in setup-required mode.
    pub database_url: Option<String>,
    pub session_ttl_hours: i64,
    pub message_poll_interval_secs: u64,
    pub search_result_limit: i64,
    pub public_base_url: String,
    pub otel_endpoint: Option<String>,
    pub honeycomb_api_key: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            session_ttl_hours: 24,
            message_poll_interval_secs: 5,
            search_result_limit: 50,
            public_base_url: "http://localhost:8000".to_string(),
            otel_endpoint: None,
            honeycomb_api_key: None,
        }
    }
}

fn optional_var(name: &str) -> Option<String> {
    dotenvy::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parsed_var<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_var(name) {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("{} must be a number, got {:?}", name, raw)),
        None => Ok(default),
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();

        let config = Self {
            database_url: optional_var("DATABASE_URL"),
            session_ttl_hours: parsed_var("SESSION_TTL_HOURS", defaults.session_ttl_hours)?,
            message_poll_interval_secs: parsed_var(
                "MESSAGE_POLL_INTERVAL_SECS",
                defaults.message_poll_interval_secs,
            )?,
            search_result_limit: parsed_var("SEARCH_RESULT_LIMIT", defaults.search_result_limit)?,
            public_base_url: optional_var("PUBLIC_BASE_URL").unwrap_or(defaults.public_base_url),
            otel_endpoint: optional_var("OTEL_EXPORTER_OTLP_ENDPOINT"),
            honeycomb_api_key: optional_var("HONEYCOMB_API_KEY"),
        };

        if config.session_ttl_hours <= 0 {
            anyhow::bail!("SESSION_TTL_HOURS must be positive");
        }
        if config.message_poll_interval_secs == 0 {
            anyhow::bail!("MESSAGE_POLL_INTERVAL_SECS must be positive");
        }
        if config.search_result_limit <= 0 {
            anyhow::bail!("SEARCH_RESULT_LIMIT must be positive");
        }

        Ok(config)
    }

    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.session_ttl_hours)
    }

    pub fn poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.message_poll_interval_secs)
    }

    pub fn telemetry_enabled(&self) -> bool {
        self.otel_endpoint.is_some() || self.honeycomb_api_key.is_some()
    }
}
