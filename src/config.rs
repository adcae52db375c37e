use std::time::Duration;

use serde::Deserialize;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub base_url: String,
    pub config_path: String,
    pub request_timeout_secs: u64,
    pub accept_invalid_certs: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefreshSettings {
    pub config_interval_secs: u64,
    pub listing_interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NoticeSettings {
    pub error_ms: u64,
    pub success_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LoggingSettings {
    pub filter: Option<String>,
    pub directory: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    pub server: ServerSettings,
    pub refresh: RefreshSettings,
    pub notices: NoticeSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

impl RefreshSettings {
    pub fn config_interval(&self) -> Duration {
        Duration::from_secs(self.config_interval_secs)
    }

    pub fn listing_interval(&self) -> Duration {
        Duration::from_secs(self.listing_interval_secs)
    }
}

impl NoticeSettings {
    pub fn error_duration(&self) -> Duration {
        Duration::from_millis(self.error_ms)
    }

    pub fn success_duration(&self) -> Duration {
        Duration::from_millis(self.success_ms)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        // Fallback: parse the embedded default TOML
        let defaults: &str = include_str!("../config/default.toml");
        match ::config::Config::builder()
            .add_source(::config::File::from_str(defaults, ::config::FileFormat::Toml))
            .build()
        {
            Ok(cfg) => match cfg.try_deserialize() {
                Ok(client_cfg) => client_cfg,
                Err(e) => {
                    eprintln!("FATAL: Failed to deserialize default config: {}", e);
                    panic!("Failed to deserialize default config: {}", e);
                }
            },
            Err(e) => {
                eprintln!("FATAL: Failed to parse default config: {}", e);
                panic!("Failed to parse default config: {}", e);
            }
        }
    }
}

/// Reads the layered settings without checking them.
///
/// Command line overrides go on top of the result; [`validate`] runs after.
pub fn load() -> anyhow::Result<ClientConfig> {
    // Load .env first (optional)
    let _ = dotenvy::dotenv();

    let defaults: &str = include_str!("../config/default.toml");
    let mut builder = ::config::Config::builder()
        .add_source(::config::File::from_str(defaults, ::config::FileFormat::Toml))
        // Optional local file: ablage.toml (in CWD)
        .add_source(::config::File::with_name("ablage").required(false));

    if let Ok(custom_path) = std::env::var("ABLAGE_CONFIG") {
        builder = builder.add_source(::config::File::with_name(&custom_path).required(false));
    }
    // Environment variables last to have highest precedence
    builder = builder.add_source(::config::Environment::with_prefix("ABLAGE").separator("__"));

    let cfg = builder.build()?;
    let client_cfg: ClientConfig = cfg.try_deserialize()?;
    Ok(client_cfg)
}

pub fn validate(cfg: &ClientConfig) -> AppResult<()> {
    let base = cfg.server.base_url.trim();
    if !(base.starts_with("http://") || base.starts_with("https://")) {
        return Err(AppError::InvalidSettings(format!("invalid server.base_url: {}", cfg.server.base_url)));
    }
    if cfg.server.config_path.is_empty() {
        return Err(AppError::InvalidSettings("server.config_path must not be empty".to_string()));
    }
    if cfg.server.request_timeout_secs == 0 {
        return Err(AppError::InvalidSettings("server.request_timeout_secs must be > 0".to_string()));
    }
    if cfg.server.accept_invalid_certs {
        tracing::warn!("TLS certificate verification is disabled for {}", cfg.server.base_url);
    }

    if cfg.refresh.config_interval_secs == 0 {
        return Err(AppError::InvalidSettings("refresh.config_interval_secs must be > 0".to_string()));
    }
    if cfg.refresh.listing_interval_secs == 0 {
        return Err(AppError::InvalidSettings("refresh.listing_interval_secs must be > 0".to_string()));
    }

    if cfg.notices.error_ms == 0 || cfg.notices.success_ms == 0 {
        return Err(AppError::InvalidSettings("notices durations must be > 0".to_string()));
    }

    Ok(())
}
