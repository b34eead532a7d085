use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::{error, info};
use validator::Validate;

const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_PORT: u16 = 8080;
const CONFIG_DIR: &str = "config";

/// Application configuration, loaded from `config/` files layered with
/// `APP__`-prefixed environment variables.
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Database connection URL
    pub database_url: String,

    /// JWT secret key (minimum 32 characters)
    #[validate(length(min = 32))]
    pub jwt_secret: String,

    /// JWT expiration time in seconds
    #[serde(default = "default_jwt_expiration")]
    pub jwt_expiration: u64,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Application environment (development / staging / production)
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// Whether to run database migrations on startup
    #[serde(default)]
    pub auto_migrate: bool,

    /// Comma-separated list of allowed CORS origins; permissive in development
    #[serde(default)]
    pub cors_allowed_origins: Option<String>,

    /// Push relay endpoint for fire-and-forget notifications
    #[serde(default)]
    pub push_relay_url: Option<String>,

    /// Shared secret for verifying payment gateway webhook signatures
    #[serde(default)]
    pub payment_webhook_secret: Option<String>,

    /// Allowed webhook timestamp skew in seconds
    #[serde(default)]
    pub payment_webhook_tolerance_secs: Option<u64>,

    /// Trial length granted to new businesses, in days
    #[serde(default = "default_trial_days")]
    pub trial_period_days: i64,
}

fn default_jwt_expiration() -> u64 {
    3600
}
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_environment() -> String {
    DEFAULT_ENV.to_string()
}
fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}
fn default_trial_days() -> i64 {
    14
}

impl AppConfig {
    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
    }
}

#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("configuration load error: {0}")]
    Load(#[from] ConfigError),
    #[error("configuration validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

pub fn load_config() -> Result<AppConfig, AppConfigError> {
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    if !Path::new(CONFIG_DIR).exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            CONFIG_DIR
        );
    }

    // jwt_secret has no default - it MUST come from a config file or env var.
    let config = Config::builder()
        .set_default("database_url", "sqlite://washtrack.db?mode=rwc")?
        .set_default("host", "0.0.0.0")?
        .set_default("port", DEFAULT_PORT)?
        .set_default("environment", DEFAULT_ENV)?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
        .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, run_env)).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    if config.get_string("jwt_secret").is_err() {
        error!("JWT secret is not configured. Set APP__JWT_SECRET with a secure random string.");
        return Err(AppConfigError::Load(ConfigError::NotFound(
            "jwt_secret is required but not configured. Set APP__JWT_SECRET environment variable."
                .into(),
        )));
    }

    let cfg: AppConfig = config.try_deserialize()?;
    cfg.validate()?;
    Ok(cfg)
}

/// Initialises the global tracing subscriber. `RUST_LOG` overrides the
/// config-derived directive when set.
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::fmt;

    let default_directive = format!("washtrack_api={},tower_http=debug", level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    if json {
        let _ = fmt().with_env_filter(filter_directive).json().try_init();
    } else {
        let _ = fmt().with_env_filter(filter_directive).try_init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> AppConfig {
        AppConfig {
            database_url: "sqlite::memory:".into(),
            jwt_secret: "test_secret_key_for_testing_purposes_only_32chars".into(),
            jwt_expiration: 3600,
            host: "127.0.0.1".into(),
            port: 18080,
            environment: "test".into(),
            log_level: "debug".into(),
            log_json: false,
            auto_migrate: true,
            cors_allowed_origins: None,
            push_relay_url: None,
            payment_webhook_secret: None,
            payment_webhook_tolerance_secs: None,
            trial_period_days: 14,
        }
    }

    #[test]
    fn validation_rejects_short_jwt_secret() {
        let mut cfg = base_config();
        cfg.jwt_secret = "short".into();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn valid_config_passes() {
        assert!(base_config().validate().is_ok());
    }
}
