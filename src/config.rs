use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::{error, info, warn};
use validator::Validate;

const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_PORT: u16 = 8080;
const CONFIG_DIR: &str = "config";
const DEFAULT_ORDER_PREFIX: &str = "ADR";
const DEFAULT_TRACKING_BASE_URL: &str = "https://adire.ng/track";
const DEFAULT_EMAIL_FROM: &str = "Adire <orders@adire.ng>";

/// Application configuration.
///
/// Loaded from built-in defaults, then optional `config/<env>.toml` files,
/// then `APP__`-prefixed environment variables. Provider credentials are
/// optional: a missing credential disables the corresponding channel with
/// a warning instead of failing startup.
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct AppConfig {
    /// Database connection URL
    pub database_url: String,

    /// Server host address
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Application environment (development | production | test)
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

    /// CORS: comma-separated list of allowed origins
    #[serde(default)]
    pub cors_allowed_origins: Option<String>,

    /// Allow permissive CORS fallback (development convenience)
    #[serde(default)]
    pub cors_allow_any_origin: bool,

    /// DB pool: max connections
    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,

    /// DB pool: min connections
    #[serde(default = "default_db_min_connections")]
    pub db_min_connections: u32,

    /// DB connect timeout (seconds)
    #[serde(default = "default_db_connect_timeout_secs")]
    pub db_connect_timeout_secs: u64,

    /// DB acquire timeout (seconds)
    #[serde(default = "default_db_acquire_timeout_secs")]
    pub db_acquire_timeout_secs: u64,

    /// Shared secret expected in the back-office session cookie.
    /// Unset disables the whole admin surface (requests get 401).
    #[serde(default)]
    pub admin_session_secret: Option<String>,

    /// Paystack secret key used to verify webhook signatures.
    /// Unset means webhook processing fails closed with 500.
    #[serde(default)]
    pub paystack_webhook_secret: Option<String>,

    /// Resend API key for transactional email. Unset skips email sends.
    #[serde(default)]
    pub resend_api_key: Option<String>,

    /// From address for transactional email
    #[serde(default = "default_email_from")]
    pub email_from: String,

    /// WhatsApp Cloud API token. Unset skips WhatsApp sends.
    #[serde(default)]
    pub whatsapp_token: Option<String>,

    /// WhatsApp Cloud API phone number id
    #[serde(default)]
    pub whatsapp_phone_id: Option<String>,

    /// Base URL for customer-facing tracking links
    #[serde(default = "default_tracking_base_url")]
    pub tracking_base_url: String,

    /// Prefix for generated order numbers
    #[validate(length(min = 1, max = 8))]
    #[serde(default = "default_order_prefix")]
    pub order_number_prefix: String,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}
fn default_db_max_connections() -> u32 {
    10
}
fn default_db_min_connections() -> u32 {
    1
}
fn default_db_connect_timeout_secs() -> u64 {
    30
}
fn default_db_acquire_timeout_secs() -> u64 {
    8
}
fn default_order_prefix() -> String {
    DEFAULT_ORDER_PREFIX.to_string()
}
fn default_tracking_base_url() -> String {
    DEFAULT_TRACKING_BASE_URL.to_string()
}
fn default_email_from() -> String {
    DEFAULT_EMAIL_FROM.to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            environment: DEFAULT_ENV.to_string(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            log_json: false,
            auto_migrate: false,
            cors_allowed_origins: None,
            cors_allow_any_origin: false,
            db_max_connections: default_db_max_connections(),
            db_min_connections: default_db_min_connections(),
            db_connect_timeout_secs: default_db_connect_timeout_secs(),
            db_acquire_timeout_secs: default_db_acquire_timeout_secs(),
            admin_session_secret: None,
            paystack_webhook_secret: None,
            resend_api_key: None,
            email_from: default_email_from(),
            whatsapp_token: None,
            whatsapp_phone_id: None,
            tracking_base_url: default_tracking_base_url(),
            order_number_prefix: default_order_prefix(),
        }
    }
}

impl AppConfig {
    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
    }

    pub fn should_allow_permissive_cors(&self) -> bool {
        self.is_development() || self.cors_allow_any_origin
    }
}

#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ConfigError),
    #[error("Configuration validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// Load configuration for the current `RUN_ENV`/`APP_ENV` profile.
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

    let builder = Config::builder()
        .set_default("database_url", "sqlite://adire.db?mode=rwc")?
        .set_default("host", "0.0.0.0")?
        .set_default("port", DEFAULT_PORT as i64)?
        .set_default("environment", DEFAULT_ENV)?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
        .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, run_env)).required(false));

    let config = builder
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    let app_config: AppConfig = config.try_deserialize()?;

    app_config.validate().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    if app_config.paystack_webhook_secret.is_none() {
        warn!("Paystack webhook secret not configured; payment webhooks will be rejected");
    }
    if app_config.admin_session_secret.is_none() {
        warn!("Admin session secret not configured; the admin surface is disabled");
    }

    Ok(app_config)
}

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` overrides the configured level when set.
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::fmt;

    let default_directive = format!("adire_api={},tower_http=debug", level);
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

    #[test]
    fn default_config_validates() {
        let cfg = AppConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.order_number_prefix, "ADR");
        assert!(cfg.is_development());
    }

    #[test]
    fn permissive_cors_follows_environment() {
        let mut cfg = AppConfig::default();
        assert!(cfg.should_allow_permissive_cors());
        cfg.environment = "production".to_string();
        assert!(!cfg.should_allow_permissive_cors());
        cfg.cors_allow_any_origin = true;
        assert!(cfg.should_allow_permissive_cors());
    }
}
