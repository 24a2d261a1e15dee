//! Application configuration.

use serde::Deserialize;
use std::path::Path;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Redis configuration.
    pub redis: RedisConfig,
    /// Payment provider configuration.
    pub payment: PaymentConfig,
    /// Outbound email configuration (optional; disabled when absent).
    #[serde(default)]
    pub email: Option<EmailConfig>,
    /// WhatsApp transport configuration (optional; disabled when absent).
    #[serde(default)]
    pub whatsapp: Option<WhatsAppConfig>,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public URL of this instance.
    pub url: String,
    /// Interval between subscription-expiry sweeps, in seconds.
    #[serde(default = "default_sweep_interval")]
    pub subscription_sweep_interval_secs: u64,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Redis configuration.
///
/// Redis only holds short-lived verification codes; everything durable lives
/// in the relational store.
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    /// Redis connection URL.
    pub url: String,
    /// Key prefix for all Redis keys.
    #[serde(default = "default_redis_prefix")]
    pub prefix: String,
}

/// Payment provider configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    /// Base URL of the provider's REST API.
    pub base_url: String,
    /// Secret key used as a bearer token.
    pub secret_key: String,
    /// One-time unlock price, in the currency's minor unit.
    pub unlock_amount: i64,
    /// ISO currency code.
    #[serde(default = "default_currency")]
    pub currency: String,
    /// URL the provider redirects back to after checkout.
    pub return_url: String,
    /// Request timeout in seconds.
    #[serde(default = "default_provider_timeout")]
    pub timeout_secs: u64,
}

/// SMTP email configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    /// SMTP host.
    pub host: String,
    /// SMTP port.
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    /// SMTP username.
    pub username: Option<String>,
    /// SMTP password.
    pub password: Option<String>,
    /// From address.
    pub from_address: String,
    /// From display name.
    #[serde(default = "default_from_name")]
    pub from_name: String,
}

/// WhatsApp text transport configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WhatsAppConfig {
    /// Base URL of the messaging API.
    pub base_url: String,
    /// API access token.
    pub token: String,
    /// Country calling code applied when normalizing local numbers.
    #[serde(default = "default_country_code")]
    pub default_country_code: String,
    /// Request timeout in seconds.
    #[serde(default = "default_provider_timeout")]
    pub timeout_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_sweep_interval() -> u64 {
    // Nightly sweep; the access gate re-checks expiry itself in the meantime.
    24 * 60 * 60
}

const fn default_max_connections() -> u32 {
    100
}

const fn default_min_connections() -> u32 {
    5
}

fn default_redis_prefix() -> String {
    "proplet".to_string()
}

fn default_currency() -> String {
    "NGN".to_string()
}

const fn default_provider_timeout() -> u64 {
    15
}

const fn default_smtp_port() -> u16 {
    587
}

fn default_from_name() -> String {
    "Proplet".to_string()
}

fn default_country_code() -> String {
    "234".to_string()
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// A `.env` file, if present, is folded into the process environment
    /// first. Configuration is then loaded in the following order:
    /// 1. `config/default.toml`
    /// 2. `config/{environment}.toml` (based on `PROPLET_ENV`)
    /// 3. Environment variables with `PROPLET_` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        let env = std::env::var("PROPLET_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("PROPLET")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("PROPLET")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
