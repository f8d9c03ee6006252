use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub supplier: SupplierConfig,
    pub sms: SmsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    /// Per-tenant requests per minute admitted by the rate limiter.
    #[serde(default = "default_rate_limit")]
    pub rate_limit_per_minute: u32,
}

fn default_rate_limit() -> u32 {
    120
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SecurityConfig {
    /// Master key material for the credential vault. Mandatory when
    /// `production` is set; the vault constructor enforces this.
    pub master_key: Option<String>,
    #[serde(default)]
    pub production: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SupplierConfig {
    #[serde(default = "default_supplier_timeout")]
    pub request_timeout_seconds: u64,
}

fn default_supplier_timeout() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct SmsConfig {
    /// Fallback per-segment price for tenants without an explicit one.
    #[serde(default = "default_sms_cost")]
    pub default_cost_per_segment_cents: i64,
    #[serde(default = "default_sms_endpoint")]
    pub transport_url: String,
    #[serde(default = "default_sms_timeout")]
    pub request_timeout_seconds: u64,
}

fn default_sms_cost() -> i64 {
    5
}

fn default_sms_endpoint() -> String {
    "https://api.imiconnect.io/resources/v1/messaging".to_string()
}

fn default_sms_timeout() -> u64 {
    15
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            // Start off by merging in the "default" configuration file
            .add_source(config::File::with_name("config/default"))
            // Add in the current environment file (optional)
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add in a local configuration file that stays out of git
            .add_source(config::File::with_name("config/local").required(false))
            // Add in settings from the environment (with a prefix of KEYRELAY)
            // E.g. `KEYRELAY__SERVER__PORT=8080` would set server.port
            .add_source(config::Environment::with_prefix("KEYRELAY").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
