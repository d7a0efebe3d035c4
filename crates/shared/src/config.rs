//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// JWT configuration.
    pub jwt: JwtSettings,
    /// SMS gateway configuration.
    #[serde(default)]
    pub sms: SmsConfig,
    /// Email (SMTP) configuration.
    #[serde(default)]
    pub email: EmailConfig,
    /// Reconciliation engine configuration.
    #[serde(default)]
    pub reconciliation: ReconciliationConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// JWT configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtSettings {
    /// Secret key for signing tokens.
    pub secret: String,
    /// Access token expiration in seconds.
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry_secs: u64,
    /// Refresh token expiration in seconds.
    #[serde(default = "default_refresh_token_expiry")]
    pub refresh_token_expiry_secs: u64,
}

fn default_access_token_expiry() -> u64 {
    900 // 15 minutes
}

fn default_refresh_token_expiry() -> u64 {
    604800 // 7 days
}

/// SMS gateway configuration.
///
/// The approval link for a sent document is delivered out-of-band over SMS;
/// the gateway is a plain JSON-over-HTTP provider.
#[derive(Debug, Clone, Deserialize)]
pub struct SmsConfig {
    /// Gateway endpoint URL.
    #[serde(default)]
    pub gateway_url: String,
    /// Gateway API key.
    #[serde(default)]
    pub api_key: String,
    /// Sender name shown to the recipient.
    #[serde(default = "default_sms_sender")]
    pub sender: String,
    /// Base URL used to build approval links (frontend).
    #[serde(default = "default_approval_base_url")]
    pub approval_base_url: String,
}

fn default_sms_sender() -> String {
    "BALANCO".to_string()
}

fn default_approval_base_url() -> String {
    "http://localhost:3000/approval".to_string()
}

impl Default for SmsConfig {
    fn default() -> Self {
        Self {
            gateway_url: String::new(),
            api_key: String::new(),
            sender: default_sms_sender(),
            approval_base_url: default_approval_base_url(),
        }
    }
}

/// Email (SMTP) configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    /// SMTP host.
    #[serde(default = "default_smtp_host")]
    pub smtp_host: String,
    /// SMTP port.
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    /// SMTP username.
    #[serde(default)]
    pub smtp_username: String,
    /// SMTP password.
    #[serde(default)]
    pub smtp_password: String,
    /// From address.
    #[serde(default = "default_from_email")]
    pub from_email: String,
    /// From display name.
    #[serde(default = "default_from_name")]
    pub from_name: String,
}

fn default_smtp_host() -> String {
    "localhost".to_string()
}

fn default_smtp_port() -> u16 {
    587
}

fn default_from_email() -> String {
    "noreply@balanco.app".to_string()
}

fn default_from_name() -> String {
    "Balanco".to_string()
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_host: default_smtp_host(),
            smtp_port: default_smtp_port(),
            smtp_username: String::new(),
            smtp_password: String::new(),
            from_email: default_from_email(),
            from_name: default_from_name(),
        }
    }
}

/// Reconciliation engine configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ReconciliationConfig {
    /// Maximum number of raw rows accepted in one import batch.
    #[serde(default = "default_max_batch_rows")]
    pub max_batch_rows: usize,
    /// Approval token validity in hours.
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: i64,
    /// Prefix for generated document numbers.
    #[serde(default = "default_document_prefix")]
    pub document_prefix: String,
}

fn default_max_batch_rows() -> usize {
    1000
}

fn default_token_ttl_hours() -> i64 {
    72
}

fn default_document_prefix() -> String {
    "REC".to_string()
}

impl Default for ReconciliationConfig {
    fn default() -> Self {
        Self {
            max_batch_rows: default_max_batch_rows(),
            token_ttl_hours: default_token_ttl_hours(),
            document_prefix: default_document_prefix(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("BALANCO").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reconciliation_defaults() {
        let cfg = ReconciliationConfig::default();
        assert_eq!(cfg.max_batch_rows, 1000);
        assert_eq!(cfg.token_ttl_hours, 72);
        assert_eq!(cfg.document_prefix, "REC");
    }

    #[test]
    fn test_sms_defaults() {
        let cfg = SmsConfig::default();
        assert_eq!(cfg.sender, "BALANCO");
        assert!(cfg.gateway_url.is_empty());
    }
}
