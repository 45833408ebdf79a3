//! # Billing Configuration
//!
//! Configuration management for the billing service.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     SHOPDESK_PORT=9090                                                 │
//! │     SHOPDESK_DB_PATH=/var/lib/shopdesk/shopdesk.db                     │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     --config <path>, or SHOPDESK_CONFIG, or                            │
//! │     ~/.config/billing/billing.toml (Linux)                             │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     0.0.0.0:8080, ./shopdesk.db, 5 commit attempts                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # billing.toml
//! [server]
//! bind_addr = "0.0.0.0"
//! port = 8080
//!
//! [database]
//! path = "./shopdesk.db"
//! max_connections = 5
//!
//! [sales]
//! max_commit_attempts = 5
//! retry_initial_backoff_ms = 20
//! retry_max_backoff_ms = 500
//!
//! [notifications]
//! timeout_ms = 5000
//!
//! [notifications.email]
//! enabled = true
//! relay_url = "http://localhost:8025/send"
//! from_address = "billing@shopdesk.local"
//!
//! [notifications.whatsapp]
//! enabled = false
//! gateway_url = "https://wa-gateway.local/v1/messages"
//! api_token = "..."
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Server Settings
// =============================================================================

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Bind address (default: 0.0.0.0 for all interfaces).
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerSettings {
    fn default() -> Self {
        ServerSettings {
            bind_addr: default_bind_addr(),
            port: default_port(),
        }
    }
}

impl ServerSettings {
    /// Returns the full bind address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

// =============================================================================
// Database Settings
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./shopdesk.db")
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_db_path(),
            max_connections: default_max_connections(),
        }
    }
}

// =============================================================================
// Sale Settings
// =============================================================================

/// Retry behavior of the sale transaction.
///
/// ## Retry Timeline (defaults)
/// ```text
/// attempt 1 ──✗ conflict──► wait ~20ms
/// attempt 2 ──✗ conflict──► wait ~40ms
/// attempt 3 ──✗ conflict──► wait ~80ms
/// attempt 4 ──✗ conflict──► wait ~160ms
/// attempt 5 ──✗ conflict──► PersistenceConflict (409)
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleSettings {
    /// Total attempts, including the first one.
    #[serde(default = "default_max_commit_attempts")]
    pub max_commit_attempts: u32,

    #[serde(default = "default_retry_initial_backoff")]
    pub retry_initial_backoff_ms: u64,

    #[serde(default = "default_retry_max_backoff")]
    pub retry_max_backoff_ms: u64,
}

fn default_max_commit_attempts() -> u32 {
    5
}

fn default_retry_initial_backoff() -> u64 {
    20
}

fn default_retry_max_backoff() -> u64 {
    500
}

impl Default for SaleSettings {
    fn default() -> Self {
        SaleSettings {
            max_commit_attempts: default_max_commit_attempts(),
            retry_initial_backoff_ms: default_retry_initial_backoff(),
            retry_max_backoff_ms: default_retry_max_backoff(),
        }
    }
}

impl SaleSettings {
    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_initial_backoff_ms)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_max_backoff_ms)
    }
}

// =============================================================================
// Notification Settings
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationSettings {
    /// Per-channel send timeout.
    #[serde(default = "default_notification_timeout")]
    pub timeout_ms: u64,

    #[serde(default)]
    pub email: EmailSettings,

    #[serde(default)]
    pub whatsapp: WhatsAppSettings,
}

fn default_notification_timeout() -> u64 {
    5000
}

impl Default for NotificationSettings {
    fn default() -> Self {
        NotificationSettings {
            timeout_ms: default_notification_timeout(),
            email: EmailSettings::default(),
            whatsapp: WhatsAppSettings::default(),
        }
    }
}

impl NotificationSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Email delivery through an HTTP mail relay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Relay endpoint accepting a JSON message. Email reports `disabled`
    /// when this is unset.
    #[serde(default)]
    pub relay_url: Option<String>,

    #[serde(default = "default_from_address")]
    pub from_address: String,
}

fn default_true() -> bool {
    true
}

fn default_from_address() -> String {
    "billing@shopdesk.local".to_string()
}

impl Default for EmailSettings {
    fn default() -> Self {
        EmailSettings {
            enabled: default_true(),
            relay_url: None,
            from_address: default_from_address(),
        }
    }
}

impl EmailSettings {
    /// Enabled and pointed at a relay.
    pub fn is_active(&self) -> bool {
        self.enabled && self.relay_url.is_some()
    }
}

/// WhatsApp delivery through an HTTP messaging gateway.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WhatsAppSettings {
    #[serde(default)]
    pub enabled: bool,

    /// Gateway endpoint accepting a JSON document message. Required when
    /// `enabled` is set.
    #[serde(default)]
    pub gateway_url: Option<String>,

    /// Sent as a bearer token when present.
    #[serde(default)]
    pub api_token: Option<String>,
}

impl WhatsAppSettings {
    pub fn is_active(&self) -> bool {
        self.enabled && self.gateway_url.is_some()
    }
}

// =============================================================================
// Billing Configuration
// =============================================================================

/// Complete billing service configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BillingConfig {
    #[serde(default)]
    pub server: ServerSettings,

    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub sales: SaleSettings,

    #[serde(default)]
    pub notifications: NotificationSettings,
}

impl BillingConfig {
    /// Loads configuration from a file, then environment overrides.
    ///
    /// ## Loading Order
    /// 1. Start with defaults
    /// 2. Load from TOML file if it exists
    /// 3. Apply environment variable overrides
    /// 4. Validate
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let path = config_path
            .or_else(|| std::env::var("SHOPDESK_CONFIG").ok().map(PathBuf::from))
            .or_else(default_config_path);

        let mut config = match path {
            Some(ref p) if p.exists() => {
                info!(path = %p.display(), "Loading config from file");
                Self::from_file(p)?
            }
            Some(ref p) => {
                debug!(path = %p.display(), "Config file not found, using defaults");
                Self::default()
            }
            None => Self::default(),
        };

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Parses a TOML config file.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&content)?)
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(addr) = std::env::var("SHOPDESK_BIND_ADDR") {
            debug!(bind_addr = %addr, "Bind address from environment");
            self.server.bind_addr = addr;
        }

        if let Ok(port) = std::env::var("SHOPDESK_PORT") {
            match port.parse() {
                Ok(p) => self.server.port = p,
                Err(_) => warn!(value = %port, "Ignoring invalid SHOPDESK_PORT"),
            }
        }

        if let Ok(path) = std::env::var("SHOPDESK_DB_PATH") {
            self.database.path = PathBuf::from(path);
        }

        if let Ok(max) = std::env::var("SHOPDESK_DB_MAX_CONNECTIONS") {
            match max.parse() {
                Ok(m) => self.database.max_connections = m,
                Err(_) => warn!(value = %max, "Ignoring invalid SHOPDESK_DB_MAX_CONNECTIONS"),
            }
        }

        if let Ok(attempts) = std::env::var("SHOPDESK_MAX_COMMIT_ATTEMPTS") {
            match attempts.parse() {
                Ok(a) => self.sales.max_commit_attempts = a,
                Err(_) => warn!(value = %attempts, "Ignoring invalid SHOPDESK_MAX_COMMIT_ATTEMPTS"),
            }
        }

        if let Ok(url) = std::env::var("SHOPDESK_EMAIL_RELAY_URL") {
            self.notifications.email.relay_url = Some(url).filter(|u| !u.is_empty());
        }

        if let Ok(enabled) = std::env::var("SHOPDESK_EMAIL_ENABLED") {
            self.notifications.email.enabled = parse_flag(&enabled);
        }

        if let Ok(url) = std::env::var("SHOPDESK_WHATSAPP_GATEWAY_URL") {
            self.notifications.whatsapp.gateway_url = Some(url).filter(|u| !u.is_empty());
        }

        if let Ok(token) = std::env::var("SHOPDESK_WHATSAPP_API_TOKEN") {
            self.notifications.whatsapp.api_token = Some(token).filter(|t| !t.is_empty());
        }

        if let Ok(enabled) = std::env::var("SHOPDESK_WHATSAPP_ENABLED") {
            self.notifications.whatsapp.enabled = parse_flag(&enabled);
        }
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.server.bind_addr.trim().is_empty() {
            return Err(ConfigError::Invalid("server.bind_addr must not be empty".into()));
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be at least 1".into(),
            ));
        }

        if self.sales.max_commit_attempts == 0 {
            return Err(ConfigError::Invalid(
                "sales.max_commit_attempts must be at least 1".into(),
            ));
        }

        if self.sales.retry_initial_backoff_ms > self.sales.retry_max_backoff_ms {
            return Err(ConfigError::Invalid(
                "sales.retry_initial_backoff_ms must not exceed retry_max_backoff_ms".into(),
            ));
        }

        if self.notifications.timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "notifications.timeout_ms must be positive".into(),
            ));
        }

        if let Some(url) = &self.notifications.email.relay_url {
            require_http_url("notifications.email.relay_url", url)?;
        }

        let whatsapp = &self.notifications.whatsapp;
        match &whatsapp.gateway_url {
            Some(url) => require_http_url("notifications.whatsapp.gateway_url", url)?,
            None if whatsapp.enabled => {
                return Err(ConfigError::Invalid(
                    "notifications.whatsapp.gateway_url is required when whatsapp is enabled"
                        .into(),
                ))
            }
            None => {}
        }

        Ok(())
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

fn require_http_url(key: &str, url: &str) -> ConfigResult<()> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!(
            "{} must be an http(s) URL, got '{}'",
            key, url
        )))
    }
}

/// Platform config file location.
///
/// ## Locations
/// - Linux: `~/.config/billing/billing.toml`
/// - macOS: `~/Library/Application Support/com.shopdesk.billing/billing.toml`
/// - Windows: `C:\Users\<user>\AppData\Roaming\shopdesk\billing\config\billing.toml`
pub fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("com", "shopdesk", "billing")
        .map(|dirs| dirs.config_dir().join("billing.toml"))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = BillingConfig::default();
        assert_eq!(config.server.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.sales.max_commit_attempts, 5);
        assert!(config.notifications.email.enabled);
        assert!(!config.notifications.email.is_active());
        assert!(!config.notifications.whatsapp.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[server]
port = 9090

[notifications.email]
relay_url = "http://relay.local/send"
"#
        )
        .unwrap();

        let config = BillingConfig::from_file(file.path()).unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.bind_addr, "0.0.0.0");
        assert_eq!(config.database.max_connections, 5);
        assert!(config.notifications.email.is_active());
        assert_eq!(config.notifications.timeout_ms, 5000);
    }

    #[test]
    fn test_malformed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server\nport = ").unwrap();

        assert!(matches!(
            BillingConfig::from_file(file.path()),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_validation() {
        let mut config = BillingConfig::default();
        config.sales.max_commit_attempts = 0;
        assert!(config.validate().is_err());

        let mut config = BillingConfig::default();
        config.sales.retry_initial_backoff_ms = 1000;
        config.sales.retry_max_backoff_ms = 10;
        assert!(config.validate().is_err());

        let mut config = BillingConfig::default();
        config.notifications.email.relay_url = Some("smtp://mail".into());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_whatsapp_needs_a_gateway_when_enabled() {
        let mut config = BillingConfig::default();
        config.notifications.whatsapp.enabled = true;
        assert!(config.validate().is_err());

        config.notifications.whatsapp.gateway_url = Some("wa://gateway".into());
        assert!(config.validate().is_err());

        config.notifications.whatsapp.gateway_url = Some("https://wa.local/v1/messages".into());
        assert!(config.validate().is_ok());
        assert!(config.notifications.whatsapp.is_active());
    }
}
