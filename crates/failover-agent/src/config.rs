//! Configuration loading and validation for the failover agent.

use crate::types::AgentConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use validator::{Validate, ValidationError};

// Re-export Validate trait for derive macro
#[allow(unused_imports)]
use validator::Validate as _;

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found in search paths")]
    FileNotFound,

    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(#[from] validator::ValidationErrors),
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerSettings,

    #[serde(default)]
    pub daemon: DaemonSettings,

    #[serde(default)]
    pub dns: DnsSettings,

    #[serde(default)]
    pub publish: PublishSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

impl Validate for Config {
    fn validate(&self) -> Result<(), validator::ValidationErrors> {
        self.daemon.validate()?;
        self.dns.validate()?;
        self.publish.validate()?;
        Ok(())
    }
}

/// Front-end settings, consumed by the request front end.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    pub port: u16,

    /// Source IPs allowed to call the front end. Empty denies everything.
    pub allowed_ips: Vec<String>,
}

/// Failover daemon settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DaemonSettings {
    #[validate(length(min = 1))]
    pub unit: String,

    #[validate(length(min = 1), custom = "validate_conf_path")]
    pub conf_path: String,

    #[validate(length(min = 1))]
    pub resolver_unit: String,

    #[serde(with = "humantime_serde")]
    #[validate(custom = "validate_command_timeout")]
    pub command_timeout: Duration,
}

/// DNS health probe settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DnsSettings {
    #[validate(length(min = 1))]
    pub resolver: String,

    #[validate(length(min = 1))]
    pub query: String,

    #[serde(with = "humantime_serde")]
    #[validate(custom = "validate_dns_timeout")]
    pub timeout: Duration,
}

/// Status publishing settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PublishSettings {
    pub enabled: bool,

    /// Broker endpoint for the sink implementation.
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,

    #[validate(length(min = 1))]
    pub topic: String,

    #[serde(with = "humantime_serde")]
    #[validate(custom = "validate_update_interval")]
    pub update_interval: Duration,

    #[serde(with = "humantime_serde")]
    #[validate(custom = "validate_poll_interval")]
    pub poll_interval: Duration,
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    pub level: Option<String>,
    pub format: Option<String>,
}

// Default implementations

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: 5000,
            allowed_ips: Vec::new(),
        }
    }
}

impl Default for DaemonSettings {
    fn default() -> Self {
        Self {
            unit: "keepalived".to_string(),
            conf_path: "/etc/keepalived/keepalived.conf".to_string(),
            resolver_unit: "pihole-FTL".to_string(),
            command_timeout: Duration::from_secs(5),
        }
    }
}

impl Default for DnsSettings {
    fn default() -> Self {
        Self {
            resolver: "127.0.0.1".to_string(),
            query: "google.com".to_string(),
            timeout: Duration::from_secs(3),
        }
    }
}

impl Default for PublishSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            host: "127.0.0.1".to_string(),
            port: 1883,
            username: String::new(),
            password: String::new(),
            topic: "failover/status".to_string(),
            update_interval: Duration::from_secs(30),
            poll_interval: Duration::from_secs(2),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: None,
            format: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerSettings::default(),
            daemon: DaemonSettings::default(),
            dns: DnsSettings::default(),
            publish: PublishSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

// Custom validators

fn validate_conf_path(path: &str) -> Result<(), ValidationError> {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::new("conf_path_empty"));
    }

    // Must be absolute path or relative (starting with ./)
    if !trimmed.starts_with('/') && !trimmed.starts_with("./") {
        return Err(ValidationError::new("conf_path_invalid_format"));
    }

    Ok(())
}

fn validate_command_timeout(timeout: &Duration) -> Result<(), ValidationError> {
    let millis = timeout.as_millis();
    if millis < 100 || millis > 60_000 {
        return Err(ValidationError::new("command_timeout_out_of_range"));
    }
    Ok(())
}

fn validate_dns_timeout(timeout: &Duration) -> Result<(), ValidationError> {
    let secs = timeout.as_secs();
    if secs < 1 || secs > 30 {
        return Err(ValidationError::new("dns_timeout_out_of_range"));
    }
    Ok(())
}

fn validate_update_interval(interval: &Duration) -> Result<(), ValidationError> {
    let secs = interval.as_secs();
    if secs < 1 || secs > 3_600 {
        return Err(ValidationError::new("update_interval_out_of_range"));
    }
    Ok(())
}

fn validate_poll_interval(interval: &Duration) -> Result<(), ValidationError> {
    let millis = interval.as_millis();
    if millis < 100 || millis > 60_000 {
        return Err(ValidationError::new("poll_interval_out_of_range"));
    }
    Ok(())
}

// Configuration loading implementation

impl Config {
    /// Load configuration from default search paths
    pub fn load() -> Result<Self, ConfigError> {
        match Self::find_config_file() {
            Some(path) => {
                tracing::info!("Loading configuration from: {}", path.display());
                Self::load_from_file(&path)
            }
            None => {
                tracing::info!("No configuration file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let config: Config = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Find configuration file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let mut paths = vec![
            PathBuf::from("/etc/failover-agent/config.yaml"),
        ];

        if let Some(home_path) = Self::home_config_path() {
            paths.push(home_path);
        }

        paths.push(PathBuf::from("./failover-agent.yaml"));

        paths.into_iter()
            .find(|p: &PathBuf| p.exists() && p.is_file())
    }

    /// Get home directory config path
    fn home_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".config/failover-agent/config.yaml"))
    }

    /// Convert to the flat runtime AgentConfig
    pub fn to_agent_config(&self) -> AgentConfig {
        AgentConfig {
            port: self.server.port,
            allowed_ips: self.server.allowed_ips.clone(),
            daemon_unit: self.daemon.unit.clone(),
            daemon_conf: self.daemon.conf_path.clone(),
            resolver_unit: self.daemon.resolver_unit.clone(),
            command_timeout: self.daemon.command_timeout,
            dns_resolver: self.dns.resolver.clone(),
            dns_query: self.dns.query.clone(),
            dns_timeout: self.dns.timeout,
            publish_enabled: self.publish.enabled,
            publish_topic: self.publish.topic.clone(),
            update_interval: self.publish.update_interval,
            poll_interval: self.publish.poll_interval,
        }
    }
}
