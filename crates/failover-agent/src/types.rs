//! Types for status snapshots and runtime agent configuration.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// Interface assumed when the daemon config names none.
pub const DEFAULT_INTERFACE: &str = "eth0";

/// Placeholder reported when the daemon config lists no virtual IP.
pub const PLACEHOLDER_VIP: &str = "0.0.0.0";

/// Service-manager state of the failover daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DaemonState {
    Active,
    Inactive,
    Unknown,
}

impl FromStr for DaemonState {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "active" => DaemonState::Active,
            "inactive" => DaemonState::Inactive,
            _ => DaemonState::Unknown,
        })
    }
}

impl std::fmt::Display for DaemonState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DaemonState::Active => write!(f, "active"),
            DaemonState::Inactive => write!(f, "inactive"),
            DaemonState::Unknown => write!(f, "unknown"),
        }
    }
}

/// Role configured in the daemon's config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Master,
    Backup,
    Unknown,
}

impl Role {
    /// Parse the value of a `state` keyword. Case-insensitive; anything
    /// other than MASTER/BACKUP is Unknown.
    pub fn from_config_token(token: &str) -> Self {
        match token.to_uppercase().as_str() {
            "MASTER" => Role::Master,
            "BACKUP" => Role::Backup,
            _ => Role::Unknown,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Master => write!(f, "MASTER"),
            Role::Backup => write!(f, "BACKUP"),
            Role::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// Live failover mode, derived solely from whether the virtual IP is
/// currently bound to the interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FailoverMode {
    Master,
    Backup,
}

impl FailoverMode {
    pub fn from_vip_bound(vip_bound: bool) -> Self {
        if vip_bound {
            FailoverMode::Master
        } else {
            FailoverMode::Backup
        }
    }
}

impl std::fmt::Display for FailoverMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailoverMode::Master => write!(f, "MASTER"),
            FailoverMode::Backup => write!(f, "BACKUP"),
        }
    }
}

/// One complete status computation. Ephemeral: lives for the duration of a
/// single reply or publish cycle, owns no references back to its inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusSnapshot {
    /// Action that produced this snapshot ("status" for plain queries).
    pub action: String,

    /// Service-manager state of the failover daemon.
    pub daemon_state: DaemonState,

    /// Role configured in the daemon's config file.
    pub configured_role: Role,

    /// Live mode derived from VIP binding.
    pub mode: FailoverMode,

    /// Virtual IP this host is configured to hold.
    pub configured_vip: String,

    /// Whether the VIP is currently bound to the interface.
    pub vip_bound: bool,

    /// Resolver service state ("active", "inactive", "error", ...).
    pub resolver_state: String,

    /// Whether the DNS probe succeeded.
    pub dns_ok: bool,

    /// DNS probe latency in milliseconds, -1 when not applicable.
    pub dns_latency_ms: i64,

    /// Resolved answer body from the DNS probe.
    pub dns_answer: String,

    /// Raw stdout of the command that produced this snapshot.
    pub stdout: String,

    /// Raw stderr of the command that produced this snapshot.
    pub stderr: String,
}

/// Runtime agent configuration, flattened from the YAML config.
///
/// Immutable after startup; passed by value into each component so engines
/// stay independently testable.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Front-end listen port (consumed by the request front end).
    pub port: u16,

    /// Source IPs allowed to call the front end.
    pub allowed_ips: Vec<String>,

    /// Service-manager unit of the failover daemon.
    pub daemon_unit: String,

    /// Path to the failover daemon's config file.
    pub daemon_conf: String,

    /// Service-manager unit of the DNS resolver.
    pub resolver_unit: String,

    /// Timeout for service-manager and interface-listing commands.
    pub command_timeout: Duration,

    /// Resolver address the DNS probe queries.
    pub dns_resolver: String,

    /// Name the DNS probe resolves.
    pub dns_query: String,

    /// Hard timeout for the DNS probe.
    pub dns_timeout: Duration,

    /// Whether background publishing is enabled.
    pub publish_enabled: bool,

    /// Topic the status payload is published under.
    pub publish_topic: String,

    /// Period of the unconditional full-status publish loop.
    pub update_interval: Duration,

    /// Period of the resolver-state change-detection poll.
    pub poll_interval: Duration,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            allowed_ips: Vec::new(),
            daemon_unit: "keepalived".to_string(),
            daemon_conf: "/etc/keepalived/keepalived.conf".to_string(),
            resolver_unit: "pihole-FTL".to_string(),
            command_timeout: Duration::from_secs(5),
            dns_resolver: "127.0.0.1".to_string(),
            dns_query: "google.com".to_string(),
            dns_timeout: Duration::from_secs(3),
            publish_enabled: false,
            publish_topic: "failover/status".to_string(),
            update_interval: Duration::from_secs(30),
            poll_interval: Duration::from_secs(2),
        }
    }
}
