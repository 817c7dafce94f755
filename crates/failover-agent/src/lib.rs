//! Failover status agent for a keepalived-style VRRP daemon.
//!
//! Exposes the operational state of the local failover daemon and the DNS
//! resolver it fronts, over an on-demand query surface and two periodic
//! publish loops, and applies daemon lifecycle actions.
//!
//! # Components
//!
//! - **keepalived**: parses the daemon's config file into an immutable
//!   descriptor (role, interface, router id, priority, virtual IPs)
//! - **probes**: live OS facts (daemon state, VIP binding, resolver state,
//!   DNS health) behind a process-execution seam
//! - **StatusEngine**: reconciles descriptor and live facts into one
//!   canonical snapshot used by every caller
//! - **ControlEngine**: start/stop/restart plus the post-action snapshot
//! - **PublishScheduler**: fixed-interval and resolver-change-triggered
//!   publishing to a retained pub/sub sink

pub mod agent;
pub mod config;
pub mod control;
pub mod exec;
pub mod keepalived;
pub mod probes;
pub mod publish;
pub mod status;
pub mod types;

pub use agent::FailoverAgent;
pub use config::{Config, ConfigError};
pub use control::{Action, ControlEngine};
pub use exec::{CommandOutput, CommandRunner, SystemRunner};
pub use keepalived::VrrpDescriptor;
pub use publish::{LogSink, PublishScheduler, PublishSink};
pub use status::StatusEngine;
pub use types::{AgentConfig, DaemonState, FailoverMode, Role, StatusSnapshot};
