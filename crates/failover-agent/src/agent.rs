//! Agent wiring: builds the engines from configuration and exposes the
//! status/control surface the request front end consumes.

use crate::control::ControlEngine;
use crate::exec::CommandRunner;
use crate::keepalived::VrrpDescriptor;
use crate::probes::{DnsProbe, SystemProbe};
use crate::publish::{PublishScheduler, PublishSink};
use crate::status::StatusEngine;
use crate::types::{AgentConfig, StatusSnapshot};
use common::Result;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Top-level agent.
///
/// Owns the immutable configuration and descriptor, a shared status
/// engine, and the control engine. Safe to share behind an `Arc`: the
/// status path is read-only and the control path serializes through the
/// service manager itself.
pub struct FailoverAgent {
    config: AgentConfig,
    status: Arc<StatusEngine>,
    control: ControlEngine,
}

impl FailoverAgent {
    pub fn new(
        config: AgentConfig,
        descriptor: &VrrpDescriptor,
        runner: Arc<dyn CommandRunner>,
    ) -> Self {
        let system = SystemProbe::new(runner.clone(), config.command_timeout);
        let dns = DnsProbe::new(
            runner.clone(),
            config.dns_resolver.clone(),
            config.dns_query.clone(),
            config.dns_timeout,
        );
        let status = Arc::new(StatusEngine::new(
            descriptor,
            config.daemon_unit.clone(),
            config.resolver_unit.clone(),
            system,
            dns,
        ));
        let control = ControlEngine::new(
            runner,
            config.daemon_unit.clone(),
            config.command_timeout,
            status.clone(),
        );

        Self {
            config,
            status,
            control,
        }
    }

    /// On-demand status snapshot.
    pub async fn status(&self) -> Result<StatusSnapshot> {
        self.status.snapshot("status").await
    }

    /// Apply a lifecycle action by name and return the post-action
    /// snapshot.
    pub async fn apply(&self, action: &str) -> Result<StatusSnapshot> {
        self.control.apply_named(action).await
    }

    /// Runtime configuration (for the front-end collaborator).
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Spawn the background publish loops against `sink`.
    pub fn spawn_publishers(
        &self,
        sink: Arc<dyn PublishSink>,
        token: CancellationToken,
    ) -> (JoinHandle<()>, JoinHandle<()>) {
        PublishScheduler::new(
            self.status.clone(),
            sink,
            self.config.publish_topic.clone(),
            self.config.update_interval,
            self.config.poll_interval,
            token,
        )
        .spawn()
    }
}
