//! Status determination and aggregation.

use crate::keepalived::VrrpDescriptor;
use crate::probes::{DnsProbe, SystemProbe};
use crate::types::{FailoverMode, Role, StatusSnapshot};
use common::Result;

/// Reconciles the static descriptor with live probes into one canonical
/// snapshot.
///
/// Every caller (status query, control reply, publish loops) goes through
/// [`StatusEngine::snapshot`]; there is no alternative composition order.
/// The engine has no mutable state and is safe to call concurrently.
pub struct StatusEngine {
    configured_role: Role,
    interface: String,
    vip: String,
    daemon_unit: String,
    resolver_unit: String,
    system: SystemProbe,
    dns: DnsProbe,
}

impl StatusEngine {
    pub fn new(
        descriptor: &VrrpDescriptor,
        daemon_unit: impl Into<String>,
        resolver_unit: impl Into<String>,
        system: SystemProbe,
        dns: DnsProbe,
    ) -> Self {
        Self {
            configured_role: descriptor.role,
            interface: descriptor.interface_or_default().to_string(),
            vip: descriptor.primary_vip().to_string(),
            daemon_unit: daemon_unit.into(),
            resolver_unit: resolver_unit.into(),
            system,
            dns,
        }
    }

    /// Compute one fresh snapshot.
    ///
    /// Probe order is fixed: daemon state, VIP binding, resolver state,
    /// DNS health. Daemon and VIP probe failures surface as errors;
    /// resolver and DNS results degrade instead.
    pub async fn snapshot(&self, action: &str) -> Result<StatusSnapshot> {
        let (daemon_state, stdout, stderr) = self.system.daemon_status(&self.daemon_unit).await?;
        let vip_bound = self.system.vip_assigned(&self.interface, &self.vip).await?;
        let resolver_state = self.system.service_status(&self.resolver_unit).await;
        let dns = self.dns.probe().await;

        Ok(StatusSnapshot {
            action: action.to_string(),
            daemon_state,
            configured_role: self.configured_role,
            mode: FailoverMode::from_vip_bound(vip_bound),
            configured_vip: self.vip.clone(),
            vip_bound,
            resolver_state,
            dns_ok: dns.ok,
            dns_latency_ms: dns.latency_ms,
            dns_answer: dns.answer,
            stdout,
            stderr,
        })
    }

    /// Cheap resolver-state poll for the change-detection loop.
    pub async fn resolver_state(&self) -> String {
        self.system.service_status(&self.resolver_unit).await
    }
}
