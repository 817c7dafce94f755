//! Live OS-state probes: daemon state, VIP binding, resolver state, DNS
//! health.

use crate::exec::CommandRunner;
use crate::types::DaemonState;
use common::{Error, Result};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// systemd exit code for `is-active` on a stopped unit. Part of the
/// service-manager contract; mapped to Inactive, not treated as failure.
const EXIT_UNIT_INACTIVE: i32 = 3;

/// Queries service-manager and interface state through the execution seam.
pub struct SystemProbe {
    runner: Arc<dyn CommandRunner>,
    timeout: Duration,
}

impl SystemProbe {
    pub fn new(runner: Arc<dyn CommandRunner>, timeout: Duration) -> Self {
        Self { runner, timeout }
    }

    /// Service-manager state of the failover daemon, with raw output.
    ///
    /// Exit code 3 means the unit is inactive and is reported as such with
    /// empty raw output. Any other non-zero exit is a probe error; an
    /// unknown daemon state must never be silently reported as down.
    pub async fn daemon_status(&self, unit: &str) -> Result<(DaemonState, String, String)> {
        let out = self
            .runner
            .run("systemctl", &["is-active", unit], Some(self.timeout))
            .await
            .map_err(|e| Error::probe(format!("systemctl is-active {}: {}", unit, e)))?;

        if out.success() {
            let stdout = out.stdout.trim().to_string();
            let stderr = out.stderr.trim().to_string();
            let state = stdout.parse().unwrap_or(DaemonState::Unknown);
            Ok((state, stdout, stderr))
        } else if out.code == Some(EXIT_UNIT_INACTIVE) {
            Ok((DaemonState::Inactive, String::new(), String::new()))
        } else {
            Err(Error::probe(format!(
                "systemctl is-active {} exited with {:?}: {}",
                unit,
                out.code,
                out.stderr.trim()
            )))
        }
    }

    /// Whether `vip` is currently bound to `interface`.
    ///
    /// Execution failure propagates as an error: an unknown VIP state must
    /// not be reported as false.
    pub async fn vip_assigned(&self, interface: &str, vip: &str) -> Result<bool> {
        let out = self
            .runner
            .run("ip", &["addr", "show", interface], Some(self.timeout))
            .await
            .map_err(|e| Error::probe(format!("ip addr show {}: {}", interface, e)))?;

        if !out.success() {
            return Err(Error::probe(format!(
                "ip addr show {} exited with {:?}: {}",
                interface,
                out.code,
                out.stderr.trim()
            )));
        }

        let bound = address_listed(&out.stdout, vip);
        debug!(interface, vip, bound, "VIP binding probed");
        Ok(bound)
    }

    /// Best-effort state of a secondary service.
    ///
    /// Advisory telemetry only: the trimmed stdout is reported regardless
    /// of exit code, and an execution failure degrades to "error".
    pub async fn service_status(&self, unit: &str) -> String {
        match self
            .runner
            .run("systemctl", &["is-active", unit], Some(self.timeout))
            .await
        {
            Ok(out) => out.stdout.trim().to_string(),
            Err(e) => {
                warn!(unit, error = %e, "Service status probe failed");
                "error".to_string()
            }
        }
    }
}

/// Delimiter-aware membership test for an address in `ip addr` output.
///
/// A bare token or a `addr/prefix` token matches; a longer address that
/// merely starts with `vip` (10.0.0.100 vs 10.0.0.1) does not.
fn address_listed(dump: &str, vip: &str) -> bool {
    dump.split_whitespace().any(|token| {
        token == vip || token.split('/').next() == Some(vip)
    })
}

/// Uniform DNS probe result.
///
/// Failures are collapsed: callers never distinguish timeout from empty
/// answer from non-zero exit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsProbeResult {
    pub ok: bool,
    pub latency_ms: i64,
    pub answer: String,
}

impl DnsProbeResult {
    fn failed() -> Self {
        Self {
            ok: false,
            latency_ms: -1,
            answer: String::new(),
        }
    }
}

/// Bounded-time DNS health probe against the local resolver.
pub struct DnsProbe {
    runner: Arc<dyn CommandRunner>,
    resolver: String,
    query: String,
    timeout: Duration,
}

impl DnsProbe {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        resolver: impl Into<String>,
        query: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            runner,
            resolver: resolver.into(),
            query: query.into(),
            timeout,
        }
    }

    /// Issue one resolution request, measuring wall-clock latency.
    ///
    /// Success requires exit 0 and a non-empty answer; every other outcome
    /// is the uniform failure result.
    pub async fn probe(&self) -> DnsProbeResult {
        let server = format!("@{}", self.resolver);
        // dig's own wait is kept one second under the hard timeout.
        let wait = self.timeout.as_secs().saturating_sub(1).max(1);
        let wait_arg = format!("+time={}", wait);

        let start = Instant::now();
        let result = self
            .runner
            .run(
                "dig",
                &[server.as_str(), self.query.as_str(), wait_arg.as_str(), "+short"],
                Some(self.timeout),
            )
            .await;
        let latency_ms = start.elapsed().as_millis() as i64;

        match result {
            Ok(out) if out.success() => {
                let answer = out.stdout.trim().to_string();
                if answer.is_empty() {
                    debug!(query = %self.query, "DNS probe returned empty answer");
                    DnsProbeResult::failed()
                } else {
                    debug!(query = %self.query, latency_ms, "DNS probe succeeded");
                    DnsProbeResult {
                        ok: true,
                        latency_ms,
                        answer,
                    }
                }
            }
            Ok(out) => {
                debug!(query = %self.query, code = ?out.code, "DNS probe exited non-zero");
                DnsProbeResult::failed()
            }
            Err(e) => {
                debug!(query = %self.query, error = %e, "DNS probe execution failed");
                DnsProbeResult::failed()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::CommandOutput;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::io;
    use std::sync::Mutex;

    /// Replays a queue of scripted command results.
    struct ScriptedRunner {
        script: Mutex<VecDeque<io::Result<CommandOutput>>>,
    }

    impl ScriptedRunner {
        fn new(results: Vec<io::Result<CommandOutput>>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(results.into()),
            })
        }
    }

    #[async_trait]
    impl CommandRunner for ScriptedRunner {
        async fn run(
            &self,
            _program: &str,
            _args: &[&str],
            _timeout: Option<Duration>,
        ) -> io::Result<CommandOutput> {
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .expect("unexpected command execution")
        }
    }

    fn ok(code: i32, stdout: &str, stderr: &str) -> io::Result<CommandOutput> {
        Ok(CommandOutput {
            code: Some(code),
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
        })
    }

    fn timed_out() -> io::Result<CommandOutput> {
        Err(io::Error::new(io::ErrorKind::TimedOut, "timed out"))
    }

    const T: Duration = Duration::from_secs(3);

    #[tokio::test]
    async fn test_daemon_status_active() {
        let runner = ScriptedRunner::new(vec![ok(0, "active\n", "")]);
        let probe = SystemProbe::new(runner, T);
        let (state, stdout, stderr) = probe.daemon_status("keepalived").await.unwrap();
        assert_eq!(state, DaemonState::Active);
        assert_eq!(stdout, "active");
        assert_eq!(stderr, "");
    }

    #[tokio::test]
    async fn test_daemon_status_exit_three_maps_to_inactive() {
        let runner = ScriptedRunner::new(vec![ok(3, "inactive\n", "")]);
        let probe = SystemProbe::new(runner, T);
        let (state, stdout, stderr) = probe.daemon_status("keepalived").await.unwrap();
        assert_eq!(state, DaemonState::Inactive);
        assert_eq!(stdout, "");
        assert_eq!(stderr, "");
    }

    #[tokio::test]
    async fn test_daemon_status_other_exit_is_error() {
        let runner = ScriptedRunner::new(vec![ok(4, "", "no such unit")]);
        let probe = SystemProbe::new(runner, T);
        assert!(probe.daemon_status("keepalived").await.is_err());
    }

    #[tokio::test]
    async fn test_daemon_status_exec_failure_is_error() {
        let runner = ScriptedRunner::new(vec![timed_out()]);
        let probe = SystemProbe::new(runner, T);
        assert!(probe.daemon_status("keepalived").await.is_err());
    }

    const IP_DUMP: &str = "\
2: eth1: <BROADCAST,MULTICAST,UP,LOWER_UP> mtu 1500 qdisc fq_codel state UP
    inet 192.168.178.2/24 brd 192.168.178.255 scope global eth1
    inet 10.0.0.1/24 scope global secondary eth1
";

    #[tokio::test]
    async fn test_vip_assigned_exact_prefix_token() {
        let runner = ScriptedRunner::new(vec![ok(0, IP_DUMP, "")]);
        let probe = SystemProbe::new(runner, T);
        assert!(probe.vip_assigned("eth1", "10.0.0.1").await.unwrap());
    }

    #[tokio::test]
    async fn test_vip_assigned_rejects_superset_address() {
        let dump = "    inet 10.0.0.100/24 scope global eth1\n";
        let runner = ScriptedRunner::new(vec![ok(0, dump, "")]);
        let probe = SystemProbe::new(runner, T);
        // 10.0.0.1 must not match within 10.0.0.100
        assert!(!probe.vip_assigned("eth1", "10.0.0.1").await.unwrap());
    }

    #[tokio::test]
    async fn test_vip_assigned_matches_bare_address_token() {
        let dump = "peer 10.0.0.1 dev eth1\n";
        let runner = ScriptedRunner::new(vec![ok(0, dump, "")]);
        let probe = SystemProbe::new(runner, T);
        assert!(probe.vip_assigned("eth1", "10.0.0.1").await.unwrap());
    }

    #[tokio::test]
    async fn test_vip_assigned_propagates_command_failure() {
        let runner = ScriptedRunner::new(vec![ok(1, "", "Device \"eth9\" does not exist.")]);
        let probe = SystemProbe::new(runner, T);
        assert!(probe.vip_assigned("eth9", "10.0.0.1").await.is_err());
    }

    #[tokio::test]
    async fn test_service_status_reports_stdout_even_on_nonzero_exit() {
        let runner = ScriptedRunner::new(vec![ok(3, "inactive\n", "")]);
        let probe = SystemProbe::new(runner, T);
        assert_eq!(probe.service_status("pihole-FTL").await, "inactive");
    }

    #[tokio::test]
    async fn test_service_status_degrades_to_error() {
        let runner = ScriptedRunner::new(vec![timed_out()]);
        let probe = SystemProbe::new(runner, T);
        assert_eq!(probe.service_status("pihole-FTL").await, "error");
    }

    fn dns_probe(runner: Arc<ScriptedRunner>) -> DnsProbe {
        DnsProbe::new(runner, "127.0.0.1", "google.com", T)
    }

    #[tokio::test]
    async fn test_dns_probe_success_carries_latency_and_answer() {
        let runner = ScriptedRunner::new(vec![ok(0, "142.250.186.46\n", "")]);
        let result = dns_probe(runner).probe().await;
        assert!(result.ok);
        assert!(result.latency_ms >= 0);
        assert_eq!(result.answer, "142.250.186.46");
    }

    #[tokio::test]
    async fn test_dns_probe_failures_collapse_uniformly() {
        // Non-zero exit, empty answer, and timeout: one identical shape.
        for scripted in [ok(9, "", "connection refused"), ok(0, "\n", ""), timed_out()] {
            let runner = ScriptedRunner::new(vec![scripted]);
            let result = dns_probe(runner).probe().await;
            assert_eq!(result, DnsProbeResult::failed());
        }
    }
}
