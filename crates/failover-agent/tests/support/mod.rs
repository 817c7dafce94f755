//! Shared fake OS surface for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use failover_agent::exec::{CommandOutput, CommandRunner};
use failover_agent::types::AgentConfig;
use failover_agent::VrrpDescriptor;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const DAEMON_UNIT: &str = "keepalived";
pub const RESOLVER_UNIT: &str = "pihole-FTL";
pub const VIP: &str = "192.168.178.9";

#[derive(Debug)]
struct Inner {
    daemon_active: bool,
    daemon_probe_fails: bool,
    vip_bound: bool,
    vip_probe_fails: bool,
    resolver_state: String,
    dns_answer: String,
    control_stderr: Option<String>,
    executions: Vec<String>,
}

/// Stateful fake of the OS surface the agent shells out to.
///
/// Answers by command shape and records every execution.
pub struct FakeSystem {
    inner: Mutex<Inner>,
}

impl FakeSystem {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(Inner {
                daemon_active: true,
                daemon_probe_fails: false,
                vip_bound: true,
                vip_probe_fails: false,
                resolver_state: "active".to_string(),
                dns_answer: "142.250.186.46".to_string(),
                control_stderr: None,
                executions: Vec::new(),
            }),
        })
    }

    pub fn set_daemon_active(&self, active: bool) {
        self.inner.lock().unwrap().daemon_active = active;
    }

    pub fn set_daemon_probe_fails(&self, fails: bool) {
        self.inner.lock().unwrap().daemon_probe_fails = fails;
    }

    pub fn set_vip_bound(&self, bound: bool) {
        self.inner.lock().unwrap().vip_bound = bound;
    }

    pub fn set_vip_probe_fails(&self, fails: bool) {
        self.inner.lock().unwrap().vip_probe_fails = fails;
    }

    pub fn set_resolver_state(&self, state: &str) {
        self.inner.lock().unwrap().resolver_state = state.to_string();
    }

    /// Make the next lifecycle command fail with this stderr.
    pub fn set_control_failure(&self, stderr: &str) {
        self.inner.lock().unwrap().control_stderr = Some(stderr.to_string());
    }

    pub fn execution_count(&self) -> usize {
        self.inner.lock().unwrap().executions.len()
    }

    pub fn executions(&self) -> Vec<String> {
        self.inner.lock().unwrap().executions.clone()
    }
}

fn out(code: i32, stdout: &str, stderr: &str) -> io::Result<CommandOutput> {
    Ok(CommandOutput {
        code: Some(code),
        stdout: stdout.to_string(),
        stderr: stderr.to_string(),
    })
}

#[async_trait]
impl CommandRunner for FakeSystem {
    async fn run(
        &self,
        program: &str,
        args: &[&str],
        _timeout: Option<Duration>,
    ) -> io::Result<CommandOutput> {
        let mut inner = self.inner.lock().unwrap();
        inner
            .executions
            .push(format!("{} {}", program, args.join(" ")));

        match (program, args) {
            ("systemctl", ["is-active", DAEMON_UNIT]) => {
                if inner.daemon_probe_fails {
                    out(4, "", "Failed to connect to bus")
                } else if inner.daemon_active {
                    out(0, "active\n", "")
                } else {
                    out(3, "inactive\n", "")
                }
            }
            ("systemctl", ["is-active", RESOLVER_UNIT]) => {
                let state = inner.resolver_state.clone();
                let code = if state == "active" { 0 } else { 3 };
                out(code, &format!("{}\n", state), "")
            }
            ("systemctl", [action, DAEMON_UNIT]) => {
                if let Some(stderr) = inner.control_stderr.take() {
                    return out(1, "", &stderr);
                }
                match *action {
                    "start" | "restart" => inner.daemon_active = true,
                    "stop" => inner.daemon_active = false,
                    _ => return out(1, "", "Unknown command verb."),
                }
                out(0, &format!("systemctl {} issued\n", action), "")
            }
            ("ip", ["addr", "show", _iface]) => {
                if inner.vip_probe_fails {
                    out(1, "", "Device does not exist")
                } else if inner.vip_bound {
                    out(
                        0,
                        &format!("    inet {}/24 scope global secondary eth1\n", VIP),
                        "",
                    )
                } else {
                    out(0, "    inet 192.168.178.2/24 scope global eth1\n", "")
                }
            }
            ("dig", _) => {
                let answer = inner.dns_answer.clone();
                out(0, &format!("{}\n", answer), "")
            }
            _ => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("unexpected command: {} {:?}", program, args),
            )),
        }
    }
}

/// Descriptor matching the fake system's interface and VIP.
pub fn descriptor() -> VrrpDescriptor {
    VrrpDescriptor {
        role: failover_agent::Role::Backup,
        interface: Some("eth1".to_string()),
        router_id: Some("51".to_string()),
        priority: Some("100".to_string()),
        virtual_ips: vec![format!("{}", VIP)],
    }
}

/// Agent config with test-friendly intervals.
pub fn agent_config(update_interval: Duration, poll_interval: Duration) -> AgentConfig {
    AgentConfig {
        update_interval,
        poll_interval,
        publish_enabled: true,
        ..AgentConfig::default()
    }
}
