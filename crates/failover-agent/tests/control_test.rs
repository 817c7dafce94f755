//! Integration tests for the control path.

mod support;

use failover_agent::{DaemonState, FailoverAgent};
use std::sync::Arc;
use std::time::Duration;
use support::{agent_config, descriptor, FakeSystem};

fn agent(system: &Arc<FakeSystem>) -> FailoverAgent {
    FailoverAgent::new(
        agent_config(Duration::from_secs(30), Duration::from_secs(2)),
        &descriptor(),
        system.clone(),
    )
}

#[tokio::test]
async fn test_start_transitions_inactive_daemon_to_active() {
    let system = FakeSystem::new();
    let agent = agent(&system);
    system.set_daemon_active(false);

    let snapshot = agent.apply("start").await.unwrap();

    assert_eq!(snapshot.action, "start");
    assert_eq!(snapshot.daemon_state, DaemonState::Active);
    // The start command's own output is authoritative, not the status
    // query's raw output.
    assert_eq!(snapshot.stdout, "systemctl start issued");
    assert_eq!(snapshot.stderr, "");
}

#[tokio::test]
async fn test_stop_reports_inactive_snapshot() {
    let system = FakeSystem::new();
    let agent = agent(&system);

    let snapshot = agent.apply("stop").await.unwrap();
    assert_eq!(snapshot.action, "stop");
    assert_eq!(snapshot.daemon_state, DaemonState::Inactive);
}

#[tokio::test]
async fn test_invalid_action_runs_no_process() {
    let system = FakeSystem::new();
    let agent = agent(&system);

    let err = agent.apply("reload").await.unwrap_err();
    assert!(err.to_string().contains("reload"));
    assert_eq!(system.execution_count(), 0);
}

#[tokio::test]
async fn test_failed_command_carries_stderr() {
    let system = FakeSystem::new();
    let agent = agent(&system);
    system.set_control_failure("Job for keepalived.service failed.");

    let err = agent.apply("restart").await.unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("restart"));
    assert!(msg.contains("Job for keepalived.service failed."));
}

#[tokio::test]
async fn test_valid_action_issues_exactly_one_control_command() {
    let system = FakeSystem::new();
    let agent = agent(&system);

    agent.apply("restart").await.unwrap();

    let control_calls: Vec<String> = system
        .executions()
        .into_iter()
        .filter(|c| c.starts_with("systemctl restart"))
        .collect();
    assert_eq!(control_calls, vec!["systemctl restart keepalived".to_string()]);
}
