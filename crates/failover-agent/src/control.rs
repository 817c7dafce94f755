//! Daemon lifecycle control.

use crate::exec::CommandRunner;
use crate::status::StatusEngine;
use crate::types::StatusSnapshot;
use common::{Error, Result};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// The fixed set of daemon lifecycle actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Start,
    Stop,
    Restart,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Start => "start",
            Action::Stop => "stop",
            Action::Restart => "restart",
        }
    }
}

impl FromStr for Action {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "start" => Ok(Action::Start),
            "stop" => Ok(Action::Stop),
            "restart" => Ok(Action::Restart),
            other => Err(Error::invalid_action(other)),
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Applies a lifecycle action to the failover daemon and reports the
/// resulting snapshot.
pub struct ControlEngine {
    runner: Arc<dyn CommandRunner>,
    daemon_unit: String,
    timeout: Duration,
    status: Arc<StatusEngine>,
}

impl ControlEngine {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        daemon_unit: impl Into<String>,
        timeout: Duration,
        status: Arc<StatusEngine>,
    ) -> Self {
        Self {
            runner,
            daemon_unit: daemon_unit.into(),
            timeout,
            status,
        }
    }

    /// Parse and apply an action by name.
    ///
    /// An unrecognized name is rejected before any process runs.
    pub async fn apply_named(&self, name: &str) -> Result<StatusSnapshot> {
        self.apply(name.parse()?).await
    }

    /// Apply a lifecycle action, then recompute the status snapshot.
    ///
    /// The action's own captured output is authoritative for the
    /// snapshot's stdout/stderr fields.
    pub async fn apply(&self, action: Action) -> Result<StatusSnapshot> {
        info!(action = %action, unit = %self.daemon_unit, "Applying daemon lifecycle action");

        let out = self
            .runner
            .run(
                "systemctl",
                &[action.as_str(), self.daemon_unit.as_str()],
                Some(self.timeout),
            )
            .await
            .map_err(|e| Error::command_failed(action, format!("systemctl {}: {}", self.daemon_unit, e)))?;

        if !out.success() {
            return Err(Error::command_failed(action, out.stderr.trim()));
        }

        let mut snapshot = self.status.snapshot(action.as_str()).await?;
        snapshot.stdout = out.stdout.trim().to_string();
        snapshot.stderr = out.stderr.trim().to_string();
        Ok(snapshot)
    }
}
