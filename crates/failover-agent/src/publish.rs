//! Periodic status publishing.
//!
//! Two independent loops drive the status engine: an unconditional
//! fixed-interval publish and an edge-triggered publish on resolver-state
//! change. A transient failure never terminates a loop; both stop only on
//! cancellation.

use crate::status::StatusEngine;
use async_trait::async_trait;
use common::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Retained pub/sub sink the scheduler publishes into.
///
/// `retain` asks the sink to hand the last value to late subscribers.
/// Implementations must be safe for concurrent publishes.
#[async_trait]
pub trait PublishSink: Send + Sync {
    async fn publish(&self, topic: &str, payload: Vec<u8>, retain: bool) -> Result<()>;
}

/// Sink that logs payloads through tracing.
///
/// Stands in for the broker transport, which lives outside this crate.
#[derive(Debug, Default)]
pub struct LogSink;

#[async_trait]
impl PublishSink for LogSink {
    async fn publish(&self, topic: &str, payload: Vec<u8>, retain: bool) -> Result<()> {
        info!(topic, retain, payload = %String::from_utf8_lossy(&payload), "Publishing status");
        Ok(())
    }
}

/// Drives the status engine on two independent timers.
pub struct PublishScheduler {
    engine: Arc<StatusEngine>,
    sink: Arc<dyn PublishSink>,
    topic: String,
    update_interval: Duration,
    poll_interval: Duration,
    token: CancellationToken,
}

impl PublishScheduler {
    pub fn new(
        engine: Arc<StatusEngine>,
        sink: Arc<dyn PublishSink>,
        topic: impl Into<String>,
        update_interval: Duration,
        poll_interval: Duration,
        token: CancellationToken,
    ) -> Self {
        Self {
            engine,
            sink,
            topic: topic.into(),
            update_interval,
            poll_interval,
            token,
        }
    }

    /// Spawn both loops. They run until the token is cancelled.
    pub fn spawn(self) -> (JoinHandle<()>, JoinHandle<()>) {
        let periodic = tokio::spawn(Self::run_periodic(
            self.engine.clone(),
            self.sink.clone(),
            self.topic.clone(),
            self.update_interval,
            self.token.clone(),
        ));
        let change_watch = tokio::spawn(Self::run_change_watch(
            self.engine,
            self.sink,
            self.topic,
            self.poll_interval,
            self.token,
        ));
        (periodic, change_watch)
    }

    /// Unconditional full-status publish on a fixed interval.
    ///
    /// The first publish happens immediately so a fresh snapshot is on the
    /// wire at startup rather than a full interval later.
    async fn run_periodic(
        engine: Arc<StatusEngine>,
        sink: Arc<dyn PublishSink>,
        topic: String,
        period: Duration,
        token: CancellationToken,
    ) {
        info!(?period, "Periodic publish loop started");
        let mut timer = interval(period);

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = timer.tick() => {
                    if let Err(e) = Self::publish_snapshot(&engine, &sink, &topic).await {
                        warn!(error = %e, "Periodic publish failed");
                    }
                }
            }
        }
        info!("Periodic publish loop stopped");
    }

    /// Publish a full snapshot only when the resolver state changes.
    async fn run_change_watch(
        engine: Arc<StatusEngine>,
        sink: Arc<dyn PublishSink>,
        topic: String,
        period: Duration,
        token: CancellationToken,
    ) {
        info!(?period, "Resolver change-watch loop started");
        let mut timer = interval(period);
        let mut last_state: Option<String> = None;

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = timer.tick() => {
                    let state = engine.resolver_state().await;
                    if last_state.as_deref() != Some(state.as_str()) {
                        debug!(previous = ?last_state, current = %state, "Resolver state changed");
                        match Self::publish_snapshot(&engine, &sink, &topic).await {
                            Ok(()) => last_state = Some(state),
                            Err(e) => warn!(error = %e, "Change-triggered publish failed"),
                        }
                    }
                }
            }
        }
        info!("Resolver change-watch loop stopped");
    }

    async fn publish_snapshot(
        engine: &StatusEngine,
        sink: &Arc<dyn PublishSink>,
        topic: &str,
    ) -> Result<()> {
        let snapshot = engine.snapshot("status").await?;
        let payload = serde_json::to_vec(&snapshot)?;
        sink.publish(topic, payload, true).await
    }
}
