//! Failover agent binary

use failover_agent::{Config, FailoverAgent, LogSink, SystemRunner, keepalived};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration first (needed for logging settings)
    let config = match Config::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            eprintln!("Using default configuration");
            Config::default()
        }
    };

    common::logging::init_from(
        config.logging.level.as_deref(),
        config.logging.format.as_deref(),
    );

    tracing::info!("Failover agent starting");

    let agent_config = config.to_agent_config();

    // Parsing the daemon config is fatal: the agent must not run with an
    // unknown failover identity.
    let descriptor = keepalived::parse_file(&agent_config.daemon_conf)?;
    tracing::info!(
        role = %descriptor.role,
        interface = descriptor.interface_or_default(),
        vip = descriptor.primary_vip(),
        "Failover daemon configuration parsed"
    );

    let publish_enabled = agent_config.publish_enabled;
    let agent = FailoverAgent::new(agent_config, &descriptor, Arc::new(SystemRunner::new()));

    match agent.status().await {
        Ok(snapshot) => tracing::info!(
            daemon_state = %snapshot.daemon_state,
            mode = %snapshot.mode,
            vip_bound = snapshot.vip_bound,
            "Startup status"
        ),
        Err(e) => tracing::warn!(error = %e, "Startup status probe failed"),
    }

    let token = CancellationToken::new();
    let publishers = if publish_enabled {
        Some(agent.spawn_publishers(Arc::new(LogSink), token.clone()))
    } else {
        tracing::info!("Publishing disabled");
        None
    };

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown requested");
    token.cancel();

    if let Some((periodic, change_watch)) = publishers {
        let _ = periodic.await;
        let _ = change_watch.await;
    }

    tracing::info!("Failover agent stopped");
    Ok(())
}
