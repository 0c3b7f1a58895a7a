//! Redis Probe - Entry Point
//!
//! Builds a sentinel or cluster client from the environment, checks it answers `PING`
//! and exits non-zero when it does not. Meant as a startup check for deployments.

#![recursion_limit = "256"]

use core_config::FromEnv;
use core_config::tracing::{init_tracing, install_color_eyre};
use redis_factory::{CancellationToken, PoolState, cluster, sentinel};
use tracing::{info, warn};

mod config;

use config::{Config, Target};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    install_color_eyre();

    let config = Config::from_env()?;
    init_tracing(&config.environment);

    let cancel = CancellationToken::new();
    spawn_deadline(cancel.clone(), config.startup_timeout);

    let mode = config.target.mode();
    info!(%mode, timeout = ?config.startup_timeout, "Probing Redis");

    let state = match &config.target {
        Target::Sentinel(sentinel_config) => {
            let handle = sentinel::new_sentinel_client(&cancel, sentinel_config).await?;
            handle.ping().await?;
            handle.state()
        }
        Target::Cluster(cluster_config) => {
            let handle = cluster::new_cluster_client(&cancel, cluster_config).await?;
            handle.ping().await?;
            handle.state()
        }
    };

    report(state);
    Ok(())
}

/// Cancel the probe on Ctrl-C or once `timeout` has elapsed
fn spawn_deadline(cancel: CancellationToken, timeout: std::time::Duration) {
    tokio::spawn(async move {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => warn!("Interrupted, cancelling probe"),
            _ = tokio::time::sleep(timeout) => warn!("Startup timeout elapsed, cancelling probe"),
            _ = cancel.cancelled() => return,
        }
        cancel.cancel();
    });
}

fn report(state: PoolState) {
    info!(
        connections = state.connections,
        idle = state.idle_connections,
        "Redis is reachable"
    );
}
