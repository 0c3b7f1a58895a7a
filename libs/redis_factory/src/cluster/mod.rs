//! Cluster client factory

mod config;
mod connector;
mod options;

pub use config::ClusterConfig;
pub use connector::ClusterConnectionManager;
pub use options::{ClusterOptions, ReadRouting};

use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

use crate::common::{ClientMode, FactoryError, FactoryResult, RetryConfig, retry_with_backoff};
use crate::handle::RedisHandle;
use crate::health;

/// Live cluster client
pub type ClusterHandle = RedisHandle<ClusterConnectionManager, ClusterOptions>;

/// Build a cluster client and check it answers `PING`.
///
/// Every config field is applied to the client or its pool; see [`ClusterOptions`] for
/// the defaults. Fails with "cluster ping failed" when the seed nodes cannot be reached
/// or reject the credentials.
///
/// # Example
/// ```ignore
/// use redis_factory::CancellationToken;
/// use redis_factory::cluster::{ClusterConfig, new_cluster_client};
///
/// let mut config = ClusterConfig::new(["127.0.0.1:7000"]);
/// config.max_retries = Some(3);
/// config.pool_size = Some(20);
///
/// let handle = new_cluster_client(&CancellationToken::new(), &config).await?;
/// handle.ping().await?;
/// ```
#[instrument(skip_all, fields(nodes = config.addrs.len()))]
pub async fn new_cluster_client(
    cancel: &CancellationToken,
    config: &ClusterConfig,
) -> FactoryResult<ClusterHandle> {
    let options = ClusterOptions::try_from(config)?;
    let manager = ClusterConnectionManager::new(&options, config.on_connect.clone())?;

    health::probe(cancel, ClientMode::Cluster, &manager).await?;

    let pool = options
        .pool_settings()
        .builder()
        .build(manager)
        .await
        .map_err(|e| FactoryError::Pool(e.to_string()))?;

    info!(
        read_routing = ?options.read_routing,
        pool_size = options.pool_size,
        min_idle = options.min_idle_conns,
        retries = options.retry_budget(),
        "Cluster client ready"
    );

    Ok(RedisHandle::new(pool, options, ClientMode::Cluster))
}

/// [`new_cluster_client`] with retry on failed probes
///
/// `None` uses [`RetryConfig::default`].
pub async fn new_cluster_client_with_retry(
    cancel: &CancellationToken,
    config: &ClusterConfig,
    retry_config: Option<RetryConfig>,
) -> FactoryResult<ClusterHandle> {
    retry_with_backoff(
        cancel,
        || new_cluster_client(cancel, config),
        retry_config.unwrap_or_default(),
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::NewConnection;
    use redis::AsyncCommands;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    fn unreachable_config() -> ClusterConfig {
        let mut config = ClusterConfig::new(["127.0.0.1:1"]);
        config.dial_timeout = Some(Duration::from_millis(200));
        config.read_timeout = Some(Duration::from_millis(200));
        config
    }

    fn live_addrs() -> Vec<String> {
        std::env::var("REDIS_CLUSTER_ADDRS")
            .unwrap_or_else(|_| "127.0.0.1:7000".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_unreachable_nodes_return_error() {
        let cancel = CancellationToken::new();
        let result = tokio::time::timeout(
            Duration::from_secs(10),
            new_cluster_client(&cancel, &unreachable_config()),
        )
        .await
        .expect("factory should not hang");

        let err = result.err().expect("no handle for unreachable nodes");
        assert!(matches!(err, FactoryError::PingFailed(ClientMode::Cluster, _)));
        assert_eq!(err.to_string(), "cluster ping failed");
    }

    #[tokio::test]
    async fn test_cancelled_context_fails_promptly() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let started = std::time::Instant::now();
        let result = new_cluster_client(&cancel, &unreachable_config()).await;

        assert!(matches!(result, Err(FactoryError::Cancelled(ClientMode::Cluster))));
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_cancel_during_probe() {
        let cancel = CancellationToken::new();
        let timer = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            timer.cancel();
        });

        // Non-routable address: the dial hangs until cancelled
        let mut config = ClusterConfig::new(["10.255.255.1:7000"]);
        config.dial_timeout = Some(Duration::from_secs(30));

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            new_cluster_client(&cancel, &config),
        )
        .await
        .expect("cancellation should stop the probe");

        assert!(matches!(
            result,
            Err(FactoryError::Cancelled(ClientMode::Cluster))
                | Err(FactoryError::PingFailed(ClientMode::Cluster, _))
        ));
    }

    #[tokio::test]
    async fn test_invalid_config_rejected_before_io() {
        let mut config = ClusterConfig::new(["127.0.0.1:7000"]);
        config.pool_size = Some(2);
        config.min_idle_conns = Some(5);

        let result = new_cluster_client(&CancellationToken::new(), &config).await;
        assert!(matches!(result, Err(FactoryError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_malformed_address_is_a_redis_error() {
        let config = ClusterConfig::new(["redis://bad host:7000"]);

        let result = new_cluster_client(&CancellationToken::new(), &config).await;
        assert!(matches!(result, Err(FactoryError::Redis(_))));
    }

    /// Requires a running cluster: `REDIS_CLUSTER_ADDRS=127.0.0.1:7000`
    #[tokio::test]
    #[ignore]
    async fn test_live_cluster_ping_returns_pong() {
        let mut config = ClusterConfig::new(live_addrs());
        config.max_retries = Some(3);
        config.pool_size = Some(20);

        let handle = new_cluster_client(&CancellationToken::new(), &config)
            .await
            .unwrap();

        let mut conn = handle.connection().await.unwrap();
        let pong: String = redis::cmd("PING").query_async(&mut *conn).await.unwrap();
        assert_eq!(pong, "PONG");
        assert_eq!(handle.options().pool_size, 20);
        assert_eq!(handle.options().max_retries, 3);
    }

    #[tokio::test]
    #[ignore]
    async fn test_live_cluster_commands_and_hook() {
        let seen: Arc<Mutex<Vec<NewConnection>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let mut config = ClusterConfig::new(live_addrs())
            .with_on_connect(move |c| sink.lock().unwrap().push(c.clone()));
        config.min_idle_conns = Some(2);
        config.pool_size = Some(4);

        let handle = new_cluster_client(&CancellationToken::new(), &config)
            .await
            .unwrap();

        let mut conn = handle.connection().await.unwrap();
        let _: () = conn.set("redis_factory:test", "value").await.unwrap();
        let value: String = conn.get("redis_factory:test").await.unwrap();
        let _: () = conn.del("redis_factory:test").await.unwrap();
        assert_eq!(value, "value");

        let seen = seen.lock().unwrap();
        // probe connection plus the pre-warmed idle connections
        assert!(seen.len() >= 3);
        assert!(seen.iter().all(|c| c.mode == ClientMode::Cluster));
        assert_eq!(seen[0].sequence, 1);
    }
}
