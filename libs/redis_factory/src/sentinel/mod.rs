//! Sentinel (failover) client factory
//!
//! The sentinels are asked for the current master on every new connection; the handle
//! pools those connections with bb8.

mod config;
mod connector;
mod options;

pub use config::SentinelConfig;
pub use connector::SentinelConnectionManager;
pub use options::SentinelOptions;

use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

use crate::common::{ClientMode, FactoryError, FactoryResult, RetryConfig, retry_with_backoff};
use crate::handle::RedisHandle;
use crate::health;

/// Live sentinel client
pub type SentinelHandle = RedisHandle<SentinelConnectionManager, SentinelOptions>;

/// Build a sentinel client and check it answers `PING`.
///
/// The probe runs under `cancel`; cancel the token from a timer to bound startup. On
/// failure no handle is returned and the error reads "sentinel ping failed".
///
/// # Example
/// ```ignore
/// use redis_factory::CancellationToken;
/// use redis_factory::sentinel::{SentinelConfig, new_sentinel_client};
///
/// let config = SentinelConfig::new("mymaster", ["10.0.0.1:26379"]).with_password("pw");
/// let handle = new_sentinel_client(&CancellationToken::new(), &config).await?;
/// ```
#[instrument(
    skip_all,
    fields(master = %config.master_name, sentinels = config.sentinel_addrs.len())
)]
pub async fn new_sentinel_client(
    cancel: &CancellationToken,
    config: &SentinelConfig,
) -> FactoryResult<SentinelHandle> {
    let options = SentinelOptions::try_from(config)?;
    let manager = SentinelConnectionManager::new(&options, config.on_connect.clone())?;

    health::probe(cancel, ClientMode::Sentinel, &manager).await?;

    let pool = options
        .pool_settings()
        .builder()
        .build(manager)
        .await
        .map_err(|e| FactoryError::Pool(e.to_string()))?;

    info!(
        db = options.db,
        replica_only = options.replica_only,
        pool_size = options.pool_size,
        "Sentinel client ready"
    );

    Ok(RedisHandle::new(pool, options, ClientMode::Sentinel))
}

/// [`new_sentinel_client`] with retry on failed probes
///
/// `None` uses [`RetryConfig::default`].
pub async fn new_sentinel_client_with_retry(
    cancel: &CancellationToken,
    config: &SentinelConfig,
    retry_config: Option<RetryConfig>,
) -> FactoryResult<SentinelHandle> {
    retry_with_backoff(
        cancel,
        || new_sentinel_client(cancel, config),
        retry_config.unwrap_or_default(),
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::Duration;

    fn unreachable_config() -> SentinelConfig {
        let mut config = SentinelConfig::new("mymaster", ["127.0.0.1:1"]);
        config.read_timeout = Some(Duration::from_millis(200));
        config
    }

    #[tokio::test]
    async fn test_unreachable_sentinels_return_error() {
        let cancel = CancellationToken::new();
        let result = tokio::time::timeout(
            Duration::from_secs(10),
            new_sentinel_client(&cancel, &unreachable_config()),
        )
        .await
        .expect("factory should not hang");

        let err = result.err().expect("no handle for unreachable sentinels");
        assert!(matches!(err, FactoryError::PingFailed(ClientMode::Sentinel, _)));
        assert_eq!(err.to_string(), "sentinel ping failed");
    }

    #[tokio::test]
    async fn test_cancelled_context_fails_promptly() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let started = std::time::Instant::now();
        let result = new_sentinel_client(&cancel, &unreachable_config()).await;

        assert!(matches!(result, Err(FactoryError::Cancelled(ClientMode::Sentinel))));
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_invalid_config_rejected_before_io() {
        let cancel = CancellationToken::new();
        let config = SentinelConfig::new("mymaster", Vec::<String>::new());

        let result = new_sentinel_client(&cancel, &config).await;
        assert!(matches!(result, Err(FactoryError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_retry_stops_on_invalid_config() {
        let cancel = CancellationToken::new();
        let config = SentinelConfig::new("", ["127.0.0.1:26379"]);

        let result = new_sentinel_client_with_retry(&cancel, &config, None).await;
        assert!(matches!(result, Err(FactoryError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_retry_gives_up_on_unreachable_sentinels() {
        let cancel = CancellationToken::new();
        let retry = RetryConfig::new()
            .with_max_retries(1)
            .with_initial_delay(Duration::from_millis(10))
            .without_jitter();

        let result = tokio::time::timeout(
            Duration::from_secs(20),
            new_sentinel_client_with_retry(&cancel, &unreachable_config(), Some(retry)),
        )
        .await
        .expect("retry should not hang");

        assert!(matches!(result, Err(FactoryError::PingFailed(ClientMode::Sentinel, _))));
    }

    /// Requires a running sentinel deployment:
    /// `REDIS_SENTINEL_ADDRS=127.0.0.1:26379 REDIS_SENTINEL_MASTER=mymaster`
    #[tokio::test]
    #[ignore]
    async fn test_live_sentinel_returns_handle() {
        let addrs = std::env::var("REDIS_SENTINEL_ADDRS").unwrap_or("127.0.0.1:26379".into());
        let master = std::env::var("REDIS_SENTINEL_MASTER").unwrap_or("mymaster".into());

        let opened = Arc::new(AtomicU64::new(0));
        let counter = opened.clone();
        let mut config = SentinelConfig::new(master, addrs.split(','))
            .with_on_connect(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        config.password = std::env::var("REDIS_PASSWORD").ok();

        let handle = new_sentinel_client(&CancellationToken::new(), &config)
            .await
            .unwrap();

        handle.ping().await.unwrap();
        assert_eq!(handle.mode(), ClientMode::Sentinel);
        assert_eq!(handle.options().master_name, config.master_name);
        assert!(opened.load(Ordering::SeqCst) >= 2);
    }
}
