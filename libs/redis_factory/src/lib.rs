//! Redis client factories for sentinel (failover) and cluster deployments
//!
//! Each factory turns a plain configuration into a pooled client, checks it with a
//! `PING` under a caller-supplied cancellation token and hands the live handle back.
//! Nothing is stored globally: the caller owns the handle and decides what a failed probe
//! means for the process.
//!
//! # Features
//!
//! - `sentinel` (default) - Sentinel-managed master/replica discovery
//! - `cluster` (default) - Redis cluster support
//! - `config` - Loading configs from the environment with `core_config::FromEnv`
//! - `all` - All features
//!
//! # Examples
//!
//! ## Sentinel
//!
//! ```ignore
//! use redis_factory::{AsyncCommands, CancellationToken};
//! use redis_factory::sentinel::{SentinelConfig, new_sentinel_client};
//!
//! let config = SentinelConfig::new("mymaster", ["10.0.0.1:26379", "10.0.0.2:26379"])
//!     .with_password("s3cret");
//! let handle = new_sentinel_client(&CancellationToken::new(), &config).await?;
//!
//! let mut conn = handle.connection().await?;
//! conn.set::<_, _, ()>("key", "value").await?;
//! ```
//!
//! ## Cluster
//!
//! ```ignore
//! use std::time::Duration;
//! use redis_factory::CancellationToken;
//! use redis_factory::cluster::{ClusterConfig, new_cluster_client};
//!
//! let mut config = ClusterConfig::new(["127.0.0.1:7000"]);
//! config.route_by_latency = true;
//!
//! // Bound startup to five seconds
//! let cancel = CancellationToken::new();
//! let timer = cancel.clone();
//! tokio::spawn(async move {
//!     tokio::time::sleep(Duration::from_secs(5)).await;
//!     timer.cancel();
//! });
//!
//! let handle = new_cluster_client(&cancel, &config).await?;
//! assert!(handle.options().read_only());
//! ```

pub mod common;
pub mod handle;
pub mod health;
pub mod pool;

#[cfg(feature = "sentinel")]
pub mod sentinel;

#[cfg(feature = "cluster")]
pub mod cluster;

pub use common::{ClientMode, FactoryError, FactoryResult, RetryConfig};
pub use handle::{PoolState, RedisHandle};
pub use health::{HealthStatus, check_health, check_health_detailed};
pub use pool::{ConnectHook, NewConnection};

// Re-export redis and cancellation types for convenience
pub use redis::{AsyncCommands, RedisError, RedisResult};
pub use tokio_util::sync::CancellationToken;
