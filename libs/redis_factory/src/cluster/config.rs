use std::time::Duration;

use serde::Deserialize;

use crate::pool::{ConnectHook, NewConnection};

#[cfg(feature = "config")]
use core_config::{ConfigError, FromEnv, env_duration, env_flag, env_list, env_optional};

/// Redis cluster configuration
///
/// Unset sizes and durations resolve to the defaults documented on
/// [`ClusterOptions`](super::ClusterOptions).
///
/// # Example
///
/// ```ignore
/// use redis_factory::cluster::ClusterConfig;
///
/// let mut config = ClusterConfig::new(["10.0.0.1:7000", "10.0.0.2:7000"]);
/// config.max_retries = Some(3);
/// config.pool_size = Some(20);
/// ```
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Seed node addresses (`host:port` or `redis://` URLs); at least one required
    pub addrs: Vec<String>,

    pub username: Option<String>,
    pub password: Option<String>,

    /// Allow read commands to be served by replicas
    pub read_only: bool,

    /// Route reads to the closest node. Implies `read_only`.
    pub route_by_latency: bool,

    /// Route reads to a random node. Implies `read_only`.
    pub route_randomly: bool,

    /// MOVED/ASK redirects followed per command
    pub max_redirects: Option<u32>,

    pub pool_size: Option<u32>,
    pub min_idle_conns: Option<u32>,

    /// Retries per command on transient failures
    pub max_retries: Option<u32>,

    #[serde(with = "humantime_serde")]
    pub min_retry_backoff: Option<Duration>,

    #[serde(with = "humantime_serde")]
    pub max_retry_backoff: Option<Duration>,

    /// Timeout for establishing a new connection
    #[serde(with = "humantime_serde")]
    pub dial_timeout: Option<Duration>,

    #[serde(with = "humantime_serde")]
    pub read_timeout: Option<Duration>,

    #[serde(with = "humantime_serde")]
    pub write_timeout: Option<Duration>,

    /// How long a caller waits for a pooled connection
    #[serde(with = "humantime_serde")]
    pub pool_timeout: Option<Duration>,

    /// How often idle connections are reaped
    #[serde(with = "humantime_serde")]
    pub idle_check_frequency: Option<Duration>,

    #[serde(with = "humantime_serde")]
    pub idle_timeout: Option<Duration>,

    /// Connections older than this are closed when returned to the pool
    #[serde(with = "humantime_serde")]
    pub max_conn_age: Option<Duration>,

    #[serde(skip)]
    pub on_connect: Option<ConnectHook>,
}

impl ClusterConfig {
    pub fn new<I, S>(addrs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            addrs: addrs.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Register a callback fired once per newly opened connection
    pub fn with_on_connect<F>(mut self, hook: F) -> Self
    where
        F: Fn(&NewConnection) + Send + Sync + 'static,
    {
        self.on_connect = Some(ConnectHook::new(hook));
        self
    }
}

/// Load ClusterConfig from environment variables
///
/// - `REDIS_CLUSTER_ADDRS` (required) - comma separated seed nodes
/// - `REDIS_USERNAME`, `REDIS_PASSWORD` (optional)
/// - `REDIS_READ_ONLY`, `REDIS_ROUTE_BY_LATENCY`, `REDIS_ROUTE_RANDOMLY` (optional flags)
/// - `REDIS_MAX_REDIRECTS`, `REDIS_POOL_SIZE`, `REDIS_MIN_IDLE_CONNS`, `REDIS_MAX_RETRIES`
/// - `REDIS_MIN_RETRY_BACKOFF`, `REDIS_MAX_RETRY_BACKOFF`, `REDIS_DIAL_TIMEOUT`,
///   `REDIS_READ_TIMEOUT`, `REDIS_WRITE_TIMEOUT`, `REDIS_POOL_TIMEOUT`,
///   `REDIS_IDLE_CHECK_FREQUENCY`, `REDIS_IDLE_TIMEOUT`, `REDIS_MAX_CONN_AGE` (durations)
#[cfg(feature = "config")]
impl FromEnv for ClusterConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            addrs: env_list("REDIS_CLUSTER_ADDRS")?,
            username: env_optional("REDIS_USERNAME")?,
            password: env_optional("REDIS_PASSWORD")?,
            read_only: env_flag("REDIS_READ_ONLY")?,
            route_by_latency: env_flag("REDIS_ROUTE_BY_LATENCY")?,
            route_randomly: env_flag("REDIS_ROUTE_RANDOMLY")?,
            max_redirects: env_optional("REDIS_MAX_REDIRECTS")?,
            pool_size: env_optional("REDIS_POOL_SIZE")?,
            min_idle_conns: env_optional("REDIS_MIN_IDLE_CONNS")?,
            max_retries: env_optional("REDIS_MAX_RETRIES")?,
            min_retry_backoff: env_duration("REDIS_MIN_RETRY_BACKOFF")?,
            max_retry_backoff: env_duration("REDIS_MAX_RETRY_BACKOFF")?,
            dial_timeout: env_duration("REDIS_DIAL_TIMEOUT")?,
            read_timeout: env_duration("REDIS_READ_TIMEOUT")?,
            write_timeout: env_duration("REDIS_WRITE_TIMEOUT")?,
            pool_timeout: env_duration("REDIS_POOL_TIMEOUT")?,
            idle_check_frequency: env_duration("REDIS_IDLE_CHECK_FREQUENCY")?,
            idle_timeout: env_duration("REDIS_IDLE_TIMEOUT")?,
            max_conn_age: env_duration("REDIS_MAX_CONN_AGE")?,
            on_connect: None,
        })
    }
}
