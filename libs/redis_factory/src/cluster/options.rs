use std::time::Duration;

use redis::RedisResult;
use redis::cluster::{ClusterClient, ClusterClientBuilder};

use super::ClusterConfig;
use crate::common::{FactoryError, available_cpus, node_url};
use crate::pool::{CommandTimeouts, PoolSettings, non_zero, or_default};

const DEFAULT_MAX_REDIRECTS: u32 = 3;
const POOL_SIZE_PER_CPU: u32 = 5;
const DEFAULT_MIN_RETRY_BACKOFF: Duration = Duration::from_millis(8);
const DEFAULT_MAX_RETRY_BACKOFF: Duration = Duration::from_millis(512);
const DEFAULT_DIAL_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(3);
const DEFAULT_IDLE_CHECK_FREQUENCY: Duration = Duration::from_secs(60);
const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Where read commands may be served
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadRouting {
    /// Every command goes to the slot's primary
    #[default]
    Primary,
    /// Reads may be served by replicas
    Replicas,
    /// Reads go to the node with the lowest latency
    ByLatency,
    /// Reads go to a random node serving the slot
    Randomly,
}

impl ReadRouting {
    /// Latency routing takes precedence over random routing, and either one implies
    /// replica reads.
    pub fn from_flags(read_only: bool, route_by_latency: bool, route_randomly: bool) -> Self {
        if route_by_latency {
            ReadRouting::ByLatency
        } else if route_randomly {
            ReadRouting::Randomly
        } else if read_only {
            ReadRouting::Replicas
        } else {
            ReadRouting::Primary
        }
    }

    pub fn read_only(&self) -> bool {
        !matches!(self, ReadRouting::Primary)
    }
}

/// Effective options of a cluster client
///
/// | field | default |
/// |---|---|
/// | max_redirects | 3 |
/// | pool_size | 5 x CPUs |
/// | min_idle_conns | 0 |
/// | max_retries | 0 |
/// | min_retry_backoff | 8ms |
/// | max_retry_backoff | 512ms |
/// | dial_timeout | 5s (zero means default) |
/// | read_timeout | 3s (zero means default) |
/// | write_timeout | read_timeout (zero means default) |
/// | pool_timeout | read_timeout + 1s |
/// | idle_check_frequency | 1m |
/// | idle_timeout | 5m (zero disables) |
/// | max_conn_age | none |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterOptions {
    pub addrs: Vec<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub read_routing: ReadRouting,
    pub max_redirects: u32,
    pub pool_size: u32,
    pub min_idle_conns: u32,
    pub max_retries: u32,
    pub min_retry_backoff: Duration,
    pub max_retry_backoff: Duration,
    pub dial_timeout: Duration,
    pub read_timeout: Duration,
    pub write_timeout: Duration,
    pub pool_timeout: Duration,
    pub idle_check_frequency: Duration,
    pub idle_timeout: Duration,
    pub max_conn_age: Option<Duration>,
}

impl ClusterOptions {
    pub fn read_only(&self) -> bool {
        self.read_routing.read_only()
    }

    pub fn route_by_latency(&self) -> bool {
        self.read_routing == ReadRouting::ByLatency
    }

    pub fn route_randomly(&self) -> bool {
        self.read_routing == ReadRouting::Randomly
    }

    /// Retry budget handed to the client library.
    ///
    /// The library spends one budget on both transient failures and MOVED/ASK
    /// redirects, so the larger of the two limits applies.
    pub fn retry_budget(&self) -> u32 {
        self.max_retries.max(self.max_redirects)
    }

    pub fn node_urls(&self) -> Vec<String> {
        self.addrs.iter().map(|a| node_url(a)).collect()
    }

    /// Build the cluster client. Fails on malformed node addresses.
    pub fn client(&self) -> RedisResult<ClusterClient> {
        let mut builder = ClusterClientBuilder::new(self.node_urls())
            .retries(self.retry_budget())
            .min_retry_wait(millis(self.min_retry_backoff))
            .max_retry_wait(millis(self.max_retry_backoff))
            .connection_timeout(self.dial_timeout)
            .response_timeout(self.read_timeout);

        if let Some(username) = &self.username {
            builder = builder.username(username.clone());
        }
        if let Some(password) = &self.password {
            builder = builder.password(password.clone());
        }
        if self.read_only() {
            builder = builder.read_from_replicas();
        }

        builder.build()
    }

    pub fn command_timeouts(&self) -> CommandTimeouts {
        CommandTimeouts::new(Some(self.read_timeout), Some(self.write_timeout))
    }

    pub fn pool_settings(&self) -> PoolSettings {
        PoolSettings {
            max_size: self.pool_size,
            min_idle: Some(self.min_idle_conns).filter(|n| *n > 0),
            connection_timeout: self.pool_timeout,
            idle_timeout: non_zero(Some(self.idle_timeout)),
            max_lifetime: non_zero(self.max_conn_age),
            reaper_rate: self.idle_check_frequency,
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl TryFrom<&ClusterConfig> for ClusterOptions {
    type Error = FactoryError;

    fn try_from(config: &ClusterConfig) -> Result<Self, Self::Error> {
        let addrs: Vec<String> = config
            .addrs
            .iter()
            .filter(|a| !a.trim().is_empty())
            .cloned()
            .collect();
        if addrs.is_empty() {
            return Err(invalid("at least one cluster node address is required"));
        }

        let pool_size = config
            .pool_size
            .unwrap_or_else(|| POOL_SIZE_PER_CPU * available_cpus());
        if pool_size == 0 {
            return Err(invalid("pool size must be at least 1"));
        }

        let min_idle_conns = config.min_idle_conns.unwrap_or(0);
        if min_idle_conns > pool_size {
            return Err(FactoryError::InvalidConfig(format!(
                "min idle connections ({}) exceed pool size ({})",
                min_idle_conns, pool_size
            )));
        }

        let min_retry_backoff = config.min_retry_backoff.unwrap_or(DEFAULT_MIN_RETRY_BACKOFF);
        let max_retry_backoff = config.max_retry_backoff.unwrap_or(DEFAULT_MAX_RETRY_BACKOFF);
        if min_retry_backoff > max_retry_backoff {
            return Err(invalid("min retry backoff exceeds max retry backoff"));
        }

        let read_timeout = or_default(config.read_timeout, DEFAULT_READ_TIMEOUT);
        let pool_timeout = config
            .pool_timeout
            .unwrap_or(read_timeout + Duration::from_secs(1));
        if pool_timeout.is_zero() {
            return Err(invalid("pool timeout must be greater than zero"));
        }

        let idle_check_frequency = config
            .idle_check_frequency
            .unwrap_or(DEFAULT_IDLE_CHECK_FREQUENCY);
        if idle_check_frequency.is_zero() {
            return Err(invalid("idle check frequency must be greater than zero"));
        }

        Ok(Self {
            addrs,
            username: config.username.clone(),
            password: config.password.clone(),
            read_routing: ReadRouting::from_flags(
                config.read_only,
                config.route_by_latency,
                config.route_randomly,
            ),
            max_redirects: config.max_redirects.unwrap_or(DEFAULT_MAX_REDIRECTS),
            pool_size,
            min_idle_conns,
            max_retries: config.max_retries.unwrap_or(0),
            min_retry_backoff,
            max_retry_backoff,
            dial_timeout: or_default(config.dial_timeout, DEFAULT_DIAL_TIMEOUT),
            read_timeout,
            write_timeout: or_default(config.write_timeout, read_timeout),
            pool_timeout,
            idle_check_frequency,
            idle_timeout: config.idle_timeout.unwrap_or(DEFAULT_IDLE_TIMEOUT),
            max_conn_age: config.max_conn_age,
        })
    }
}

fn invalid(message: &str) -> FactoryError {
    FactoryError::InvalidConfig(message.to_string())
}
