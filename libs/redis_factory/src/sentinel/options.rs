use std::time::Duration;

use redis::RedisConnectionInfo;
use redis::sentinel::{SentinelNodeConnectionInfo, SentinelServerType};

use super::SentinelConfig;
use crate::common::{FactoryError, available_cpus, node_url};
use crate::pool::{CommandTimeouts, PoolSettings, non_zero, or_default};

const DEFAULT_DIAL_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(3);
const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(5 * 60);
const REAPER_RATE: Duration = Duration::from_secs(60);
const POOL_SIZE_PER_CPU: u32 = 10;

/// Effective options of a sentinel client
///
/// Resolved from a [`SentinelConfig`]: every field set on the config is carried over
/// as-is, unset ones take the defaults below.
///
/// | field | default |
/// |---|---|
/// | db | 0 |
/// | dial_timeout | 5s (zero means default) |
/// | read_timeout | 3s (zero means default) |
/// | write_timeout | read_timeout (zero means default) |
/// | idle_timeout | 5m (zero disables) |
/// | pool_size | 10 x CPUs |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentinelOptions {
    pub master_name: String,
    pub sentinel_addrs: Vec<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub db: i64,
    pub dial_timeout: Duration,
    pub read_timeout: Duration,
    pub write_timeout: Duration,
    pub idle_timeout: Duration,
    pub replica_only: bool,
    pub pool_size: u32,
}

impl SentinelOptions {
    /// Sentinel node URLs handed to the client library
    pub fn sentinel_urls(&self) -> Vec<String> {
        self.sentinel_addrs.iter().map(|a| node_url(a)).collect()
    }

    /// Credentials and database applied to the discovered master or replica
    pub fn node_connection_info(&self) -> SentinelNodeConnectionInfo {
        SentinelNodeConnectionInfo {
            tls_mode: None,
            redis_connection_info: Some(RedisConnectionInfo {
                db: self.db,
                username: self.username.clone(),
                password: self.password.clone(),
                ..Default::default()
            }),
        }
    }

    pub fn server_type(&self) -> SentinelServerType {
        if self.replica_only {
            SentinelServerType::Replica
        } else {
            SentinelServerType::Master
        }
    }

    pub fn command_timeouts(&self) -> CommandTimeouts {
        CommandTimeouts::new(Some(self.read_timeout), Some(self.write_timeout))
    }

    pub fn pool_settings(&self) -> PoolSettings {
        PoolSettings {
            max_size: self.pool_size,
            min_idle: None,
            connection_timeout: self.read_timeout + Duration::from_secs(1),
            idle_timeout: non_zero(Some(self.idle_timeout)),
            max_lifetime: None,
            reaper_rate: REAPER_RATE,
        }
    }
}

impl TryFrom<&SentinelConfig> for SentinelOptions {
    type Error = FactoryError;

    fn try_from(config: &SentinelConfig) -> Result<Self, Self::Error> {
        if config.master_name.trim().is_empty() {
            return Err(FactoryError::InvalidConfig(
                "sentinel master name must not be empty".to_string(),
            ));
        }

        if config.sentinel_addrs.iter().all(|a| a.trim().is_empty()) {
            return Err(FactoryError::InvalidConfig(
                "at least one sentinel address is required".to_string(),
            ));
        }

        if config.db < 0 {
            return Err(FactoryError::InvalidConfig(format!(
                "database index must not be negative, got {}",
                config.db
            )));
        }

        if config.pool_size == Some(0) {
            return Err(FactoryError::InvalidConfig(
                "pool size must be at least 1".to_string(),
            ));
        }

        let read_timeout = or_default(config.read_timeout, DEFAULT_READ_TIMEOUT);

        Ok(Self {
            master_name: config.master_name.clone(),
            sentinel_addrs: config
                .sentinel_addrs
                .iter()
                .filter(|a| !a.trim().is_empty())
                .cloned()
                .collect(),
            username: config.username.clone(),
            password: config.password.clone(),
            db: config.db,
            dial_timeout: or_default(config.dial_timeout, DEFAULT_DIAL_TIMEOUT),
            read_timeout,
            write_timeout: or_default(config.write_timeout, read_timeout),
            idle_timeout: config.idle_timeout.unwrap_or(DEFAULT_IDLE_TIMEOUT),
            replica_only: config.replica_only,
            pool_size: config
                .pool_size
                .unwrap_or_else(|| POOL_SIZE_PER_CPU * available_cpus()),
        })
    }
}
