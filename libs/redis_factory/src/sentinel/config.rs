use std::time::Duration;

use serde::Deserialize;

use crate::pool::{ConnectHook, NewConnection};

#[cfg(feature = "config")]
use core_config::{ConfigError, FromEnv, env_duration, env_flag, env_list, env_optional, env_required};

/// Redis sentinel (failover) configuration
///
/// Built by hand, deserialized from a config file, or loaded from environment variables
/// with the `config` feature. Unset timeouts fall back to the defaults documented on
/// [`SentinelOptions`](super::SentinelOptions).
///
/// # Example
///
/// ```ignore
/// use redis_factory::sentinel::SentinelConfig;
///
/// let config = SentinelConfig::new("mymaster", ["10.0.0.1:26379", "10.0.0.2:26379"])
///     .with_password("s3cret")
///     .with_db(2);
/// ```
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct SentinelConfig {
    /// Name of the monitored master, as configured on the sentinels
    pub master_name: String,

    /// Sentinel node addresses (`host:port` or `redis://` URLs); at least one required
    pub sentinel_addrs: Vec<String>,

    /// Optional username for Redis ACL
    pub username: Option<String>,

    /// Optional password for the master (and replicas)
    pub password: Option<String>,

    /// Database index selected on every connection
    pub db: i64,

    /// Bound on master discovery plus connecting to the discovered node
    #[serde(with = "humantime_serde")]
    pub dial_timeout: Option<Duration>,

    #[serde(with = "humantime_serde")]
    pub read_timeout: Option<Duration>,

    #[serde(with = "humantime_serde")]
    pub write_timeout: Option<Duration>,

    /// Pooled connections idle for longer than this are closed
    #[serde(with = "humantime_serde")]
    pub idle_timeout: Option<Duration>,

    /// Connect to a replica reported by the sentinels instead of the master
    pub replica_only: bool,

    /// Maximum pooled connections
    pub pool_size: Option<u32>,

    #[serde(skip)]
    pub on_connect: Option<ConnectHook>,
}

impl SentinelConfig {
    pub fn new<I, S>(master_name: impl Into<String>, sentinel_addrs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            master_name: master_name.into(),
            sentinel_addrs: sentinel_addrs.into_iter().map(Into::into).collect(),
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

    pub fn with_db(mut self, db: i64) -> Self {
        self.db = db;
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

/// Load SentinelConfig from environment variables
///
/// - `REDIS_SENTINEL_MASTER` (required) - master name
/// - `REDIS_SENTINEL_ADDRS` (required) - comma separated sentinel addresses
/// - `REDIS_USERNAME`, `REDIS_PASSWORD` (optional) - credentials
/// - `REDIS_DB` (optional) - database index, default 0
/// - `REDIS_DIAL_TIMEOUT`, `REDIS_READ_TIMEOUT`, `REDIS_WRITE_TIMEOUT`, `REDIS_IDLE_TIMEOUT`
///   (optional) - e.g. `3s`
/// - `REDIS_REPLICA_ONLY` (optional) - `true` to connect to a replica
/// - `REDIS_POOL_SIZE` (optional)
#[cfg(feature = "config")]
impl FromEnv for SentinelConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            master_name: env_required("REDIS_SENTINEL_MASTER")?,
            sentinel_addrs: env_list("REDIS_SENTINEL_ADDRS")?,
            username: env_optional("REDIS_USERNAME")?,
            password: env_optional("REDIS_PASSWORD")?,
            db: env_optional("REDIS_DB")?.unwrap_or(0),
            dial_timeout: env_duration("REDIS_DIAL_TIMEOUT")?,
            read_timeout: env_duration("REDIS_READ_TIMEOUT")?,
            write_timeout: env_duration("REDIS_WRITE_TIMEOUT")?,
            idle_timeout: env_duration("REDIS_IDLE_TIMEOUT")?,
            replica_only: env_flag("REDIS_REPLICA_ONLY")?,
            pool_size: env_optional("REDIS_POOL_SIZE")?,
            on_connect: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel_config_new() {
        let config = SentinelConfig::new("mymaster", ["127.0.0.1:26379", "127.0.0.1:26380"]);
        assert_eq!(config.master_name, "mymaster");
        assert_eq!(config.sentinel_addrs, vec!["127.0.0.1:26379", "127.0.0.1:26380"]);
        assert_eq!(config.db, 0);
        assert_eq!(config.password, None);
        assert!(config.on_connect.is_none());
    }

    #[test]
    fn test_sentinel_config_builders() {
        let config = SentinelConfig::new("mymaster", ["s1:26379"])
            .with_username("app")
            .with_password("pass")
            .with_db(4)
            .with_on_connect(|_| {});
        assert_eq!(config.username.as_deref(), Some("app"));
        assert_eq!(config.password.as_deref(), Some("pass"));
        assert_eq!(config.db, 4);
        assert!(config.on_connect.is_some());
    }

    #[test]
    fn test_sentinel_config_deserialize() {
        let config: SentinelConfig = serde_json::from_str(
            r#"{
                "master_name": "mymaster",
                "sentinel_addrs": ["10.0.0.1:26379"],
                "password": "pw",
                "db": 1,
                "dial_timeout": "2s",
                "read_timeout": "500ms",
                "idle_timeout": "5m"
            }"#,
        )
        .unwrap();

        assert_eq!(config.master_name, "mymaster");
        assert_eq!(config.db, 1);
        assert_eq!(config.dial_timeout, Some(Duration::from_secs(2)));
        assert_eq!(config.read_timeout, Some(Duration::from_millis(500)));
        assert_eq!(config.write_timeout, None);
        assert_eq!(config.idle_timeout, Some(Duration::from_secs(300)));
        assert!(!config.replica_only);
    }

    #[cfg(feature = "config")]
    #[test]
    fn test_sentinel_config_from_env() {
        temp_env::with_vars(
            [
                ("REDIS_SENTINEL_MASTER", Some("mymaster")),
                ("REDIS_SENTINEL_ADDRS", Some("10.0.0.1:26379, 10.0.0.2:26379")),
                ("REDIS_PASSWORD", Some("secret")),
                ("REDIS_DB", Some("3")),
                ("REDIS_READ_TIMEOUT", Some("2s")),
                ("REDIS_REPLICA_ONLY", Some("true")),
            ],
            || {
                let config = SentinelConfig::from_env().unwrap();
                assert_eq!(config.master_name, "mymaster");
                assert_eq!(config.sentinel_addrs, vec!["10.0.0.1:26379", "10.0.0.2:26379"]);
                assert_eq!(config.password.as_deref(), Some("secret"));
                assert_eq!(config.db, 3);
                assert_eq!(config.read_timeout, Some(Duration::from_secs(2)));
                assert!(config.replica_only);
            },
        );
    }

    #[cfg(feature = "config")]
    #[test]
    fn test_sentinel_config_from_env_missing_master() {
        temp_env::with_vars(
            [
                ("REDIS_SENTINEL_MASTER", None::<&str>),
                ("REDIS_SENTINEL_ADDRS", Some("10.0.0.1:26379")),
            ],
            || {
                let err = SentinelConfig::from_env().unwrap_err();
                assert!(err.to_string().contains("REDIS_SENTINEL_MASTER"));
            },
        );
    }

    #[cfg(feature = "config")]
    #[test]
    fn test_sentinel_config_from_env_invalid_db() {
        temp_env::with_vars(
            [
                ("REDIS_SENTINEL_MASTER", Some("mymaster")),
                ("REDIS_SENTINEL_ADDRS", Some("10.0.0.1:26379")),
                ("REDIS_DB", Some("first")),
            ],
            || {
                let err = SentinelConfig::from_env().unwrap_err();
                assert!(err.to_string().contains("REDIS_DB"));
            },
        );
    }
}
