use std::time::Duration;

use core_config::{ConfigError, FromEnv, env_duration, env_required};
use redis_factory::ClientMode;
use redis_factory::cluster::ClusterConfig;
use redis_factory::sentinel::SentinelConfig;

pub use core_config::Environment;

const DEFAULT_STARTUP_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone, Debug)]
pub enum Target {
    Sentinel(SentinelConfig),
    Cluster(ClusterConfig),
}

impl Target {
    pub fn mode(&self) -> ClientMode {
        match self {
            Target::Sentinel(_) => ClientMode::Sentinel,
            Target::Cluster(_) => ClientMode::Cluster,
        }
    }
}

/// Probe configuration
///
/// - `REDIS_MODE` (required) - `sentinel` or `cluster`
/// - `REDIS_STARTUP_TIMEOUT` (optional) - bound on the startup probe, default 10s
/// - plus the sentinel or cluster variables of the selected mode
#[derive(Clone, Debug)]
pub struct Config {
    pub environment: Environment,
    pub target: Target,
    pub startup_timeout: Duration,
}

impl FromEnv for Config {
    fn from_env() -> Result<Self, ConfigError> {
        let raw_mode = env_required("REDIS_MODE")?;
        let mode = raw_mode
            .parse::<ClientMode>()
            .map_err(|e| ConfigError::ParseError {
                key: "REDIS_MODE".to_string(),
                details: e.to_string(),
            })?;

        let target = match mode {
            ClientMode::Sentinel => Target::Sentinel(SentinelConfig::from_env()?),
            ClientMode::Cluster => Target::Cluster(ClusterConfig::from_env()?),
        };

        Ok(Self {
            environment: Environment::from_env(),
            target,
            startup_timeout: env_duration("REDIS_STARTUP_TIMEOUT")?
                .unwrap_or(DEFAULT_STARTUP_TIMEOUT),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_cluster_mode() {
        temp_env::with_vars(
            [
                ("REDIS_MODE", Some("cluster")),
                ("REDIS_CLUSTER_ADDRS", Some("127.0.0.1:7000")),
                ("REDIS_STARTUP_TIMEOUT", Some("3s")),
            ],
            || {
                let config = Config::from_env().unwrap();
                assert_eq!(config.target.mode(), ClientMode::Cluster);
                assert_eq!(config.startup_timeout, Duration::from_secs(3));
            },
        );
    }

    #[test]
    fn test_config_sentinel_mode() {
        temp_env::with_vars(
            [
                ("REDIS_MODE", Some("sentinel")),
                ("REDIS_SENTINEL_MASTER", Some("mymaster")),
                ("REDIS_SENTINEL_ADDRS", Some("127.0.0.1:26379")),
                ("REDIS_STARTUP_TIMEOUT", None),
            ],
            || {
                let config = Config::from_env().unwrap();
                match config.target {
                    Target::Sentinel(sentinel) => assert_eq!(sentinel.master_name, "mymaster"),
                    Target::Cluster(_) => panic!("expected sentinel target"),
                }
                assert_eq!(config.startup_timeout, DEFAULT_STARTUP_TIMEOUT);
            },
        );
    }

    #[test]
    fn test_config_rejects_unknown_mode() {
        temp_env::with_var("REDIS_MODE", Some("standalone"), || {
            let err = Config::from_env().unwrap_err();
            assert!(err.to_string().contains("REDIS_MODE"));
        });
    }
}
