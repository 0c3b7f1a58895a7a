//! Common utilities shared by the sentinel and cluster factories

pub mod error;
pub mod retry;

pub use error::{FactoryError, FactoryResult};
pub use retry::{RetryConfig, retry, retry_with_backoff};

use std::fmt;
use std::str::FromStr;

/// Topology a handle was built for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientMode {
    Sentinel,
    Cluster,
}

impl ClientMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientMode::Sentinel => "sentinel",
            ClientMode::Cluster => "cluster",
        }
    }
}

impl fmt::Display for ClientMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClientMode {
    type Err = FactoryError;

    /// Accepts `sentinel` (or `failover`) and `cluster`, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sentinel" | "failover" => Ok(ClientMode::Sentinel),
            "cluster" => Ok(ClientMode::Cluster),
            other => Err(FactoryError::InvalidConfig(format!(
                "expected 'sentinel' or 'cluster', got '{}'",
                other
            ))),
        }
    }
}

/// Normalise a node address to a `redis://` URL.
///
/// Operators usually write `host:port`; the client library wants a URL. Addresses that
/// already carry a scheme are passed through untouched.
pub(crate) fn node_url(addr: &str) -> String {
    let addr = addr.trim();
    if addr.contains("://") {
        addr.to_string()
    } else {
        format!("redis://{}", addr)
    }
}

/// Number of CPUs visible to the process, used for pool size defaults.
pub(crate) fn available_cpus() -> u32 {
    std::thread::available_parallelism()
        .map(|n| n.get() as u32)
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_mode_display() {
        assert_eq!(ClientMode::Sentinel.to_string(), "sentinel");
        assert_eq!(ClientMode::Cluster.to_string(), "cluster");
    }

    #[test]
    fn test_client_mode_from_str() {
        assert_eq!("sentinel".parse::<ClientMode>().unwrap(), ClientMode::Sentinel);
        assert_eq!(" Failover ".parse::<ClientMode>().unwrap(), ClientMode::Sentinel);
        assert_eq!("CLUSTER".parse::<ClientMode>().unwrap(), ClientMode::Cluster);

        let err = "standalone".parse::<ClientMode>().unwrap_err();
        assert!(matches!(err, FactoryError::InvalidConfig(_)));
        assert!(err.to_string().contains("standalone"));
    }

    #[test]
    fn test_node_url_adds_scheme() {
        assert_eq!(node_url("127.0.0.1:7000"), "redis://127.0.0.1:7000");
        assert_eq!(node_url(" cache-0.internal:6379 "), "redis://cache-0.internal:6379");
    }

    #[test]
    fn test_node_url_keeps_existing_scheme() {
        assert_eq!(node_url("rediss://secure:6380"), "rediss://secure:6380");
        assert_eq!(node_url("redis://10.0.0.1:6379/2"), "redis://10.0.0.1:6379/2");
    }

    #[test]
    fn test_available_cpus_is_positive() {
        assert!(available_cpus() >= 1);
    }
}
