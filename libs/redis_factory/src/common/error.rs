use super::ClientMode;

/// Error type for client construction and liveness checks
///
/// Every failure a factory can hit is reported here instead of aborting the process;
/// whether a failed probe is fatal is up to the caller.
#[derive(Debug, thiserror::Error)]
pub enum FactoryError {
    /// The liveness probe (PING) failed: unreachable nodes, auth failure, timeout
    #[error("{0} ping failed")]
    PingFailed(ClientMode, #[source] redis::RedisError),

    /// The caller cancelled the context before the probe completed
    #[error("{0} ping cancelled")]
    Cancelled(ClientMode),

    /// Configuration rejected before any network I/O
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Error raised by the client library while building the client
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Pool could not be built or could not hand out a connection
    #[error("Connection pool error: {0}")]
    Pool(String),

    /// Health check failed on an established handle
    #[error("Health check failed: {0}")]
    HealthCheckFailed(String),
}

impl FactoryError {
    /// Whether repeating the operation could succeed.
    ///
    /// Cancellation and configuration errors are final.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            FactoryError::Cancelled(_) | FactoryError::InvalidConfig(_)
        )
    }

    pub(crate) fn ping_failed(mode: ClientMode, source: redis::RedisError) -> Self {
        FactoryError::PingFailed(mode, source)
    }

    pub(crate) fn pool<E: std::fmt::Display>(err: bb8::RunError<E>) -> Self {
        match err {
            bb8::RunError::User(e) => FactoryError::Pool(e.to_string()),
            bb8::RunError::TimedOut => {
                FactoryError::Pool("timed out waiting for a pooled connection".to_string())
            }
        }
    }
}

/// Result type alias for factory operations
pub type FactoryResult<T> = Result<T, FactoryError>;
