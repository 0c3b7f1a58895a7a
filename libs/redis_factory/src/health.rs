use bb8::ManageConnection;
use redis::aio::ConnectionLike;
use redis::{ErrorKind, RedisError, RedisResult};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::common::{ClientMode, FactoryError, FactoryResult};
use crate::handle::RedisHandle;

/// Send `PING` and require `PONG`.
pub async fn ping<C>(conn: &mut C) -> RedisResult<()>
where
    C: ConnectionLike + Send,
{
    let response: String = redis::cmd("PING").query_async(conn).await?;

    if response != "PONG" {
        return Err(RedisError::from((
            ErrorKind::ResponseError,
            "unexpected PING reply",
            response,
        )));
    }

    Ok(())
}

/// Liveness probe run by the factories before a handle is returned.
///
/// Opens one connection through `manager`, pings it and drops it. Any failure along the
/// way, connecting included, is reported as [`FactoryError::PingFailed`]. Cancellation
/// of `cancel` wins over an in-flight probe.
pub(crate) async fn probe<M>(
    cancel: &CancellationToken,
    mode: ClientMode,
    manager: &M,
) -> FactoryResult<()>
where
    M: ManageConnection<Error = RedisError>,
    M::Connection: ConnectionLike + Send,
{
    let attempt = async {
        let mut conn = manager.connect().await?;
        ping(&mut conn).await
    };

    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            warn!(%mode, "Liveness probe cancelled");
            Err(FactoryError::Cancelled(mode))
        }
        result = attempt => result.map_err(|e| {
            warn!(%mode, error = %e, "Liveness probe failed");
            FactoryError::ping_failed(mode, e)
        }),
    }
}

/// Check the health of an established handle
///
/// Checks out a pooled connection and pings it. Suitable for readiness probes.
pub async fn check_health<M, O>(handle: &RedisHandle<M, O>) -> FactoryResult<()>
where
    M: ManageConnection<Error = RedisError>,
    M::Connection: ConnectionLike + Send,
{
    debug!(mode = %handle.mode(), "Running Redis health check");

    let mut conn = handle
        .connection()
        .await
        .map_err(|e| FactoryError::HealthCheckFailed(e.to_string()))?;

    ping(&mut *conn)
        .await
        .map_err(|e| FactoryError::HealthCheckFailed(format!("Redis PING failed: {}", e)))?;

    debug!(mode = %handle.mode(), "Redis health check passed");
    Ok(())
}

/// Health check result for detailed status reporting
#[derive(Debug, Clone)]
pub struct HealthStatus {
    pub healthy: bool,

    /// Error message if unhealthy
    pub message: Option<String>,

    pub response_time_ms: u64,
}

impl HealthStatus {
    pub fn healthy(response_time_ms: u64) -> Self {
        Self {
            healthy: true,
            message: None,
            response_time_ms,
        }
    }

    pub fn unhealthy(message: String, response_time_ms: u64) -> Self {
        Self {
            healthy: false,
            message: Some(message),
            response_time_ms,
        }
    }
}

/// Check health and report the outcome with the measured response time
pub async fn check_health_detailed<M, O>(handle: &RedisHandle<M, O>) -> HealthStatus
where
    M: ManageConnection<Error = RedisError>,
    M::Connection: ConnectionLike + Send,
{
    let start = std::time::Instant::now();
    let result = check_health(handle).await;
    let elapsed = start.elapsed().as_millis() as u64;

    match result {
        Ok(()) => HealthStatus::healthy(elapsed),
        Err(e) => HealthStatus::unhealthy(e.to_string(), elapsed),
    }
}
