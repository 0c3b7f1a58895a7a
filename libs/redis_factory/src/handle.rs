use std::sync::Arc;

use bb8::{ManageConnection, Pool, PooledConnection};
use redis::RedisError;
use redis::aio::ConnectionLike;

use crate::common::{ClientMode, FactoryError, FactoryResult};
use crate::health;

/// Live client returned by the factories
///
/// Owns the connection pool and the effective options the client was built with. The
/// caller keeps it in its application state; clones share the same pool.
///
/// # Example
/// ```ignore
/// use redis_factory::AsyncCommands;
///
/// let mut conn = handle.connection().await?;
/// conn.set::<_, _, ()>("session:42", "alice").await?;
/// let user: String = conn.get("session:42").await?;
/// ```
pub struct RedisHandle<M, O>
where
    M: ManageConnection,
{
    pool: Pool<M>,
    options: Arc<O>,
    mode: ClientMode,
}

/// Snapshot of pool occupancy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolState {
    pub connections: u32,
    pub idle_connections: u32,
}

impl<M, O> Clone for RedisHandle<M, O>
where
    M: ManageConnection,
{
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            options: self.options.clone(),
            mode: self.mode,
        }
    }
}

impl<M, O> RedisHandle<M, O>
where
    M: ManageConnection<Error = RedisError>,
    M::Connection: ConnectionLike + Send,
{
    pub(crate) fn new(pool: Pool<M>, options: O, mode: ClientMode) -> Self {
        Self {
            pool,
            options: Arc::new(options),
            mode,
        }
    }

    pub fn mode(&self) -> ClientMode {
        self.mode
    }

    /// Effective options the client was constructed with
    pub fn options(&self) -> &O {
        &self.options
    }

    /// Check out a pooled connection. It returns to the pool when dropped.
    pub async fn connection(&self) -> FactoryResult<PooledConnection<'_, M>> {
        self.pool.get().await.map_err(FactoryError::pool)
    }

    /// Check out a connection that is not tied to the handle's lifetime
    pub async fn owned_connection(&self) -> FactoryResult<PooledConnection<'static, M>> {
        self.pool.get_owned().await.map_err(FactoryError::pool)
    }

    /// Round-trip a `PING` through a pooled connection
    pub async fn ping(&self) -> FactoryResult<()> {
        let mut conn = self.connection().await?;
        health::ping(&mut *conn)
            .await
            .map_err(|e| FactoryError::ping_failed(self.mode, e))
    }

    pub fn state(&self) -> PoolState {
        let state = self.pool.state();
        PoolState {
            connections: state.connections,
            idle_connections: state.idle_connections,
        }
    }

    /// Underlying bb8 pool, for callers that need its full API
    pub fn pool(&self) -> &Pool<M> {
        &self.pool
    }
}
