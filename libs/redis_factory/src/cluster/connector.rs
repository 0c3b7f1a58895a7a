use redis::RedisError;
use redis::cluster::ClusterClient;
use redis::cluster_async::ClusterConnection;

use super::ClusterOptions;
use crate::common::ClientMode;
use crate::health;
use crate::pool::{CommandTimeouts, ConnectHook, ConnectNotifier, TimedConnection};

/// bb8 connection manager for a Redis cluster.
///
/// Each pooled connection is a full cluster connection that tracks slot ownership and
/// follows redirects on its own.
pub struct ClusterConnectionManager {
    client: ClusterClient,
    timeouts: CommandTimeouts,
    notifier: ConnectNotifier,
}

impl ClusterConnectionManager {
    pub(crate) fn new(
        options: &ClusterOptions,
        on_connect: Option<ConnectHook>,
    ) -> Result<Self, RedisError> {
        Ok(Self {
            client: options.client()?,
            timeouts: options.command_timeouts(),
            notifier: ConnectNotifier::new(ClientMode::Cluster, on_connect),
        })
    }

    /// Connections opened so far, the liveness probe included
    pub fn opened_connections(&self) -> u64 {
        self.notifier.opened()
    }
}

impl bb8::ManageConnection for ClusterConnectionManager {
    type Connection = TimedConnection<ClusterConnection>;
    type Error = RedisError;

    async fn connect(&self) -> Result<Self::Connection, Self::Error> {
        let conn = self.client.get_async_connection().await?;
        self.notifier.notify();
        Ok(TimedConnection::new(conn, self.timeouts))
    }

    async fn is_valid(&self, conn: &mut Self::Connection) -> Result<(), Self::Error> {
        health::ping(conn).await
    }

    fn has_broken(&self, _: &mut Self::Connection) -> bool {
        false
    }
}
