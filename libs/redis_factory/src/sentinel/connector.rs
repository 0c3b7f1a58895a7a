use std::io;
use std::time::Duration;

use redis::RedisError;
use redis::aio::MultiplexedConnection;
use redis::sentinel::SentinelClient;
use tokio::sync::Mutex;

use super::SentinelOptions;
use crate::common::ClientMode;
use crate::health;
use crate::pool::{CommandTimeouts, ConnectHook, ConnectNotifier, TimedConnection};

/// bb8 connection manager that asks the sentinels for the current master (or a replica)
/// each time a new connection is opened, so a failover is picked up on reconnect.
pub struct SentinelConnectionManager {
    client: Mutex<SentinelClient>,
    dial_timeout: Duration,
    timeouts: CommandTimeouts,
    notifier: ConnectNotifier,
}

impl SentinelConnectionManager {
    pub(crate) fn new(
        options: &SentinelOptions,
        on_connect: Option<ConnectHook>,
    ) -> Result<Self, RedisError> {
        let client = SentinelClient::build(
            options.sentinel_urls(),
            options.master_name.clone(),
            Some(options.node_connection_info()),
            options.server_type(),
        )?;

        Ok(Self {
            client: Mutex::new(client),
            dial_timeout: options.dial_timeout,
            timeouts: options.command_timeouts(),
            notifier: ConnectNotifier::new(ClientMode::Sentinel, on_connect),
        })
    }

    /// Connections opened so far, the liveness probe included
    pub fn opened_connections(&self) -> u64 {
        self.notifier.opened()
    }

    async fn discover(&self) -> Result<MultiplexedConnection, RedisError> {
        let mut client = self.client.lock().await;
        client.get_async_connection().await
    }
}

impl bb8::ManageConnection for SentinelConnectionManager {
    type Connection = TimedConnection<MultiplexedConnection>;
    type Error = RedisError;

    async fn connect(&self) -> Result<Self::Connection, Self::Error> {
        // The lock is released when the deadline drops the discovery future.
        let conn = match tokio::time::timeout(self.dial_timeout, self.discover()).await {
            Ok(result) => result?,
            Err(_) => return Err(dial_timed_out(self.dial_timeout)),
        };

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

fn dial_timed_out(limit: Duration) -> RedisError {
    io::Error::new(
        io::ErrorKind::TimedOut,
        format!("sentinel dial exceeded {}ms", limit.as_millis()),
    )
    .into()
}
