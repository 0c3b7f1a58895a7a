use std::future::Future;
use std::io;
use std::time::Duration;

use redis::aio::ConnectionLike;
use redis::{Cmd, Pipeline, RedisError, RedisFuture, RedisResult, Value};

/// Read and write budgets for a single command round-trip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CommandTimeouts {
    pub read: Option<Duration>,
    pub write: Option<Duration>,
}

impl CommandTimeouts {
    pub fn new(read: Option<Duration>, write: Option<Duration>) -> Self {
        Self { read, write }
    }

    /// Deadline for a whole command: writing the request plus reading the reply.
    ///
    /// `None` when neither budget is set.
    pub fn budget(&self) -> Option<Duration> {
        match (self.read, self.write) {
            (None, None) => None,
            (read, write) => Some(read.unwrap_or_default() + write.unwrap_or_default()),
        }
    }
}

/// Async connection whose commands fail with a timeout once the budget is spent.
///
/// The client library multiplexes writes and reads on one task, so the read and write
/// budgets are enforced together as one deadline per command or pipeline.
pub struct TimedConnection<C> {
    inner: C,
    budget: Option<Duration>,
}

impl<C> TimedConnection<C> {
    pub fn new(inner: C, timeouts: CommandTimeouts) -> Self {
        Self {
            inner,
            budget: timeouts.budget(),
        }
    }

    pub fn budget(&self) -> Option<Duration> {
        self.budget
    }

    pub fn get_ref(&self) -> &C {
        &self.inner
    }

    pub fn into_inner(self) -> C {
        self.inner
    }
}

impl<C> ConnectionLike for TimedConnection<C>
where
    C: ConnectionLike + Send,
{
    fn req_packed_command<'a>(&'a mut self, cmd: &'a Cmd) -> RedisFuture<'a, Value> {
        let budget = self.budget;
        Box::pin(with_deadline(budget, self.inner.req_packed_command(cmd)))
    }

    fn req_packed_commands<'a>(
        &'a mut self,
        cmd: &'a Pipeline,
        offset: usize,
        count: usize,
    ) -> RedisFuture<'a, Vec<Value>> {
        let budget = self.budget;
        Box::pin(with_deadline(
            budget,
            self.inner.req_packed_commands(cmd, offset, count),
        ))
    }

    fn get_db(&self) -> i64 {
        self.inner.get_db()
    }
}

async fn with_deadline<T, F>(budget: Option<Duration>, request: F) -> RedisResult<T>
where
    F: Future<Output = RedisResult<T>>,
{
    match budget {
        None => request.await,
        Some(limit) => match tokio::time::timeout(limit, request).await {
            Ok(result) => result,
            Err(_) => Err(timed_out(limit)),
        },
    }
}

fn timed_out(limit: Duration) -> RedisError {
    io::Error::new(
        io::ErrorKind::TimedOut,
        format!("command exceeded {}ms deadline", limit.as_millis()),
    )
    .into()
}
