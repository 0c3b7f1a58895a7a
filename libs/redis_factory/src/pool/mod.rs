//! Connection pooling shared by both topologies
//!
//! Each topology supplies a `bb8::ManageConnection` implementation; this module holds the
//! pieces they have in common: the connect hook, the per-command deadline wrapper and the
//! mapping from resolved options onto the bb8 builder.

mod hook;
mod timeout;

pub use hook::{ConnectHook, NewConnection};
pub(crate) use hook::ConnectNotifier;
pub use timeout::{CommandTimeouts, TimedConnection};

use std::time::Duration;

use bb8::ManageConnection;

/// Pool sizing and connection lifecycle settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolSettings {
    pub max_size: u32,
    pub min_idle: Option<u32>,
    /// How long a caller waits for a free connection
    pub connection_timeout: Duration,
    pub idle_timeout: Option<Duration>,
    pub max_lifetime: Option<Duration>,
    /// How often idle and expired connections are reaped
    pub reaper_rate: Duration,
}

impl PoolSettings {
    pub(crate) fn builder<M: ManageConnection>(&self) -> bb8::Builder<M> {
        bb8::Pool::builder()
            .max_size(self.max_size)
            .min_idle(self.min_idle)
            .connection_timeout(self.connection_timeout)
            .idle_timeout(self.idle_timeout)
            .max_lifetime(self.max_lifetime)
            .reaper_rate(self.reaper_rate)
    }
}

/// Zero means "never" for idle and lifetime limits.
pub(crate) fn non_zero(duration: Option<Duration>) -> Option<Duration> {
    duration.filter(|d| !d.is_zero())
}

/// Zero means "use the default" for dial and command timeouts.
pub(crate) fn or_default(duration: Option<Duration>, default: Duration) -> Duration {
    non_zero(duration).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_zero() {
        assert_eq!(non_zero(Some(Duration::ZERO)), None);
        assert_eq!(non_zero(None), None);
        assert_eq!(
            non_zero(Some(Duration::from_secs(1))),
            Some(Duration::from_secs(1))
        );
    }

    #[test]
    fn test_or_default_treats_zero_as_unset() {
        let default = Duration::from_secs(3);
        assert_eq!(or_default(None, default), default);
        assert_eq!(or_default(Some(Duration::ZERO), default), default);
        assert_eq!(
            or_default(Some(Duration::from_millis(250)), default),
            Duration::from_millis(250)
        );
    }
}
