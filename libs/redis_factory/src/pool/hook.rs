use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

use crate::common::ClientMode;

/// Details handed to a [`ConnectHook`] each time a connection is opened
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewConnection {
    pub mode: ClientMode,
    /// 1-based count of connections opened by this client, the probe connection included
    pub sequence: u64,
}

/// Callback invoked once per newly opened connection.
///
/// It runs on the pool's task right after the connection is established and before the
/// connection is handed out, so it must not block. Use it for metrics or logging.
#[derive(Clone)]
pub struct ConnectHook(Arc<dyn Fn(&NewConnection) + Send + Sync>);

impl ConnectHook {
    pub fn new<F>(hook: F) -> Self
    where
        F: Fn(&NewConnection) + Send + Sync + 'static,
    {
        Self(Arc::new(hook))
    }

    pub(crate) fn call(&self, connection: &NewConnection) {
        (self.0)(connection)
    }
}

impl fmt::Debug for ConnectHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ConnectHook(..)")
    }
}

/// Counts opened connections and fires the hook, if any.
#[derive(Debug)]
pub(crate) struct ConnectNotifier {
    mode: ClientMode,
    hook: Option<ConnectHook>,
    opened: AtomicU64,
}

impl ConnectNotifier {
    pub(crate) fn new(mode: ClientMode, hook: Option<ConnectHook>) -> Self {
        Self {
            mode,
            hook,
            opened: AtomicU64::new(0),
        }
    }

    pub(crate) fn notify(&self) -> u64 {
        let sequence = self.opened.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(mode = %self.mode, sequence, "Opened Redis connection");

        if let Some(hook) = &self.hook {
            hook.call(&NewConnection {
                mode: self.mode,
                sequence,
            });
        }

        sequence
    }

    pub(crate) fn opened(&self) -> u64 {
        self.opened.load(Ordering::Relaxed)
    }
}
