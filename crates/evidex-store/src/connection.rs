//! Connection lifecycle for store adapters.
//!
//! `Disconnected → Connecting → Connected → Closed`. Every external call goes
//! through [`ManagedConnection::with_connection`], which holds the handle for
//! the duration of the call only, connects lazily (at most one attempt per
//! call), and drops back to `Disconnected` when the call reports the
//! connection lost, so the next call reconnects.

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info, warn};

use evidex_core::{Error, Result};

/// Opens raw connections to a store.
pub trait Connector: Send + Sync {
    type Connection: Send;

    /// Open a new connection.
    fn connect(&self) -> Result<Self::Connection>;

    /// Human-readable target, for logs and errors.
    fn target(&self) -> String;
}

/// Observable state of a [`ManagedConnection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Connected,
    Closed,
}

enum Slot<C> {
    Disconnected,
    Connecting,
    Connected(C),
    Closed,
}

impl<C> Slot<C> {
    fn status(&self) -> ConnectionStatus {
        match self {
            Self::Disconnected => ConnectionStatus::Disconnected,
            Self::Connecting => ConnectionStatus::Connecting,
            Self::Connected(_) => ConnectionStatus::Connected,
            Self::Closed => ConnectionStatus::Closed,
        }
    }
}

/// A lazily opened, mutex-guarded connection.
///
/// Concurrent callers serialize on the handle instead of sharing it.
pub struct ManagedConnection<K: Connector> {
    connector: K,
    slot: Mutex<Slot<K::Connection>>,
}

impl<K: Connector> ManagedConnection<K> {
    pub fn new(connector: K) -> Self {
        Self {
            connector,
            slot: Mutex::new(Slot::Disconnected),
        }
    }

    pub fn connector(&self) -> &K {
        &self.connector
    }

    pub fn status(&self) -> ConnectionStatus {
        self.slot.lock().status()
    }

    /// Connect now instead of on first use.
    pub fn connect(&self) -> Result<()> {
        self.with_connection(|_| Ok(()))
    }

    /// Run `f` against the connection, opening it first if needed.
    ///
    /// Connect failures surface as [`Error::SourceUnavailable`] and are not
    /// retried. If `f` itself fails with `SourceUnavailable` the handle is
    /// discarded.
    pub fn with_connection<T>(
        &self,
        f: impl FnOnce(&mut K::Connection) -> Result<T>,
    ) -> Result<T> {
        let mut slot = self.slot.lock();

        let needs_connect = match &*slot {
            Slot::Closed => {
                return Err(Error::SourceUnavailable(format!(
                    "connection to {} is closed",
                    self.connector.target()
                )))
            }
            Slot::Connected(_) => false,
            Slot::Disconnected | Slot::Connecting => true,
        };

        if needs_connect {
            *slot = Slot::Connecting;
            debug!("Connecting to {}", self.connector.target());
            match self.connector.connect() {
                Ok(conn) => {
                    info!("Connected to {}", self.connector.target());
                    *slot = Slot::Connected(conn);
                }
                Err(e) => {
                    *slot = Slot::Disconnected;
                    warn!("Failed to connect to {}: {}", self.connector.target(), e);
                    return Err(match e {
                        Error::SourceUnavailable(msg) => Error::SourceUnavailable(msg),
                        other => Error::SourceUnavailable(format!(
                            "{}: {}",
                            self.connector.target(),
                            other
                        )),
                    });
                }
            }
        }

        let result = match &mut *slot {
            Slot::Connected(conn) => f(conn),
            _ => {
                return Err(Error::SourceUnavailable(format!(
                    "no connection to {}",
                    self.connector.target()
                )))
            }
        };

        if let Err(e) = &result {
            if e.is_source_unavailable() {
                warn!("Lost connection to {}: {}", self.connector.target(), e);
                *slot = Slot::Disconnected;
            }
        }

        result
    }

    /// Release the connection. Later calls fail with `SourceUnavailable`.
    pub fn close(&self) {
        let mut slot = self.slot.lock();
        if !matches!(*slot, Slot::Closed) {
            info!("Closing connection to {}", self.connector.target());
        }
        *slot = Slot::Closed;
    }
}
