//! Device session registry: which scanner connection is authoritative.
//!
//! The scanner reboots and reconnects without a clean handshake, so a new
//! connection arriving while an old one looks live means the old one is
//! stale. The registry implements the replacement protocol:
//!
//! 1. `on_connect` with an occupied registry sends a close notice to every
//!    tracked connection and flags it for eviction, then adopts the new
//!    connection alongside.
//! 2. A grace task evicts the flagged entries after a short delay, letting
//!    the close notice flush and letting the old socket's disconnect event
//!    arrive without racing the adoption.
//!
//! During the grace window the registry transiently tracks two connections:
//! inbound frames from the old one are still processed, but `broadcast`
//! never routes new outbound commands to a connection flagged for eviction,
//! and `on_disconnect` only removes a connection that is still a member, so
//! a late disconnect of the old socket can never evict its replacement.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::{debug, info, warn};

use presencia_core::constants::{CLOSE_REASON_SUPERSEDED, DEFAULT_REPLACEMENT_GRACE_MS};
use presencia_core::{Error, Result};
use presencia_protocol::DeviceCommand;

use crate::connection::{ConnectionId, DeviceConnection};

/// Configuration for the device session registry
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Grace window between flagging a superseded connection and evicting
    /// it. Must be greater than zero so the close handshake can flush.
    pub grace: Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            grace: Duration::from_millis(DEFAULT_REPLACEMENT_GRACE_MS),
        }
    }
}

/// Aggregate outcome of one broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Connections that accepted the frame
    pub delivered: usize,

    /// Connections the frame was offered to
    pub attempted: usize,
}

impl BroadcastReport {
    /// Whether every target accepted the frame.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.delivered == self.attempted
    }
}

struct Tracked {
    conn: DeviceConnection,
    /// Flagged by a replacement; evicted when the grace window elapses.
    evicting: bool,
}

/// Owner of the authoritative scanner connection.
///
/// All mutation goes through this object under one lock; no other component
/// holds a [`DeviceConnection`]. The tracked set sits behind an `Arc` so
/// the replacement grace task can finish an eviction after the registry
/// handle that started it is gone.
pub struct DeviceRegistry {
    inner: Arc<Mutex<Vec<Tracked>>>,
    grace: Duration,
}

impl DeviceRegistry {
    /// Create a registry with the given configuration.
    #[must_use]
    pub fn new(config: RegistryConfig) -> Self {
        debug_assert!(config.grace > Duration::ZERO);
        Self {
            inner: Arc::new(Mutex::new(Vec::new())),
            grace: config.grace,
        }
    }

    /// Adopt a new scanner connection, replacing any current one.
    ///
    /// Must be called within a tokio runtime: replacement arms a grace
    /// timer task.
    pub fn on_connect(&self, conn: DeviceConnection) {
        let mut inner = self.inner.lock().unwrap();

        if inner.is_empty() {
            info!(connection_id = %conn.id(), "Scanner connected");
            inner.push(Tracked {
                conn,
                evicting: false,
            });
            return;
        }

        info!(
            connection_id = %conn.id(),
            superseded = inner.len(),
            "Scanner reconnected, replacing current connection"
        );

        for tracked in inner.iter_mut() {
            if !tracked.evicting {
                tracked.conn.close(CLOSE_REASON_SUPERSEDED);
                tracked.evicting = true;
            }
        }

        inner.push(Tracked {
            conn,
            evicting: false,
        });
        drop(inner);

        let grace = self.grace;
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            tokio::time::sleep(grace).await;

            let mut inner = inner.lock().unwrap();
            let before = inner.len();
            inner.retain(|t| !t.evicting);
            let evicted = before - inner.len();
            if evicted > 0 {
                debug!(evicted, remaining = inner.len(), "Replacement grace elapsed");
            }
        });
    }

    /// Drop a connection that went away, if it is still tracked.
    ///
    /// A connection already evicted by a replacement is not a member any
    /// more; its late disconnect is a no-op and cannot touch the
    /// replacement.
    pub fn on_disconnect(&self, id: ConnectionId) {
        let mut inner = self.inner.lock().unwrap();

        let Some(pos) = inner.iter().position(|t| t.conn.id() == id) else {
            debug!(connection_id = %id, "Disconnect for already evicted connection");
            return;
        };

        inner.remove(pos);
        if inner.is_empty() {
            warn!(connection_id = %id, "Scanner disconnected, no device available");
        } else {
            info!(connection_id = %id, "Scanner connection removed");
        }
    }

    /// Snapshot of tracked connection ids: zero or one in steady state,
    /// transiently two during a replacement window.
    #[must_use]
    pub fn current(&self) -> Vec<ConnectionId> {
        self.inner
            .lock()
            .unwrap()
            .iter()
            .map(|t| t.conn.id())
            .collect()
    }

    /// Whether a broadcast right now would have at least one target.
    #[must_use]
    pub fn has_connection(&self) -> bool {
        self.inner
            .lock()
            .unwrap()
            .iter()
            .any(|t| !t.evicting && t.conn.is_live())
    }

    /// Serialize a command once and transmit it to every live connection
    /// not flagged for eviction.
    ///
    /// Per-connection failures are counted, not propagated: one dead
    /// connection must not block delivery to the others.
    ///
    /// # Errors
    /// Returns `Error::NoDeviceAvailable` if there is no eligible target at
    /// all. Callers surface this as a service-unavailable condition.
    pub fn broadcast(&self, command: &DeviceCommand) -> Result<BroadcastReport> {
        let frame = serde_json::to_value(command)
            .map_err(|e| Error::Codec(format!("serialize: {e}")))?;

        let inner = self.inner.lock().unwrap();
        let targets: Vec<&Tracked> = inner
            .iter()
            .filter(|t| !t.evicting && t.conn.is_live())
            .collect();

        if targets.is_empty() {
            warn!(command = command.action(), "Broadcast with no scanner connected");
            return Err(Error::NoDeviceAvailable);
        }

        let attempted = targets.len();
        let mut delivered = 0;
        for tracked in targets {
            match tracked.conn.send_value(frame.clone()) {
                Ok(()) => delivered += 1,
                Err(e) => warn!(
                    connection_id = %tracked.conn.id(),
                    error = %e,
                    "Broadcast delivery failed for connection"
                ),
            }
        }

        info!(
            command = command.action(),
            delivered, attempted, "Broadcast delivered {delivered} of {attempted}"
        );

        Ok(BroadcastReport {
            delivered,
            attempted,
        })
    }
}
