//! Connection handles owned by the device session registry.
//!
//! A [`DeviceConnection`] is the transmit half of one scanner socket: the
//! network layer owns the socket tasks, the registry owns this handle, and
//! everything else (ledger, router, façade) goes through the registry. The
//! one exception is [`ReplySink`], a per-message reply capability handed to
//! the router so a device-initiated query can be answered on the exact
//! connection it arrived on, including one that is about to be evicted.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::trace;

use presencia_core::{Error, Result};
use presencia_protocol::DeviceCommand;

/// Monotonically assigned connection identifier.
///
/// The creation timestamp orders connections; the sequence number keeps two
/// connections created in the same millisecond distinct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId {
    millis: u64,
    seq: u64,
}

impl ConnectionId {
    fn next() -> Self {
        static SEQ: AtomicU64 = AtomicU64::new(0);

        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;

        ConnectionId {
            millis,
            seq: SEQ.fetch_add(1, Ordering::Relaxed),
        }
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}-{}", self.millis, self.seq)
    }
}

/// Transmit handle for one scanner connection.
///
/// Frames are enqueued on an unbounded channel drained by the network
/// layer's writer task; dropping the handle closes the channel, which ends
/// the writer after the queue flushes and closes the socket.
#[derive(Debug)]
pub struct DeviceConnection {
    id: ConnectionId,
    outbound: mpsc::UnboundedSender<Value>,
}

impl DeviceConnection {
    /// Create a handle around the outbound frame channel of a socket.
    #[must_use]
    pub fn new(outbound: mpsc::UnboundedSender<Value>) -> Self {
        Self {
            id: ConnectionId::next(),
            outbound,
        }
    }

    /// Get the connection identifier.
    #[must_use]
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Whether the socket side of this connection is still draining frames.
    #[must_use]
    pub fn is_live(&self) -> bool {
        !self.outbound.is_closed()
    }

    /// Enqueue a pre-serialized frame.
    ///
    /// # Errors
    /// Returns `Error::ConnectionClosed` if the socket tasks are gone.
    pub fn send_value(&self, frame: Value) -> Result<()> {
        trace!(connection_id = %self.id, "Enqueueing frame");
        self.outbound
            .send(frame)
            .map_err(|_| Error::ConnectionClosed)
    }

    /// Serialize and enqueue a message.
    ///
    /// # Errors
    /// Returns `Error::Codec` on serialization failure or
    /// `Error::ConnectionClosed` if the socket tasks are gone.
    pub fn send<T: Serialize>(&self, message: &T) -> Result<()> {
        let value =
            serde_json::to_value(message).map_err(|e| Error::Codec(format!("serialize: {e}")))?;
        self.send_value(value)
    }

    /// Notify the peer this connection is being dropped and why.
    ///
    /// Best effort: a connection whose socket already died has nowhere to
    /// deliver the notice.
    pub fn close(&self, reason: &str) {
        let _ = self.send(&DeviceCommand::CloseNotice {
            reason: reason.to_string(),
        });
    }

    /// Reply capability bound to this connection, for answering
    /// device-initiated queries on the connection they arrived on.
    #[must_use]
    pub fn reply_sink(&self) -> ReplySink {
        ReplySink {
            id: self.id,
            outbound: self.outbound.clone(),
        }
    }
}

/// Per-message reply capability handed to the router.
///
/// Holds only the outbound channel, not the connection: the registry keeps
/// exclusive ownership of the [`DeviceConnection`] itself.
#[derive(Debug, Clone)]
pub struct ReplySink {
    id: ConnectionId,
    outbound: mpsc::UnboundedSender<Value>,
}

impl ReplySink {
    /// Identifier of the connection this sink answers on.
    #[must_use]
    pub fn connection_id(&self) -> ConnectionId {
        self.id
    }

    /// Serialize and enqueue a reply frame.
    ///
    /// # Errors
    /// Returns `Error::Codec` on serialization failure or
    /// `Error::ConnectionClosed` if the connection is gone.
    pub fn send<T: Serialize>(&self, message: &T) -> Result<()> {
        let value =
            serde_json::to_value(message).map_err(|e| Error::Codec(format!("serialize: {e}")))?;
        self.outbound
            .send(value)
            .map_err(|_| Error::ConnectionClosed)
    }
}
