//! TCP listener bridging scanner sockets into the gateway.
//!
//! # Architecture
//!
//! ```text
//!                    ┌─> writer task ──(Framed sink)──> socket
//! Scanner ──(TCP)────┤
//!                    └─> reader task ──> MessageRouter ──> handlers
//!                             │
//!                             └─ on EOF/error ─> DeviceRegistry.on_disconnect
//! ```
//!
//! Each accepted socket becomes a channel-backed [`DeviceConnection`]: the
//! registry (and through it the façade) enqueues frames on the channel from
//! any task, and a dedicated writer task drains the queue into the socket.
//! When the registry drops the connection handle the channel closes, the
//! writer flushes what is queued (including a pending close notice) and the
//! socket shuts down.
//!
//! # Design Principles
//!
//! The listener is a transport layer only:
//! - **No authentication**: the scanner link is assumed trusted
//! - **No reconnect logic**: the scanner reconnects on its own; the
//!   registry's replacement protocol handles the stale side
//! - **No business logic**: every decoded frame goes straight to the router

use std::net::SocketAddr;
use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use serde_json::Value;
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_util::codec::Framed;
use tracing::{debug, error, info, warn};

use presencia_gateway::{DeviceConnection, DeviceRegistry, MessageRouter};
use presencia_protocol::WireCodec;

/// Configuration for the device listener
#[derive(Debug, Clone)]
pub struct ListenerConfig {
    /// Address to bind the listener to
    pub bind_addr: SocketAddr,

    /// Upper bound on simultaneously tracked connections. The registry
    /// converges to one; this only guards against connection floods during
    /// replacement churn.
    pub max_connections: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".parse().unwrap(),
            max_connections: 8,
        }
    }
}

/// Errors that can occur during listener operations
#[derive(Debug, Error)]
pub enum ListenerError {
    /// Failed to bind to address
    #[error("Failed to bind to {0}")]
    BindFailed(SocketAddr),

    /// Low-level I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// TCP listener feeding scanner connections into the registry and router.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use presencia_gateway::{DeviceRegistry, MessageRouter, PendingLedger, RegistryConfig};
/// use presencia_network::{DeviceListener, ListenerConfig};
/// use presencia_storage::{Database, SqliteRecordService};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let db = Database::in_memory().await?;
/// let records = Arc::new(SqliteRecordService::new(db.pool().clone()));
/// let ledger = Arc::new(PendingLedger::new());
/// let registry = Arc::new(DeviceRegistry::new(RegistryConfig::default()));
/// let router = Arc::new(MessageRouter::standard(records, ledger));
///
/// let listener = DeviceListener::bind(ListenerConfig::default(), registry, router).await?;
/// listener.run().await?;
/// # Ok(())
/// # }
/// ```
pub struct DeviceListener {
    listener: TcpListener,
    registry: Arc<DeviceRegistry>,
    router: Arc<MessageRouter>,
    config: ListenerConfig,
}

impl DeviceListener {
    /// Bind the listener to the configured address.
    ///
    /// # Errors
    /// Returns `ListenerError::BindFailed` if the address is unavailable.
    pub async fn bind(
        config: ListenerConfig,
        registry: Arc<DeviceRegistry>,
        router: Arc<MessageRouter>,
    ) -> Result<Self, ListenerError> {
        info!("Binding device listener to {}", config.bind_addr);

        let listener = TcpListener::bind(config.bind_addr)
            .await
            .map_err(|_| ListenerError::BindFailed(config.bind_addr))?;

        info!(
            "Device listener on {} (max {} connections)",
            config.bind_addr, config.max_connections
        );

        Ok(Self {
            listener,
            registry,
            router,
            config,
        })
    }

    /// Get the local address the listener is bound to.
    ///
    /// Useful for tests that bind to port 0.
    pub fn local_addr(&self) -> Result<SocketAddr, ListenerError> {
        self.listener.local_addr().map_err(Into::into)
    }

    /// Accept scanner connections until the listener socket fails.
    ///
    /// Each accepted socket is registered with the registry and served by
    /// its own reader and writer tasks; this loop never blocks on a
    /// connection.
    pub async fn run(self) -> Result<(), ListenerError> {
        loop {
            let (stream, addr) = self.listener.accept().await?;
            debug!("Accepted connection from {}", addr);

            if self.registry.current().len() >= self.config.max_connections {
                warn!(
                    %addr,
                    max_connections = self.config.max_connections,
                    "Connection rejected: tracking limit reached"
                );
                drop(stream);
                continue;
            }

            if let Err(e) = stream.set_nodelay(true) {
                warn!("Failed to set TCP_NODELAY for {}: {}", addr, e);
            }

            self.spawn_connection(stream, addr);
        }
    }

    fn spawn_connection(&self, stream: TcpStream, addr: SocketAddr) {
        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Value>();
        let conn = DeviceConnection::new(outbound_tx);
        let id = conn.id();
        let sink = conn.reply_sink();

        info!(connection_id = %id, %addr, "Scanner connected");
        self.registry.on_connect(conn);

        let framed = Framed::new(stream, WireCodec::new());
        let (mut frame_sink, mut frame_stream) = framed.split::<Value>();

        // Writer: drain the outbound queue into the socket. Ends when the
        // registry drops the connection handle (channel closed) or on a
        // write error; either way the socket is closed after the flush.
        tokio::spawn(async move {
            while let Some(frame) = outbound_rx.recv().await {
                if let Err(e) = frame_sink.send(frame).await {
                    warn!(connection_id = %id, error = %e, "Write failed, stopping writer");
                    break;
                }
            }
            let _ = frame_sink.close().await;
            debug!(connection_id = %id, "Writer finished");
        });

        // Reader: every decoded frame goes to the router; the router never
        // errors out, so only EOF and transport failures end this loop.
        let registry = Arc::clone(&self.registry);
        let router = Arc::clone(&self.router);
        tokio::spawn(async move {
            while let Some(result) = frame_stream.next().await {
                match result {
                    Ok(frame) => router.dispatch_raw(frame.as_bytes(), &sink).await,
                    Err(e) => {
                        error!(connection_id = %id, error = %e, "Connection failed");
                        break;
                    }
                }
            }

            info!(connection_id = %id, "Scanner disconnected");
            registry.on_disconnect(id);
        });
    }
}
