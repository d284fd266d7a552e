//! Network transport for the Presencia scanner link.
//!
//! This crate owns the TCP side of the gateway: accepting the scanner's
//! persistent socket, framing it with [`presencia_protocol::WireCodec`],
//! and wiring decoded frames into the gateway's registry and router.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use presencia_gateway::{DeviceRegistry, MessageRouter, PendingLedger, RegistryConfig};
//! use presencia_network::{DeviceListener, ListenerConfig};
//! use presencia_storage::{Database, SqliteRecordService};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::in_memory().await?;
//! let records = Arc::new(SqliteRecordService::new(db.pool().clone()));
//! let ledger = Arc::new(PendingLedger::new());
//! let registry = Arc::new(DeviceRegistry::new(RegistryConfig::default()));
//! let router = Arc::new(MessageRouter::standard(records, Arc::clone(&ledger)));
//!
//! let config = ListenerConfig {
//!     bind_addr: "0.0.0.0:3000".parse()?,
//!     max_connections: 8,
//! };
//! let listener = DeviceListener::bind(config, registry, router).await?;
//! tokio::spawn(listener.run());
//! # Ok(())
//! # }
//! ```

mod server;

pub use server::{DeviceListener, ListenerConfig, ListenerError};
