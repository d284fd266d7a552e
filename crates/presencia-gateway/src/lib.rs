//! Device-session gateway for the Presencia attendance system.
//!
//! This crate is the correlation engine between web callers, one embedded
//! fingerprint scanner on a persistent socket, and the attendance record
//! store:
//!
//! ```text
//! Web caller ──> Gateway ──> DeviceRegistry ──(socket)──> Scanner
//!                   │              ▲                         │
//!                   │              │                         ▼
//!                   └─> PendingLedger <── MessageRouter <── events
//!                                              │
//!                                              └──> RecordService
//! ```
//!
//! # Components
//!
//! - [`DeviceRegistry`] - owns the authoritative scanner connection and the
//!   replacement protocol for stale ones
//! - [`PendingLedger`] - turns one-shot requests into correlated,
//!   timeout-bounded waits
//! - [`MessageRouter`] - classifies inbound device events and dispatches
//!   them to registered handlers
//! - [`Gateway`] - the façade web callers use
//!
//! # Concurrency
//!
//! The connection set and the pending-request map are the only shared
//! mutable state; each is guarded by its own lock and every mutation goes
//! through its owning object. `request_attendance_verification` is the
//! only operation that suspends a caller beyond dispatch; its entry is
//! destroyed exactly once, by reply or by deadline.

pub mod connection;
pub mod facade;
pub mod ledger;
pub mod registry;
pub mod router;

#[cfg(test)]
pub(crate) mod testutil;

pub use connection::{ConnectionId, DeviceConnection, ReplySink};
pub use facade::{Gateway, RegistrationRequest, VerificationRequest};
pub use ledger::{PendingHandle, PendingLedger};
pub use registry::{BroadcastReport, DeviceRegistry, RegistryConfig};
pub use router::{EventHandler, MessageRouter};
