//! Storage layer for the Presencia attendance gateway.
//!
//! This crate provides SQLite-backed persistence for users and attendance
//! sessions, plus the [`RecordService`] trait the gateway's message
//! handlers consume.
//!
//! # Architecture
//!
//! The storage layer uses a repository pattern:
//!
//! - [`Database`] - Connection pool manager with automatic migrations
//! - [`UserRepository`], [`SessionRepository`] - Data access traits
//! - [`RecordService`] - The narrow facade the gateway depends on;
//!   `SqliteRecordService` is the production implementation
//!
//! # Examples
//!
//! ```no_run
//! use presencia_core::UserId;
//! use presencia_storage::{Database, DatabaseConfig, RecordService, SqliteRecordService};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = DatabaseConfig::new("presencia.db")
//!     .max_connections(10)
//!     .auto_migrate(true);
//!
//! let db = Database::new(config).await?;
//! let records = SqliteRecordService::new(db.pool().clone());
//!
//! let uid = UserId::new("u-1")?;
//! if let Some(user) = records.user_by_uid(&uid).await? {
//!     println!("{} enrolled: {}", user.name, user.is_enrolled());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! All queries use parameterized statements via SQLx. The pool runs SQLite
//! in WAL mode with foreign keys enforced; migrations are embedded at
//! compile time from the workspace `migrations/` directory.

pub mod connection;
pub mod error;
pub mod models;
pub mod records;
pub mod repositories;

pub use connection::{Database, DatabaseConfig};
pub use error::{StorageError, StorageResult};
pub use models::{AttendanceSession, UserRecord};
pub use records::{RecordService, SqliteRecordService};
pub use repositories::{
    SessionRepository, SqliteSessionRepository, SqliteUserRepository, UserRepository,
};
