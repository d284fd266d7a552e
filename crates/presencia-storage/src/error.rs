use thiserror::Error;

/// Storage-specific error types for the attendance record store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Database connection or query execution failed
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration execution failed
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Entity not found in database
    #[error("Entity not found: {entity_type} with {field}={value}")]
    NotFound {
        entity_type: String,
        field: String,
        value: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Specialized result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Record-store failures cross into the gateway as the contained
/// `RecordService` taxonomy entry; handlers log them and degrade, they
/// never propagate past the router boundary.
impl From<StorageError> for presencia_core::Error {
    fn from(e: StorageError) -> Self {
        presencia_core::Error::RecordService(e.to_string())
    }
}
