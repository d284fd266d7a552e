#![allow(async_fn_in_trait)]

use crate::error::{StorageError, StorageResult};
use crate::models::UserRecord;
use chrono::Utc;
use sqlx::SqlitePool;

/// Repository trait for user record operations
///
/// This trait uses native async trait methods (Edition 2024 feature),
/// eliminating the need for the async-trait crate while maintaining
/// full async/await support in trait methods.
pub trait UserRepository: Send + Sync {
    /// Find a user by uid
    async fn find_by_uid(&self, uid: &str) -> StorageResult<Option<UserRecord>>;

    /// Find the enrolled user owning a scanner template slot
    async fn find_by_template(&self, template_id: &str) -> StorageResult<Option<UserRecord>>;

    /// Create a new user record
    async fn create(&self, user: &UserRecord) -> StorageResult<()>;

    /// Record a successful enrollment: mark the user enrolled and store
    /// the template slot the scanner assigned
    async fn apply_enrollment(&self, uid: &str, template_id: &str) -> StorageResult<()>;
}

/// SQLite implementation of UserRepository
pub struct SqliteUserRepository {
    pool: SqlitePool,
}

impl SqliteUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl UserRepository for SqliteUserRepository {
    async fn find_by_uid(&self, uid: &str) -> StorageResult<Option<UserRecord>> {
        let user = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT uid, name, email, title,
                   fingerprint_enrolled, template_id,
                   created_at, updated_at
            FROM users
            WHERE uid = ?
            "#,
        )
        .bind(uid)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_template(&self, template_id: &str) -> StorageResult<Option<UserRecord>> {
        let user = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT uid, name, email, title,
                   fingerprint_enrolled, template_id,
                   created_at, updated_at
            FROM users
            WHERE template_id = ? AND fingerprint_enrolled = 1
            "#,
        )
        .bind(template_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn create(&self, user: &UserRecord) -> StorageResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (
                uid, name, email, title,
                fingerprint_enrolled, template_id,
                created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.uid)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.title)
        .bind(user.fingerprint_enrolled)
        .bind(&user.template_id)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn apply_enrollment(&self, uid: &str, template_id: &str) -> StorageResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET fingerprint_enrolled = 1, template_id = ?, updated_at = ?
            WHERE uid = ?
            "#,
        )
        .bind(template_id)
        .bind(Utc::now())
        .bind(uid)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound {
                entity_type: "User".to_string(),
                field: "uid".to_string(),
                value: uid.to_string(),
            });
        }

        Ok(())
    }
}
