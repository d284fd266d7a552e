#![allow(async_fn_in_trait)]

use crate::error::{StorageError, StorageResult};
use crate::models::AttendanceSession;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

/// Repository trait for attendance session operations
pub trait SessionRepository: Send + Sync {
    /// Create a new attendance session
    async fn create(&self, session: &AttendanceSession) -> StorageResult<()>;

    /// Most recent session for a user and meeting token, regardless of
    /// whether it has been closed. The exit-scan handler inspects the
    /// timestamps itself to distinguish "no session" from "already
    /// checked out".
    async fn find_latest(
        &self,
        uid: &str,
        token: &str,
    ) -> StorageResult<Option<AttendanceSession>>;

    /// Write the exit timestamp on a session
    async fn mark_exit(&self, session_id: &str, at: DateTime<Utc>) -> StorageResult<()>;
}

/// SQLite implementation of SessionRepository
pub struct SqliteSessionRepository {
    pool: SqlitePool,
}

impl SqliteSessionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl SessionRepository for SqliteSessionRepository {
    async fn create(&self, session: &AttendanceSession) -> StorageResult<()> {
        sqlx::query(
            r#"
            INSERT INTO attendance_sessions (
                id, uid, token, entered_at, exited_at, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&session.id)
        .bind(&session.uid)
        .bind(&session.token)
        .bind(session.entered_at)
        .bind(session.exited_at)
        .bind(session.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_latest(
        &self,
        uid: &str,
        token: &str,
    ) -> StorageResult<Option<AttendanceSession>> {
        let session = sqlx::query_as::<_, AttendanceSession>(
            r#"
            SELECT id, uid, token, entered_at, exited_at, created_at
            FROM attendance_sessions
            WHERE uid = ? AND token = ?
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(uid)
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    async fn mark_exit(&self, session_id: &str, at: DateTime<Utc>) -> StorageResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE attendance_sessions
            SET exited_at = ?
            WHERE id = ?
            "#,
        )
        .bind(at)
        .bind(session_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound {
                entity_type: "AttendanceSession".to_string(),
                field: "id".to_string(),
                value: session_id.to_string(),
            });
        }

        Ok(())
    }
}
