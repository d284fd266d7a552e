#![allow(async_fn_in_trait)]

//! The record-service seam between the gateway and the document store.
//!
//! The gateway's message handlers never touch repositories directly; they
//! consume this trait, which exposes exactly the reads and updates the
//! device protocol needs. Tests substitute an in-memory implementation.

use crate::error::StorageResult;
use crate::models::{AttendanceSession, UserRecord};
use crate::repositories::{
    SessionRepository, SqliteSessionRepository, SqliteUserRepository, UserRepository,
};
use chrono::{DateTime, Utc};
use presencia_core::{MeetingToken, TemplateId, UserId};
use sqlx::SqlitePool;
use std::future::Future;

/// Keyed-record operations consumed by the gateway.
pub trait RecordService: Send + Sync {
    /// Read a user by uid
    fn user_by_uid(
        &self,
        uid: &UserId,
    ) -> impl Future<Output = StorageResult<Option<UserRecord>>> + Send;

    /// Read the enrolled user owning a scanner template slot
    fn user_by_template(
        &self,
        template_id: &TemplateId,
    ) -> impl Future<Output = StorageResult<Option<UserRecord>>> + Send;

    /// Mark a user enrolled with the template slot the scanner assigned
    fn apply_enrollment(
        &self,
        uid: &UserId,
        template_id: &TemplateId,
    ) -> impl Future<Output = StorageResult<()>> + Send;

    /// Most recent attendance session for a user and meeting token
    fn latest_session(
        &self,
        uid: &UserId,
        token: &MeetingToken,
    ) -> impl Future<Output = StorageResult<Option<AttendanceSession>>> + Send;

    /// Write the exit timestamp on a session
    fn mark_session_exit(
        &self,
        session_id: &str,
        at: DateTime<Utc>,
    ) -> impl Future<Output = StorageResult<()>> + Send;
}

/// SQLite-backed record service composing the repositories.
pub struct SqliteRecordService {
    users: SqliteUserRepository,
    sessions: SqliteSessionRepository,
}

impl SqliteRecordService {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            users: SqliteUserRepository::new(pool.clone()),
            sessions: SqliteSessionRepository::new(pool),
        }
    }
}

impl RecordService for SqliteRecordService {
    async fn user_by_uid(&self, uid: &UserId) -> StorageResult<Option<UserRecord>> {
        self.users.find_by_uid(uid.as_str()).await
    }

    async fn user_by_template(
        &self,
        template_id: &TemplateId,
    ) -> StorageResult<Option<UserRecord>> {
        self.users.find_by_template(template_id.as_str()).await
    }

    async fn apply_enrollment(
        &self,
        uid: &UserId,
        template_id: &TemplateId,
    ) -> StorageResult<()> {
        self.users
            .apply_enrollment(uid.as_str(), template_id.as_str())
            .await
    }

    async fn latest_session(
        &self,
        uid: &UserId,
        token: &MeetingToken,
    ) -> StorageResult<Option<AttendanceSession>> {
        self.sessions
            .find_latest(uid.as_str(), token.as_str())
            .await
    }

    async fn mark_session_exit(&self, session_id: &str, at: DateTime<Utc>) -> StorageResult<()> {
        self.sessions.mark_exit(session_id, at).await
    }
}
