//! In-memory record service for gateway unit tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use presencia_core::{MeetingToken, TemplateId, UserId};
use presencia_storage::{
    AttendanceSession, RecordService, StorageError, StorageResult, UserRecord,
};

/// Vec-backed stand-in for the SQLite record service, with one-shot
/// failure injection for handler containment tests.
pub struct MemoryRecords {
    users: Mutex<Vec<UserRecord>>,
    sessions: Mutex<Vec<AttendanceSession>>,
    fail_next: AtomicBool,
}

impl MemoryRecords {
    pub fn new() -> Self {
        Self {
            users: Mutex::new(Vec::new()),
            sessions: Mutex::new(Vec::new()),
            fail_next: AtomicBool::new(false),
        }
    }

    pub fn add_user(&self, uid: &str, name: &str, template: Option<&str>) {
        let mut user = UserRecord::new(uid, name, &format!("{uid}@example.org"));
        if let Some(template) = template {
            user.fingerprint_enrolled = true;
            user.template_id = Some(template.to_string());
        }
        self.users.lock().unwrap().push(user);
    }

    pub fn set_title(&self, uid: &str, title: &str) {
        let mut users = self.users.lock().unwrap();
        if let Some(user) = users.iter_mut().find(|u| u.uid == uid) {
            user.title = Some(title.to_string());
        }
    }

    pub fn open_session(&self, uid: &str, token: &str) {
        self.sessions
            .lock()
            .unwrap()
            .push(AttendanceSession::begin(uid, token, Utc::now()));
    }

    pub fn open_session_without_entry(&self, uid: &str, token: &str) {
        let mut session = AttendanceSession::begin(uid, token, Utc::now());
        session.entered_at = None;
        self.sessions.lock().unwrap().push(session);
    }

    pub fn user(&self, uid: &str) -> Option<UserRecord> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.uid == uid)
            .cloned()
    }

    /// Make the next record operation fail once.
    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    fn check_fail(&self) -> StorageResult<()> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(StorageError::Configuration("injected failure".to_string()));
        }
        Ok(())
    }
}

impl RecordService for MemoryRecords {
    async fn user_by_uid(&self, uid: &UserId) -> StorageResult<Option<UserRecord>> {
        self.check_fail()?;
        Ok(self.user(uid.as_str()))
    }

    async fn user_by_template(
        &self,
        template_id: &TemplateId,
    ) -> StorageResult<Option<UserRecord>> {
        self.check_fail()?;
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.fingerprint_enrolled && u.template_id.as_deref() == Some(template_id.as_str()))
            .cloned())
    }

    async fn apply_enrollment(
        &self,
        uid: &UserId,
        template_id: &TemplateId,
    ) -> StorageResult<()> {
        self.check_fail()?;
        let mut users = self.users.lock().unwrap();
        let user = users
            .iter_mut()
            .find(|u| u.uid == uid.as_str())
            .ok_or_else(|| StorageError::NotFound {
                entity_type: "User".to_string(),
                field: "uid".to_string(),
                value: uid.to_string(),
            })?;
        user.fingerprint_enrolled = true;
        user.template_id = Some(template_id.as_str().to_string());
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn latest_session(
        &self,
        uid: &UserId,
        token: &MeetingToken,
    ) -> StorageResult<Option<AttendanceSession>> {
        self.check_fail()?;
        Ok(self
            .sessions
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.uid == uid.as_str() && s.token == token.as_str())
            .max_by_key(|s| s.created_at)
            .cloned())
    }

    async fn mark_session_exit(&self, session_id: &str, at: DateTime<Utc>) -> StorageResult<()> {
        self.check_fail()?;
        let mut sessions = self.sessions.lock().unwrap();
        let session = sessions
            .iter_mut()
            .find(|s| s.id == session_id)
            .ok_or_else(|| StorageError::NotFound {
                entity_type: "AttendanceSession".to_string(),
                field: "id".to_string(),
                value: session_id.to_string(),
            })?;
        session.exited_at = Some(at);
        Ok(())
    }
}
