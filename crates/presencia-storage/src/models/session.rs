use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One user's attendance record for one meeting.
///
/// Created when the entry scan matches, closed when the exit scan writes
/// `exited_at`. A session with no `exited_at` is open; a session with no
/// `entered_at` never completed its entry scan and cannot be checked out.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AttendanceSession {
    /// Surrogate key (UUID v4)
    pub id: String,

    /// Owning user's uid
    pub uid: String,

    /// Meeting token this session belongs to
    pub token: String,

    /// Entry scan timestamp
    pub entered_at: Option<DateTime<Utc>>,

    /// Exit scan timestamp
    pub exited_at: Option<DateTime<Utc>>,

    /// Record creation timestamp
    pub created_at: DateTime<Utc>,
}

impl AttendanceSession {
    /// Open a new session with the entry timestamp set.
    #[must_use]
    pub fn begin(uid: &str, token: &str, entered_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            uid: uid.to_string(),
            token: token.to_string(),
            entered_at: Some(entered_at),
            exited_at: None,
            created_at: entered_at,
        }
    }

    /// Whether the session has an entry scan and no exit scan yet.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.entered_at.is_some() && self.exited_at.is_none()
    }
}
