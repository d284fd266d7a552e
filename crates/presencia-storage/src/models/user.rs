use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User entity as stored in the record service.
///
/// `uid` is the natural key shared with the web application; it is also the
/// correlation key for attendance verification. `template_id` is assigned
/// by the scanner during enrollment and is the only key the scanner itself
/// knows, so exit scans look users up by template.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserRecord {
    /// Natural key, matches the web application's user id
    pub uid: String,

    /// Full display name
    pub name: String,

    /// Contact e-mail, carried on enrollment commands for display on the
    /// scanner
    pub email: String,

    /// Optional role/title shown on checkout replies
    pub title: Option<String>,

    /// Whether a fingerprint template has been stored on the scanner
    pub fingerprint_enrolled: bool,

    /// Template slot on the scanner, set when enrollment succeeds
    pub template_id: Option<String>,

    /// Record creation timestamp
    pub created_at: DateTime<Utc>,

    /// Record last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl UserRecord {
    /// Create an unenrolled user record.
    #[must_use]
    pub fn new(uid: &str, name: &str, email: &str) -> Self {
        let now = Utc::now();
        Self {
            uid: uid.to_string(),
            name: name.to_string(),
            email: email.to_string(),
            title: None,
            fingerprint_enrolled: false,
            template_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether this user can answer verification and exit scans.
    #[must_use]
    pub fn is_enrolled(&self) -> bool {
        self.fingerprint_enrolled && self.template_id.is_some()
    }
}
