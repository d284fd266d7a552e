//! Outbound frames: gateway-to-scanner commands and checkout replies.
//!
//! Every outbound frame is a JSON object discriminated by its `action`
//! field. The command set is open: adding a variant here is a compile-time
//! change, and the scanner ignores actions it does not know.

use presencia_core::{CheckoutOutcome, MeetingToken, TemplateId, UserId};
use serde::{Deserialize, Serialize};

/// Command sent to the scanner.
///
/// Serialized with the `action` tag matching the wire protocol:
///
/// ```
/// use presencia_core::{TemplateId, UserId};
/// use presencia_protocol::DeviceCommand;
///
/// let cmd = DeviceCommand::VerifyAttendance {
///     uid: UserId::new("u-1").unwrap(),
///     name: "Ada".to_string(),
///     template_id: TemplateId::new("7").unwrap(),
/// };
///
/// let json = serde_json::to_string(&cmd).unwrap();
/// assert!(json.contains(r#""action":"verify_attendance""#));
/// assert!(json.contains(r#""templateId":"7""#));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum DeviceCommand {
    /// Start a supervised enrollment on the scanner. Fire-and-forget: the
    /// result arrives later as a `fingerprint_register_result` event.
    RegisterFingerprint {
        uid: UserId,
        name: String,
        email: String,
    },

    /// Ask the scanner to match a finger against the stored template.
    /// The reply is correlated back through the pending-request ledger.
    VerifyAttendance {
        uid: UserId,
        name: String,
        #[serde(rename = "templateId")]
        template_id: TemplateId,
    },

    /// Push the QR token of an in-progress meeting to the scanner display.
    MeetingToken {
        #[serde(rename = "tokenQR")]
        token_qr: MeetingToken,
    },

    /// Tell a connection it is about to be dropped and why.
    CloseNotice { reason: String },
}

impl DeviceCommand {
    /// Wire tag of this command.
    #[must_use]
    pub fn action(&self) -> &'static str {
        match self {
            DeviceCommand::RegisterFingerprint { .. } => "register_fingerprint",
            DeviceCommand::VerifyAttendance { .. } => "verify_attendance",
            DeviceCommand::MeetingToken { .. } => "meeting_token",
            DeviceCommand::CloseNotice { .. } => "close_notice",
        }
    }
}

/// Synchronous answer to a `checkout_result` event, written back on the
/// connection the event arrived on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutReply {
    pub answer: CheckoutOutcome,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl CheckoutReply {
    /// No enrolled user matches the scanned template.
    #[must_use]
    pub fn not_enrolled() -> Self {
        Self {
            answer: CheckoutOutcome::NotEnrolled,
            name: None,
            title: None,
        }
    }

    /// No open session for this user and meeting token.
    #[must_use]
    pub fn no_matching_session() -> Self {
        Self {
            answer: CheckoutOutcome::NoMatchingSession,
            name: None,
            title: None,
        }
    }

    /// The session already carries an exit timestamp.
    #[must_use]
    pub fn already_checked_out(name: Option<String>, title: Option<String>) -> Self {
        Self {
            answer: CheckoutOutcome::AlreadyCheckedOut,
            name,
            title,
        }
    }

    /// Exit timestamp written by this scan.
    #[must_use]
    pub fn checked_out_ok(name: Option<String>, title: Option<String>) -> Self {
        Self {
            answer: CheckoutOutcome::CheckedOutOk,
            name,
            title,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn uid() -> UserId {
        UserId::new("u-1").unwrap()
    }

    #[test]
    fn test_register_fingerprint_wire_shape() {
        let cmd = DeviceCommand::RegisterFingerprint {
            uid: uid(),
            name: "Ada Lovelace".to_string(),
            email: "ada@example.org".to_string(),
        };

        let value: serde_json::Value = serde_json::to_value(&cmd).unwrap();
        assert_eq!(value["action"], "register_fingerprint");
        assert_eq!(value["uid"], "u-1");
        assert_eq!(value["name"], "Ada Lovelace");
        assert_eq!(value["email"], "ada@example.org");
    }

    #[test]
    fn test_verify_attendance_wire_shape() {
        let cmd = DeviceCommand::VerifyAttendance {
            uid: uid(),
            name: "Ada".to_string(),
            template_id: TemplateId::new("7").unwrap(),
        };

        let value: serde_json::Value = serde_json::to_value(&cmd).unwrap();
        assert_eq!(value["action"], "verify_attendance");
        assert_eq!(value["templateId"], "7");
    }

    #[test]
    fn test_meeting_token_wire_shape() {
        let cmd = DeviceCommand::MeetingToken {
            token_qr: MeetingToken::new("TOK-1").unwrap(),
        };

        let value: serde_json::Value = serde_json::to_value(&cmd).unwrap();
        assert_eq!(value["action"], "meeting_token");
        assert_eq!(value["tokenQR"], "TOK-1");
    }

    #[rstest]
    #[case(CheckoutReply::not_enrolled(), "not_enrolled", false)]
    #[case(CheckoutReply::no_matching_session(), "no_matching_session", false)]
    #[case(
        CheckoutReply::checked_out_ok(Some("Ada".into()), Some("Engineer".into())),
        "checked_out_ok",
        true
    )]
    fn test_checkout_reply_wire_shape(
        #[case] reply: CheckoutReply,
        #[case] answer: &str,
        #[case] has_display: bool,
    ) {
        let value: serde_json::Value = serde_json::to_value(&reply).unwrap();
        assert_eq!(value["answer"], answer);
        assert_eq!(value.get("name").is_some(), has_display);
        assert_eq!(value.get("title").is_some(), has_display);
    }

    #[test]
    fn test_action_names_match_serde_tags() {
        let cmd = DeviceCommand::CloseNotice {
            reason: "shutdown".to_string(),
        };
        let value: serde_json::Value = serde_json::to_value(&cmd).unwrap();
        assert_eq!(value["action"], cmd.action());
    }
}
