use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// User identifier (non-empty, trimmed).
///
/// This is the correlation key for attendance verification: at most one
/// in-flight verification may exist per `UserId` at any instant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Create a new user id with validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidArgument` if the id is empty or whitespace.
    pub fn new(uid: &str) -> Result<Self> {
        let uid = uid.trim();
        if uid.is_empty() {
            return Err(Error::InvalidArgument { field: "uid" });
        }
        Ok(UserId(uid.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for UserId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        UserId::new(s)
    }
}

/// Fingerprint template slot identifier assigned by the scanner.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateId(String);

impl TemplateId {
    /// Create a new template id with validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidArgument` if the id is empty or whitespace.
    pub fn new(id: &str) -> Result<Self> {
        let id = id.trim();
        if id.is_empty() {
            return Err(Error::InvalidArgument { field: "templateId" });
        }
        Ok(TemplateId(id.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TemplateId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        TemplateId::new(s)
    }
}

/// Meeting token identifying one attendance event.
///
/// Open attendance sessions are keyed by user and meeting token; the same
/// token is also what the scanner renders as a QR code between scans.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MeetingToken(String);

impl MeetingToken {
    /// Create a new meeting token with validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidArgument` if the token is empty or whitespace.
    pub fn new(token: &str) -> Result<Self> {
        let token = token.trim();
        if token.is_empty() {
            return Err(Error::InvalidArgument { field: "token" });
        }
        Ok(MeetingToken(token.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MeetingToken {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outcome of an exit-scan lookup.
///
/// Serialized as the `answer` field of the checkout reply frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutOutcome {
    /// No enrolled user matches the scanned template.
    NotEnrolled,
    /// The user has no open session for this meeting token.
    NoMatchingSession,
    /// The session already carries an exit timestamp.
    AlreadyCheckedOut,
    /// Exit timestamp written.
    CheckedOutOk,
}

impl CheckoutOutcome {
    /// Returns `true` if the exit timestamp was written by this scan.
    #[inline]
    #[must_use]
    pub fn is_checked_out(self) -> bool {
        matches!(self, CheckoutOutcome::CheckedOutOk)
    }

    /// Wire string for the `answer` field.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            CheckoutOutcome::NotEnrolled => "not_enrolled",
            CheckoutOutcome::NoMatchingSession => "no_matching_session",
            CheckoutOutcome::AlreadyCheckedOut => "already_checked_out",
            CheckoutOutcome::CheckedOutOk => "checked_out_ok",
        }
    }
}

impl fmt::Display for CheckoutOutcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("u-123", "u-123")]
    #[case("  u-123  ", "u-123")]
    #[case("9f8e7d", "9f8e7d")]
    fn test_user_id_valid(#[case] input: &str, #[case] expected: &str) {
        let uid: UserId = input.parse().unwrap();
        assert_eq!(uid.as_str(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    fn test_user_id_invalid(#[case] input: &str) {
        assert!(UserId::new(input).is_err());
    }

    #[test]
    fn test_template_id_valid() {
        let id: TemplateId = "42".parse().unwrap();
        assert_eq!(id.as_str(), "42");
    }

    #[test]
    fn test_template_id_invalid() {
        assert!(TemplateId::new(" ").is_err());
    }

    #[test]
    fn test_meeting_token() {
        let token = MeetingToken::new("TOK-2026").unwrap();
        assert_eq!(token.as_str(), "TOK-2026");
        assert!(MeetingToken::new("").is_err());
    }

    #[rstest]
    #[case(CheckoutOutcome::NotEnrolled, "not_enrolled")]
    #[case(CheckoutOutcome::NoMatchingSession, "no_matching_session")]
    #[case(CheckoutOutcome::AlreadyCheckedOut, "already_checked_out")]
    #[case(CheckoutOutcome::CheckedOutOk, "checked_out_ok")]
    fn test_checkout_outcome_wire_names(
        #[case] outcome: CheckoutOutcome,
        #[case] expected: &str,
    ) {
        assert_eq!(outcome.as_str(), expected);
    }

    #[test]
    fn test_checkout_outcome_is_checked_out() {
        assert!(CheckoutOutcome::CheckedOutOk.is_checked_out());
        assert!(!CheckoutOutcome::AlreadyCheckedOut.is_checked_out());
    }
}
