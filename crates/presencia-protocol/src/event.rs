//! Inbound frames: scanner-to-gateway events.
//!
//! Inbound frames are parsed in two stages. [`DeviceEvent::parse`] only
//! validates JSON and extracts the `action` discriminator; payload
//! deserialization happens per handler, so one malformed field affects one
//! handler and never the routing loop. Unknown actions are valid frames and
//! are dropped downstream, not rejected here.

use presencia_core::constants::TAG_FIELD;
use presencia_core::{Error, MeetingToken, Result, TemplateId, UserId};
use serde::Deserialize;
use serde_json::Value;

/// Known inbound action tags.
pub mod tags {
    /// Outcome of a supervised enrollment started by `register_fingerprint`.
    pub const FINGERPRINT_REGISTER_RESULT: &str = "fingerprint_register_result";
    /// Match outcome for a `verify_attendance` command.
    pub const ATTENDANCE_RESULT: &str = "attendance_result";
    /// Device-initiated exit scan, answered synchronously on the same
    /// connection.
    pub const CHECKOUT_RESULT: &str = "checkout_result";
}

/// A classified inbound frame: the `action` tag plus the raw body.
///
/// # Example
///
/// ```
/// use presencia_protocol::DeviceEvent;
///
/// let event = DeviceEvent::parse(br#"{"action":"attendance_result","uid":"u-1","match":true}"#)
///     .unwrap();
/// assert_eq!(event.action, "attendance_result");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceEvent {
    /// Wire discriminator from the `action` field.
    pub action: String,

    /// Full frame body; handlers deserialize their own payload from it.
    pub body: Value,
}

impl DeviceEvent {
    /// Parse raw frame bytes into a classified event.
    ///
    /// # Errors
    /// Returns `Error::MalformedDeviceMessage` if the bytes are not a JSON
    /// object or the `action` field is absent or not a string. Callers log
    /// and drop such frames; the error never crosses the router boundary.
    pub fn parse(raw: &[u8]) -> Result<Self> {
        let body: Value =
            serde_json::from_slice(raw).map_err(|e| Error::MalformedDeviceMessage {
                reason: format!("invalid JSON: {e}"),
            })?;

        if !body.is_object() {
            return Err(Error::MalformedDeviceMessage {
                reason: format!("expected object, got {body}"),
            });
        }

        let action = body
            .get(TAG_FIELD)
            .and_then(Value::as_str)
            .ok_or_else(|| Error::MalformedDeviceMessage {
                reason: format!("missing '{TAG_FIELD}' field"),
            })?
            .to_string();

        Ok(DeviceEvent { action, body })
    }

    /// Deserialize the body into a typed payload.
    ///
    /// # Errors
    /// Returns `Error::MalformedDeviceMessage` if the body does not match
    /// the payload shape.
    pub fn payload<'de, T: Deserialize<'de>>(&'de self) -> Result<T> {
        T::deserialize(&self.body).map_err(|e| Error::MalformedDeviceMessage {
            reason: format!("invalid {} payload: {e}", self.action),
        })
    }
}

/// Payload of [`tags::FINGERPRINT_REGISTER_RESULT`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RegisterResult {
    pub uid: UserId,

    /// Whether the scanner stored the template.
    pub register_status: bool,

    /// Template slot assigned on success.
    #[serde(rename = "templateId", default)]
    pub template_id: Option<TemplateId>,
}

/// Payload of [`tags::ATTENDANCE_RESULT`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AttendanceResult {
    pub uid: UserId,

    #[serde(rename = "match")]
    pub matched: bool,
}

/// Payload of [`tags::CHECKOUT_RESULT`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CheckoutRequest {
    #[serde(rename = "templateId")]
    pub template_id: TemplateId,

    pub token: MeetingToken,
}
