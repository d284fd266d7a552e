//! Gateway façade: the operations web callers invoke.
//!
//! Each operation validates its inputs and goes through the registry for
//! transmission. Only attendance verification suspends the caller, on a
//! pending-request ledger entry, until the scanner replies or the deadline
//! passes. Exit scans have no operation here: they are
//! device-initiated and handled entirely by the router.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use presencia_core::constants::{
    DEFAULT_VERIFY_TIMEOUT_MS, MAX_VERIFY_TIMEOUT_MS, MIN_VERIFY_TIMEOUT_MS,
};
use presencia_core::{Error, MeetingToken, Result, TemplateId, UserId};
use presencia_protocol::DeviceCommand;

use crate::ledger::PendingLedger;
use crate::registry::{BroadcastReport, DeviceRegistry};

/// Body of a fingerprint-registration request.
#[derive(Debug, Clone)]
pub struct RegistrationRequest {
    pub uid: String,
    pub name: String,
    pub email: String,
}

/// Body of an attendance-verification request.
#[derive(Debug, Clone)]
pub struct VerificationRequest {
    pub uid: String,
    pub name: String,
    pub template_id: String,
}

/// Entry point composing the registry, ledger, and router.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use presencia_gateway::{
///     DeviceRegistry, Gateway, PendingLedger, RegistryConfig, VerificationRequest,
/// };
///
/// # async fn example() -> presencia_core::Result<()> {
/// let registry = Arc::new(DeviceRegistry::new(RegistryConfig::default()));
/// let ledger = Arc::new(PendingLedger::new());
/// let gateway = Gateway::new(registry, ledger);
///
/// let request = VerificationRequest {
///     uid: "u-1".to_string(),
///     name: "Ada".to_string(),
///     template_id: "7".to_string(),
/// };
/// let matched = gateway.request_attendance_verification(&request).await?;
/// println!("match: {matched}");
/// # Ok(())
/// # }
/// ```
pub struct Gateway {
    registry: Arc<DeviceRegistry>,
    ledger: Arc<PendingLedger<bool>>,
    verify_timeout: Duration,
}

impl Gateway {
    /// Create a gateway with the default verification timeout (15 s).
    #[must_use]
    pub fn new(registry: Arc<DeviceRegistry>, ledger: Arc<PendingLedger<bool>>) -> Self {
        Self {
            registry,
            ledger,
            verify_timeout: Duration::from_millis(DEFAULT_VERIFY_TIMEOUT_MS),
        }
    }

    /// Override the verification timeout.
    ///
    /// Clamped to the supported range: below it a user cannot realistically
    /// present a finger, above it web callers hang too long.
    #[must_use]
    pub fn with_verify_timeout(mut self, timeout: Duration) -> Self {
        let ms = (timeout.as_millis() as u64).clamp(MIN_VERIFY_TIMEOUT_MS, MAX_VERIFY_TIMEOUT_MS);
        self.verify_timeout = Duration::from_millis(ms);
        self
    }

    /// Ask the scanner to start a supervised enrollment.
    ///
    /// Fire-and-forget: returns as soon as the command is dispatched. The
    /// enrollment outcome arrives later as a device event and is applied by
    /// the router; the web caller only needs confirmation of dispatch.
    ///
    /// # Errors
    /// `Error::InvalidArgument` if a field is blank;
    /// `Error::NoDeviceAvailable` if no scanner is connected.
    pub fn request_fingerprint_registration(
        &self,
        request: &RegistrationRequest,
    ) -> Result<BroadcastReport> {
        let uid = UserId::new(&request.uid)?;
        let name = required(&request.name, "name")?;
        let email = required(&request.email, "email")?;

        let command = DeviceCommand::RegisterFingerprint { uid, name, email };
        let report = self.registry.broadcast(&command)?;

        info!(
            uid = %request.uid,
            delivered = report.delivered,
            "Fingerprint registration dispatched"
        );
        Ok(report)
    }

    /// Ask the scanner to verify a fingerprint and await the match result.
    ///
    /// Suspends the caller until the scanner's `attendance_result` resolves
    /// the ledger entry or the configured deadline passes. This is the only
    /// façade operation that blocks beyond dispatch.
    ///
    /// # Errors
    /// `Error::InvalidArgument` if a field is blank;
    /// `Error::NoDeviceAvailable` if no scanner is connected (checked
    /// before the ledger is touched);
    /// `Error::DuplicateKey` if a verification for this uid is already
    /// pending;
    /// `Error::Timeout` if the scanner never replies; the ledger entry is
    /// already cleaned up when this surfaces.
    pub async fn request_attendance_verification(
        &self,
        request: &VerificationRequest,
    ) -> Result<bool> {
        self.request_attendance_verification_with_timeout(request, self.verify_timeout)
            .await
    }

    /// Same as [`request_attendance_verification`] with an explicit
    /// per-call timeout.
    ///
    /// [`request_attendance_verification`]: Gateway::request_attendance_verification
    pub async fn request_attendance_verification_with_timeout(
        &self,
        request: &VerificationRequest,
        timeout: Duration,
    ) -> Result<bool> {
        let uid = UserId::new(&request.uid)?;
        let name = required(&request.name, "name")?;
        let template_id = TemplateId::new(&request.template_id)?;

        // Checked before registering so an absent scanner leaves no ledger
        // entry behind.
        if !self.registry.has_connection() {
            return Err(Error::NoDeviceAvailable);
        }

        let handle = self.ledger.register(uid.clone(), timeout)?;

        let command = DeviceCommand::VerifyAttendance {
            uid: uid.clone(),
            name,
            template_id,
        };
        if let Err(e) = self.registry.broadcast(&command) {
            // The connection vanished between the check and the send; the
            // entry must not linger until its deadline.
            self.ledger.withdraw(&uid);
            return Err(e);
        }

        debug!(uid = %uid, timeout_ms = timeout.as_millis() as u64, "Awaiting attendance result");
        handle.outcome().await
    }

    /// Push an in-progress meeting's QR token to the scanner display.
    ///
    /// # Errors
    /// `Error::NoDeviceAvailable` if no scanner is connected.
    pub fn announce_meeting_token(&self, token: &MeetingToken) -> Result<BroadcastReport> {
        let command = DeviceCommand::MeetingToken {
            token_qr: token.clone(),
        };
        let report = self.registry.broadcast(&command)?;
        debug!(token = %token, delivered = report.delivered, "Meeting token announced");
        Ok(report)
    }
}

fn required(value: &str, field: &'static str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(Error::InvalidArgument { field });
    }
    Ok(value.to_string())
}
