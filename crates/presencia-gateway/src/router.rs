//! Device message router: classify inbound frames and dispatch.
//!
//! The router is a dispatch table keyed by the frame's `action` tag:
//! handlers are registered at startup and unknown tags fall through to a
//! default no-op, so new device messages are added by registration rather
//! than by editing a match.
//!
//! Per-message pipeline, stateless across messages:
//!
//! 1. Parse the raw bytes; failure is logged and the frame dropped.
//! 2. Require the `action` tag; absence is logged and the frame dropped.
//! 3. Dispatch to the registered handler.
//!
//! Handler errors, including record-service failures, are caught here and
//! logged; nothing a handler does can take down the message loop or the
//! connection the frame arrived on.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use futures::future::BoxFuture;
use tracing::{debug, info, warn};

use presencia_core::{Result, UserId};
use presencia_protocol::{
    AttendanceResult, CheckoutReply, CheckoutRequest, DeviceEvent, RegisterResult, tags,
};
use presencia_storage::RecordService;

use crate::connection::ReplySink;
use crate::ledger::PendingLedger;

/// One entry in the dispatch table.
///
/// Returns a boxed future so handlers stay object-safe; implementations
/// deserialize their own payload from the event body.
pub trait EventHandler: Send + Sync {
    fn handle<'a>(
        &'a self,
        event: &'a DeviceEvent,
        reply: &'a ReplySink,
    ) -> BoxFuture<'a, Result<()>>;
}

/// Tag-keyed dispatcher for inbound scanner frames.
pub struct MessageRouter {
    handlers: HashMap<&'static str, Box<dyn EventHandler>>,
}

impl MessageRouter {
    /// Create an empty router; handlers are added with [`register`].
    ///
    /// [`register`]: MessageRouter::register
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Create a router wired with the standard handlers for the known
    /// inbound tags.
    #[must_use]
    pub fn standard<S: RecordService + 'static>(
        records: Arc<S>,
        ledger: Arc<PendingLedger<bool>>,
    ) -> Self {
        let mut router = Self::new();
        router.register(
            tags::FINGERPRINT_REGISTER_RESULT,
            RegisterResultHandler {
                records: Arc::clone(&records),
            },
        );
        router.register(tags::ATTENDANCE_RESULT, AttendanceResultHandler { ledger });
        router.register(tags::CHECKOUT_RESULT, CheckoutHandler { records });
        router
    }

    /// Register a handler for an action tag, replacing any existing one.
    pub fn register<H: EventHandler + 'static>(&mut self, action: &'static str, handler: H) {
        self.handlers.insert(action, Box::new(handler));
    }

    /// Parse and dispatch one raw frame.
    ///
    /// Never fails: malformed frames and handler errors are logged and the
    /// frame dropped, leaving the connection usable.
    pub async fn dispatch_raw(&self, raw: &[u8], reply: &ReplySink) {
        let event = match DeviceEvent::parse(raw) {
            Ok(event) => event,
            Err(e) => {
                warn!(error = %e, "Dropping malformed device message");
                return;
            }
        };
        self.dispatch(&event, reply).await;
    }

    /// Dispatch a classified event.
    pub async fn dispatch(&self, event: &DeviceEvent, reply: &ReplySink) {
        match self.handlers.get(event.action.as_str()) {
            Some(handler) => {
                if let Err(e) = handler.handle(event, reply).await {
                    warn!(
                        action = %event.action,
                        error = %e,
                        "Handler failed, message dropped"
                    );
                }
            }
            None => {
                debug!(action = %event.action, "Ignoring unrecognized device message");
            }
        }
    }
}

impl Default for MessageRouter {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies enrollment results to the user record.
///
/// No ledger interaction: registration is fire-and-forget from the
/// gateway's perspective, the web caller was answered at dispatch time.
struct RegisterResultHandler<S> {
    records: Arc<S>,
}

impl<S: RecordService + 'static> EventHandler for RegisterResultHandler<S> {
    fn handle<'a>(
        &'a self,
        event: &'a DeviceEvent,
        _reply: &'a ReplySink,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let payload: RegisterResult = event.payload()?;

            if !payload.register_status {
                warn!(uid = %payload.uid, "Scanner reported enrollment failure");
                return Ok(());
            }

            let Some(template_id) = payload.template_id else {
                warn!(
                    uid = %payload.uid,
                    "Enrollment success without template id, record not updated"
                );
                return Ok(());
            };

            self.records
                .apply_enrollment(&payload.uid, &template_id)
                .await?;
            info!(uid = %payload.uid, template_id = %template_id, "User enrolled");
            Ok(())
        })
    }
}

/// Resolves attendance replies against the pending-request ledger.
struct AttendanceResultHandler {
    ledger: Arc<PendingLedger<bool>>,
}

impl EventHandler for AttendanceResultHandler {
    fn handle<'a>(
        &'a self,
        event: &'a DeviceEvent,
        _reply: &'a ReplySink,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let payload: AttendanceResult = event.payload()?;
            // Unknown or expired uids are the ledger's no-op case.
            self.ledger.resolve(&payload.uid, payload.matched);
            Ok(())
        })
    }
}

/// Answers device-initiated exit scans.
///
/// This exchange is request-reply over the same connection and synchronous
/// within the handler; it never touches the ledger. A record-service
/// failure mid-lookup drops the reply (the scanner times out on its side)
/// rather than reporting a wrong outcome.
struct CheckoutHandler<S> {
    records: Arc<S>,
}

impl<S: RecordService + 'static> CheckoutHandler<S> {
    async fn checkout(&self, request: &CheckoutRequest) -> Result<CheckoutReply> {
        let Some(user) = self.records.user_by_template(&request.template_id).await? else {
            debug!(template_id = %request.template_id, "Exit scan from unenrolled template");
            return Ok(CheckoutReply::not_enrolled());
        };

        let uid = UserId::new(&user.uid)?;
        let Some(session) = self.records.latest_session(&uid, &request.token).await? else {
            debug!(uid = %uid, token = %request.token, "Exit scan with no session");
            return Ok(CheckoutReply::no_matching_session());
        };

        // A session that never completed its entry scan cannot be exited.
        if session.entered_at.is_none() {
            return Ok(CheckoutReply::no_matching_session());
        }

        if session.exited_at.is_some() {
            debug!(uid = %uid, session_id = %session.id, "Repeated exit scan");
            return Ok(CheckoutReply::already_checked_out(
                Some(user.name),
                user.title,
            ));
        }

        self.records
            .mark_session_exit(&session.id, Utc::now())
            .await?;
        info!(uid = %uid, session_id = %session.id, "Checkout recorded");
        Ok(CheckoutReply::checked_out_ok(Some(user.name), user.title))
    }
}

impl<S: RecordService + 'static> EventHandler for CheckoutHandler<S> {
    fn handle<'a>(
        &'a self,
        event: &'a DeviceEvent,
        reply: &'a ReplySink,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let payload: CheckoutRequest = event.payload()?;
            let answer = self.checkout(&payload).await?;
            reply.send(&answer)?;
            Ok(())
        })
    }
}
