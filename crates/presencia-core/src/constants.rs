//! Protocol-level constants for the scanner gateway.
//!
//! Every frame exchanged with the scanner is one JSON object per line,
//! discriminated by the [`TAG_FIELD`] key:
//!
//! ```text
//! {"action":"verify_attendance","uid":"u-1","name":"Ada","templateId":"7"}\n
//! ```
//!
//! Timeouts and the connection-replacement grace window are defined here so
//! that every crate agrees on the defaults; both are tunable at the
//! configuration structs that consume them.

/// JSON key carrying the message discriminator on both wire directions.
pub const TAG_FIELD: &str = "action";

// ============================================================================
// Timeout Configuration
// ============================================================================

/// Default deadline for an attendance-verification reply (milliseconds).
///
/// Verification involves a physical finger placement, so this is far longer
/// than a network round trip.
///
/// # Value: 15000ms (15 seconds)
pub const DEFAULT_VERIFY_TIMEOUT_MS: u64 = 15_000;

/// Minimum allowed verification timeout (milliseconds).
///
/// Values below this expire before a user can realistically present a
/// finger to the scanner.
///
/// # Value: 1000ms
pub const MIN_VERIFY_TIMEOUT_MS: u64 = 1_000;

/// Maximum allowed verification timeout (milliseconds).
///
/// Values above this leave web callers suspended for too long.
///
/// # Value: 60000ms (60 seconds)
pub const MAX_VERIFY_TIMEOUT_MS: u64 = 60_000;

// ============================================================================
// Connection Replacement
// ============================================================================

/// Default grace window between notifying a superseded connection and
/// evicting it (milliseconds).
///
/// The scanner reboots and reconnects without a clean handshake. The grace
/// window lets the close notice flush and lets the old socket's disconnect
/// event arrive without racing the adoption of the new connection. Must be
/// greater than zero; not validated against slow links, so deployments with
/// high link latency should raise it.
///
/// # Value: 100ms
pub const DEFAULT_REPLACEMENT_GRACE_MS: u64 = 100;

/// Close-notice reason sent to connections evicted by a replacement.
pub const CLOSE_REASON_SUPERSEDED: &str = "superseded by new connection";

// ============================================================================
// Framing
// ============================================================================

/// Maximum accepted frame size in bytes (64 KB).
///
/// Frames above this are rejected before parsing to bound memory use on a
/// misbehaving or hostile peer. Legitimate scanner frames are well under
/// 1 KB.
pub const MAX_FRAME_SIZE: usize = 64 * 1024;
