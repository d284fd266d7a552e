//! Pending-request ledger: one-shot correlation with timeout.
//!
//! A caller awaiting a scanner reply registers its correlation key (the
//! user id) and gets back a [`PendingHandle`]. The entry is destroyed by
//! exactly one of two mutually exclusive paths:
//!
//! - a matching reply arrives and [`PendingLedger::resolve`] completes the
//!   handle with the value, cancelling the timer;
//! - the deadline elapses and the timer task completes the handle with a
//!   timeout, removing the entry.
//!
//! Whichever path removes the entry from the map (under the lock) owns the
//! completion sender, so double completion is structurally impossible: the
//! loser finds the key gone and becomes a no-op.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::AbortHandle;
use tracing::debug;

use presencia_core::{Error, Result, UserId};

enum Outcome<V> {
    Resolved(V),
    TimedOut,
}

struct PendingEntry<V> {
    tx: oneshot::Sender<Outcome<V>>,
    timer: AbortHandle,
}

/// Awaitable side of one registered correlation.
pub struct PendingHandle<V> {
    rx: oneshot::Receiver<Outcome<V>>,
    timeout_ms: u64,
}

impl<V> PendingHandle<V> {
    /// Wait for the reply or the deadline, whichever fires first.
    ///
    /// # Errors
    /// Returns `Error::Timeout` if the deadline elapsed, or if the entry
    /// was withdrawn before completing.
    pub async fn outcome(self) -> Result<V> {
        match self.rx.await {
            Ok(Outcome::Resolved(value)) => Ok(value),
            Ok(Outcome::TimedOut) | Err(_) => Err(Error::Timeout {
                ms: self.timeout_ms,
            }),
        }
    }
}

/// Correlation map keyed by user id.
///
/// All mutation happens under one lock, so resolve-vs-timeout is decided
/// exactly once per key regardless of runtime threading. The map sits
/// behind an `Arc` shared with the per-entry timer tasks.
pub struct PendingLedger<V> {
    entries: Arc<Mutex<HashMap<UserId, PendingEntry<V>>>>,
}

impl<V: Send + 'static> PendingLedger<V> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Register a correlation key and arm its deadline.
    ///
    /// Must be called within a tokio runtime: the deadline is a timer task.
    ///
    /// # Errors
    /// Returns `Error::DuplicateKey` if the key already has a pending
    /// entry. A stale entry must resolve, time out, or be withdrawn before
    /// the key can be reused.
    pub fn register(&self, key: UserId, timeout: Duration) -> Result<PendingHandle<V>> {
        let (tx, rx) = oneshot::channel();
        let timeout_ms = timeout.as_millis() as u64;

        let mut entries = self.entries.lock().unwrap();
        if entries.contains_key(&key) {
            return Err(Error::DuplicateKey {
                uid: key.to_string(),
            });
        }

        let map = Arc::clone(&self.entries);
        let timer_key = key.clone();
        let timer = tokio::spawn(async move {
            tokio::time::sleep(timeout).await;

            // Still present means the reply lost the race: complete with a
            // timeout. Gone means resolved or withdrawn, nothing to do.
            let entry = map.lock().unwrap().remove(&timer_key);
            if let Some(entry) = entry {
                debug!(uid = %timer_key, "Pending request timed out");
                let _ = entry.tx.send(Outcome::TimedOut);
            }
        })
        .abort_handle();

        debug!(uid = %key, timeout_ms, "Registered pending request");
        entries.insert(key, PendingEntry { tx, timer });

        Ok(PendingHandle { rx, timeout_ms })
    }

    /// Complete a pending entry with a value.
    ///
    /// A key with no pending entry means the scanner sent an unsolicited or
    /// late reply; that is logged and ignored, never an error.
    pub fn resolve(&self, key: &UserId, value: V) {
        let entry = self.entries.lock().unwrap().remove(key);
        match entry {
            Some(entry) => {
                entry.timer.abort();
                let _ = entry.tx.send(Outcome::Resolved(value));
                debug!(uid = %key, "Pending request resolved");
            }
            None => {
                debug!(uid = %key, "Reply for unknown correlation key ignored");
            }
        }
    }

    /// Remove an entry without completing it.
    ///
    /// Used when the command that registered the entry could not be sent;
    /// the caller reports the send failure instead of awaiting the handle.
    pub fn withdraw(&self, key: &UserId) {
        if let Some(entry) = self.entries.lock().unwrap().remove(key) {
            entry.timer.abort();
            debug!(uid = %key, "Pending request withdrawn");
        }
    }

    /// Whether a key currently has a pending entry.
    #[must_use]
    pub fn is_pending(&self, key: &UserId) -> bool {
        self.entries.lock().unwrap().contains_key(key)
    }

    /// Number of in-flight correlations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().unwrap().is_empty()
    }
}

impl<V: Send + 'static> Default for PendingLedger<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uid(s: &str) -> UserId {
        UserId::new(s).unwrap()
    }

    fn ledger() -> Arc<PendingLedger<bool>> {
        Arc::new(PendingLedger::new())
    }

    #[tokio::test]
    async fn test_register_and_resolve() {
        let ledger = ledger();
        let handle = ledger
            .register(uid("u-1"), Duration::from_secs(15))
            .unwrap();
        assert!(ledger.is_pending(&uid("u-1")));

        ledger.resolve(&uid("u-1"), true);
        assert!(handle.outcome().await.unwrap());
        assert!(ledger.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_key_rejected() {
        let ledger = ledger();
        let _handle = ledger
            .register(uid("u-1"), Duration::from_secs(15))
            .unwrap();

        let second = ledger.register(uid("u-1"), Duration::from_secs(15));
        assert!(matches!(second, Err(Error::DuplicateKey { .. })));

        // The original entry is untouched by the rejected registration.
        assert_eq!(ledger.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_fires_at_deadline() {
        let ledger = ledger();
        let handle = ledger
            .register(uid("u-1"), Duration::from_millis(500))
            .unwrap();

        let outcome = handle.outcome().await;
        assert!(matches!(outcome, Err(Error::Timeout { ms: 500 })));
        assert!(ledger.is_empty());

        // A reply arriving after expiry is a no-op.
        ledger.resolve(&uid("u-1"), true);
        assert!(ledger.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_resolve_cancels_timer() {
        let ledger = ledger();
        let handle = ledger
            .register(uid("u-1"), Duration::from_millis(500))
            .unwrap();

        ledger.resolve(&uid("u-1"), false);
        assert!(!handle.outcome().await.unwrap());

        // Advance well past the original deadline: no late timeout fires,
        // and the key is immediately reusable.
        tokio::time::sleep(Duration::from_secs(2)).await;
        let handle = ledger
            .register(uid("u-1"), Duration::from_millis(500))
            .unwrap();
        ledger.resolve(&uid("u-1"), true);
        assert!(handle.outcome().await.unwrap());
    }

    #[tokio::test]
    async fn test_unsolicited_resolve_is_noop() {
        let ledger = ledger();
        ledger.resolve(&uid("nobody"), true);
        assert!(ledger.is_empty());
    }

    #[tokio::test]
    async fn test_withdraw_reports_as_timeout_if_awaited() {
        let ledger = ledger();
        let handle = ledger
            .register(uid("u-1"), Duration::from_secs(15))
            .unwrap();

        ledger.withdraw(&uid("u-1"));
        assert!(ledger.is_empty());
        assert!(matches!(handle.outcome().await, Err(Error::Timeout { .. })));
    }

    #[tokio::test]
    async fn test_independent_keys() {
        let ledger = ledger();
        let h1 = ledger
            .register(uid("u-1"), Duration::from_secs(15))
            .unwrap();
        let h2 = ledger
            .register(uid("u-2"), Duration::from_secs(15))
            .unwrap();

        ledger.resolve(&uid("u-2"), true);
        assert!(h2.outcome().await.unwrap());
        assert!(ledger.is_pending(&uid("u-1")));

        ledger.resolve(&uid("u-1"), false);
        assert!(!h1.outcome().await.unwrap());
    }
}
