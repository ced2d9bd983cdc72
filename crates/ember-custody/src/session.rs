//! Session model
//!
//! The session is the time-boxed, lockable window during which secret
//! operations are permitted. It persists as a descriptor-tier record (it
//! contains no secret) and is re-evaluated lazily on every secret-gated
//! call; a background timer is never load-bearing.

use ember_storage::SessionRecord;
use std::time::Duration;

/// Custody configuration
#[derive(Debug, Clone)]
pub struct CustodyConfig {
    /// Length of an unlocked session window
    pub session_window: Duration,
    /// Transition the very first wallet ever created straight to Unlocked
    /// (onboarding continuity). See DESIGN.md.
    pub first_wallet_auto_unlock: bool,
    /// Default network id for fresh sessions
    pub default_network_id: u64,
}

impl Default for CustodyConfig {
    fn default() -> Self {
        Self {
            session_window: Duration::from_secs(5 * 60),
            first_wallet_auto_unlock: true,
            default_network_id: 1,
        }
    }
}

/// Coarse custody state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// No wallet exists yet
    NoWallet,
    /// Wallets exist, secrets unreachable
    Locked,
    /// Secrets reachable until the window elapses
    Unlocked,
}

/// Current unix timestamp (seconds)
pub(crate) fn now_ts() -> i64 {
    chrono::Utc::now().timestamp()
}

/// True when the record permits secret access at `now`.
///
/// Fails closed: a missing expiry on an unlocked record counts as expired.
pub(crate) fn is_active(session: &SessionRecord, now: i64) -> bool {
    if session.locked {
        return false;
    }
    matches!(session.expires_at, Some(expires) if now < expires)
}

/// Re-lock a session record in place, clearing the window bookkeeping.
pub(crate) fn mark_locked(session: &mut SessionRecord) {
    session.locked = true;
    session.unlocked_at = None;
    session.expires_at = None;
}

/// Unlock a session record in place for one window starting at `now`.
pub(crate) fn mark_unlocked(session: &mut SessionRecord, now: i64, window: Duration) {
    session.locked = false;
    session.unlocked_at = Some(now);
    session.expires_at = Some(now + window.as_secs() as i64);
}

/// Sanitize a session loaded from disk.
///
/// A restored session stays unlocked only when it was not explicitly locked
/// and its window is still open; any ambiguity re-locks.
pub(crate) fn sanitize_loaded(mut session: SessionRecord, now: i64) -> SessionRecord {
    if !is_active(&session, now) {
        mark_locked(&mut session);
    }
    session
}
