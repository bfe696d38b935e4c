//! Single-slot holding area for decisions that arrive while the screen is busy.

use ulid::Ulid;

use crate::api::Decision;
use crate::model::Snapshot;
use crate::signature;
use crate::{elapsed, Millis};

/// Deferred decisions older than this are discarded instead of replayed.
pub const DEFERRED_TTL_MS: Millis = 5_000;

/// A decision that arrived while the Action Lock was held.
#[derive(Debug, Clone)]
pub struct DeferredDecision {
    /// Round-trip id, for log correlation.
    pub request_id: Ulid,
    /// The answer to replay.
    pub decision: Decision,
    /// [`signature::deferral`] of `snapshot`.
    pub signature: String,
    /// The snapshot the decision was computed against.
    pub snapshot: Snapshot,
    /// When the answer arrived.
    pub created_at: Millis,
}

impl DeferredDecision {
    /// Capture `decision` against the snapshot it answered.
    pub fn new(request_id: Ulid, decision: Decision, snapshot: Snapshot, created_at: Millis) -> Self {
        Self {
            request_id,
            decision,
            signature: signature::deferral(&snapshot),
            snapshot,
            created_at,
        }
    }
}

/// Result of [`DeferredSlot::flush`].
#[derive(Debug, Clone)]
pub enum Flush {
    /// Nothing was pending.
    Empty,
    /// Something is pending but actuation is busy; try again later.
    Busy,
    /// The pending decision was too old and has been dropped.
    Expired(DeferredDecision),
    /// Replay `decision` against `snapshot`.
    Replay {
        /// Round-trip id of the original request.
        request_id: Ulid,
        /// The answer to replay.
        decision: Decision,
        /// Snapshot to replay against.
        snapshot: Snapshot,
        /// True when `snapshot` is the current scene rather than the stored one.
        fresh: bool,
        /// When the original answer arrived; a replay that finds the lock
        /// taken again re-defers with this age.
        created_at: Millis,
    },
}

/// Single-slot holding area for decisions that could not run immediately.
///
/// A new decision always overwrites the previous one.
#[derive(Debug, Default)]
pub struct DeferredSlot {
    pending: Option<DeferredDecision>,
}

impl DeferredSlot {
    /// Empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `deferred`, returning whatever it displaced.
    pub fn store(&mut self, deferred: DeferredDecision) -> Option<DeferredDecision> {
        self.pending.replace(deferred)
    }

    /// True when a decision is waiting.
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Decide what to do with the pending decision at `now`.
    ///
    /// Staleness is checked before `busy`, so an expired decision is cleared
    /// even while an action runs. When `current` still has the same
    /// signature the replay uses it, since it is the fresher read.
    pub fn flush(&mut self, now: Millis, busy: bool, current: Option<&Snapshot>) -> Flush {
        let Some(pending) = self.pending.as_ref() else {
            return Flush::Empty;
        };
        if elapsed(now, pending.created_at) > DEFERRED_TTL_MS {
            return match self.pending.take() {
                Some(expired) => Flush::Expired(expired),
                None => Flush::Empty,
            };
        }
        if busy {
            return Flush::Busy;
        }
        let Some(pending) = self.pending.take() else {
            return Flush::Empty;
        };

        match current {
            Some(snap) if signature::deferral(snap) == pending.signature => Flush::Replay {
                request_id: pending.request_id,
                decision: pending.decision,
                snapshot: snap.clone(),
                fresh: true,
                created_at: pending.created_at,
            },
            _ => Flush::Replay {
                request_id: pending.request_id,
                decision: pending.decision,
                snapshot: pending.snapshot,
                fresh: false,
                created_at: pending.created_at,
            },
        }
    }
}
