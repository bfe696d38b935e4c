//! Burst cadence and the stuck-defense watchdog.

use crate::model::{Phase, Snapshot};
use crate::signature;
use crate::{elapsed, Millis};

/// Burst extension while defense shows no incoming effect.
pub const DEFENSE_EMPTY_BURST_MS: Millis = 1_500;

/// How long `other` must persist before bursting.
pub const OTHER_STUCK_MS: Millis = 2_500;

/// Burst extension while stuck in `other`.
pub const OTHER_STUCK_BURST_MS: Millis = 2_500;

/// Empty-defense duration after which the watchdog forces a pass.
pub const WATCHDOG_DEFENSE_EMPTY_MS: Millis = 4_500;

/// What the scheduler must do after observing a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Watchdog {
    /// Carry on with the normal tick.
    Continue,
    /// Force a defense pass and skip the rest of the tick.
    ForcePass {
        /// How long defense has shown no incoming effect.
        empty_for: Millis,
    },
}

/// Adaptive polling cadence and the stuck-state watchdog.
#[derive(Debug, Clone, Default)]
pub struct PollingState {
    progress_sig: String,
    progress_at: Option<Millis>,
    other_since: Option<Millis>,
    defense_empty_since: Option<Millis>,
    burst_until: Millis,
}

impl PollingState {
    /// Fresh state: no burst, no timers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a snapshot taken at `now`, extend the burst window as needed
    /// and run the watchdog.
    pub fn observe(&mut self, snap: &Snapshot, now: Millis) -> Watchdog {
        let sig = signature::progress(snap);
        if self.progress_at.is_none() || sig != self.progress_sig {
            self.progress_sig = sig;
            self.progress_at = Some(now);
        }

        if snap.phase == Phase::Defense && snap.incoming.is_empty() {
            self.defense_empty_since.get_or_insert(now);
            self.extend_burst(now + DEFENSE_EMPTY_BURST_MS);
        } else {
            self.defense_empty_since = None;
        }

        if snap.phase == Phase::Other {
            let since = *self.other_since.get_or_insert(now);
            if elapsed(now, since) > OTHER_STUCK_MS {
                self.extend_burst(now + OTHER_STUCK_BURST_MS);
            }
        } else {
            self.other_since = None;
        }

        match self.defense_empty_since {
            Some(since) if elapsed(now, since) >= WATCHDOG_DEFENSE_EMPTY_MS => {
                // Restart the window so the pass is not repeated every tick.
                self.defense_empty_since = Some(now);
                Watchdog::ForcePass {
                    empty_for: elapsed(now, since),
                }
            }
            _ => Watchdog::Continue,
        }
    }

    /// True while the high-frequency tick should run.
    pub fn burst_active(&self, now: Millis) -> bool {
        now < self.burst_until
    }

    /// How long the visible state has been unchanged.
    pub fn stalled_for(&self, now: Millis) -> Millis {
        self.progress_at.map(|t| elapsed(now, t)).unwrap_or(0)
    }

    fn extend_burst(&mut self, until: Millis) {
        self.burst_until = self.burst_until.max(until);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::IncomingCard;

    fn snap(phase: Phase) -> Snapshot {
        Snapshot {
            phase,
            ..Default::default()
        }
    }

    #[test]
    fn empty_defense_bursts_briefly() {
        let mut p = PollingState::new();
        assert_eq!(p.observe(&snap(Phase::Defense), 1_000), Watchdog::Continue);
        assert!(p.burst_active(2_499));
        assert!(!p.burst_active(2_500));
    }

    #[test]
    fn lingering_other_bursts() {
        let mut p = PollingState::new();
        p.observe(&snap(Phase::Other), 0);
        p.observe(&snap(Phase::Other), 2_500);
        assert!(!p.burst_active(2_500));
        p.observe(&snap(Phase::Other), 2_501);
        assert!(p.burst_active(5_000));
        assert!(!p.burst_active(5_001));
    }

    #[test]
    fn other_interrupted_restarts_clock() {
        let mut p = PollingState::new();
        p.observe(&snap(Phase::Other), 0);
        p.observe(&snap(Phase::Attack), 2_000);
        p.observe(&snap(Phase::Other), 3_000);
        p.observe(&snap(Phase::Other), 5_000);
        assert!(!p.burst_active(5_000));
    }

    #[test]
    fn watchdog_fires_once_per_window() {
        let mut p = PollingState::new();
        let mut fired = vec![];
        let mut t = 0;
        while t <= 9_500 {
            if let Watchdog::ForcePass { .. } = p.observe(&snap(Phase::Defense), t) {
                fired.push(t);
            }
            t += 250;
        }
        assert_eq!(fired, vec![4_500, 9_000]);
    }

    #[test]
    fn incoming_effect_disarms_watchdog() {
        let mut p = PollingState::new();
        p.observe(&snap(Phase::Defense), 0);
        let mut armed = snap(Phase::Defense);
        armed.incoming.push(IncomingCard::default());
        p.observe(&armed, 3_000);
        assert_eq!(p.observe(&snap(Phase::Defense), 4_600), Watchdog::Continue);
        assert_eq!(p.observe(&snap(Phase::Defense), 9_100), Watchdog::ForcePass { empty_for: 4_500 });
    }

    #[test]
    fn stall_tracks_signature_changes() {
        let mut p = PollingState::new();
        p.observe(&snap(Phase::Attack), 0);
        p.observe(&snap(Phase::Attack), 3_000);
        assert_eq!(p.stalled_for(3_000), 3_000);
        p.observe(&snap(Phase::Other), 4_000);
        assert_eq!(p.stalled_for(4_500), 500);
    }
}
