//! Phase detection with defense debouncing.

use crate::model::{Phase, SceneCues};
use crate::{elapsed, Millis};

/// How long the defense cue must persist before it is trusted.
pub const DEFENSE_CONFIRM_MS: Millis = 2_000;

/// How long the defense cue may vanish without restarting confirmation.
pub const DEFENSE_GRACE_MS: Millis = 1_500;

/// Turns raw scene cues into a [`Phase`].
///
/// The defense cue flashes during unrelated animations, so it is debounced:
/// the detector answers [`Phase::Other`] until the cue has been seen for
/// [`DEFENSE_CONFIRM_MS`], tolerating gaps of up to [`DEFENSE_GRACE_MS`].
#[derive(Debug, Clone, Default)]
pub struct PhaseDetector {
    /// When the current run of defense cues began.
    defense_since: Option<Millis>,
    /// Last time the defense cue was actually observed.
    defense_seen_at: Option<Millis>,
}

impl PhaseDetector {
    /// New detector with no pending confirmation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify the cues observed at `now`.
    pub fn detect(&mut self, cues: &SceneCues, now: Millis) -> Phase {
        if cues.buy_hitbox {
            self.reset();
            return Phase::BuyChoice;
        }
        if cues.attack_cue {
            self.reset();
            return Phase::Attack;
        }
        if cues.defense_cue {
            return self.confirm_defense(now);
        }

        // Cue missing: keep the timer alive through short flicker.
        match self.defense_seen_at {
            Some(seen) if elapsed(now, seen) <= DEFENSE_GRACE_MS => {}
            _ => self.reset(),
        }
        Phase::Other
    }

    /// Start of the pending defense confirmation, if any.
    pub fn pending_since(&self) -> Option<Millis> {
        self.defense_since
    }

    fn confirm_defense(&mut self, now: Millis) -> Phase {
        let continuing = self
            .defense_seen_at
            .is_some_and(|seen| elapsed(now, seen) <= DEFENSE_GRACE_MS);
        self.defense_seen_at = Some(now);

        let since = match self.defense_since {
            Some(since) if continuing => since,
            _ => {
                self.defense_since = Some(now);
                return Phase::Other;
            }
        };

        if elapsed(now, since) >= DEFENSE_CONFIRM_MS {
            Phase::Defense
        } else {
            Phase::Other
        }
    }

    fn reset(&mut self) {
        self.defense_since = None;
        self.defense_seen_at = None;
    }
}
