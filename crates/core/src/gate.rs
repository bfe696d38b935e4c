//! The act-now gate: dedup, cooldown and grace rules.

use crate::model::{IncomingCard, Phase, Snapshot};
use crate::signature;
use crate::vocabulary::{mentions, Vocabulary};
use crate::{elapsed, Millis};

/// Quiet time after an action before defense may be decided again.
pub const DEFENSE_COOLDOWN_MS: Millis = 3_000;

/// Grace after entering defense while the opponent holds the veiling status.
pub const VEIL_GRACE_MS: Millis = 3_000;

/// Why the gate declined to consult the decision service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Suppress {
    /// Defense just began and the opponent's status may still hide effects.
    VeilGrace,
    /// An action sequence is executing.
    ActionInFlight,
    /// Defense without any incoming effect yet.
    AwaitingIncoming,
    /// Incoming effects are the echo of a trade, not an attack.
    HarmlessTrade,
    /// Too soon after the last action.
    Cooldown,
    /// Same phase and same hand/offer as the last consultation.
    Unchanged,
    /// Phase never warrants a decision.
    Idle,
}

/// Gate outcome for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Consult the decision service now.
    Act,
    /// Do nothing this tick.
    Suppress(Suppress),
}

impl Verdict {
    /// True for [`Verdict::Act`].
    pub fn is_act(self) -> bool {
        matches!(self, Verdict::Act)
    }
}

/// State owned by the Action Lock that the gate reads each tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct LockView {
    /// An action sequence currently holds the lock.
    pub in_flight: bool,
    /// When the last action sequence released the lock.
    pub last_finish: Option<Millis>,
}

/// The act-now gate: decides whether a snapshot is new enough, and safe
/// enough, to ask the decision service about.
#[derive(Debug, Clone)]
pub struct DecisionGate {
    vocabulary: Vocabulary,
    /// Phase of the last snapshot we consulted on.
    acted_phase: Option<Phase>,
    acted_hand: Option<String>,
    acted_offer: Option<String>,
    /// Phase of the previous snapshot observed, acted on or not.
    observed_phase: Option<Phase>,
    defense_entered_at: Option<Millis>,
    /// Trade echoes restart the cooldown as if an action had just finished.
    echo_reset_at: Option<Millis>,
}

impl DecisionGate {
    /// New gate with no recency state.
    pub fn new(vocabulary: Vocabulary) -> Self {
        Self {
            vocabulary,
            acted_phase: None,
            acted_hand: None,
            acted_offer: None,
            observed_phase: None,
            defense_entered_at: None,
            echo_reset_at: None,
        }
    }

    /// Evaluate `snap` at `now`, updating recency state.
    pub fn evaluate(&mut self, snap: &Snapshot, lock: LockView, now: Millis) -> Verdict {
        self.track_phase_entry(snap.phase, now);

        if snap.phase == Phase::Defense && snap.enemy.has_status(&self.vocabulary.veiling_status) {
            let entered = self.defense_entered_at.unwrap_or(now);
            if elapsed(now, entered) < VEIL_GRACE_MS {
                return Verdict::Suppress(Suppress::VeilGrace);
            }
        }

        if lock.in_flight {
            return Verdict::Suppress(Suppress::ActionInFlight);
        }

        if snap.phase == Phase::Defense {
            if snap.incoming.is_empty() {
                return Verdict::Suppress(Suppress::AwaitingIncoming);
            }
            if is_harmless_trade(&snap.incoming, &self.vocabulary) {
                self.echo_reset_at = Some(now);
                return Verdict::Suppress(Suppress::HarmlessTrade);
            }
            let cooled_from = lock.last_finish.max(self.echo_reset_at);
            if cooled_from.is_some_and(|t| elapsed(now, t) < DEFENSE_COOLDOWN_MS) {
                return Verdict::Suppress(Suppress::Cooldown);
            }
        }

        if snap.phase == Phase::BuyChoice {
            let offer = signature::offer(snap.offer.as_ref());
            if self.acted_phase == Some(Phase::BuyChoice) && self.acted_offer.as_deref() == Some(offer.as_str()) {
                return Verdict::Suppress(Suppress::Unchanged);
            }
            self.acted_phase = Some(Phase::BuyChoice);
            self.acted_offer = Some(offer);
            self.acted_hand = None;
            return Verdict::Act;
        }

        if !matches!(snap.phase, Phase::Attack | Phase::Defense) {
            return Verdict::Suppress(Suppress::Idle);
        }

        let hand = signature::hand(&snap.hand);
        if self.acted_phase == Some(snap.phase) && self.acted_hand.as_deref() == Some(hand.as_str()) {
            return Verdict::Suppress(Suppress::Unchanged);
        }
        self.acted_phase = Some(snap.phase);
        self.acted_hand = Some(hand);
        Verdict::Act
    }

    /// When the current defense phase was first observed.
    pub fn defense_entered_at(&self) -> Option<Millis> {
        self.defense_entered_at
    }

    fn track_phase_entry(&mut self, phase: Phase, now: Millis) {
        if phase == Phase::Defense && self.observed_phase != Some(Phase::Defense) {
            self.defense_entered_at = Some(now);
        }
        self.observed_phase = Some(phase);
    }
}

/// True when the incoming effects are only the cosmetic echo of a trade:
/// a lone sale, a lone forgiveness, or a pair containing a purchase.
pub fn is_harmless_trade(incoming: &[IncomingCard], vocabulary: &Vocabulary) -> bool {
    match incoming {
        [only] => mentions(&only.name, &vocabulary.sale) || mentions(&only.name, &vocabulary.forgive),
        [_, _] => incoming.iter().any(|c| mentions(&c.name, &vocabulary.purchase)),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BuyOffer, HandCard, Status};

    fn hand(names: &[&str]) -> Vec<HandCard> {
        names
            .iter()
            .enumerate()
            .map(|(index, n)| HandCard {
                index,
                name: n.to_string(),
                ..Default::default()
            })
            .collect()
    }

    fn incoming(names: &[&str]) -> Vec<IncomingCard> {
        names
            .iter()
            .map(|n| IncomingCard {
                name: n.to_string(),
                ..Default::default()
            })
            .collect()
    }

    fn snap(phase: Phase, cards: &[&str]) -> Snapshot {
        Snapshot {
            phase,
            hand: hand(cards),
            ..Default::default()
        }
    }

    fn idle() -> LockView {
        LockView::default()
    }

    #[test]
    fn identical_ticks_consult_once() {
        let mut gate = DecisionGate::new(Vocabulary::default());
        let s = snap(Phase::Attack, &["Sword", "Shield"]);
        assert_eq!(gate.evaluate(&s, idle(), 0), Verdict::Act);
        assert_eq!(gate.evaluate(&s, idle(), 1_000), Verdict::Suppress(Suppress::Unchanged));
        assert_eq!(gate.evaluate(&s, idle(), 2_000), Verdict::Suppress(Suppress::Unchanged));
    }

    #[test]
    fn hand_change_reconsults() {
        let mut gate = DecisionGate::new(Vocabulary::default());
        assert!(gate.evaluate(&snap(Phase::Attack, &["Sword", "Shield"]), idle(), 0).is_act());
        assert!(gate.evaluate(&snap(Phase::Attack, &["Shield"]), idle(), 1_000).is_act());
    }

    #[test]
    fn in_flight_suppresses() {
        let mut gate = DecisionGate::new(Vocabulary::default());
        let lock = LockView {
            in_flight: true,
            last_finish: None,
        };
        assert_eq!(
            gate.evaluate(&snap(Phase::Attack, &["Sword"]), lock, 0),
            Verdict::Suppress(Suppress::ActionInFlight)
        );
        // Suppression does not consume the novelty.
        assert!(gate.evaluate(&snap(Phase::Attack, &["Sword"]), idle(), 100).is_act());
    }

    #[test]
    fn other_phase_is_idle() {
        let mut gate = DecisionGate::new(Vocabulary::default());
        assert_eq!(
            gate.evaluate(&snap(Phase::Other, &["Sword"]), idle(), 0),
            Verdict::Suppress(Suppress::Idle)
        );
    }

    #[test]
    fn defense_waits_for_incoming() {
        let mut gate = DecisionGate::new(Vocabulary::default());
        assert_eq!(
            gate.evaluate(&snap(Phase::Defense, &["Shield"]), idle(), 0),
            Verdict::Suppress(Suppress::AwaitingIncoming)
        );
    }

    #[test]
    fn defense_cools_down_after_action() {
        let mut gate = DecisionGate::new(Vocabulary::default());
        let mut s = snap(Phase::Defense, &["Shield"]);
        s.incoming = incoming(&["Spear"]);
        let lock = LockView {
            in_flight: false,
            last_finish: Some(10_000),
        };
        assert_eq!(gate.evaluate(&s, lock, 10_000), Verdict::Suppress(Suppress::Cooldown));
        assert_eq!(gate.evaluate(&s, lock, 12_999), Verdict::Suppress(Suppress::Cooldown));
        assert_eq!(gate.evaluate(&s, lock, 13_000), Verdict::Act);
    }

    #[test]
    fn lone_sale_is_harmless_and_restarts_cooldown() {
        let mut gate = DecisionGate::new(Vocabulary::default());
        let mut s = snap(Phase::Defense, &["Shield"]);
        s.incoming = incoming(&["Sale confirmation"]);
        assert_eq!(gate.evaluate(&s, idle(), 5_000), Verdict::Suppress(Suppress::HarmlessTrade));

        s.incoming = incoming(&["Spear"]);
        assert_eq!(gate.evaluate(&s, idle(), 7_000), Verdict::Suppress(Suppress::Cooldown));
        assert_eq!(gate.evaluate(&s, idle(), 8_000), Verdict::Act);
    }

    #[test]
    fn harmless_shapes() {
        let v = Vocabulary::default();
        assert!(is_harmless_trade(&incoming(&["売る"]), &v));
        assert!(is_harmless_trade(&incoming(&["許す"]), &v));
        assert!(is_harmless_trade(&incoming(&["Axe", "買う"]), &v));
        assert!(!is_harmless_trade(&incoming(&["Axe", "Bow"]), &v));
        assert!(!is_harmless_trade(&incoming(&["売る", "Bow"]), &v));
        assert!(!is_harmless_trade(&incoming(&["買う", "買う", "Bow"]), &v));
        assert!(!is_harmless_trade(&[], &v));
    }

    #[test]
    fn veil_grace_holds_for_three_seconds_after_entry() {
        let mut gate = DecisionGate::new(Vocabulary::default());
        let mut s = snap(Phase::Defense, &["Shield"]);
        s.incoming = incoming(&["Spear"]);
        s.enemy.statuses.push(Status {
            name: "夢".into(),
            raw_text: String::new(),
        });
        assert_eq!(gate.evaluate(&s, idle(), 1_000), Verdict::Suppress(Suppress::VeilGrace));
        assert_eq!(gate.evaluate(&s, idle(), 3_999), Verdict::Suppress(Suppress::VeilGrace));
        assert_eq!(gate.defense_entered_at(), Some(1_000));
        assert_eq!(gate.evaluate(&s, idle(), 4_000), Verdict::Act);
    }

    #[test]
    fn buy_choice_acts_on_new_offer_only() {
        let mut gate = DecisionGate::new(Vocabulary::default());
        let offer = |name: &str| Snapshot {
            phase: Phase::BuyChoice,
            offer: Some(BuyOffer {
                name: name.into(),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(gate.evaluate(&offer("Bow"), idle(), 0).is_act());
        assert_eq!(gate.evaluate(&offer("Bow"), idle(), 1_000), Verdict::Suppress(Suppress::Unchanged));
        assert!(gate.evaluate(&offer("Axe"), idle(), 2_000).is_act());
    }

    #[test]
    fn returning_from_buy_choice_reconsults_same_hand() {
        let mut gate = DecisionGate::new(Vocabulary::default());
        let attack = snap(Phase::Attack, &["Sword"]);
        assert!(gate.evaluate(&attack, idle(), 0).is_act());
        let buy = Snapshot {
            phase: Phase::BuyChoice,
            ..Default::default()
        };
        assert!(gate.evaluate(&buy, idle(), 1_000).is_act());
        assert!(gate.evaluate(&attack, idle(), 2_000).is_act());
    }
}
