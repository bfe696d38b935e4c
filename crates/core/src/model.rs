//! Scene model: what the sampler reads and the per-tick snapshot.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::vocabulary::mentions;

/// Coarse turn state inferred from the scene.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Our turn to attack (the pray cue is visible).
    Attack,
    /// We are being attacked and may respond.
    Defense,
    /// A purchase offer is waiting for yes/no.
    BuyChoice,
    /// Anything else, including intermediate animation frames.
    #[default]
    Other,
}

impl Phase {
    /// Wire name of the phase.
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Attack => "attack",
            Phase::Defense => "defense",
            Phase::BuyChoice => "buy_choice",
            Phase::Other => "other",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which player a decision targets.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    /// Ourselves.
    #[serde(rename = "self")]
    Me,
    /// The opponent.
    Enemy,
}

/// An active status effect on a player.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Status {
    /// Display name.
    pub name: String,
    /// Hover text, if it was revealed.
    #[serde(default)]
    pub raw_text: String,
}

/// Health, resource, currency and statuses of one player.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Vitals {
    /// Player name as shown on screen.
    pub name: String,
    /// Health.
    pub hp: i64,
    /// Resource spent on miracles.
    pub mp: i64,
    /// Currency.
    pub gold: i64,
    /// Active status effects.
    #[serde(default)]
    pub statuses: Vec<Status>,
}

impl Vitals {
    /// True when any status name contains one of `markers`.
    pub fn has_status(&self, markers: &[String]) -> bool {
        self.statuses.iter().any(|s| mentions(&s.name, markers))
    }
}

/// A card in our hand. `index` is stable for the lifetime of the frame.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct HandCard {
    /// Slot index used when clicking.
    pub index: usize,
    /// Number or label drawn over the card art.
    #[serde(default)]
    pub overlay: String,
    /// Item name.
    #[serde(default)]
    pub name: String,
    /// Detail text.
    #[serde(default)]
    pub raw_text: String,
    /// Whether the client renders the card as playable, when known.
    #[serde(default)]
    pub usable: Option<bool>,
}

/// An effect currently being played against us.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct IncomingCard {
    /// Sampler index, if it assigned one.
    #[serde(default)]
    pub index: Option<usize>,
    /// Number or label drawn over the card art.
    #[serde(default)]
    pub overlay: String,
    /// Effect name.
    #[serde(default)]
    pub name: String,
    /// Detail text.
    #[serde(default)]
    pub raw_text: String,
    /// Screen region the effect was rendered in, when the sampler could tell.
    #[serde(default)]
    pub zone: Option<String>,
}

/// The card offered in a purchase prompt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct BuyOffer {
    /// Position of the offer on screen.
    #[serde(default)]
    pub index: usize,
    /// Number or label drawn over the card art.
    #[serde(default)]
    pub overlay: String,
    /// Item name.
    #[serde(default)]
    pub name: String,
    /// Detail text.
    #[serde(default)]
    pub raw_text: String,
}

/// Raw text/geometry predicates the phase detector consumes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct SceneCues {
    /// The "pray" control (attack turn) is on screen.
    #[serde(default)]
    pub attack_cue: bool,
    /// The "forgive" control (defense turn) is on screen.
    #[serde(default)]
    pub defense_cue: bool,
    /// The purchase yes/no hitbox is on screen.
    #[serde(default)]
    pub buy_hitbox: bool,
}

/// One best-effort read of the scene, before phase detection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct SceneFrame {
    /// Phase cues.
    #[serde(default)]
    pub cues: SceneCues,
    /// Our vitals.
    pub me: Vitals,
    /// Opponent vitals.
    pub enemy: Vitals,
    /// Our hand, in screen order.
    #[serde(default)]
    pub hand: Vec<HandCard>,
    /// Effects in the incoming area, whatever the phase.
    #[serde(default)]
    pub incoming: Vec<IncomingCard>,
    /// Purchase offers, top first.
    #[serde(default)]
    pub offers: Vec<BuyOffer>,
}

/// Result of opening the miracle history view.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct MiracleReading {
    /// Number of icons located on screen, resolved or not.
    pub icons: usize,
    /// Resolved names on our side.
    #[serde(default)]
    pub me: Vec<String>,
    /// Resolved names on the opponent's side.
    #[serde(default)]
    pub enemy: Vec<String>,
}

/// Special effects observed so far for each side.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct SeenMiracles {
    /// Ours.
    pub me: BTreeSet<String>,
    /// The opponent's.
    pub enemy: BTreeSet<String>,
}

/// Outcome of [`SeenMiracles::refresh`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refresh {
    /// Both sets were replaced with the reading.
    Replaced,
    /// No icons were on screen; nothing changed.
    NoIcons,
    /// Icons were present but no names resolved; the prior record is kept.
    KeptPrevious,
}

impl SeenMiracles {
    /// Apply a reading. A reading that found icons but resolved no names
    /// never overwrites what we already know.
    pub fn refresh(&mut self, reading: &MiracleReading) -> Refresh {
        if reading.icons == 0 {
            return Refresh::NoIcons;
        }
        if reading.me.is_empty() && reading.enemy.is_empty() {
            return Refresh::KeptPrevious;
        }
        self.me = reading.me.iter().cloned().collect();
        self.enemy = reading.enemy.iter().cloned().collect();
        Refresh::Replaced
    }
}

/// Immutable per-tick view of the game.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Snapshot {
    /// Debounced phase.
    pub phase: Phase,
    /// Our vitals.
    pub me: Vitals,
    /// Opponent vitals.
    pub enemy: Vitals,
    /// Our hand, in screen order.
    pub hand: Vec<HandCard>,
    /// Only populated in [`Phase::Defense`].
    pub incoming: Vec<IncomingCard>,
    /// Only populated in [`Phase::BuyChoice`].
    pub offer: Option<BuyOffer>,
    /// Miracles seen so far, as of this tick.
    pub seen: SeenMiracles,
}

impl Snapshot {
    /// Build a snapshot from a sampled frame and the detected phase.
    ///
    /// Incoming effects are dropped outside defense and the offer outside a
    /// purchase prompt, so stale reads from the previous phase never leak
    /// into signatures.
    pub fn assemble(phase: Phase, frame: SceneFrame, seen: &SeenMiracles) -> Self {
        let incoming = if phase == Phase::Defense {
            frame.incoming
        } else {
            Vec::new()
        };
        let offer = if phase == Phase::BuyChoice {
            frame.offers.into_iter().next()
        } else {
            None
        };
        Self {
            phase,
            me: frame.me,
            enemy: frame.enemy,
            hand: frame.hand,
            incoming,
            offer,
            seen: seen.clone(),
        }
    }

    /// Hand card by its stable index.
    pub fn card(&self, index: usize) -> Option<&HandCard> {
        self.hand.iter().find(|c| c.index == index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> SceneFrame {
        SceneFrame {
            incoming: vec![IncomingCard {
                name: "Sword".into(),
                ..Default::default()
            }],
            offers: vec![
                BuyOffer {
                    name: "Shield".into(),
                    ..Default::default()
                },
                BuyOffer {
                    name: "Spear".into(),
                    ..Default::default()
                },
            ],
            ..Default::default()
        }
    }

    #[test]
    fn assemble_keeps_incoming_only_in_defense() {
        let seen = SeenMiracles::default();
        assert_eq!(Snapshot::assemble(Phase::Defense, frame(), &seen).incoming.len(), 1);
        assert!(Snapshot::assemble(Phase::Attack, frame(), &seen).incoming.is_empty());
    }

    #[test]
    fn assemble_takes_first_offer_in_buy_choice() {
        let seen = SeenMiracles::default();
        let snap = Snapshot::assemble(Phase::BuyChoice, frame(), &seen);
        assert_eq!(snap.offer.map(|o| o.name), Some("Shield".to_string()));
        assert!(Snapshot::assemble(Phase::Other, frame(), &seen).offer.is_none());
    }

    #[test]
    fn refresh_keeps_previous_when_names_unresolved() {
        let mut seen = SeenMiracles::default();
        seen.me.insert("Heal".into());

        let blank = MiracleReading {
            icons: 3,
            ..Default::default()
        };
        assert_eq!(seen.refresh(&blank), Refresh::KeptPrevious);
        assert!(seen.me.contains("Heal"));

        let none = MiracleReading::default();
        assert_eq!(seen.refresh(&none), Refresh::NoIcons);
        assert!(seen.me.contains("Heal"));

        let read = MiracleReading {
            icons: 2,
            me: vec!["Storm".into()],
            enemy: vec!["Curse".into()],
        };
        assert_eq!(seen.refresh(&read), Refresh::Replaced);
        assert!(!seen.me.contains("Heal"));
        assert!(seen.enemy.contains("Curse"));
    }

    #[test]
    fn status_markers_match_by_substring() {
        let v = Vitals {
            statuses: vec![Status {
                name: "Dream (3)".into(),
                raw_text: String::new(),
            }],
            ..Default::default()
        };
        assert!(v.has_status(&["Dream".to_string()]));
        assert!(!v.has_status(&["Fog".to_string()]));
    }
}
