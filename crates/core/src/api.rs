//! Wire contract of the decision service.

use serde::{Deserialize, Serialize};

use crate::model::{Phase, Snapshot, Target, Vitals};

/// Hand card as sent to the decision service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WireHandCard {
    /// Hand slot or position.
    pub index: usize,
    /// Overlay label.
    pub overlay: String,
    /// Card name.
    pub name: String,
    /// Detail text.
    pub raw_text: String,
    /// Playable flag, when the sampler knew it.
    pub usable: Option<bool>,
}

/// Incoming effect or purchase offer as sent to the decision service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WireCard {
    /// Hand slot or position.
    pub index: usize,
    /// Overlay label.
    pub overlay: String,
    /// Card name.
    pub name: String,
    /// Detail text.
    pub raw_text: String,
}

/// Seen-miracle lists in wire form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct WireSeenMiracles {
    /// Ours.
    pub me: Vec<String>,
    /// The opponent's.
    pub enemy: Vec<String>,
}

/// Body of `POST /decide`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DecideRequest {
    /// Current phase.
    pub phase: Phase,
    /// Our vitals.
    pub me: Vitals,
    /// Opponent vitals.
    pub enemy: Vitals,
    /// Our hand.
    pub hand: Vec<WireHandCard>,
    /// Effects played against us; empty outside defense.
    pub incoming_cards: Vec<WireCard>,
    /// Top purchase offer in a buy prompt.
    pub buy_candidate: Option<WireCard>,
    /// Miracles seen so far.
    pub seen_miracles: WireSeenMiracles,
}

impl From<&Snapshot> for DecideRequest {
    fn from(snap: &Snapshot) -> Self {
        Self {
            phase: snap.phase,
            me: snap.me.clone(),
            enemy: snap.enemy.clone(),
            hand: snap
                .hand
                .iter()
                .map(|c| WireHandCard {
                    index: c.index,
                    overlay: c.overlay.clone(),
                    name: c.name.clone(),
                    raw_text: c.raw_text.clone(),
                    usable: c.usable,
                })
                .collect(),
            // Effects without a sampler index are numbered by position.
            incoming_cards: snap
                .incoming
                .iter()
                .enumerate()
                .map(|(pos, c)| WireCard {
                    index: c.index.unwrap_or(pos),
                    overlay: c.overlay.clone(),
                    name: c.name.clone(),
                    raw_text: c.raw_text.clone(),
                })
                .collect(),
            buy_candidate: snap.offer.as_ref().map(|o| WireCard {
                index: o.index,
                overlay: o.overlay.clone(),
                name: o.name.clone(),
                raw_text: o.raw_text.clone(),
            }),
            seen_miracles: WireSeenMiracles {
                me: snap.seen.me.iter().cloned().collect(),
                enemy: snap.seen.enemy.iter().cloned().collect(),
            },
        }
    }
}

/// Action type chosen by the decision service.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DecisionKind {
    /// Play cards against a target.
    #[serde(rename = "attack")]
    Attack,
    /// Play defensive cards.
    #[serde(rename = "defend")]
    Defend,
    /// Play a shield.
    #[serde(rename = "shield")]
    Shield,
    /// Pass the attack turn.
    #[serde(rename = "attack-pass")]
    AttackPass,
    /// Take the hit without responding.
    #[serde(rename = "defense-pass")]
    DefensePass,
    /// Answer a purchase prompt; see [`Decision::buy`].
    #[serde(rename = "buy_choice")]
    BuyChoice,
    /// Play an exchange card and move the counters.
    #[serde(rename = "exchange")]
    Exchange,
    /// Sell a card using a sale card.
    #[serde(rename = "sell")]
    Sell,
    /// Play a purchase card.
    #[serde(rename = "buy")]
    Buy,
}

/// Target resource levels for an exchange.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExchangePlan {
    /// Target mp.
    pub mp: i64,
    /// Target gold.
    pub gold: i64,
}

impl ExchangePlan {
    /// Counter adjustments `(mp, gold)` needed to move from `me` to the
    /// plan. Negative targets are clamped to zero.
    pub fn deltas(&self, me: &Vitals) -> (i64, i64) {
        (self.mp.max(0) - me.mp, self.gold.max(0) - me.gold)
    }
}

/// Response of `POST /decide`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Decision {
    /// What to do.
    #[serde(rename = "type")]
    pub kind: DecisionKind,
    /// Hand slots to use, in order.
    #[serde(rename = "cardIndices", default, skip_serializing_if = "Option::is_none")]
    pub card_indices: Option<Vec<usize>>,
    /// Who the cards are aimed at.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<Target>,
    /// `1` accepts a purchase prompt, anything else declines.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buy: Option<u8>,
    /// Target levels for an exchange.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exchange: Option<ExchangePlan>,
    /// Free-form explanation from the service; logged only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Decision {
    /// A bare decision of `kind` with no cards.
    pub fn new(kind: DecisionKind) -> Self {
        Self {
            kind,
            card_indices: None,
            target: None,
            buy: None,
            exchange: None,
            reason: None,
        }
    }

    /// Card indices, empty when the service omitted them.
    pub fn indices(&self) -> &[usize] {
        self.card_indices.as_deref().unwrap_or(&[])
    }

    /// True when a purchase prompt should be accepted.
    pub fn accepts_purchase(&self) -> bool {
        self.buy == Some(1)
    }
}
