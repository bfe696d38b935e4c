//! Experimental detection of our own attack being rendered back at us.
//!
//! When we attack, the client briefly shows our cards in the incoming area.
//! This module remembers what we attacked with so that a look-alike incoming
//! set can be recognised. The gate does not consult it: the zone learning
//! has not been validated against real games.

use crate::model::{HandCard, IncomingCard};

#[derive(Debug, Clone, PartialEq, Eq)]
struct CardSig {
    name: String,
    overlay: String,
}

/// Our last attack and the zone it was seen rendered in.
#[derive(Debug, Clone, Default)]
pub struct AttackMemory {
    cards: Vec<CardSig>,
    zone: Option<String>,
}

impl AttackMemory {
    /// Empty memory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember the cards at `indices` as our latest attack. Unknown
    /// indices are skipped. The learned zone is forgotten.
    pub fn remember(&mut self, indices: &[usize], hand: &[HandCard]) {
        self.cards = indices
            .iter()
            .filter_map(|i| hand.iter().find(|c| c.index == *i))
            .map(|c| CardSig {
                name: c.name.clone(),
                overlay: c.overlay.clone(),
            })
            .collect();
        self.zone = None;
    }

    /// Number of remembered attack cards.
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// True when no attack is remembered.
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Zone learned from the first matching echo.
    pub fn zone(&self) -> Option<&str> {
        self.zone.as_deref()
    }

    /// True when `incoming` looks like our own attack echoed back.
    ///
    /// All incoming effects must share one zone and match the remembered
    /// cards by name (and by overlay when every card carries one). The first
    /// match teaches the zone; later matches must come from the same zone.
    pub fn is_likely_echo(&mut self, incoming: &[IncomingCard]) -> bool {
        if self.cards.is_empty() || incoming.is_empty() {
            return false;
        }

        let mut zones: Vec<&str> = incoming.iter().filter_map(|c| c.zone.as_deref()).collect();
        zones.sort_unstable();
        zones.dedup();
        let [zone] = zones.as_slice() else {
            return false;
        };

        if incoming.len() != self.cards.len() {
            return false;
        }

        let names_match = incoming
            .iter()
            .all(|x| self.cards.iter().any(|y| y.name == x.name))
            && self
                .cards
                .iter()
                .all(|y| incoming.iter().any(|x| x.name == y.name));
        if !names_match {
            return false;
        }

        let all_overlays = incoming.iter().all(|x| !x.overlay.is_empty())
            && self.cards.iter().all(|y| !y.overlay.is_empty());
        if all_overlays {
            let overlays_match = incoming
                .iter()
                .all(|x| self.cards.iter().any(|y| y.name == x.name && y.overlay == x.overlay));
            if !overlays_match {
                return false;
            }
        }

        match &self.zone {
            None => {
                self.zone = Some(zone.to_string());
                true
            }
            Some(learned) => learned == zone,
        }
    }
}
