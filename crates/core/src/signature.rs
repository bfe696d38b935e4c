//! String signatures used for change detection.
//!
//! Cards are identified by `name:overlay`, never by index, so a reshuffled
//! hand with the same contents in the same order compares equal.

use crate::model::{BuyOffer, HandCard, IncomingCard, Phase, Snapshot};

fn card(name: &str, overlay: &str) -> String {
    format!("{name}:{overlay}")
}

/// Order-preserving signature of the hand.
pub fn hand(hand: &[HandCard]) -> String {
    hand.iter()
        .map(|c| card(&c.name, &c.overlay))
        .collect::<Vec<_>>()
        .join("|")
}

/// Order-preserving signature of the incoming effects.
pub fn incoming(incoming: &[IncomingCard]) -> String {
    incoming
        .iter()
        .map(|c| card(&c.name, &c.overlay))
        .collect::<Vec<_>>()
        .join("|")
}

/// Signature of the top purchase offer; empty when there is none.
pub fn offer(offer: Option<&BuyOffer>) -> String {
    offer.map(|o| card(&o.name, &o.overlay)).unwrap_or_default()
}

/// Everything visible that can indicate progress.
pub fn progress(snap: &Snapshot) -> String {
    format!(
        "{}|{}|{}|{}",
        snap.phase,
        hand(&snap.hand),
        incoming(&snap.incoming),
        offer(snap.offer.as_ref())
    )
}

/// Signature a deferred decision is tagged with. Purchase prompts only care
/// about the offer; everything else about phase, hand and incoming.
pub fn deferral(snap: &Snapshot) -> String {
    if snap.phase == Phase::BuyChoice {
        return format!("buy:{}", offer(snap.offer.as_ref()));
    }
    format!(
        "{}|{}|{}",
        snap.phase,
        hand(&snap.hand),
        incoming(&snap.incoming)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(index: usize, name: &str, overlay: &str) -> HandCard {
        HandCard {
            index,
            name: name.into(),
            overlay: overlay.into(),
            ..Default::default()
        }
    }

    #[test]
    fn hand_ignores_index_but_keeps_order() {
        let a = [c(0, "Sword", "3"), c(1, "Shield", "")];
        let b = [c(4, "Sword", "3"), c(7, "Shield", "")];
        let swapped = [c(0, "Shield", ""), c(1, "Sword", "3")];
        assert_eq!(hand(&a), "Sword:3|Shield:");
        assert_eq!(hand(&a), hand(&b));
        assert_ne!(hand(&a), hand(&swapped));
    }

    #[test]
    fn deferral_for_buy_choice_ignores_hand() {
        let mut snap = Snapshot {
            phase: Phase::BuyChoice,
            offer: Some(BuyOffer {
                name: "Bow".into(),
                overlay: "5".into(),
                ..Default::default()
            }),
            ..Default::default()
        };
        let before = deferral(&snap);
        snap.hand.push(c(0, "Axe", ""));
        assert_eq!(before, "buy:Bow:5");
        assert_eq!(deferral(&snap), before);
        assert_eq!(progress(&snap), "buy_choice|Axe:||Bow:5");
    }
}
