//! Card selection: a wrapping sequential cursor and the default weighted
//! policy that discourages repeats and type clustering.
//!
//! Selection only picks an id; committing the pick (cursor movement, discard
//! append) happens after the id resolves against the catalog, so a stale id
//! never mutates the deck.

use rand::Rng;

use crate::catalog::CardKind;
use crate::room::models::DeckConfig;

/// How many recent discards the weighted policy looks back over.
pub const RECENT_WINDOW: usize = 8;
/// No candidate weight drops below this.
pub const WEIGHT_FLOOR: f64 = 0.05;

/// Factor for a card that itself sits in the recent window.
const EXACT_REPEAT_FACTOR: f64 = 0.25;
/// Factor for a candidate whose type shows up twice or more in the window.
const TYPE_CLUSTER_FACTOR: f64 = 0.65;

/// A drawable entry: the deck id plus its catalog type, when known.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedCandidate {
    pub id: String,
    pub kind: Option<CardKind>,
}

/// Static starting weight per card type. Forfeits are pushed down further
/// when safe mode is on.
pub fn base_weight(kind: CardKind, safe_mode: bool) -> f64 {
    match kind {
        CardKind::Forfeit if safe_mode => 0.55,
        CardKind::Forfeit => 1.0,
        CardKind::Rule => 0.9,
        CardKind::Role => 0.8,
        CardKind::Curse => 0.75,
        CardKind::Event => 0.5,
        CardKind::Joker => 0.35,
        CardKind::Duel => 0.7,
        CardKind::Vote => 0.65,
    }
}

/// Effective weight of one candidate against the recent-discard window.
pub fn weight_for(
    candidate: &WeightedCandidate,
    recent: &[(String, Option<CardKind>)],
    safe_mode: bool,
) -> f64 {
    let mut weight = candidate
        .kind
        .map(|kind| base_weight(kind, safe_mode))
        .unwrap_or(1.0);

    if recent.iter().any(|(id, _)| *id == candidate.id) {
        weight *= EXACT_REPEAT_FACTOR;
    }

    if candidate.kind == Some(CardKind::Forfeit) {
        let recent_forfeits = recent
            .iter()
            .filter(|(_, kind)| *kind == Some(CardKind::Forfeit))
            .count();
        if recent_forfeits >= 4 {
            weight *= 0.5;
        } else if recent_forfeits >= 3 {
            weight *= 0.7;
        }
    }

    if let Some(kind) = candidate.kind {
        let same_type = recent.iter().filter(|(_, k)| *k == Some(kind)).count();
        if same_type >= 2 {
            weight *= TYPE_CLUSTER_FACTOR;
        }
    }

    weight.max(WEIGHT_FLOOR)
}

/// Cumulative-weight roulette over the candidate list.
///
/// Rounding can exhaust the running value before the walk ends; the last
/// candidate absorbs that case.
pub fn draw_weighted<R: Rng + ?Sized>(
    rng: &mut R,
    candidates: &[WeightedCandidate],
    recent: &[(String, Option<CardKind>)],
    safe_mode: bool,
) -> Option<String> {
    if candidates.is_empty() {
        return None;
    }

    let weights: Vec<f64> = candidates
        .iter()
        .map(|c| weight_for(c, recent, safe_mode))
        .collect();
    let total: f64 = weights.iter().sum();

    let mut value = rng.random_range(0.0..total);
    for (candidate, weight) in candidates.iter().zip(&weights) {
        value -= weight;
        if value <= 0.0 {
            return Some(candidate.id.clone());
        }
    }
    candidates.last().map(|c| c.id.clone())
}

/// The id the sequential cursor points at, without moving the cursor.
pub fn peek_sequential(deck: &DeckConfig) -> Option<String> {
    let order = deck.order();
    if order.is_empty() {
        return None;
    }
    Some(order[deck.cursor % order.len()].clone())
}

/// Moves the sequential cursor one slot forward, wrapping at the end.
pub fn commit_sequential(deck: &mut DeckConfig) {
    let len = deck.order().len();
    if len == 0 {
        return;
    }
    deck.cursor = (deck.cursor + 1) % len;
}

/// The slice of the discard pile the weighted policy considers.
pub fn recent_discards(discard: &[String]) -> &[String] {
    let start = discard.len().saturating_sub(RECENT_WINDOW);
    &discard[start..]
}
