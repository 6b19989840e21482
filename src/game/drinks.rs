//! Heuristic drink-tally bookkeeping.
//!
//! Card text is scanned for drink language; nothing here is authoritative
//! game logic, it only keeps the per-player given/taken counters roughly
//! honest for the end-of-night recap.

use crate::catalog::Card;
use crate::room::models::Room;

const DRINK_WORDS: [&str; 6] = ["sip", "drink", "shot", "gulp", "chug", "swig"];
const GIVE_MARKERS: [&str; 4] = ["give", "hand out", "distribute", "share"];

/// Units for "finish your drink" style cards.
const FINISH_UNITS: u32 = 5;
/// Parsed unit counts are clamped to this.
const MAX_UNITS: u32 = 10;

/// What a tally pass actually recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TallyApplication {
    pub units: u32,
    /// True when the resolver handed the units out instead of taking them.
    pub distributed: bool,
}

/// Units implied by the card text, if it talks about drinking at all.
pub fn drink_units(text: &str) -> Option<u32> {
    let lowered = text.to_lowercase();
    if !DRINK_WORDS.iter().any(|word| lowered.contains(word)) {
        return None;
    }
    if lowered.contains("finish") {
        return Some(FINISH_UNITS);
    }
    if let Some(number) = first_number(&lowered) {
        return Some(number.clamp(1, MAX_UNITS));
    }
    // Drink language with no amount counts as one unit.
    Some(1)
}

/// Updates the room tallies for a resolved card.
///
/// With targets and give-language the resolver distributes the units, one
/// share per target; otherwise the resolver takes them. A resolution-supplied
/// count replaces the amount parsed from the text. Safe mode halves units,
/// rounding up.
pub fn apply_card_tally(
    room: &mut Room,
    card: &Card,
    resolver_id: &str,
    targets: &[String],
    count_override: Option<u32>,
) -> Option<TallyApplication> {
    let parsed = drink_units(&card.text)?;
    let mut units = count_override
        .map(|count| count.clamp(1, MAX_UNITS))
        .unwrap_or(parsed);
    if room.settings.safe_mode {
        units = (units + 1) / 2;
    }

    let lowered = card.text.to_lowercase();
    let gives = GIVE_MARKERS.iter().any(|marker| lowered.contains(marker));

    if gives && !targets.is_empty() {
        room.add_drinks_given(resolver_id, units * targets.len() as u32);
        for target in targets {
            room.add_drinks_taken(target, units);
        }
        Some(TallyApplication {
            units,
            distributed: true,
        })
    } else {
        room.add_drinks_taken(resolver_id, units);
        Some(TallyApplication {
            units,
            distributed: false,
        })
    }
}

fn first_number(text: &str) -> Option<u32> {
    text.split(|c: char| !c.is_ascii_digit())
        .find(|chunk| !chunk.is_empty())
        .and_then(|chunk| chunk.parse().ok())
}
