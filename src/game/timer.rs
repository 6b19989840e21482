//! Turn-timer duration policy.
//!
//! The countdown length follows what the drawn card asks of the drawer:
//! cards that create standing effects or need target picking get more time,
//! free-text and discussion cards get no timer at all so nobody is rushed
//! while typing or talking.

use chrono::{DateTime, Duration, Utc};

use crate::catalog::{Card, CardKind, ResolutionKind};
use crate::room::models::TurnTimer;

pub const BASE_SECONDS: i64 = 30;
/// Extra time for categories that install standing effects.
pub const MULTI_EFFECT_BONUS: i64 = 15;
/// Extra time for room-wide event cards.
pub const EVENT_BONUS: i64 = 60;
pub const MIN_SECONDS: i64 = 20;
pub const MAX_SECONDS: i64 = 90;

/// Text fragments that mark a card as open-ended discussion.
const OPEN_ENDED_MARKERS: [&str; 3] = ["discuss", "debate", "story"];

/// Builds the timer for a fresh draw of `card`, anchored at `now`.
pub fn timer_for_card(card: &Card, now: DateTime<Utc>) -> TurnTimer {
    if card.resolution == ResolutionKind::RuleText {
        return disabled(now, "Rule writing is untimed");
    }
    if is_open_ended(&card.text) {
        return disabled(now, "Discussion cards are untimed");
    }

    let seconds = duration_seconds(card.kind, card.resolution);
    TurnTimer {
        enabled: true,
        seconds,
        ends_at: now + Duration::seconds(seconds),
        disabled_reason: None,
    }
}

/// Raw duration table: base plus category and input-kind bonuses, clamped.
pub fn duration_seconds(kind: CardKind, resolution: ResolutionKind) -> i64 {
    let mut seconds = BASE_SECONDS;

    seconds += match kind {
        CardKind::Rule | CardKind::Role | CardKind::Curse => MULTI_EFFECT_BONUS,
        CardKind::Event | CardKind::Joker => EVENT_BONUS,
        _ => 0,
    };

    seconds += match resolution {
        ResolutionKind::Target => 10,
        ResolutionKind::Count => 10,
        ResolutionKind::TargetCount => 15,
        ResolutionKind::TwoTargets => 20,
        _ => 0,
    };

    seconds.clamp(MIN_SECONDS, MAX_SECONDS)
}

fn is_open_ended(text: &str) -> bool {
    let lowered = text.to_lowercase();
    OPEN_ENDED_MARKERS
        .iter()
        .any(|marker| lowered.contains(marker))
}

fn disabled(now: DateTime<Utc>, reason: &str) -> TurnTimer {
    TurnTimer {
        enabled: false,
        seconds: 0,
        ends_at: now,
        disabled_reason: Some(reason.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(CardKind::Forfeit, ResolutionKind::None, 30)]
    #[case(CardKind::Forfeit, ResolutionKind::Target, 40)]
    #[case(CardKind::Forfeit, ResolutionKind::Count, 40)]
    #[case(CardKind::Forfeit, ResolutionKind::TargetCount, 45)]
    #[case(CardKind::Rule, ResolutionKind::None, 45)]
    #[case(CardKind::Role, ResolutionKind::Target, 55)]
    #[case(CardKind::Curse, ResolutionKind::TwoTargets, 65)]
    #[case(CardKind::Event, ResolutionKind::None, 90)]
    #[case(CardKind::Joker, ResolutionKind::None, 90)]
    #[case(CardKind::Duel, ResolutionKind::DuelChallenge, 30)]
    #[case(CardKind::Vote, ResolutionKind::GroupVote, 30)]
    fn test_duration_table(
        #[case] kind: CardKind,
        #[case] resolution: ResolutionKind,
        #[case] expected: i64,
    ) {
        assert_eq!(duration_seconds(kind, resolution), expected);
    }

    #[test]
    fn test_duration_is_clamped() {
        // Event plus the two-target bonus would exceed the cap.
        assert_eq!(
            duration_seconds(CardKind::Event, ResolutionKind::TwoTargets),
            MAX_SECONDS
        );
    }

    #[test]
    fn test_rule_text_cards_are_untimed() {
        let card = Card::new(
            "make-a-rule",
            CardKind::Rule,
            "Rule Maker",
            "Write a new rule for the table.",
            ResolutionKind::RuleText,
        );
        let timer = timer_for_card(&card, Utc::now());

        assert!(!timer.enabled);
        assert!(timer.disabled_reason.is_some());
    }

    #[test]
    fn test_discussion_cards_are_untimed() {
        let card = Card::new(
            "story-time",
            CardKind::Event,
            "Story Time",
            "Discuss your most embarrassing moment.",
            ResolutionKind::None,
        );
        let timer = timer_for_card(&card, Utc::now());

        assert!(!timer.enabled);
        assert_eq!(
            timer.disabled_reason.as_deref(),
            Some("Discussion cards are untimed")
        );
    }

    #[test]
    fn test_timed_card_gets_absolute_deadline() {
        let card = Card::new(
            "take-two",
            CardKind::Forfeit,
            "Take Two",
            "Take 2 sips.",
            ResolutionKind::None,
        );
        let now = Utc::now();
        let timer = timer_for_card(&card, now);

        assert!(timer.enabled);
        assert_eq!(timer.seconds, 30);
        assert_eq!(timer.ends_at, now + Duration::seconds(30));
        assert!(timer.disabled_reason.is_none());
    }
}
