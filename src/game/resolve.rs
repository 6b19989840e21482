//! Card resolution: validated player input applied to room effects.
//!
//! Validation is fully front-loaded. Every error path returns before the
//! first mutation, so a failed resolve leaves the room exactly as it was.
//! Turn advancement is the caller's job; this module only applies effects.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::{
    Card, CardKind, ResolutionKind, SpecialEffect, MAX_COUNT, MAX_RULE_TEXT_LEN, MIN_COUNT,
};
use crate::game::{acks, drinks};
use crate::room::models::{AckMeta, ActiveEvent, Room, StandingRule};
use crate::shared::GameError;

/// Player-supplied resolution payload, tagged by what the card asked for.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolutionInput {
    #[default]
    None,
    Target {
        target: String,
    },
    TwoTargets {
        first: String,
        second: String,
    },
    Count {
        count: u32,
    },
    TargetCount {
        target: String,
        count: u32,
    },
    RuleText {
        text: String,
    },
    DuelChallenge {
        opponent: String,
    },
    GroupVote,
}

/// What a successful resolution produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionOutcome {
    pub message: String,
    pub targets: Vec<String>,
}

/// Input after validation: targets exist and are distinct, the count is
/// clamped, the rule text is trimmed and bounded.
#[derive(Debug, Default)]
struct ValidatedInput {
    targets: Vec<String>,
    count: Option<u32>,
    rule_text: Option<String>,
}

/// Applies `card` to the room on behalf of `resolver_id`.
///
/// Special-effect markers win over category dispatch. The common tail
/// (drink tally, log entry, one ack per distinct target) runs for every
/// successful resolution.
pub fn resolve_card(
    room: &mut Room,
    card: &Card,
    resolver_id: &str,
    input: &ResolutionInput,
) -> Result<ResolutionOutcome, GameError> {
    let validated = validate(room, card, input)?;

    let message = if let Some(effect) = card.special {
        apply_special(room, card, resolver_id, effect, &validated)
    } else {
        apply_category(room, card, resolver_id, &validated)
    };

    drinks::apply_card_tally(room, card, resolver_id, &validated.targets, validated.count);
    room.push_log(Utc::now(), message.clone());

    if card.resolution.takes_targets() {
        for target in &validated.targets {
            let instruction = format!(
                "{} played {} on you",
                room.player_name(resolver_id),
                card.title
            );
            let meta = AckMeta {
                kind: card.kind,
                count: validated.count,
                rule_text: validated.rule_text.clone(),
                targets: validated.targets.clone(),
            };
            acks::create(room, card, resolver_id, target, instruction, meta);
        }
    }

    Ok(ResolutionOutcome {
        message,
        targets: validated.targets,
    })
}

fn validate(room: &Room, card: &Card, input: &ResolutionInput) -> Result<ValidatedInput, GameError> {
    match card.resolution {
        ResolutionKind::Target => {
            let target = single_target(input).ok_or(GameError::MissingTarget)?;
            require_player(room, &target)?;
            Ok(ValidatedInput {
                targets: vec![target],
                count: extract_count(input),
                rule_text: None,
            })
        }
        ResolutionKind::TwoTargets => {
            let ResolutionInput::TwoTargets { first, second } = input else {
                return Err(GameError::MissingTargets);
            };
            if first.is_empty() || second.is_empty() || first == second {
                return Err(GameError::MissingTargets);
            }
            require_player(room, first)?;
            require_player(room, second)?;
            Ok(ValidatedInput {
                targets: vec![first.clone(), second.clone()],
                count: None,
                rule_text: None,
            })
        }
        ResolutionKind::Count => Ok(ValidatedInput {
            targets: Vec::new(),
            count: extract_count(input),
            rule_text: None,
        }),
        ResolutionKind::TargetCount => {
            let target = single_target(input).ok_or(GameError::MissingTarget)?;
            require_player(room, &target)?;
            Ok(ValidatedInput {
                targets: vec![target],
                count: extract_count(input),
                rule_text: None,
            })
        }
        ResolutionKind::RuleText => {
            let ResolutionInput::RuleText { text } = input else {
                return Err(GameError::MissingRuleText);
            };
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Err(GameError::MissingRuleText);
            }
            let bounded: String = trimmed.chars().take(MAX_RULE_TEXT_LEN).collect();
            Ok(ValidatedInput {
                targets: Vec::new(),
                count: None,
                rule_text: Some(bounded),
            })
        }
        ResolutionKind::None | ResolutionKind::DuelChallenge | ResolutionKind::GroupVote => {
            Ok(ValidatedInput::default())
        }
    }
}

fn single_target(input: &ResolutionInput) -> Option<String> {
    match input {
        ResolutionInput::Target { target } | ResolutionInput::TargetCount { target, .. } => {
            if target.is_empty() {
                None
            } else {
                Some(target.clone())
            }
        }
        _ => None,
    }
}

fn extract_count(input: &ResolutionInput) -> Option<u32> {
    match input {
        ResolutionInput::Count { count } | ResolutionInput::TargetCount { count, .. } => {
            Some((*count).clamp(MIN_COUNT, MAX_COUNT))
        }
        _ => None,
    }
}

fn require_player(room: &Room, player_id: &str) -> Result<(), GameError> {
    if room.player(player_id).is_none() {
        return Err(GameError::PlayerNotFound);
    }
    Ok(())
}

fn apply_special(
    room: &mut Room,
    card: &Card,
    resolver_id: &str,
    effect: SpecialEffect,
    validated: &ValidatedInput,
) -> String {
    match effect {
        SpecialEffect::LiftCurse => {
            let target = validated
                .targets
                .first()
                .cloned()
                .unwrap_or_else(|| resolver_id.to_string());
            let target_name = room.player_name(&target);
            match room.effects.curses.remove(&target) {
                Some(curse) => format!("{target_name} is freed from {curse}"),
                None => format!("{target_name} had no curse to lift"),
            }
        }
        SpecialEffect::ClearRoles => {
            let cleared = room.effects.roles.len();
            room.effects.roles.clear();
            format!("All roles were cleared ({cleared} removed)")
        }
        SpecialEffect::TransferCurse => {
            let (Some(from), Some(to)) = (validated.targets.first(), validated.targets.get(1))
            else {
                return format!("{} fizzled", card.title);
            };
            let from_name = room.player_name(from);
            let to_name = room.player_name(to);
            match room.effects.curses.remove(from) {
                Some(curse) => {
                    room.effects.curses.insert(to.clone(), curse.clone());
                    format!("{curse} jumped from {from_name} to {to_name}")
                }
                None => format!("{from_name} had no curse to pass on"),
            }
        }
        SpecialEffect::ClearRules => {
            let cleared = room.effects.rules.len();
            room.effects.rules.clear();
            format!("All standing rules were wiped ({cleared} removed)")
        }
    }
}

fn apply_category(
    room: &mut Room,
    card: &Card,
    resolver_id: &str,
    validated: &ValidatedInput,
) -> String {
    match card.kind {
        CardKind::Rule => {
            let text = validated
                .rule_text
                .clone()
                .unwrap_or_else(|| card.text.clone());
            room.effects.rules.push(StandingRule {
                id: Uuid::new_v4().to_string(),
                text: text.clone(),
                created_by: resolver_id.to_string(),
                card_id: card.id.clone(),
                created_at: Utc::now(),
            });
            format!("New rule: {text}")
        }
        CardKind::Role => {
            let target = assignee(resolver_id, validated);
            let name = room.player_name(&target);
            room.effects.roles.insert(target, card.title.clone());
            format!("{name} is now the {}", card.title)
        }
        CardKind::Curse => {
            let target = assignee(resolver_id, validated);
            let name = room.player_name(&target);
            room.effects.curses.insert(target, card.title.clone());
            format!("{name} is cursed: {}", card.title)
        }
        CardKind::Event | CardKind::Joker => {
            room.effects.event = Some(ActiveEvent {
                card_id: card.id.clone(),
                title: card.title.clone(),
                text: card.text.clone(),
                started_at: Utc::now(),
            });
            format!("{} is now in play", card.title)
        }
        CardKind::Forfeit | CardKind::Duel | CardKind::Vote => {
            format!("{} resolved {}", room.player_name(resolver_id), card.title)
        }
    }
}

/// Role and curse cards land on the picked target, or on the resolver for
/// self-targeting cards.
fn assignee(resolver_id: &str, validated: &ValidatedInput) -> String {
    validated
        .targets
        .first()
        .cloned()
        .unwrap_or_else(|| resolver_id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::room::models::{Player, PlayerMode};
    use chrono::Utc;

    fn room_with_players(ids: &[&str]) -> Room {
        let mut room = Room::new("test-room".to_string(), vec![], Utc::now());
        for (i, id) in ids.iter().enumerate() {
            room.players.push(Player {
                id: id.to_string(),
                name: format!("Player-{id}"),
                seat: i as i32,
                mode: PlayerMode::Player,
                connected: true,
                joined_at: Utc::now(),
            });
        }
        room
    }

    fn target_card(kind: CardKind) -> Card {
        Card::new("pick-one", kind, "Pick One", "Pick a player.", ResolutionKind::Target)
    }

    #[test]
    fn test_missing_target_leaves_state_unchanged() {
        let mut room = room_with_players(&["ann", "bea"]);
        let before = room.clone();
        let card = target_card(CardKind::Role);

        let err = resolve_card(&mut room, &card, "ann", &ResolutionInput::None).unwrap_err();

        assert_eq!(err, GameError::MissingTarget);
        assert_eq!(room, before);
    }

    #[test]
    fn test_unknown_target_is_player_not_found() {
        let mut room = room_with_players(&["ann"]);
        let before = room.clone();
        let card = target_card(CardKind::Role);
        let input = ResolutionInput::Target {
            target: "ghost".to_string(),
        };

        assert_eq!(
            resolve_card(&mut room, &card, "ann", &input).unwrap_err(),
            GameError::PlayerNotFound
        );
        assert_eq!(room, before);
    }

    #[test]
    fn test_two_targets_must_be_distinct() {
        let mut room = room_with_players(&["ann", "bea"]);
        let before = room.clone();
        let card = Card::new(
            "swap",
            CardKind::Curse,
            "Swap",
            "Pass a curse along.",
            ResolutionKind::TwoTargets,
        )
        .with_special(SpecialEffect::TransferCurse);

        let input = ResolutionInput::TwoTargets {
            first: "bea".to_string(),
            second: "bea".to_string(),
        };
        assert_eq!(
            resolve_card(&mut room, &card, "ann", &input).unwrap_err(),
            GameError::MissingTargets
        );
        assert_eq!(room, before);
    }

    #[test]
    fn test_rule_text_must_not_be_blank() {
        let mut room = room_with_players(&["ann"]);
        let before = room.clone();
        let card = Card::new(
            "make-a-rule",
            CardKind::Rule,
            "Rule Maker",
            "Write a rule.",
            ResolutionKind::RuleText,
        );

        let input = ResolutionInput::RuleText {
            text: "   ".to_string(),
        };
        assert_eq!(
            resolve_card(&mut room, &card, "ann", &input).unwrap_err(),
            GameError::MissingRuleText
        );
        assert_eq!(room, before);
    }

    #[test]
    fn test_free_text_rule_is_trimmed_and_bounded() {
        let mut room = room_with_players(&["ann"]);
        let card = Card::new(
            "make-a-rule",
            CardKind::Rule,
            "Rule Maker",
            "Write a rule.",
            ResolutionKind::RuleText,
        );

        let long_text = format!("  no phones {}  ", "x".repeat(300));
        let input = ResolutionInput::RuleText { text: long_text };
        resolve_card(&mut room, &card, "ann", &input).unwrap();

        assert_eq!(room.effects.rules.len(), 1);
        let rule = &room.effects.rules[0];
        assert_eq!(rule.text.chars().count(), MAX_RULE_TEXT_LEN);
        assert!(rule.text.starts_with("no phones"));
        assert_eq!(rule.created_by, "ann");
    }

    #[test]
    fn test_plain_rule_card_installs_its_body_text() {
        let mut room = room_with_players(&["ann"]);
        let card = Card::new(
            "thumb-master",
            CardKind::Rule,
            "No Names",
            "Nobody may use first names.",
            ResolutionKind::None,
        );

        let outcome = resolve_card(&mut room, &card, "ann", &ResolutionInput::None).unwrap();

        assert_eq!(room.effects.rules[0].text, "Nobody may use first names.");
        assert_eq!(outcome.message, "New rule: Nobody may use first names.");
    }

    #[test]
    fn test_role_card_assigns_title_to_target() {
        let mut room = room_with_players(&["ann", "bea"]);
        let card = target_card(CardKind::Role);
        let input = ResolutionInput::Target {
            target: "bea".to_string(),
        };

        resolve_card(&mut room, &card, "ann", &input).unwrap();

        assert_eq!(room.effects.roles.get("bea").map(String::as_str), Some("Pick One"));
    }

    #[test]
    fn test_curse_card_without_target_lands_on_resolver() {
        let mut room = room_with_players(&["ann"]);
        let card = Card::new(
            "self-curse",
            CardKind::Curse,
            "Butterfingers",
            "You are cursed.",
            ResolutionKind::None,
        );

        resolve_card(&mut room, &card, "ann", &ResolutionInput::None).unwrap();

        assert_eq!(
            room.effects.curses.get("ann").map(String::as_str),
            Some("Butterfingers")
        );
    }

    #[test]
    fn test_event_card_replaces_active_event() {
        let mut room = room_with_players(&["ann"]);
        let first = Card::new("e1", CardKind::Event, "Heat Wave", "Event one.", ResolutionKind::None);
        let second = Card::new("e2", CardKind::Joker, "Wildcard", "Event two.", ResolutionKind::None);

        resolve_card(&mut room, &first, "ann", &ResolutionInput::None).unwrap();
        resolve_card(&mut room, &second, "ann", &ResolutionInput::None).unwrap();

        let event = room.effects.event.as_ref().unwrap();
        assert_eq!(event.card_id, "e2");
        assert_eq!(event.title, "Wildcard");
    }

    #[test]
    fn test_lift_curse_removes_existing_curse() {
        let mut room = room_with_players(&["ann", "bea"]);
        room.effects
            .curses
            .insert("bea".to_string(), "Butterfingers".to_string());
        let card = Card::new(
            "cleanse",
            CardKind::Curse,
            "Cleanse",
            "Lift a curse.",
            ResolutionKind::Target,
        )
        .with_special(SpecialEffect::LiftCurse);

        let input = ResolutionInput::Target {
            target: "bea".to_string(),
        };
        let outcome = resolve_card(&mut room, &card, "ann", &input).unwrap();

        assert!(room.effects.curses.is_empty());
        assert!(outcome.message.contains("freed from Butterfingers"));
    }

    #[test]
    fn test_transfer_curse_moves_between_targets() {
        let mut room = room_with_players(&["ann", "bea", "cleo"]);
        room.effects
            .curses
            .insert("bea".to_string(), "Butterfingers".to_string());
        let card = Card::new(
            "pass-it-on",
            CardKind::Curse,
            "Pass It On",
            "Move a curse.",
            ResolutionKind::TwoTargets,
        )
        .with_special(SpecialEffect::TransferCurse);

        let input = ResolutionInput::TwoTargets {
            first: "bea".to_string(),
            second: "cleo".to_string(),
        };
        resolve_card(&mut room, &card, "ann", &input).unwrap();

        assert!(room.effects.curses.get("bea").is_none());
        assert_eq!(
            room.effects.curses.get("cleo").map(String::as_str),
            Some("Butterfingers")
        );
    }

    #[test]
    fn test_clear_roles_and_clear_rules() {
        let mut room = room_with_players(&["ann", "bea"]);
        room.effects.roles.insert("ann".to_string(), "DJ".to_string());
        room.effects.rules.push(StandingRule {
            id: "r1".to_string(),
            text: "No names".to_string(),
            created_by: "ann".to_string(),
            card_id: "c".to_string(),
            created_at: Utc::now(),
        });

        let clear_roles = Card::new("cr", CardKind::Event, "Reset", "Roles gone.", ResolutionKind::None)
            .with_special(SpecialEffect::ClearRoles);
        resolve_card(&mut room, &clear_roles, "ann", &ResolutionInput::None).unwrap();
        assert!(room.effects.roles.is_empty());

        let clear_rules = Card::new("cx", CardKind::Rule, "Amnesty", "Rules gone.", ResolutionKind::None)
            .with_special(SpecialEffect::ClearRules);
        resolve_card(&mut room, &clear_rules, "ann", &ResolutionInput::None).unwrap();
        assert!(room.effects.rules.is_empty());
    }

    #[test]
    fn test_targeted_card_creates_ack_and_tally() {
        let mut room = room_with_players(&["ann", "bea"]);
        let card = Card::new(
            "give-three",
            CardKind::Forfeit,
            "Give Three",
            "Give 3 sips to anyone.",
            ResolutionKind::Target,
        );

        let input = ResolutionInput::Target {
            target: "bea".to_string(),
        };
        let outcome = resolve_card(&mut room, &card, "ann", &input).unwrap();

        assert_eq!(outcome.targets, vec!["bea".to_string()]);
        assert_eq!(room.pending_acks.len(), 1);
        assert_eq!(room.pending_acks[0].assigned_to, "bea");
        assert_eq!(room.pending_acks[0].meta.kind, CardKind::Forfeit);
        assert_eq!(room.drink_stats["ann"].given, 3);
        assert_eq!(room.drink_stats["bea"].taken, 3);
    }

    #[test]
    fn test_count_is_clamped_into_bounds() {
        let mut room = room_with_players(&["ann", "bea"]);
        let card = Card::new(
            "your-call",
            CardKind::Forfeit,
            "Your Call",
            "Give sips, you choose how many.",
            ResolutionKind::TargetCount,
        );

        let input = ResolutionInput::TargetCount {
            target: "bea".to_string(),
            count: 99,
        };
        resolve_card(&mut room, &card, "ann", &input).unwrap();

        assert_eq!(room.drink_stats["bea"].taken, MAX_COUNT);
        assert_eq!(room.pending_acks[0].meta.count, Some(MAX_COUNT));
    }

    #[test]
    fn test_resolution_appends_log_but_never_advances_turn() {
        let mut room = room_with_players(&["ann", "bea"]);
        room.turn_index = 0;
        let card = Card::new("c", CardKind::Forfeit, "Card", "Take a sip.", ResolutionKind::None);

        resolve_card(&mut room, &card, "ann", &ResolutionInput::None).unwrap();

        assert_eq!(room.turn_index, 0);
        assert_eq!(room.log.len(), 1);
    }
}
