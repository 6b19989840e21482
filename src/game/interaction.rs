//! Embedded mini-games: the two-party duel and the room-wide binary vote.
//!
//! Both run against an absolute expiry evaluated by the sweep. Resolution
//! itself is pure; [`apply_interaction_outcome`] is the single place the
//! room is mutated, so eager resolution (everyone acted) and expiry
//! resolution share one code path.

use chrono::{DateTime, Duration, Utc};

use crate::catalog::Card;
use crate::game::turn;
use crate::room::models::{DuelChoice, DuelState, Interaction, Room, VoteSide, VoteState};

pub const DUEL_EXPIRY_SECS: i64 = 60;
pub const VOTE_EXPIRY_SECS: i64 = 75;

/// One drink unit per penalized player.
const PENALTY_UNITS: u32 = 1;

/// Result of resolving an interaction: what to announce and who drinks.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionOutcome {
    pub message: String,
    pub penalized: Vec<String>,
}

pub fn start_duel(
    card_id: &str,
    challenger: &str,
    opponent: &str,
    now: DateTime<Utc>,
) -> Interaction {
    Interaction::Duel(DuelState {
        card_id: card_id.to_string(),
        challenger: challenger.to_string(),
        opponent: opponent.to_string(),
        choices: Default::default(),
        started_at: now,
        expires_at: now + Duration::seconds(DUEL_EXPIRY_SECS),
    })
}

pub fn start_vote(card: &Card, started_by: &str, now: DateTime<Utc>) -> Interaction {
    Interaction::GroupVote(VoteState {
        card_id: card.id.clone(),
        question: card.text.clone(),
        started_by: started_by.to_string(),
        votes: Default::default(),
        started_at: now,
        expires_at: now + Duration::seconds(VOTE_EXPIRY_SECS),
    })
}

/// Resolves a duel once both picks are in; `None` while someone is missing.
pub fn try_resolve_duel(room: &Room, duel: &DuelState) -> Option<InteractionOutcome> {
    let challenger_choice = duel.choices.get(&duel.challenger)?;
    let opponent_choice = duel.choices.get(&duel.opponent)?;

    let challenger_name = room.player_name(&duel.challenger);
    let opponent_name = room.player_name(&duel.opponent);

    let outcome = if challenger_choice.beats(*opponent_choice) {
        InteractionOutcome {
            message: format!(
                "{challenger_name} won the duel: {} beats {}. {opponent_name} drinks",
                choice_label(*challenger_choice),
                choice_label(*opponent_choice)
            ),
            penalized: vec![duel.opponent.clone()],
        }
    } else if opponent_choice.beats(*challenger_choice) {
        InteractionOutcome {
            message: format!(
                "{opponent_name} won the duel: {} beats {}. {challenger_name} drinks",
                choice_label(*opponent_choice),
                choice_label(*challenger_choice)
            ),
            penalized: vec![duel.challenger.clone()],
        }
    } else {
        InteractionOutcome {
            message: format!(
                "The duel tied on {}. {challenger_name} and {opponent_name} both drink",
                choice_label(*challenger_choice)
            ),
            penalized: vec![duel.challenger.clone(), duel.opponent.clone()],
        }
    };
    Some(outcome)
}

/// Expiry fallback for a duel: whoever failed to answer takes the penalty.
/// A fully answered duel still resolves normally here.
pub fn resolve_duel_expiry(room: &Room, duel: &DuelState) -> InteractionOutcome {
    if let Some(outcome) = try_resolve_duel(room, duel) {
        return outcome;
    }

    let challenger_chose = duel.choices.contains_key(&duel.challenger);
    let opponent_chose = duel.choices.contains_key(&duel.opponent);

    match (challenger_chose, opponent_chose) {
        (true, false) => InteractionOutcome {
            message: format!(
                "{} never answered the duel and drinks",
                room.player_name(&duel.opponent)
            ),
            penalized: vec![duel.opponent.clone()],
        },
        (false, true) => InteractionOutcome {
            message: format!(
                "{} never answered the duel and drinks",
                room.player_name(&duel.challenger)
            ),
            penalized: vec![duel.challenger.clone()],
        },
        _ => InteractionOutcome {
            message: "Nobody answered the duel, both drink".to_string(),
            penalized: vec![duel.challenger.clone(), duel.opponent.clone()],
        },
    }
}

/// Resolves a vote once every active player has cast; `None` otherwise.
pub fn try_resolve_vote(room: &Room, vote: &VoteState) -> Option<InteractionOutcome> {
    let all_voted = turn::active_players(room)
        .iter()
        .all(|p| vote.votes.contains_key(&p.id));
    if !all_voted {
        return None;
    }
    Some(tally_vote(room, vote))
}

/// Expiry fallback for a vote: whoever voted counts, non-voters do not.
pub fn resolve_vote_expiry(room: &Room, vote: &VoteState) -> InteractionOutcome {
    tally_vote(room, vote)
}

fn tally_vote(room: &Room, vote: &VoteState) -> InteractionOutcome {
    let mut side_a: Vec<String> = Vec::new();
    let mut side_b: Vec<String> = Vec::new();
    for (player_id, side) in &vote.votes {
        match side {
            VoteSide::A => side_a.push(player_id.clone()),
            VoteSide::B => side_b.push(player_id.clone()),
        }
    }

    if side_a.len() == side_b.len() {
        let everyone: Vec<String> = turn::active_players(room)
            .iter()
            .map(|p| p.id.clone())
            .collect();
        return InteractionOutcome {
            message: format!(
                "The vote tied {}-{}. Everyone drinks",
                side_a.len(),
                side_b.len()
            ),
            penalized: everyone,
        };
    }

    let (winners, losers, winner_label) = if side_a.len() > side_b.len() {
        (side_a, side_b, "A")
    } else {
        (side_b, side_a, "B")
    };
    InteractionOutcome {
        message: format!(
            "Option {winner_label} won {}-{}. The minority drinks",
            winners.len(),
            losers.len()
        ),
        penalized: losers,
    }
}

/// Applies an outcome: penalties to players still present, log, clear the
/// interaction, advance the turn.
pub fn apply_interaction_outcome(room: &mut Room, outcome: &InteractionOutcome) {
    for player_id in &outcome.penalized {
        if room.player(player_id).is_some() {
            room.add_drinks_taken(player_id, PENALTY_UNITS);
        }
    }
    room.push_log(Utc::now(), outcome.message.clone());
    room.interaction = None;
    turn::advance_turn(room);
}

fn choice_label(choice: DuelChoice) -> &'static str {
    match choice {
        DuelChoice::Rock => "rock",
        DuelChoice::Paper => "paper",
        DuelChoice::Scissors => "scissors",
    }
}
