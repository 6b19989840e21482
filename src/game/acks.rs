//! Non-blocking confirmation receipts.
//!
//! A resolved card that targeted someone leaves a "please confirm you did
//! this" receipt for each target. Receipts are social, never gameplay:
//! nothing waits on them and turn progression ignores them entirely.

use chrono::Utc;
use uuid::Uuid;

use crate::catalog::Card;
use crate::room::models::{AckMeta, AckStatus, PendingAck, Room, CONFIRMED_ACK_RING_CAP};
use crate::shared::GameError;

/// Result of a confirm call. Replays of a recently confirmed id succeed
/// without side effects.
#[derive(Debug, Clone, PartialEq)]
pub enum AckConfirmOutcome {
    Confirmed(PendingAck),
    AlreadyConfirmed,
}

/// Appends a pending receipt for `assigned_to` and returns its id.
pub fn create(
    room: &mut Room,
    card: &Card,
    created_by: &str,
    assigned_to: &str,
    instruction: String,
    meta: AckMeta,
) -> String {
    let id = Uuid::new_v4().to_string();
    room.pending_acks.push(PendingAck {
        id: id.clone(),
        card_id: card.id.clone(),
        card_title: card.title.clone(),
        instruction,
        created_by: created_by.to_string(),
        assigned_to: assigned_to.to_string(),
        status: AckStatus::Pending,
        created_at: Utc::now(),
        meta,
    });
    id
}

/// Confirms a receipt.
///
/// Confirmed receipts are pruned immediately; their ids go into a bounded
/// ring so a double-tap confirms idempotently instead of erroring.
pub fn confirm(
    room: &mut Room,
    ack_id: &str,
    player_id: &str,
) -> Result<AckConfirmOutcome, GameError> {
    if let Some(index) = room.pending_acks.iter().position(|a| a.id == ack_id) {
        if room.pending_acks[index].assigned_to != player_id {
            return Err(GameError::NotYourAck);
        }
        let mut ack = room.pending_acks.remove(index);
        ack.status = AckStatus::Confirmed;

        room.confirmed_acks.push_back(ack.id.clone());
        while room.confirmed_acks.len() > CONFIRMED_ACK_RING_CAP {
            room.confirmed_acks.pop_front();
        }
        return Ok(AckConfirmOutcome::Confirmed(ack));
    }

    if room.confirmed_acks.iter().any(|id| id == ack_id) {
        return Ok(AckConfirmOutcome::AlreadyConfirmed);
    }

    Err(GameError::AckNotFound)
}
