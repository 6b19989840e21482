//! Seat-order turn rotation over the non-spectator players.
//!
//! Seats are stable for a room's lifetime, so the live roster can be ragged
//! (holes after kicks, seats beyond the active count). Resolution therefore
//! always goes through [`current_turn_player`], which tolerates a
//! `turn_index` that no longer lands on a seat.

use crate::room::models::{Player, Room};
use crate::shared::GameError;

/// Players participating in turn rotation, in roster order.
pub fn active_players(room: &Room) -> Vec<&Player> {
    room.players.iter().filter(|p| p.is_active()).collect()
}

/// The player whose turn it is: the active player seated at `turn_index`,
/// falling back to the first active player when the seat is vacant. `None`
/// only when no active players remain.
pub fn current_turn_player(room: &Room) -> Option<&Player> {
    let active = active_players(room);
    active
        .iter()
        .find(|p| p.seat == room.turn_index)
        .copied()
        .or_else(|| active.first().copied())
}

/// Validates that `player_id` holds the turn right now.
pub fn assert_turn_holder(room: &Room, player_id: &str) -> Result<(), GameError> {
    let holder = current_turn_player(room).ok_or(GameError::NoTurnPlayer)?;
    if holder.id != player_id {
        return Err(GameError::NotYourTurn);
    }
    Ok(())
}

/// Moves the turn one step: `turn_index` wraps modulo the active-player
/// count. Mutates nothing else.
pub fn advance_turn(room: &mut Room) {
    let active_count = room.players.iter().filter(|p| p.is_active()).count();
    if active_count == 0 {
        return;
    }
    room.turn_index = (room.turn_index + 1) % active_count as i32;
}
