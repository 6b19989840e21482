use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

use crate::catalog::CardKind;
use crate::game::turn;

/// Bounded append-only history; oldest entries are trimmed past this.
pub const LOG_CAP: usize = 200;
/// How many recently confirmed ack ids are remembered for idempotent replays.
pub const CONFIRMED_ACK_RING_CAP: usize = 32;
/// Display name bounds, after trimming.
pub const MAX_NAME_LEN: usize = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerMode {
    Player,
    Spectator,
}

/// One seat at the table.
///
/// Seat indices are assigned at join time and never renumbered; spectators sit
/// at seat -1 and stay out of turn rotation and voting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: String,
    pub name: String,
    pub seat: i32,
    pub mode: PlayerMode,
    pub connected: bool,
    pub joined_at: DateTime<Utc>,
}

impl Player {
    pub fn is_active(&self) -> bool {
        self.mode == PlayerMode::Player
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandingRule {
    pub id: String,
    pub text: String,
    pub created_by: String,
    pub card_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveEvent {
    pub card_id: String,
    pub title: String,
    pub text: String,
    pub started_at: DateTime<Utc>,
}

/// Standing consequences of resolved cards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActiveEffects {
    pub rules: Vec<StandingRule>,
    /// player id -> role title
    pub roles: HashMap<String, String>,
    /// player id -> curse title
    pub curses: HashMap<String, String>,
    pub event: Option<ActiveEvent>,
}

/// The drawn-but-unresolved card, at most one per room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentDraw {
    pub card_id: String,
    pub drawer_id: String,
    pub drawn_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnTimer {
    pub enabled: bool,
    pub seconds: i64,
    pub ends_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled_reason: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrinkTally {
    pub given: u32,
    pub taken: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub at: DateTime<Utc>,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AckStatus {
    Pending,
    Confirmed,
}

/// Structured ack metadata, enough for a client to render the request
/// without per-card special cases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AckMeta {
    pub kind: CardKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub targets: Vec<String>,
}

/// Non-blocking "please confirm you did this" receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingAck {
    pub id: String,
    pub card_id: String,
    pub card_title: String,
    pub instruction: String,
    pub created_by: String,
    pub assigned_to: String,
    pub status: AckStatus,
    pub created_at: DateTime<Utc>,
    pub meta: AckMeta,
}

/// A duel participant's hidden pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuelChoice {
    Rock,
    Paper,
    Scissors,
}

impl DuelChoice {
    /// Fixed beats-relationship of the duel set.
    pub fn beats(self, other: DuelChoice) -> bool {
        matches!(
            (self, other),
            (DuelChoice::Rock, DuelChoice::Scissors)
                | (DuelChoice::Scissors, DuelChoice::Paper)
                | (DuelChoice::Paper, DuelChoice::Rock)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteSide {
    A,
    B,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuelState {
    pub card_id: String,
    pub challenger: String,
    pub opponent: String,
    /// Hidden until resolution; snapshots only expose who has chosen.
    pub choices: HashMap<String, DuelChoice>,
    pub started_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoteState {
    pub card_id: String,
    pub question: String,
    pub started_by: String,
    /// Hidden until resolution; snapshots only expose who has voted.
    pub votes: HashMap<String, VoteSide>,
    pub started_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Embedded mini-game substituting for direct card resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Interaction {
    Duel(DuelState),
    GroupVote(VoteState),
}

impl Interaction {
    pub fn expires_at(&self) -> DateTime<Utc> {
        match self {
            Interaction::Duel(duel) => duel.expires_at,
            Interaction::GroupVote(vote) => vote.expires_at,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawMode {
    Sequential,
    Weighted,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoomSettings {
    pub safe_mode: bool,
    pub draw_mode: DrawMode,
    pub turn_timer: bool,
}

impl Default for RoomSettings {
    fn default() -> Self {
        Self {
            safe_mode: false,
            draw_mode: DrawMode::Weighted,
            turn_timer: true,
        }
    }
}

/// Partial settings update; omitted fields stay untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SettingsPatch {
    #[serde(default)]
    pub safe_mode: Option<bool>,
    #[serde(default)]
    pub draw_mode: Option<DrawMode>,
    #[serde(default)]
    pub turn_timer: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeckConfig {
    pub base_order: Vec<String>,
    pub custom_order: Option<Vec<String>>,
    pub cursor: usize,
}

impl DeckConfig {
    pub fn new(base_order: Vec<String>) -> Self {
        Self {
            base_order,
            custom_order: None,
            cursor: 0,
        }
    }

    /// The order draws come from: the host-installed custom order if present,
    /// otherwise the base order.
    pub fn order(&self) -> &[String] {
        match &self.custom_order {
            Some(order) => order,
            None => &self.base_order,
        }
    }
}

/// The authoritative state of one game session.
#[derive(Debug, Clone, PartialEq)]
pub struct Room {
    pub code: String,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub settings: RoomSettings,
    pub deck: DeckConfig,
    pub discard: Vec<String>,
    pub players: Vec<Player>,
    /// Seat number of the turn holder; resolved through the turn scheduler.
    pub turn_index: i32,
    pub current_draw: Option<CurrentDraw>,
    pub effects: ActiveEffects,
    pub turn_timer: Option<TurnTimer>,
    pub interaction: Option<Interaction>,
    pub pending_acks: Vec<PendingAck>,
    pub confirmed_acks: VecDeque<String>,
    pub drink_stats: HashMap<String, DrinkTally>,
    pub log: VecDeque<LogEntry>,
    /// Idle-nudge dedup key, one per (card, drawer, turn).
    pub nudged_for: Option<String>,
}

impl Room {
    pub fn new(code: String, base_order: Vec<String>, now: DateTime<Utc>) -> Self {
        Self {
            code,
            created_at: now,
            last_activity: now,
            settings: RoomSettings::default(),
            deck: DeckConfig::new(base_order),
            discard: Vec::new(),
            players: Vec::new(),
            turn_index: 0,
            current_draw: None,
            effects: ActiveEffects::default(),
            turn_timer: None,
            interaction: None,
            pending_acks: Vec::new(),
            confirmed_acks: VecDeque::new(),
            drink_stats: HashMap::new(),
            log: VecDeque::new(),
            nudged_for: None,
        }
    }

    /// Refresh the activity timestamp. Called on every successful player
    /// action, never by the sweep.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_activity = now;
    }

    pub fn push_log(&mut self, now: DateTime<Utc>, message: impl Into<String>) {
        self.log.push_back(LogEntry {
            at: now,
            message: message.into(),
        });
        while self.log.len() > LOG_CAP {
            self.log.pop_front();
        }
    }

    pub fn player(&self, player_id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == player_id)
    }

    pub fn player_mut(&mut self, player_id: &str) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == player_id)
    }

    pub fn player_name(&self, player_id: &str) -> String {
        self.player(player_id)
            .map(|p| p.name.clone())
            .unwrap_or_else(|| "someone".to_string())
    }

    pub fn find_by_name_ci(&self, name: &str) -> Option<&Player> {
        let lowered = name.to_lowercase();
        self.players.iter().find(|p| p.name.to_lowercase() == lowered)
    }

    /// Seat 0 is the permanent host for the room's lifetime.
    pub fn host(&self) -> Option<&Player> {
        self.players.iter().find(|p| p.seat == 0)
    }

    pub fn is_host(&self, player_id: &str) -> bool {
        self.host().map(|h| h.id == player_id).unwrap_or(false)
    }

    /// Next seat for a joining player. Seats are never reused, so this is one
    /// past the highest seat ever assigned.
    pub fn next_seat(&self) -> i32 {
        self.players
            .iter()
            .map(|p| p.seat)
            .max()
            .map(|max| max + 1)
            .unwrap_or(0)
    }

    pub fn add_drinks_taken(&mut self, player_id: &str, amount: u32) {
        let tally = self.drink_stats.entry(player_id.to_string()).or_default();
        tally.taken += amount;
    }

    pub fn add_drinks_given(&mut self, player_id: &str, amount: u32) {
        let tally = self.drink_stats.entry(player_id.to_string()).or_default();
        tally.given += amount;
    }

    /// Clear the current draw along with its timer and nudge key.
    pub fn clear_draw(&mut self) {
        self.current_draw = None;
        self.turn_timer = None;
        self.nudged_for = None;
    }

    /// Client-facing view of the room with hidden interaction state stripped.
    pub fn snapshot(&self) -> RoomSnapshot {
        let interaction = self.interaction.as_ref().map(|i| match i {
            Interaction::Duel(duel) => InteractionView::Duel {
                card_id: duel.card_id.clone(),
                challenger: duel.challenger.clone(),
                opponent: duel.opponent.clone(),
                chosen: duel.choices.keys().cloned().collect(),
                expires_at: duel.expires_at,
            },
            Interaction::GroupVote(vote) => InteractionView::GroupVote {
                card_id: vote.card_id.clone(),
                question: vote.question.clone(),
                voted: vote.votes.keys().cloned().collect(),
                expires_at: vote.expires_at,
            },
        });

        RoomSnapshot {
            code: self.code.clone(),
            created_at: self.created_at,
            last_activity: self.last_activity,
            settings: self.settings,
            players: self.players.clone(),
            turn_index: self.turn_index,
            current_player_id: turn::current_turn_player(self).map(|p| p.id.clone()),
            current_draw: self.current_draw.clone(),
            effects: self.effects.clone(),
            turn_timer: self.turn_timer.clone(),
            interaction,
            pending_acks: self.pending_acks.clone(),
            drink_stats: self.drink_stats.clone(),
            discard_count: self.discard.len(),
            log: self.log.iter().cloned().collect(),
        }
    }
}

/// Sanitized interaction state for snapshots: who has acted, never what they
/// picked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InteractionView {
    Duel {
        card_id: String,
        challenger: String,
        opponent: String,
        chosen: Vec<String>,
        expires_at: DateTime<Utc>,
    },
    GroupVote {
        card_id: String,
        question: String,
        voted: Vec<String>,
        expires_at: DateTime<Utc>,
    },
}

/// The room state broadcast to clients after every mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomSnapshot {
    pub code: String,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub settings: RoomSettings,
    pub players: Vec<Player>,
    pub turn_index: i32,
    pub current_player_id: Option<String>,
    pub current_draw: Option<CurrentDraw>,
    pub effects: ActiveEffects,
    pub turn_timer: Option<TurnTimer>,
    pub interaction: Option<InteractionView>,
    pub pending_acks: Vec<PendingAck>,
    pub drink_stats: HashMap<String, DrinkTally>,
    pub discard_count: usize,
    pub log: Vec<LogEntry>,
}

/// One row of the operator room listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomSummary {
    pub code: String,
    pub players: usize,
    pub spectators: usize,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub has_draw: bool,
    pub has_interaction: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_room() -> Room {
        Room::new("brave-otter".to_string(), vec![], Utc::now())
    }

    fn add_player(room: &mut Room, id: &str, name: &str, seat: i32, mode: PlayerMode) {
        room.players.push(Player {
            id: id.to_string(),
            name: name.to_string(),
            seat,
            mode,
            connected: true,
            joined_at: Utc::now(),
        });
    }

    #[test]
    fn test_next_seat_skips_spectators_and_gaps() {
        let mut room = test_room();
        assert_eq!(room.next_seat(), 0);

        add_player(&mut room, "h", "Ann", 0, PlayerMode::Player);
        assert_eq!(room.next_seat(), 1);

        add_player(&mut room, "s", "Watcher", -1, PlayerMode::Spectator);
        assert_eq!(room.next_seat(), 1);

        add_player(&mut room, "p3", "Cleo", 3, PlayerMode::Player);
        assert_eq!(room.next_seat(), 4);
    }

    #[test]
    fn test_find_by_name_is_case_insensitive() {
        let mut room = test_room();
        add_player(&mut room, "h", "Ann", 0, PlayerMode::Player);

        assert!(room.find_by_name_ci("ann").is_some());
        assert!(room.find_by_name_ci("ANN").is_some());
        assert!(room.find_by_name_ci("Bea").is_none());
    }

    #[test]
    fn test_log_is_capped() {
        let mut room = test_room();
        let now = Utc::now();
        for i in 0..(LOG_CAP + 25) {
            room.push_log(now, format!("entry {i}"));
        }

        assert_eq!(room.log.len(), LOG_CAP);
        // Oldest entries were trimmed.
        assert_eq!(room.log.front().unwrap().message, "entry 25");
    }

    #[test]
    fn test_duel_choice_beats() {
        assert!(DuelChoice::Rock.beats(DuelChoice::Scissors));
        assert!(DuelChoice::Scissors.beats(DuelChoice::Paper));
        assert!(DuelChoice::Paper.beats(DuelChoice::Rock));
        assert!(!DuelChoice::Rock.beats(DuelChoice::Paper));
        assert!(!DuelChoice::Rock.beats(DuelChoice::Rock));
    }

    #[test]
    fn test_snapshot_hides_duel_choices() {
        let mut room = test_room();
        add_player(&mut room, "a", "Ann", 0, PlayerMode::Player);
        add_player(&mut room, "b", "Bea", 1, PlayerMode::Player);

        let mut choices = HashMap::new();
        choices.insert("a".to_string(), DuelChoice::Rock);
        let now = Utc::now();
        room.interaction = Some(Interaction::Duel(DuelState {
            card_id: "showdown".to_string(),
            challenger: "a".to_string(),
            opponent: "b".to_string(),
            choices,
            started_at: now,
            expires_at: now + chrono::Duration::seconds(60),
        }));

        let snapshot = room.snapshot();
        match &snapshot.interaction {
            Some(InteractionView::Duel { chosen, .. }) => {
                assert_eq!(chosen, &vec!["a".to_string()]);
            }
            other => panic!("expected duel view, got {other:?}"),
        }

        // The raw choice must not appear anywhere in the serialized form.
        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(!json.contains("rock"));
    }

    #[test]
    fn test_clear_draw_resets_timer_and_nudge() {
        let mut room = test_room();
        let now = Utc::now();
        room.current_draw = Some(CurrentDraw {
            card_id: "take-two".to_string(),
            drawer_id: "a".to_string(),
            drawn_at: now,
        });
        room.turn_timer = Some(TurnTimer {
            enabled: true,
            seconds: 30,
            ends_at: now + chrono::Duration::seconds(30),
            disabled_reason: None,
        });
        room.nudged_for = Some("key".to_string());

        room.clear_draw();
        assert!(room.current_draw.is_none());
        assert!(room.turn_timer.is_none());
        assert!(room.nudged_for.is_none());
    }
}
