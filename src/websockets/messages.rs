use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::Card;
use crate::game::resolve::ResolutionInput;
use crate::room::models::{
    DuelChoice, InteractionView, RoomSnapshot, SettingsPatch, VoteSide,
};

/// Client-to-server frames.
///
/// Wire shape is `{"type": "...", "payload": {...}}`. Identity-bearing
/// actions carry `room_code`/`player_id` explicitly; the handler checks
/// them against the connection's binding before dispatch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientMessage {
    RoomCreate {
        name: String,
    },
    RoomJoin {
        room_code: String,
        name: String,
        #[serde(default)]
        spectator: bool,
    },
    RoomSync {
        room_code: String,
    },
    PlayerReconnect {
        room_code: String,
        player_id: String,
    },
    TurnDraw {
        room_code: String,
        player_id: String,
    },
    CardResolve {
        room_code: String,
        player_id: String,
        card_id: String,
        #[serde(default)]
        resolution: ResolutionInput,
    },
    AckConfirm {
        room_code: String,
        player_id: String,
        ack_id: String,
    },
    DuelChoose {
        room_code: String,
        player_id: String,
        choice: DuelChoice,
    },
    VoteCast {
        room_code: String,
        player_id: String,
        side: VoteSide,
    },
    TurnNudge {
        room_code: String,
        player_id: String,
        target_id: String,
    },
    UpdateSettings {
        room_code: String,
        player_id: String,
        patch: SettingsPatch,
    },
    SetDeck {
        room_code: String,
        player_id: String,
        deck_order: Vec<String>,
    },
    HostKick {
        room_code: String,
        player_id: String,
        target_id: String,
    },
    HostClose {
        room_code: String,
        player_id: String,
    },
}

impl ClientMessage {
    /// Stable action name, used as the rate-limiter key and echoed in
    /// `ACTION_OK`.
    pub fn action_tag(&self) -> &'static str {
        match self {
            ClientMessage::RoomCreate { .. } => "room:create",
            ClientMessage::RoomJoin { .. } => "room:join",
            ClientMessage::RoomSync { .. } => "room:sync",
            ClientMessage::PlayerReconnect { .. } => "player:reconnect",
            ClientMessage::TurnDraw { .. } => "turn:draw",
            ClientMessage::CardResolve { .. } => "card:resolve",
            ClientMessage::AckConfirm { .. } => "ack:confirm",
            ClientMessage::DuelChoose { .. } => "interaction:duel:choose",
            ClientMessage::VoteCast { .. } => "interaction:vote:cast",
            ClientMessage::TurnNudge { .. } => "turn:nudge",
            ClientMessage::UpdateSettings { .. } => "room:updateSettings",
            ClientMessage::SetDeck { .. } => "room:setDeck",
            ClientMessage::HostKick { .. } => "host:kick",
            ClientMessage::HostClose { .. } => "host:close-room",
        }
    }

    /// State-recovery actions are never throttled.
    pub fn rate_limit_exempt(&self) -> bool {
        matches!(
            self,
            ClientMessage::RoomSync { .. } | ClientMessage::PlayerReconnect { .. }
        )
    }

    /// The room a frame addresses, if any.
    pub fn room_code(&self) -> Option<&str> {
        match self {
            ClientMessage::RoomCreate { .. } => None,
            ClientMessage::RoomJoin { room_code, .. }
            | ClientMessage::RoomSync { room_code }
            | ClientMessage::PlayerReconnect { room_code, .. }
            | ClientMessage::TurnDraw { room_code, .. }
            | ClientMessage::CardResolve { room_code, .. }
            | ClientMessage::AckConfirm { room_code, .. }
            | ClientMessage::DuelChoose { room_code, .. }
            | ClientMessage::VoteCast { room_code, .. }
            | ClientMessage::TurnNudge { room_code, .. }
            | ClientMessage::UpdateSettings { room_code, .. }
            | ClientMessage::SetDeck { room_code, .. }
            | ClientMessage::HostKick { room_code, .. }
            | ClientMessage::HostClose { room_code, .. } => Some(room_code),
        }
    }
}

/// Server-to-client frames, same `{type, payload}` shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerMessage {
    /// Hello on socket accept; lets clients offset countdowns against
    /// server clock.
    Welcome {
        server_time: DateTime<Utc>,
    },
    RoomCreated {
        room_code: String,
        player_id: String,
        room: RoomSnapshot,
    },
    RoomJoined {
        room_code: String,
        player_id: String,
        room: RoomSnapshot,
    },
    RoomState {
        room: RoomSnapshot,
    },
    CardDrawn {
        card: Card,
        drawer_id: String,
    },
    EffectApplied {
        card_id: String,
        message: String,
    },
    TurnChanged {
        player_id: Option<String>,
    },
    AckConfirmed {
        ack_id: String,
        player_id: String,
    },
    InteractionStarted {
        interaction: InteractionView,
    },
    InteractionResolved {
        message: String,
    },
    PlayerNudged {
        from: Option<String>,
        to: String,
    },
    RoomClosed {
        message: String,
    },
    Kicked {
        message: String,
    },
    ActionOk {
        action: String,
    },
    Error {
        code: String,
        message: String,
    },
}
