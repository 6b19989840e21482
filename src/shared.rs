use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use crate::admin::AdminConfig;
use crate::catalog::CardCatalog;
use crate::event::EventBus;
use crate::game::service::GameService;
use crate::game::sweep::SweepConfig;
use crate::room::registry::RoomRegistry;
use crate::room::service::RoomService;
use crate::websockets::connection::ConnectionTracker;
use crate::websockets::rate_limit::ActionLimiter;

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<RoomRegistry>,
    pub catalog: Arc<CardCatalog>,
    pub connections: Arc<dyn ConnectionTracker + Send + Sync>,
    pub event_bus: EventBus,
    pub rooms: Arc<RoomService>,
    pub game: Arc<GameService>,
    pub limiter: Arc<ActionLimiter>,
    pub admin: AdminConfig,
    pub sweep_config: SweepConfig,
}

impl AppState {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        registry: Arc<RoomRegistry>,
        catalog: Arc<CardCatalog>,
        connections: Arc<dyn ConnectionTracker + Send + Sync>,
        event_bus: EventBus,
        rooms: Arc<RoomService>,
        game: Arc<GameService>,
        limiter: Arc<ActionLimiter>,
        admin: AdminConfig,
        sweep_config: SweepConfig,
    ) -> Self {
        Self {
            registry,
            catalog,
            connections,
            event_bus,
            rooms,
            game,
            limiter,
            admin,
            sweep_config,
        }
    }
}

/// Domain errors for every player and host action.
///
/// Every failure an action can produce is one of these variants; none of them
/// leave room state partially mutated. The wire representation is the stable
/// code from [`GameError::code`] plus the human-readable display text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Room code is malformed")]
    InvalidRoomCode,

    #[error("Player id is malformed")]
    InvalidPlayerId,

    #[error("Display name must be 1-24 characters")]
    InvalidName,

    #[error("Room not found")]
    RoomNotFound,

    #[error("Card not found in the catalog")]
    CardNotFound,

    #[error("Confirmation not found")]
    AckNotFound,

    #[error("Player not found in this room")]
    PlayerNotFound,

    #[error("Only the host can do that")]
    NotHost,

    #[error("It is not your turn")]
    NotYourTurn,

    #[error("That confirmation is not assigned to you")]
    NotYourAck,

    #[error("Only the drawer can resolve this card")]
    NotDrawer,

    #[error("The current card must be resolved first")]
    UnresolvedCard,

    #[error("An interaction is in progress")]
    InteractionActive,

    #[error("No card is currently drawn")]
    NoActiveDraw,

    #[error("That card is not the current draw")]
    CardMismatch,

    #[error("No interaction is in progress")]
    NoInteraction,

    #[error("You are not part of this duel")]
    NotInDuel,

    #[error("A target player is required")]
    MissingTarget,

    #[error("Two distinct target players are required")]
    MissingTargets,

    #[error("Rule text must not be empty")]
    MissingRuleText,

    #[error("That name is already taken in this room")]
    NameTaken,

    #[error("Deck order is empty or contains unknown cards")]
    EmptyDeck,

    #[error("No active players to take a turn")]
    NoTurnPlayer,

    #[error("Invalid target player")]
    InvalidTarget,

    #[error("Spectators cannot vote")]
    SpectatorsCannotVote,

    #[error("Slow down, that action was just submitted")]
    TooManyRequests,
}

impl GameError {
    /// Stable machine-readable code for the wire protocol.
    pub fn code(&self) -> &'static str {
        match self {
            GameError::InvalidRoomCode => "INVALID_ROOM_CODE",
            GameError::InvalidPlayerId => "INVALID_PLAYER_ID",
            GameError::InvalidName => "INVALID_NAME",
            GameError::RoomNotFound => "ROOM_NOT_FOUND",
            GameError::CardNotFound => "CARD_NOT_FOUND",
            GameError::AckNotFound => "ACK_NOT_FOUND",
            GameError::PlayerNotFound => "PLAYER_NOT_FOUND",
            GameError::NotHost => "NOT_HOST",
            GameError::NotYourTurn => "NOT_YOUR_TURN",
            GameError::NotYourAck => "NOT_YOUR_ACK",
            GameError::NotDrawer => "NOT_DRAWER",
            GameError::UnresolvedCard => "UNRESOLVED_CARD",
            GameError::InteractionActive => "INTERACTION_ACTIVE",
            GameError::NoActiveDraw => "NO_ACTIVE_DRAW",
            GameError::CardMismatch => "CARD_MISMATCH",
            GameError::NoInteraction => "NO_INTERACTION",
            GameError::NotInDuel => "NOT_IN_DUEL",
            GameError::MissingTarget => "MISSING_TARGET",
            GameError::MissingTargets => "MISSING_TARGETS",
            GameError::MissingRuleText => "MISSING_RULE_TEXT",
            GameError::NameTaken => "NAME_TAKEN",
            GameError::EmptyDeck => "EMPTY_DECK",
            GameError::NoTurnPlayer => "NO_TURN_PLAYER",
            GameError::InvalidTarget => "INVALID_TARGET",
            GameError::SpectatorsCannotVote => "SPECTATORS_CANNOT_VOTE",
            GameError::TooManyRequests => "TOO_MANY_REQUESTS",
        }
    }
}

/// HTTP-facing errors for the admin surface
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Game(#[from] GameError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Game(ref err) => {
                let status = match err {
                    GameError::RoomNotFound
                    | GameError::PlayerNotFound
                    | GameError::CardNotFound
                    | GameError::AckNotFound => StatusCode::NOT_FOUND,
                    GameError::NotHost => StatusCode::FORBIDDEN,
                    GameError::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
                    _ => StatusCode::BAD_REQUEST,
                };
                (status, err.to_string())
            }
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}
