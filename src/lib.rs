// Library crate for the party deck game server
// This file exposes the public API for integration tests

pub mod admin;
pub mod catalog;
pub mod event;
pub mod game;
pub mod room;
pub mod shared;
pub mod websockets;

// Re-export commonly used types for easier access in tests
pub use event::EventBus;
pub use game::{GameService, ResolutionInput, SweepConfig, Sweeper};
pub use room::{RoomRegistry, RoomService};
pub use shared::{AppError, AppState, GameError};
pub use websockets::{
    ActionLimiter, ClientMessage, ConnectionTracker, InMemoryConnectionTracker, ServerMessage,
};
