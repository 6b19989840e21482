// Public API
pub use models::{
    Player, PlayerMode, Room, RoomSettings, RoomSnapshot, RoomSummary, SettingsPatch,
};
pub use registry::{RoomRegistry, SharedRoom};
pub use service::RoomService;

// Internal modules
pub mod models;
pub mod registry;
pub mod service;
