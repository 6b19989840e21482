use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use super::models::Room;

/// Rooms are locked individually so one room's action never blocks another's.
pub type SharedRoom = Arc<Mutex<Room>>;

/// In-memory map from room code to live room state.
pub struct RoomRegistry {
    rooms: RwLock<HashMap<String, SharedRoom>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
        }
    }

    pub async fn insert(&self, room: Room) -> SharedRoom {
        let code = room.code.clone();
        let shared = Arc::new(Mutex::new(room));
        self.rooms.write().await.insert(code, shared.clone());
        shared
    }

    pub async fn get(&self, code: &str) -> Option<SharedRoom> {
        self.rooms.read().await.get(code).cloned()
    }

    pub async fn remove(&self, code: &str) -> Option<SharedRoom> {
        self.rooms.write().await.remove(code)
    }

    pub async fn contains(&self, code: &str) -> bool {
        self.rooms.read().await.contains_key(code)
    }

    pub async fn codes(&self) -> Vec<String> {
        self.rooms.read().await.keys().cloned().collect()
    }

    pub async fn count(&self) -> usize {
        self.rooms.read().await.len()
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Room codes are generated as short hyphenated words; anything a client sends
/// back must stay in that shape.
pub fn valid_room_code(code: &str) -> bool {
    !code.is_empty()
        && code.len() <= 48
        && code.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}
