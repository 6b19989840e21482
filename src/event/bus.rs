use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::debug;

use crate::websockets::messages::ServerMessage;

/// Per-channel buffer; a socket forwarder that lags this far gets a
/// `Lagged` error and resynchronizes from the next room snapshot.
const ROOM_CHANNEL_CAPACITY: usize = 100;

/// Fan-out bus for room broadcasts.
///
/// Each room gets its own lazily-created broadcast channel; every socket
/// bound to the room holds a receiver. Dropping the sender (on room close)
/// lets receivers drain what was already queued and then observe `Closed`.
#[derive(Debug, Clone)]
pub struct EventBus {
    /// Room broadcast channels: room code -> sender.
    room_channels: Arc<RwLock<HashMap<String, broadcast::Sender<ServerMessage>>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            room_channels: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Publishes a message to all subscribers of a room.
    pub async fn publish_to_room(&self, room_code: &str, message: ServerMessage) {
        let room_channels = self.room_channels.read().await;

        if let Some(sender) = room_channels.get(room_code) {
            match sender.send(message) {
                Ok(receivers) => {
                    debug!(room_code = %room_code, receivers, "Room message published");
                }
                Err(_) => {
                    debug!(room_code = %room_code, "Room message published with no receivers");
                }
            }
            return;
        }
        drop(room_channels);

        // First publish for this room creates the channel.
        let mut room_channels = self.room_channels.write().await;
        let sender = room_channels
            .entry(room_code.to_string())
            .or_insert_with(|| broadcast::channel(ROOM_CHANNEL_CAPACITY).0);
        if sender.send(message).is_err() {
            debug!(room_code = %room_code, "Room message published to fresh channel with no receivers");
        }
    }

    /// Subscribes to a room's broadcast stream, creating the channel on
    /// first use.
    pub async fn subscribe_to_room(&self, room_code: &str) -> broadcast::Receiver<ServerMessage> {
        let room_channels = self.room_channels.read().await;

        if let Some(sender) = room_channels.get(room_code) {
            return sender.subscribe();
        }
        drop(room_channels);

        let mut room_channels = self.room_channels.write().await;
        room_channels
            .entry(room_code.to_string())
            .or_insert_with(|| broadcast::channel(ROOM_CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// Drops a room's channel so its subscribers see end-of-stream.
    pub async fn remove_room(&self, room_code: &str) {
        let mut room_channels = self.room_channels.write().await;
        if room_channels.remove(room_code).is_some() {
            debug!(room_code = %room_code, "Room channel removed");
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::broadcast::error::{RecvError, TryRecvError};

    #[tokio::test]
    async fn test_subscribers_receive_published_messages() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe_to_room("r").await;

        bus.publish_to_room(
            "r",
            ServerMessage::InteractionResolved {
                message: "done".to_string(),
            },
        )
        .await;

        match rx.try_recv() {
            Ok(ServerMessage::InteractionResolved { message }) => assert_eq!(message, "done"),
            other => panic!("unexpected receive: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_silent() {
        let bus = EventBus::new();
        bus.publish_to_room(
            "quiet",
            ServerMessage::RoomClosed {
                message: "bye".to_string(),
            },
        )
        .await;

        // A later subscriber only sees messages published after it joined.
        let mut rx = bus.subscribe_to_room("quiet").await;
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn test_remove_room_drains_then_closes() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe_to_room("r").await;

        bus.publish_to_room(
            "r",
            ServerMessage::RoomClosed {
                message: "closing".to_string(),
            },
        )
        .await;
        bus.remove_room("r").await;

        assert!(matches!(rx.recv().await, Ok(ServerMessage::RoomClosed { .. })));
        assert!(matches!(rx.recv().await, Err(RecvError::Closed)));
    }

    #[tokio::test]
    async fn test_rooms_are_isolated() {
        let bus = EventBus::new();
        let mut rx_a = bus.subscribe_to_room("a").await;
        let mut rx_b = bus.subscribe_to_room("b").await;

        bus.publish_to_room(
            "a",
            ServerMessage::InteractionResolved {
                message: "only a".to_string(),
            },
        )
        .await;

        assert!(rx_a.try_recv().is_ok());
        assert!(matches!(rx_b.try_recv(), Err(TryRecvError::Empty)));
    }
}
