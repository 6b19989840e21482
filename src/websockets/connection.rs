use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::{mpsc, RwLock};
use tracing::debug;

/// Socket bookkeeping: outbound send handles plus the two-way mapping
/// between connection ids and in-room identities.
///
/// A connection starts registered but unbound; creating, joining or
/// reconnecting binds it to a `(room, player)` pair. Binding an identity
/// that is already held by another connection displaces the older one,
/// which covers a player reopening the game in a fresh tab.
#[async_trait]
pub trait ConnectionTracker: Send + Sync {
    /// Stores the outbound handle for a freshly accepted socket.
    async fn register(&self, conn_id: &str, sender: mpsc::UnboundedSender<String>);

    /// Drops the socket's handle and whatever binding it still holds.
    async fn remove_connection(&self, conn_id: &str);

    async fn bind(&self, conn_id: &str, room_code: &str, player_id: &str);

    /// Looks up the binding without touching it.
    async fn resolve(&self, conn_id: &str) -> Option<(String, String)>;

    /// Removes and returns the binding; the send handle stays registered.
    async fn unbind(&self, conn_id: &str) -> Option<(String, String)>;

    /// Reverse unbind by identity, returning the connection that held it.
    /// The handle stays registered so a farewell frame can still be sent.
    async fn unbind_identity(&self, room_code: &str, player_id: &str) -> Option<String>;

    /// Drops every binding pointing into a room.
    async fn purge_room(&self, room_code: &str);

    async fn send_to(&self, conn_id: &str, message: String);
}

#[derive(Default)]
struct TrackerState {
    senders: HashMap<String, mpsc::UnboundedSender<String>>,
    // conn id -> (room code, player id)
    by_conn: HashMap<String, (String, String)>,
    // (room code, player id) -> conn id
    by_identity: HashMap<(String, String), String>,
}

pub struct InMemoryConnectionTracker {
    state: RwLock<TrackerState>,
}

impl InMemoryConnectionTracker {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(TrackerState::default()),
        }
    }
}

impl Default for InMemoryConnectionTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConnectionTracker for InMemoryConnectionTracker {
    async fn register(&self, conn_id: &str, sender: mpsc::UnboundedSender<String>) {
        let mut state = self.state.write().await;
        state.senders.insert(conn_id.to_string(), sender);
    }

    async fn remove_connection(&self, conn_id: &str) {
        let mut state = self.state.write().await;
        state.senders.remove(conn_id);
        if let Some(identity) = state.by_conn.remove(conn_id) {
            if state.by_identity.get(&identity).map(String::as_str) == Some(conn_id) {
                state.by_identity.remove(&identity);
            }
        }
    }

    async fn bind(&self, conn_id: &str, room_code: &str, player_id: &str) {
        let mut state = self.state.write().await;
        let identity = (room_code.to_string(), player_id.to_string());

        if let Some(displaced) = state.by_identity.insert(identity.clone(), conn_id.to_string()) {
            if displaced != conn_id {
                state.by_conn.remove(&displaced);
                debug!(conn_id = %displaced, "Stale connection displaced by rebind");
            }
        }
        if let Some(old_identity) = state
            .by_conn
            .insert(conn_id.to_string(), identity.clone())
        {
            if old_identity != identity
                && state.by_identity.get(&old_identity).map(String::as_str) == Some(conn_id)
            {
                state.by_identity.remove(&old_identity);
            }
        }
    }

    async fn resolve(&self, conn_id: &str) -> Option<(String, String)> {
        let state = self.state.read().await;
        state.by_conn.get(conn_id).cloned()
    }

    async fn unbind(&self, conn_id: &str) -> Option<(String, String)> {
        let mut state = self.state.write().await;
        let identity = state.by_conn.remove(conn_id)?;
        if state.by_identity.get(&identity).map(String::as_str) == Some(conn_id) {
            state.by_identity.remove(&identity);
        }
        Some(identity)
    }

    async fn unbind_identity(&self, room_code: &str, player_id: &str) -> Option<String> {
        let mut state = self.state.write().await;
        let identity = (room_code.to_string(), player_id.to_string());
        let conn_id = state.by_identity.remove(&identity)?;
        state.by_conn.remove(&conn_id);
        Some(conn_id)
    }

    async fn purge_room(&self, room_code: &str) {
        let mut state = self.state.write().await;
        let doomed: Vec<(String, String)> = state
            .by_identity
            .keys()
            .filter(|(room, _)| room == room_code)
            .cloned()
            .collect();
        for identity in doomed {
            if let Some(conn_id) = state.by_identity.remove(&identity) {
                state.by_conn.remove(&conn_id);
            }
        }
    }

    async fn send_to(&self, conn_id: &str, message: String) {
        let state = self.state.read().await;
        if let Some(sender) = state.senders.get(conn_id) {
            // A failed send means the socket is mid-teardown.
            let _ = sender.send(message);
        }
    }
}
