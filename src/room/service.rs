use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::models::{
    Player, PlayerMode, Room, RoomSnapshot, RoomSummary, SettingsPatch, MAX_NAME_LEN,
};
use super::registry::{valid_room_code, RoomRegistry};
use crate::catalog::CardCatalog;
use crate::event::EventBus;
use crate::shared::GameError;
use crate::websockets::connection::ConnectionTracker;
use crate::websockets::messages::ServerMessage;

/// Service for room lifecycle: create, join, reconnect, host controls, close.
///
/// Gameplay actions live in the game service; this one owns who is in the
/// room and whether the room exists at all.
pub struct RoomService {
    registry: Arc<RoomRegistry>,
    catalog: Arc<CardCatalog>,
    connections: Arc<dyn ConnectionTracker + Send + Sync>,
    event_bus: EventBus,
}

impl RoomService {
    pub fn new(
        registry: Arc<RoomRegistry>,
        catalog: Arc<CardCatalog>,
        connections: Arc<dyn ConnectionTracker + Send + Sync>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            registry,
            catalog,
            connections,
            event_bus,
        }
    }

    /// Creates a room with a fresh code and seats the creator as host.
    ///
    /// Seat 0 is the host seat for the room's whole lifetime; host rights
    /// never move to another player.
    #[instrument(skip(self))]
    pub async fn create_room(
        &self,
        conn_id: &str,
        name: &str,
    ) -> Result<(String, String, RoomSnapshot), GameError> {
        let name = validate_name(name)?;
        let code = self.generate_code().await;
        let now = Utc::now();

        let mut room = Room::new(code.clone(), self.catalog.base_order(), now);
        let host_id = Uuid::new_v4().to_string();
        room.players.push(Player {
            id: host_id.clone(),
            name: name.clone(),
            seat: 0,
            mode: PlayerMode::Player,
            connected: true,
            joined_at: now,
        });
        room.push_log(now, format!("{name} opened the table"));
        let snapshot = room.snapshot();

        self.registry.insert(room).await;
        self.connections.bind(conn_id, &code, &host_id).await;

        info!(room_code = %code, host = %name, "Room created");
        Ok((code, host_id, snapshot))
    }

    /// Joins a room as a seated player or a spectator.
    ///
    /// Seated players get the next never-used seat; spectators sit at -1 and
    /// are excluded from turn order.
    #[instrument(skip(self))]
    pub async fn join_room(
        &self,
        conn_id: &str,
        room_code: &str,
        name: &str,
        spectator: bool,
    ) -> Result<(String, RoomSnapshot), GameError> {
        if !valid_room_code(room_code) {
            return Err(GameError::InvalidRoomCode);
        }
        let name = validate_name(name)?;
        let shared = self
            .registry
            .get(room_code)
            .await
            .ok_or(GameError::RoomNotFound)?;

        let (player_id, snapshot) = {
            let mut room = shared.lock().await;
            if room.find_by_name_ci(&name).is_some() {
                return Err(GameError::NameTaken);
            }

            let now = Utc::now();
            let player_id = Uuid::new_v4().to_string();
            let (seat, mode) = if spectator {
                (-1, PlayerMode::Spectator)
            } else {
                (room.next_seat(), PlayerMode::Player)
            };
            room.players.push(Player {
                id: player_id.clone(),
                name: name.clone(),
                seat,
                mode,
                connected: true,
                joined_at: now,
            });
            if spectator {
                room.push_log(now, format!("{name} is watching"));
            } else {
                room.push_log(now, format!("{name} joined the table"));
            }
            room.touch(now);
            (player_id, room.snapshot())
        };

        self.connections.bind(conn_id, room_code, &player_id).await;
        self.event_bus
            .publish_to_room(
                room_code,
                ServerMessage::RoomState {
                    room: snapshot.clone(),
                },
            )
            .await;

        info!(room_code = %room_code, player = %name, spectator, "Player joined room");
        Ok((player_id, snapshot))
    }

    /// Returns the current snapshot without mutating anything.
    #[instrument(skip(self))]
    pub async fn sync(&self, room_code: &str) -> Result<RoomSnapshot, GameError> {
        if !valid_room_code(room_code) {
            return Err(GameError::InvalidRoomCode);
        }
        let shared = self
            .registry
            .get(room_code)
            .await
            .ok_or(GameError::RoomNotFound)?;
        let room = shared.lock().await;
        Ok(room.snapshot())
    }

    /// Re-attaches a known player id to a new connection.
    #[instrument(skip(self))]
    pub async fn reconnect(
        &self,
        conn_id: &str,
        room_code: &str,
        player_id: &str,
    ) -> Result<RoomSnapshot, GameError> {
        if !valid_room_code(room_code) {
            return Err(GameError::InvalidRoomCode);
        }
        if Uuid::parse_str(player_id).is_err() {
            return Err(GameError::InvalidPlayerId);
        }
        let shared = self
            .registry
            .get(room_code)
            .await
            .ok_or(GameError::RoomNotFound)?;

        let snapshot = {
            let mut room = shared.lock().await;
            let now = Utc::now();
            let name = {
                let player = room
                    .player_mut(player_id)
                    .ok_or(GameError::PlayerNotFound)?;
                player.connected = true;
                player.name.clone()
            };
            room.push_log(now, format!("{name} reconnected"));
            room.touch(now);
            room.snapshot()
        };

        self.connections.bind(conn_id, room_code, player_id).await;
        self.event_bus
            .publish_to_room(
                room_code,
                ServerMessage::RoomState {
                    room: snapshot.clone(),
                },
            )
            .await;

        info!(room_code = %room_code, player_id = %player_id, "Player reconnected");
        Ok(snapshot)
    }

    /// Applies the departure rules for a dropped connection.
    ///
    /// Host gone closes the whole room, spectators are removed outright, and
    /// seated players stay in the roster marked disconnected so they can
    /// reclaim their seat later. Never refreshes the activity clock.
    #[instrument(skip(self))]
    pub async fn handle_disconnect(&self, conn_id: &str) {
        let Some((room_code, player_id)) = self.connections.unbind(conn_id).await else {
            debug!(conn_id = %conn_id, "Disconnect from unbound connection");
            return;
        };
        let Some(shared) = self.registry.get(&room_code).await else {
            return;
        };

        let snapshot = {
            let mut room = shared.lock().await;
            if room.is_host(&player_id) {
                drop(room);
                self.force_close(&room_code, "Host disconnected").await;
                return;
            }

            let now = Utc::now();
            match room.player(&player_id) {
                Some(p) if p.mode == PlayerMode::Spectator => {
                    let name = p.name.clone();
                    room.players.retain(|p| p.id != player_id);
                    room.push_log(now, format!("{name} stopped watching"));
                }
                Some(p) => {
                    let name = p.name.clone();
                    if let Some(player) = room.player_mut(&player_id) {
                        player.connected = false;
                    }
                    room.push_log(now, format!("{name} disconnected"));
                }
                None => return,
            }
            room.snapshot()
        };

        self.event_bus
            .publish_to_room(&room_code, ServerMessage::RoomState { room: snapshot })
            .await;
        debug!(room_code = %room_code, player_id = %player_id, "Connection unbound");
    }

    /// Host-only partial settings update; omitted fields keep their value.
    #[instrument(skip(self))]
    pub async fn update_settings(
        &self,
        room_code: &str,
        player_id: &str,
        patch: SettingsPatch,
    ) -> Result<RoomSnapshot, GameError> {
        let shared = self
            .registry
            .get(room_code)
            .await
            .ok_or(GameError::RoomNotFound)?;

        let snapshot = {
            let mut room = shared.lock().await;
            if !room.is_host(player_id) {
                return Err(GameError::NotHost);
            }

            if let Some(safe_mode) = patch.safe_mode {
                room.settings.safe_mode = safe_mode;
            }
            if let Some(draw_mode) = patch.draw_mode {
                room.settings.draw_mode = draw_mode;
            }
            if let Some(turn_timer) = patch.turn_timer {
                room.settings.turn_timer = turn_timer;
            }

            let now = Utc::now();
            let host = room.player_name(player_id);
            room.push_log(now, format!("{host} updated the room settings"));
            room.touch(now);
            room.snapshot()
        };

        self.event_bus
            .publish_to_room(
                room_code,
                ServerMessage::RoomState {
                    room: snapshot.clone(),
                },
            )
            .await;
        info!(room_code = %room_code, "Settings updated");
        Ok(snapshot)
    }

    /// Host-only deck replacement. The whole order must resolve against the
    /// catalog; the draw cursor restarts at the front.
    #[instrument(skip(self, deck_order))]
    pub async fn set_deck(
        &self,
        room_code: &str,
        player_id: &str,
        deck_order: Vec<String>,
    ) -> Result<RoomSnapshot, GameError> {
        if deck_order.is_empty() {
            return Err(GameError::EmptyDeck);
        }
        if let Some(unknown) = self.catalog.first_unknown(&deck_order).await {
            debug!(card_id = %unknown, "Deck order references unknown card");
            return Err(GameError::EmptyDeck);
        }
        let shared = self
            .registry
            .get(room_code)
            .await
            .ok_or(GameError::RoomNotFound)?;

        let (snapshot, deck_len) = {
            let mut room = shared.lock().await;
            if !room.is_host(player_id) {
                return Err(GameError::NotHost);
            }
            let deck_len = deck_order.len();
            room.deck.custom_order = Some(deck_order);
            room.deck.cursor = 0;

            let now = Utc::now();
            let host = room.player_name(player_id);
            room.push_log(now, format!("{host} swapped in a new deck"));
            room.touch(now);
            (room.snapshot(), deck_len)
        };

        self.event_bus
            .publish_to_room(
                room_code,
                ServerMessage::RoomState {
                    room: snapshot.clone(),
                },
            )
            .await;
        info!(room_code = %room_code, cards = deck_len, "Deck replaced");
        Ok(snapshot)
    }

    /// Host-only removal of another player.
    #[instrument(skip(self))]
    pub async fn kick(
        &self,
        room_code: &str,
        host_id: &str,
        target_id: &str,
    ) -> Result<RoomSnapshot, GameError> {
        let shared = self
            .registry
            .get(room_code)
            .await
            .ok_or(GameError::RoomNotFound)?;

        let (snapshot, target_name) = {
            let mut room = shared.lock().await;
            if !room.is_host(host_id) {
                return Err(GameError::NotHost);
            }
            if host_id == target_id {
                return Err(GameError::InvalidTarget);
            }
            let host = room.player_name(host_id);
            let target_name = remove_player(&mut room, target_id)?;
            let now = Utc::now();
            room.push_log(now, format!("{host} removed {target_name}"));
            room.touch(now);
            (room.snapshot(), target_name)
        };

        self.notify_kicked(room_code, target_id, "You were removed by the host")
            .await;
        self.event_bus
            .publish_to_room(
                room_code,
                ServerMessage::RoomState {
                    room: snapshot.clone(),
                },
            )
            .await;
        info!(room_code = %room_code, target = %target_name, "Player kicked");
        Ok(snapshot)
    }

    /// Operator removal, no host check. The host can be removed this way,
    /// which leaves the room without one until it idles out.
    #[instrument(skip(self))]
    pub async fn admin_kick(
        &self,
        room_code: &str,
        target_id: &str,
    ) -> Result<RoomSnapshot, GameError> {
        let shared = self
            .registry
            .get(room_code)
            .await
            .ok_or(GameError::RoomNotFound)?;

        let snapshot = {
            let mut room = shared.lock().await;
            let target_name = remove_player(&mut room, target_id)?;
            let now = Utc::now();
            room.push_log(now, format!("{target_name} was removed by an operator"));
            room.snapshot()
        };

        self.notify_kicked(room_code, target_id, "You were removed by an operator")
            .await;
        self.event_bus
            .publish_to_room(
                room_code,
                ServerMessage::RoomState {
                    room: snapshot.clone(),
                },
            )
            .await;
        info!(room_code = %room_code, target_id = %target_id, "Player kicked by operator");
        Ok(snapshot)
    }

    /// Host-only room shutdown.
    #[instrument(skip(self))]
    pub async fn close_room(&self, room_code: &str, player_id: &str) -> Result<(), GameError> {
        let shared = self
            .registry
            .get(room_code)
            .await
            .ok_or(GameError::RoomNotFound)?;
        {
            let room = shared.lock().await;
            if !room.is_host(player_id) {
                return Err(GameError::NotHost);
            }
        }
        self.force_close(room_code, "Host closed the room").await;
        Ok(())
    }

    /// Tears a room down: announce, release its connections, drop the state.
    ///
    /// The closing broadcast is published before the room channel is removed
    /// so subscribers still drain it.
    pub async fn force_close(&self, room_code: &str, message: &str) {
        self.event_bus
            .publish_to_room(
                room_code,
                ServerMessage::RoomClosed {
                    message: message.to_string(),
                },
            )
            .await;
        self.connections.purge_room(room_code).await;
        self.registry.remove(room_code).await;
        self.event_bus.remove_room(room_code).await;
        info!(room_code = %room_code, message = %message, "Room closed");
    }

    /// Operator listing of every live room.
    pub async fn room_summaries(&self) -> Vec<RoomSummary> {
        let mut summaries = Vec::new();
        for code in self.registry.codes().await {
            if let Some(shared) = self.registry.get(&code).await {
                let room = shared.lock().await;
                summaries.push(RoomSummary {
                    code: room.code.clone(),
                    players: room.players.iter().filter(|p| p.is_active()).count(),
                    spectators: room.players.iter().filter(|p| !p.is_active()).count(),
                    created_at: room.created_at,
                    last_activity: room.last_activity,
                    has_draw: room.current_draw.is_some(),
                    has_interaction: room.interaction.is_some(),
                });
            }
        }
        summaries.sort_by(|a, b| a.code.cmp(&b.code));
        summaries
    }

    async fn generate_code(&self) -> String {
        for _ in 0..8 {
            let code = petname::Petnames::default().generate_one(2, "-");
            if !self.registry.contains(&code).await {
                return code;
            }
        }
        // Collision streak; fall back to a unique suffix.
        format!("room-{}", Uuid::new_v4())
    }

    async fn notify_kicked(&self, room_code: &str, target_id: &str, message: &str) {
        let Some(conn_id) = self.connections.unbind_identity(room_code, target_id).await else {
            return;
        };
        let kicked = ServerMessage::Kicked {
            message: message.to_string(),
        };
        if let Ok(payload) = serde_json::to_string(&kicked) {
            self.connections.send_to(&conn_id, payload).await;
        }
    }
}

/// Removes a player and everything that only made sense while they were
/// seated: a draw they owned and acks waiting on them. Seats of the remaining
/// players are untouched.
fn remove_player(room: &mut Room, target_id: &str) -> Result<String, GameError> {
    let name = room
        .player(target_id)
        .map(|p| p.name.clone())
        .ok_or(GameError::PlayerNotFound)?;

    room.players.retain(|p| p.id != target_id);
    if room
        .current_draw
        .as_ref()
        .map(|draw| draw.drawer_id == target_id)
        .unwrap_or(false)
    {
        room.clear_draw();
    }
    room.pending_acks.retain(|ack| ack.assigned_to != target_id);
    Ok(name)
}

fn validate_name(name: &str) -> Result<String, GameError> {
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed.len() > MAX_NAME_LEN {
        return Err(GameError::InvalidName);
    }
    Ok(trimmed.to_string())
}
