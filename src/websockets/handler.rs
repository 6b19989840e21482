use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use chrono::Utc;
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::event::EventBus;
use crate::shared::{AppState, GameError};
use crate::websockets::connection::ConnectionTracker;
use crate::websockets::messages::{ClientMessage, ServerMessage};

/// Single websocket endpoint; rooms are entered by frames, not by path.
pub async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let conn_id = Uuid::new_v4().to_string();
    info!(conn_id = %conn_id, "WebSocket connection established");

    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<String>();
    state.connections.register(&conn_id, outbound_tx.clone()).await;

    send_frame(
        &outbound_tx,
        &ServerMessage::Welcome {
            server_time: Utc::now(),
        },
    );

    let (mut ws_tx, mut ws_rx) = socket.split();
    let mut forwarder: Option<JoinHandle<()>> = None;

    loop {
        tokio::select! {
            outbound = outbound_rx.recv() => {
                match outbound {
                    Some(text) => {
                        if ws_tx.send(Message::Text(text)).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
            inbound = ws_rx.next() => {
                match inbound {
                    Some(Ok(Message::Text(text))) => {
                        let (reply, joined_room) = handle_frame(&state, &conn_id, &text).await;
                        if let Some(room_code) = joined_room {
                            if let Some(old) = forwarder.take() {
                                old.abort();
                            }
                            forwarder = Some(
                                spawn_forwarder(
                                    state.event_bus.clone(),
                                    state.connections.clone(),
                                    conn_id.clone(),
                                    room_code,
                                    outbound_tx.clone(),
                                )
                                .await,
                            );
                        }
                        send_frame(&outbound_tx, &reply);
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {} // ping/pong/binary are protocol noise
                    Some(Err(error)) => {
                        warn!(conn_id = %conn_id, error = %error, "WebSocket receive error");
                        break;
                    }
                }
            }
        }
    }

    if let Some(handle) = forwarder.take() {
        handle.abort();
    }
    state.rooms.handle_disconnect(&conn_id).await;
    state.connections.remove_connection(&conn_id).await;
    info!(conn_id = %conn_id, "WebSocket connection closed");
}

fn send_frame(outbound: &mpsc::UnboundedSender<String>, frame: &ServerMessage) {
    if let Ok(text) = serde_json::to_string(frame) {
        let _ = outbound.send(text);
    }
}

/// Relays one room's broadcast stream into a socket's outbound channel.
/// Ends when the room channel closes, the socket goes away, or the
/// connection stops being bound to this room (a kicked client must not
/// keep tailing the room).
async fn spawn_forwarder(
    bus: EventBus,
    connections: Arc<dyn ConnectionTracker + Send + Sync>,
    conn_id: String,
    room_code: String,
    outbound: mpsc::UnboundedSender<String>,
) -> JoinHandle<()> {
    let mut rx = bus.subscribe_to_room(&room_code).await;
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(message) => {
                    let still_bound = connections
                        .resolve(&conn_id)
                        .await
                        .map(|(room, _)| room == room_code)
                        .unwrap_or(false);
                    if !still_bound {
                        debug!(conn_id = %conn_id, room_code = %room_code, "Socket forwarder detached");
                        break;
                    }
                    let Ok(text) = serde_json::to_string(&message) else {
                        continue;
                    };
                    if outbound.send(text).is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    // The next room snapshot resynchronizes the client.
                    warn!(room_code = %room_code, skipped, "Socket forwarder lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
        debug!(room_code = %room_code, "Socket forwarder finished");
    })
}

/// Parses and dispatches one inbound frame, returning the direct reply and,
/// when the frame moved this connection into a room, the room to follow.
async fn handle_frame(
    state: &AppState,
    conn_id: &str,
    text: &str,
) -> (ServerMessage, Option<String>) {
    let message: ClientMessage = match serde_json::from_str(text) {
        Ok(message) => message,
        Err(error) => {
            debug!(conn_id = %conn_id, error = %error, "Unparseable frame");
            return (
                ServerMessage::Error {
                    code: "BAD_MESSAGE".to_string(),
                    message: "Could not parse message".to_string(),
                },
                None,
            );
        }
    };

    match dispatch(state, conn_id, &message).await {
        Ok((reply, joined_room)) => (reply, joined_room),
        Err(error) => (
            ServerMessage::Error {
                code: error.code().to_string(),
                message: error.to_string(),
            },
            None,
        ),
    }
}

/// Applies rate limiting and binding rules, then routes to the services.
///
/// Unbound connections may only create, join, reconnect or sync. Bound
/// connections must address their own room and identity; a create/join/
/// reconnect aimed elsewhere detaches the old identity first, with the
/// usual disconnect semantics.
async fn dispatch(
    state: &AppState,
    conn_id: &str,
    message: &ClientMessage,
) -> Result<(ServerMessage, Option<String>), GameError> {
    if !message.rate_limit_exempt() && !state.limiter.allow(conn_id, message.action_tag()).await {
        return Err(GameError::TooManyRequests);
    }

    let binding = state.connections.resolve(conn_id).await;

    match message {
        ClientMessage::RoomCreate { name } => {
            if binding.is_some() {
                state.rooms.handle_disconnect(conn_id).await;
            }
            let (room_code, player_id, room) = state.rooms.create_room(conn_id, name).await?;
            Ok((
                ServerMessage::RoomCreated {
                    room_code: room_code.clone(),
                    player_id,
                    room,
                },
                Some(room_code),
            ))
        }
        ClientMessage::RoomJoin {
            room_code,
            name,
            spectator,
        } => {
            if binding.is_some() {
                state.rooms.handle_disconnect(conn_id).await;
            }
            let (player_id, room) = state
                .rooms
                .join_room(conn_id, room_code, name, *spectator)
                .await?;
            Ok((
                ServerMessage::RoomJoined {
                    room_code: room_code.clone(),
                    player_id,
                    room,
                },
                Some(room_code.clone()),
            ))
        }
        ClientMessage::PlayerReconnect {
            room_code,
            player_id,
        } => {
            if let Some((bound_room, bound_player)) = &binding {
                if bound_room != room_code || bound_player != player_id {
                    state.rooms.handle_disconnect(conn_id).await;
                }
            }
            let room = state.rooms.reconnect(conn_id, room_code, player_id).await?;
            Ok((
                ServerMessage::RoomJoined {
                    room_code: room_code.clone(),
                    player_id: player_id.clone(),
                    room,
                },
                Some(room_code.clone()),
            ))
        }
        ClientMessage::RoomSync { room_code } => {
            let room = state.rooms.sync(room_code).await?;
            Ok((ServerMessage::RoomState { room }, None))
        }
        ClientMessage::TurnDraw {
            room_code,
            player_id,
        } => {
            require_binding(&binding, room_code, player_id)?;
            state.game.draw(room_code, player_id).await?;
            Ok((action_ok(message), None))
        }
        ClientMessage::CardResolve {
            room_code,
            player_id,
            card_id,
            resolution,
        } => {
            require_binding(&binding, room_code, player_id)?;
            state
                .game
                .resolve(room_code, player_id, card_id, resolution)
                .await?;
            Ok((action_ok(message), None))
        }
        ClientMessage::AckConfirm {
            room_code,
            player_id,
            ack_id,
        } => {
            require_binding(&binding, room_code, player_id)?;
            state.game.confirm_ack(room_code, player_id, ack_id).await?;
            Ok((action_ok(message), None))
        }
        ClientMessage::DuelChoose {
            room_code,
            player_id,
            choice,
        } => {
            require_binding(&binding, room_code, player_id)?;
            state.game.duel_choose(room_code, player_id, *choice).await?;
            Ok((action_ok(message), None))
        }
        ClientMessage::VoteCast {
            room_code,
            player_id,
            side,
        } => {
            require_binding(&binding, room_code, player_id)?;
            state.game.vote_cast(room_code, player_id, *side).await?;
            Ok((action_ok(message), None))
        }
        ClientMessage::TurnNudge {
            room_code,
            player_id,
            target_id,
        } => {
            require_binding(&binding, room_code, player_id)?;
            state.game.nudge(room_code, player_id, target_id).await?;
            Ok((action_ok(message), None))
        }
        ClientMessage::UpdateSettings {
            room_code,
            player_id,
            patch,
        } => {
            require_binding(&binding, room_code, player_id)?;
            state
                .rooms
                .update_settings(room_code, player_id, patch.clone())
                .await?;
            Ok((action_ok(message), None))
        }
        ClientMessage::SetDeck {
            room_code,
            player_id,
            deck_order,
        } => {
            require_binding(&binding, room_code, player_id)?;
            state
                .rooms
                .set_deck(room_code, player_id, deck_order.clone())
                .await?;
            Ok((action_ok(message), None))
        }
        ClientMessage::HostKick {
            room_code,
            player_id,
            target_id,
        } => {
            require_binding(&binding, room_code, player_id)?;
            state.rooms.kick(room_code, player_id, target_id).await?;
            Ok((action_ok(message), None))
        }
        ClientMessage::HostClose {
            room_code,
            player_id,
        } => {
            require_binding(&binding, room_code, player_id)?;
            state.rooms.close_room(room_code, player_id).await?;
            Ok((action_ok(message), None))
        }
    }
}

fn action_ok(message: &ClientMessage) -> ServerMessage {
    ServerMessage::ActionOk {
        action: message.action_tag().to_string(),
    }
}

fn require_binding(
    binding: &Option<(String, String)>,
    room_code: &str,
    player_id: &str,
) -> Result<(), GameError> {
    match binding {
        Some((bound_room, bound_player)) if bound_room == room_code && bound_player == player_id => {
            Ok(())
        }
        _ => Err(GameError::InvalidPlayerId),
    }
}
