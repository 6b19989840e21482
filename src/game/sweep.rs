//! Periodic sweep: the single clock behind every time-based transition.
//!
//! One tick walks all rooms and, per room, handles exactly one concern in
//! priority order: inactivity close, expired interaction, then turn-timer
//! upkeep (clearing dead timers, nudging idle drawers, penalizing expiry).
//! Expiry is judged against absolute timestamps, so a missed or repeated
//! tick can never double-fire a transition.

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{debug, info};

use crate::event::EventBus;
use crate::game::{interaction, turn};
use crate::room::models::Interaction;
use crate::room::registry::RoomRegistry;
use crate::room::service::RoomService;
use crate::websockets::messages::ServerMessage;
use crate::websockets::rate_limit::ActionLimiter;

pub const DEFAULT_INTERVAL_MS: u64 = 500;
pub const DEFAULT_NUDGE_THRESHOLD_SECS: i64 = 15;
pub const DEFAULT_INACTIVITY_WINDOW_SECS: i64 = 300;

const TIMEOUT_PENALTY_UNITS: u32 = 1;

/// Timing knobs for the sweep, overridable from the environment so tests
/// and small deployments can shrink the windows.
#[derive(Debug, Clone)]
pub struct SweepConfig {
    pub interval_ms: u64,
    pub nudge_threshold_secs: i64,
    pub inactivity_window_secs: i64,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_INTERVAL_MS,
            nudge_threshold_secs: DEFAULT_NUDGE_THRESHOLD_SECS,
            inactivity_window_secs: DEFAULT_INACTIVITY_WINDOW_SECS,
        }
    }
}

impl SweepConfig {
    /// Reads `SWEEP_INTERVAL_MS`, `NUDGE_THRESHOLD_SECS` and
    /// `INACTIVITY_WINDOW_SECS`, falling back to the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            interval_ms: env_number("SWEEP_INTERVAL_MS", defaults.interval_ms),
            nudge_threshold_secs: env_number("NUDGE_THRESHOLD_SECS", defaults.nudge_threshold_secs),
            inactivity_window_secs: env_number(
                "INACTIVITY_WINDOW_SECS",
                defaults.inactivity_window_secs,
            ),
        }
    }
}

fn env_number<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(default)
}

pub struct Sweeper {
    registry: Arc<RoomRegistry>,
    rooms: Arc<RoomService>,
    event_bus: EventBus,
    limiter: Arc<ActionLimiter>,
    config: SweepConfig,
}

impl Sweeper {
    pub fn new(
        registry: Arc<RoomRegistry>,
        rooms: Arc<RoomService>,
        event_bus: EventBus,
        limiter: Arc<ActionLimiter>,
        config: SweepConfig,
    ) -> Self {
        Self {
            registry,
            rooms,
            event_bus,
            limiter,
            config,
        }
    }

    /// Runs one sweep pass against `now`.
    ///
    /// Time-driven transitions never refresh a room's activity stamp; an
    /// abandoned room keeps aging toward the inactivity close even while
    /// its timers fire.
    pub async fn tick(&self, now: DateTime<Utc>) {
        for code in self.registry.codes().await {
            let Some(shared) = self.registry.get(&code).await else {
                continue;
            };
            let mut room = shared.lock().await;

            let idle_for = now - room.last_activity;
            if idle_for >= Duration::seconds(self.config.inactivity_window_secs) {
                drop(room);
                info!(room_code = %code, "Closing idle room");
                self.rooms
                    .force_close(&code, "Room closed for inactivity")
                    .await;
                continue;
            }

            if let Some(live) = room.interaction.clone() {
                if live.is_expired(now) {
                    let outcome = match &live {
                        Interaction::Duel(duel) => interaction::resolve_duel_expiry(&room, duel),
                        Interaction::GroupVote(vote) => {
                            interaction::resolve_vote_expiry(&room, vote)
                        }
                    };
                    interaction::apply_interaction_outcome(&mut room, &outcome);
                    let next_player = turn::current_turn_player(&room).map(|p| p.id.clone());
                    let snapshot = room.snapshot();
                    drop(room);

                    self.event_bus
                        .publish_to_room(
                            &code,
                            ServerMessage::InteractionResolved {
                                message: outcome.message.clone(),
                            },
                        )
                        .await;
                    self.event_bus
                        .publish_to_room(
                            &code,
                            ServerMessage::TurnChanged {
                                player_id: next_player,
                            },
                        )
                        .await;
                    self.event_bus
                        .publish_to_room(&code, ServerMessage::RoomState { room: snapshot })
                        .await;
                    debug!(room_code = %code, "Expired interaction resolved");
                }
                continue;
            }

            let Some(timer) = room.turn_timer.clone() else {
                continue;
            };
            let draw = room.current_draw.clone();

            if !timer.enabled || !room.settings.turn_timer || draw.is_none() {
                // A dead countdown lingers for one tick so clients can show
                // the disabled reason, then gets swept away.
                room.turn_timer = None;
                let snapshot = room.snapshot();
                drop(room);
                self.event_bus
                    .publish_to_room(&code, ServerMessage::RoomState { room: snapshot })
                    .await;
                continue;
            }
            let Some(draw) = draw else {
                continue;
            };

            if now >= timer.ends_at {
                room.add_drinks_taken(&draw.drawer_id, TIMEOUT_PENALTY_UNITS);
                let drawer = room.player_name(&draw.drawer_id);
                room.push_log(now, format!("{drawer} ran out of time and drinks 1"));
                room.clear_draw();
                turn::advance_turn(&mut room);
                let next_player = turn::current_turn_player(&room).map(|p| p.id.clone());
                let snapshot = room.snapshot();
                drop(room);

                self.event_bus
                    .publish_to_room(
                        &code,
                        ServerMessage::TurnChanged {
                            player_id: next_player,
                        },
                    )
                    .await;
                self.event_bus
                    .publish_to_room(&code, ServerMessage::RoomState { room: snapshot })
                    .await;
                info!(room_code = %code, drawer = %draw.drawer_id, "Turn timed out");
                continue;
            }

            let remaining = timer.ends_at - now;
            if remaining <= Duration::seconds(self.config.nudge_threshold_secs) {
                let key = format!("{}:{}:{}", draw.card_id, draw.drawer_id, room.turn_index);
                if room.nudged_for.as_deref() != Some(key.as_str()) {
                    room.nudged_for = Some(key);
                    drop(room);
                    self.event_bus
                        .publish_to_room(
                            &code,
                            ServerMessage::PlayerNudged {
                                from: None,
                                to: draw.drawer_id.clone(),
                            },
                        )
                        .await;
                    debug!(room_code = %code, drawer = %draw.drawer_id, "Idle nudge sent");
                }
            }
        }

        self.limiter.prune().await;
    }
}

/// Spawns the forever-running sweep loop on its own task.
pub fn spawn_sweep_task(sweeper: Arc<Sweeper>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker =
            tokio::time::interval(std::time::Duration::from_millis(sweeper.config.interval_ms));
        loop {
            ticker.tick().await;
            sweeper.tick(Utc::now()).await;
        }
    })
}
