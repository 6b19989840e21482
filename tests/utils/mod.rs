// Shared fixtures for the integration suites: a fully wired service stack
// with no network, plus room builders for deterministic decks.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use partydeck::catalog::CardCatalog;
use partydeck::event::EventBus;
use partydeck::game::{GameService, SweepConfig, Sweeper};
use partydeck::room::models::DrawMode;
use partydeck::room::{RoomRegistry, RoomService, SharedRoom};
use partydeck::websockets::{ActionLimiter, InMemoryConnectionTracker};

pub struct TestApp {
    pub registry: Arc<RoomRegistry>,
    pub catalog: Arc<CardCatalog>,
    pub event_bus: EventBus,
    pub rooms: Arc<RoomService>,
    pub game: Arc<GameService>,
    pub limiter: Arc<ActionLimiter>,
}

impl TestApp {
    pub fn new() -> Self {
        let registry = Arc::new(RoomRegistry::new());
        let catalog = Arc::new(CardCatalog::with_builtin());
        let connections = Arc::new(InMemoryConnectionTracker::new());
        let event_bus = EventBus::new();
        let rooms = Arc::new(RoomService::new(
            registry.clone(),
            catalog.clone(),
            connections,
            event_bus.clone(),
        ));
        let game = Arc::new(GameService::new(
            registry.clone(),
            catalog.clone(),
            event_bus.clone(),
        ));
        let limiter = Arc::new(ActionLimiter::new(Duration::from_millis(0)));
        Self {
            registry,
            catalog,
            event_bus,
            rooms,
            game,
            limiter,
        }
    }

    pub fn sweeper(&self, config: SweepConfig) -> Sweeper {
        Sweeper::new(
            self.registry.clone(),
            self.rooms.clone(),
            self.event_bus.clone(),
            self.limiter.clone(),
            config,
        )
    }

    /// Creates a room through the real service path. The host and every
    /// other name join on connections named `conn-{name}`; returns the room
    /// code and player ids in seat order.
    pub async fn room_with_players(&self, host: &str, others: &[&str]) -> (String, Vec<String>) {
        let (code, host_id, _) = self
            .rooms
            .create_room(&format!("conn-{host}"), host)
            .await
            .expect("room creation failed");
        let mut ids = vec![host_id];
        for name in others {
            let (player_id, _) = self
                .rooms
                .join_room(&format!("conn-{name}"), &code, name, false)
                .await
                .expect("join failed");
            ids.push(player_id);
        }
        (code, ids)
    }

    /// Pins the room to a known card order so draws are predictable.
    pub async fn use_sequential_deck(&self, code: &str, order: &[&str]) {
        let shared = self.shared(code).await;
        let mut room = shared.lock().await;
        room.settings.draw_mode = DrawMode::Sequential;
        room.deck.custom_order = Some(order.iter().map(|s| s.to_string()).collect());
        room.deck.cursor = 0;
    }

    pub async fn shared(&self, code: &str) -> SharedRoom {
        self.registry
            .get(code)
            .await
            .expect("room missing from registry")
    }
}
