use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use partydeck::admin::{self, AdminConfig};
use partydeck::catalog::CardCatalog;
use partydeck::event::EventBus;
use partydeck::game::{spawn_sweep_task, GameService, SweepConfig, Sweeper};
use partydeck::room::{RoomRegistry, RoomService};
use partydeck::shared::AppState;
use partydeck::websockets::{websocket_handler, ActionLimiter, InMemoryConnectionTracker};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "partydeck=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting party deck server");

    // Shared application state with dependency injection
    let registry = Arc::new(RoomRegistry::new());
    let catalog = Arc::new(CardCatalog::with_builtin());
    let connections = Arc::new(InMemoryConnectionTracker::new());
    let event_bus = EventBus::new();
    let rooms = Arc::new(RoomService::new(
        registry.clone(),
        catalog.clone(),
        connections.clone(),
        event_bus.clone(),
    ));
    let game = Arc::new(GameService::new(
        registry.clone(),
        catalog.clone(),
        event_bus.clone(),
    ));
    let limiter = Arc::new(ActionLimiter::from_env());
    let admin_config = AdminConfig::from_env();
    if admin_config.enabled() {
        info!("Admin surface enabled");
    }
    let sweep_config = SweepConfig::from_env();

    let app_state = AppState::new(
        registry.clone(),
        catalog,
        connections,
        event_bus.clone(),
        rooms.clone(),
        game,
        limiter.clone(),
        admin_config,
        sweep_config.clone(),
    );

    let sweeper = Arc::new(Sweeper::new(
        registry,
        rooms,
        event_bus,
        limiter,
        sweep_config,
    ));
    spawn_sweep_task(sweeper);

    let app = Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .route("/ws", get(websocket_handler))
        .nest("/admin", admin::admin_router(app_state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    let port = std::env::var("PORT")
        .ok()
        .and_then(|raw| raw.parse::<u16>().ok())
        .unwrap_or(3000);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .unwrap();
    info!(port, "Server listening");
    axum::serve(listener, app).await.unwrap();
}
