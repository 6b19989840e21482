use axum::{
    extract::{Path, Request, State},
    http::header,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, instrument};

use crate::catalog::{Card, NewCard};
use crate::room::RoomSummary;
use crate::shared::{AppError, AppState};

/// Routes under `/admin`, all behind the bearer-token middleware.
pub fn admin_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/rooms", get(list_rooms))
        .route("/rooms/:code/close", post(close_room))
        .route("/rooms/:code/kick", post(kick_player))
        .route("/cards", post(add_card))
        .route_layer(middleware::from_fn_with_state(state, require_admin))
}

/// Gate for every admin route: 404 while no token is configured, 401 on a
/// missing or wrong bearer token.
async fn require_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if !state.admin.enabled() {
        return Err(AppError::NotFound("Not found".to_string()));
    }

    let presented = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    match presented {
        Some(token) if state.admin.authorizes(token) => Ok(next.run(request).await),
        _ => Err(AppError::Unauthorized("Invalid admin token".to_string())),
    }
}

#[instrument(name = "admin_list_rooms", skip(state))]
async fn list_rooms(State(state): State<AppState>) -> Json<Vec<RoomSummary>> {
    Json(state.rooms.room_summaries().await)
}

#[instrument(name = "admin_close_room", skip(state))]
async fn close_room(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<Value>, AppError> {
    if !state.registry.contains(&code).await {
        return Err(AppError::NotFound(format!("Room {code} not found")));
    }
    state
        .rooms
        .force_close(&code, "Room closed by an operator")
        .await;
    info!(room_code = %code, "Room closed by operator");
    Ok(Json(json!({ "closed": code })))
}

#[derive(Debug, Deserialize)]
struct KickRequest {
    player_id: String,
}

#[instrument(name = "admin_kick_player", skip(state, request))]
async fn kick_player(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(request): Json<KickRequest>,
) -> Result<Json<Value>, AppError> {
    state.rooms.admin_kick(&code, &request.player_id).await?;
    info!(room_code = %code, player_id = %request.player_id, "Player kicked by operator");
    Ok(Json(json!({ "kicked": request.player_id })))
}

#[instrument(name = "admin_add_card", skip(state, request))]
async fn add_card(
    State(state): State<AppState>,
    Json(request): Json<NewCard>,
) -> Result<Json<Card>, AppError> {
    if request.title.trim().is_empty() || request.text.trim().is_empty() {
        return Err(AppError::BadRequest(
            "Card title and text must not be empty".to_string(),
        ));
    }
    let card = state.catalog.add_custom(request).await;
    Ok(Json(card))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admin::AdminConfig;
    use crate::catalog::CardCatalog;
    use crate::event::EventBus;
    use crate::game::service::GameService;
    use crate::game::sweep::SweepConfig;
    use crate::room::registry::RoomRegistry;
    use crate::room::service::RoomService;
    use crate::websockets::connection::InMemoryConnectionTracker;
    use crate::websockets::rate_limit::ActionLimiter;
    use axum::{
        body::Body,
        http::{Request as HttpRequest, StatusCode},
    };
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt; // for `oneshot`

    fn app(admin: AdminConfig) -> (Router, AppState) {
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
        let state = AppState::new(
            registry,
            catalog,
            connections,
            event_bus,
            rooms,
            game,
            Arc::new(ActionLimiter::new(Duration::ZERO)),
            admin,
            SweepConfig::default(),
        );
        let router = Router::new()
            .nest("/admin", admin_router(state.clone()))
            .with_state(state.clone());
        (router, state)
    }

    fn get_rooms(token: Option<&str>) -> HttpRequest<Body> {
        let mut builder = HttpRequest::builder().method("GET").uri("/admin/rooms");
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_admin_routes_play_dead_without_token() {
        let (router, _) = app(AdminConfig::disabled());
        let response = router.oneshot(get_rooms(Some("whatever"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_wrong_token_is_unauthorized() {
        let (router, _) = app(AdminConfig::with_token("sekrit"));

        let response = router
            .clone()
            .oneshot(get_rooms(Some("wrong")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = router.oneshot(get_rooms(None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_room_listing_with_valid_token() {
        let (router, state) = app(AdminConfig::with_token("sekrit"));
        state.rooms.create_room("c1", "Ann").await.unwrap();

        let response = router.oneshot(get_rooms(Some("sekrit"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let summaries: Vec<RoomSummary> = serde_json::from_slice(&body).unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].players, 1);
    }

    #[tokio::test]
    async fn test_operator_close_removes_room() {
        let (router, state) = app(AdminConfig::with_token("sekrit"));
        let (code, _, _) = state.rooms.create_room("c1", "Ann").await.unwrap();

        let request = HttpRequest::builder()
            .method("POST")
            .uri(format!("/admin/rooms/{code}/close"))
            .header("authorization", "Bearer sekrit")
            .body(Body::empty())
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(!state.registry.contains(&code).await);
    }

    #[tokio::test]
    async fn test_operator_close_unknown_room_is_404() {
        let (router, _) = app(AdminConfig::with_token("sekrit"));

        let request = HttpRequest::builder()
            .method("POST")
            .uri("/admin/rooms/no-such-room/close")
            .header("authorization", "Bearer sekrit")
            .body(Body::empty())
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_operator_kick() {
        let (router, state) = app(AdminConfig::with_token("sekrit"));
        let (code, _, _) = state.rooms.create_room("c1", "Ann").await.unwrap();
        let (bea_id, _) = state.rooms.join_room("c2", &code, "Bea", false).await.unwrap();

        let request = HttpRequest::builder()
            .method("POST")
            .uri(format!("/admin/rooms/{code}/kick"))
            .header("authorization", "Bearer sekrit")
            .header("content-type", "application/json")
            .body(Body::from(format!(r#"{{"player_id":"{bea_id}"}}"#)))
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let shared = state.registry.get(&code).await.unwrap();
        assert!(shared.lock().await.player(&bea_id).is_none());
    }

    #[tokio::test]
    async fn test_add_custom_card() {
        let (router, state) = app(AdminConfig::with_token("sekrit"));

        let body = r#"{"kind":"forfeit","title":"Left Handed","text":"Drink with your left hand","resolution":"none"}"#;
        let request = HttpRequest::builder()
            .method("POST")
            .uri("/admin/cards")
            .header("authorization", "Bearer sekrit")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let card: Card = serde_json::from_slice(&bytes).unwrap();
        assert!(card.id.starts_with("custom-"));
        assert!(state.catalog.contains(&card.id).await);
    }

    #[tokio::test]
    async fn test_add_card_rejects_blank_title() {
        let (router, _) = app(AdminConfig::with_token("sekrit"));

        let body = r#"{"kind":"forfeit","title":"   ","text":"x","resolution":"none"}"#;
        let request = HttpRequest::builder()
            .method("POST")
            .uri("/admin/cards")
            .header("authorization", "Bearer sekrit")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
