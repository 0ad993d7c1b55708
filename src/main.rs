use axum::{
    routing::{get, post},
    Router,
};
use rolltable::auth::repository::InMemoryUserRepository;
use rolltable::auth::{login, signup, AuthService, TokenConfig};
use rolltable::gateway::{websocket_handler, ConnectionManager, InMemoryConnectionManager};
use rolltable::room::RoomService;
use rolltable::shared::AppState;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rolltable=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting dice room server");

    // Create shared application state with dependency injection
    let connection_manager: Arc<dyn ConnectionManager> =
        Arc::new(InMemoryConnectionManager::new());
    let room_service = Arc::new(RoomService::new(connection_manager.clone()));
    let user_repository = Arc::new(InMemoryUserRepository::new());
    let auth_service = Arc::new(AuthService::new(user_repository, TokenConfig::new()));

    let app_state = AppState::new(auth_service, room_service, connection_manager);

    // build our application
    let app = Router::new()
        .route("/api/signup", post(signup))
        .route("/api/login", post(login))
        .route("/ws", get(websocket_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    let port = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse::<u16>().ok())
        .unwrap_or(3000);

    // run our app with hyper, listening globally
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .unwrap();
    info!("Server running on http://localhost:{}", port);
    axum::serve(listener, app).await.unwrap();
}
