use axum::{
    extract::State,
    http::{HeaderValue, StatusCode},
    middleware::from_fn_with_state,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod services;
pub mod state;

use crate::config::AppConfig;
use crate::middleware::jwt_auth_middleware;
use crate::state::AppState;

/// Build the full router over a prepared application state
pub fn app(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(public_routes())
        // Protected API
        .merge(protected_routes(state.clone()))
        // Global middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn public_routes() -> Router<AppState> {
    use handlers::public;

    Router::new()
        // Token acquisition
        .route("/api/register", post(public::auth_register))
        .route("/api/login", post(public::auth_login))
        // Navigation directory is readable without a token
        .route("/api/navigation", get(public::navigation_list))
        .route("/api/navigation/", get(public::navigation_list))
        .route("/api/navigation/:id", get(public::navigation_get))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    use axum::routing::put;
    use handlers::protected;

    Router::new()
        // Profile
        .route("/api/me", get(protected::me_read).put(protected::me_update))
        .route("/api/me/activity", get(protected::me_activity))
        .route("/api/me/recommendations", get(protected::me_recommendations))
        .route("/api/recommendations", post(protected::recommendation_create))
        // Chat
        .route("/api/chat/send", post(protected::chat_send))
        .route("/api/chat/history", get(protected::chat_history))
        .route(
            "/api/chat/history/:id",
            get(protected::chat_detail).delete(protected::chat_delete),
        )
        // Navigation writes; reads live on the public router under the same paths
        .route("/api/navigation", post(protected::navigation_create))
        .route("/api/navigation/", post(protected::navigation_create))
        .route(
            "/api/navigation/:id",
            put(protected::navigation_update).delete(protected::navigation_delete),
        )
        .route_layer(from_fn_with_state(state, jwt_auth_middleware))
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    if config.cors_permissive() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin.trim()) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "name": "PsyChat API",
        "version": version,
        "description": "Mental-health chat backend: accounts, chat log and navigation directory",
        "endpoints": {
            "health": "/health (public)",
            "auth": "/api/register, /api/login (public - token acquisition)",
            "me": "/api/me, /api/me/activity, /api/me/recommendations (protected)",
            "chat": "/api/chat/send, /api/chat/history[/:id] (protected)",
            "navigation": "/api/navigation[/:id] (public reads, protected writes)",
            "recommendations": "/api/recommendations (protected, admin)",
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.repo.health_check().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "timestamp": now,
                "database": "ok"
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "degraded",
                    "timestamp": now,
                    "database_error": e.to_string()
                })),
            )
        }
    }
}
