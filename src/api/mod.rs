use axum::{
    Json, Router,
    http::HeaderValue,
    middleware,
    routing::{delete, get, post, put},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::state::SharedState;

pub mod analysis;
pub mod auth;
pub mod documents;
mod error;
pub mod event_logs;
mod types;
pub mod users;

pub use error::ApiError;
pub use types::*;

use tokio::sync::RwLock;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Arc<RwLock<Config>> {
        &self.shared.config
    }
}

#[must_use]
pub fn create_app_state(shared: Arc<SharedState>) -> Arc<AppState> {
    Arc::new(AppState { shared })
}

pub async fn create_app_state_from_config(config: Config) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    Ok(create_app_state(shared))
}

pub async fn router(state: Arc<AppState>) -> Router {
    let cors_origins = {
        let config = state.config().read().await;
        config.server.cors_allowed_origins.clone()
    };

    let protected_routes = create_protected_router(state.clone());

    let api_router = Router::new()
        .merge(protected_routes)
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh))
        .with_state(state.clone());

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    // The span declares user_id empty; the auth middleware fills it in
    // once the bearer token resolves.
    let trace_layer = TraceLayer::new_for_http().make_span_with(|request: &axum::extract::Request| {
        tracing::info_span!(
            "request",
            method = %request.method(),
            uri = %request.uri(),
            user_id = tracing::field::Empty,
        )
    });

    Router::new()
        .route("/", get(health))
        .nest("/api", api_router)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(trace_layer)
}

async fn health() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Document service is running".to_string(),
    })
}

fn create_protected_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/users", get(users::list_users))
        .route("/users/{id}/role", put(users::update_role))
        .route("/eventlogs", get(event_logs::list_logs))
        .route("/eventlogs/stream", get(event_logs::stream_logs))
        .route("/documents/upload", post(documents::upload))
        .route("/documents", get(documents::list_documents))
        .route("/documents/{id}/download", get(documents::download))
        .route("/documents/{id}", delete(documents::remove))
        .route("/aianalysis/analyze", post(analysis::analyze))
        .route_layer(middleware::from_fn_with_state(state, auth::auth_middleware))
}
