//! Route definitions and router construction.

use axum::Router;
use axum::http::HeaderValue;
use axum::middleware;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::bootstrap::CorsConfig;
use crate::handlers;
use crate::middleware::require_api_key;
use crate::state::AppState;

/// Build CORS layer from configuration. `None` when CORS is disabled.
fn build_cors_layer(config: &CorsConfig) -> Option<CorsLayer> {
    match config {
        CorsConfig::Disabled => None,
        CorsConfig::AllowAll => Some(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        ),
        CorsConfig::AllowOrigins(origins) => {
            let allowed: Vec<HeaderValue> = origins
                .iter()
                .filter_map(|o| {
                    o.parse()
                        .inspect_err(|_| warn!(origin = %o, "Ignoring invalid CORS origin"))
                        .ok()
                })
                .collect();
            Some(
                CorsLayer::new()
                    .allow_origin(allowed)
                    .allow_methods(Any)
                    .allow_headers(Any),
            )
        }
    }
}

/// Chat routes, guarded by the API key middleware.
fn chat_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/chat", post(handlers::chat::complete))
        .route("/chat/stream", post(handlers::stream::stream))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_api_key,
        ))
}

/// Create the gateway router.
pub fn create_router(state: AppState, cors: &CorsConfig) -> Router {
    let router = Router::new()
        .route("/health", get(handlers::health::health))
        .merge(chat_routes(&state))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    match build_cors_layer(cors) {
        Some(layer) => router.layer(layer),
        None => router,
    }
}
