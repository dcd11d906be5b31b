//! Liveness endpoint.

use axum::Json;
use axum::extract::State;

use crate::dto::HealthBody;
use crate::state::AppState;

/// `GET /health`: always 200 while the listener is up.
pub async fn health(State(state): State<AppState>) -> Json<HealthBody> {
    Json(HealthBody {
        ok: true,
        model_path: state.model_path.clone(),
    })
}
