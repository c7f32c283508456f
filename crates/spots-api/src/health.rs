use axum::{Json, extract::State, http::StatusCode};
use spots_types::api::HealthResponse;

use crate::auth::AppState;

pub async fn ping() -> StatusCode {
    StatusCode::OK
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: state.started_at.elapsed().as_secs(),
    })
}
