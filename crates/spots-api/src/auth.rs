use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use spots_db::store::DocumentStore;
use spots_types::api::{LoginRequest, RegisterRequest};

use crate::authorizer::Authorizer;
use crate::error::{Error, Result};
use crate::middleware::{BearerToken, NoBody, ValidJson};
use crate::passwords::Passwords;
use crate::service::{self, run};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub store: Arc<dyn DocumentStore>,
    pub authorizer: Authorizer,
    pub passwords: Passwords,
    /// Budget for each request's store work.
    pub request_timeout: Duration,
    pub started_at: Instant,
}

impl AppStateInner {
    pub fn store(&self) -> &dyn DocumentStore {
        self.store.as_ref()
    }
}

pub async fn register(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<RegisterRequest>,
) -> Result<impl IntoResponse> {
    let res = run(&state, move |s| service::user::register(s, req)).await?;
    Ok((StatusCode::CREATED, Json(res)))
}

pub async fn login(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<LoginRequest>,
) -> Result<impl IntoResponse> {
    let res = run(&state, move |s| service::user::login(s, req)).await?;
    Ok(Json(res))
}

pub async fn delete_user(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<String>, Error>,
    BearerToken(token): BearerToken,
    _: NoBody,
) -> Result<StatusCode> {
    run(&state, move |s| service::user::delete(s, &id, &token)).await?;
    Ok(StatusCode::NO_CONTENT)
}
