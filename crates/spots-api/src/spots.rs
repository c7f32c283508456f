use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use spots_types::api::{NewSpot, SpotPatch, SpotQuery};
use spots_types::models::Spot;

use crate::auth::AppState;
use crate::error::{Error, Result};
use crate::middleware::{BearerToken, NoBody, ValidJson};
use crate::service::{self, run};

pub async fn search_spots(
    State(state): State<AppState>,
    WithRejection(Query(params), _): WithRejection<Query<SpotQuery>, Error>,
    _: NoBody,
) -> Result<Json<Vec<Spot>>> {
    let spots = run(&state, move |s| service::spot::search(s, &params)).await?;
    Ok(Json(spots))
}

pub async fn create_spot(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
    ValidJson(req): ValidJson<NewSpot>,
) -> Result<impl IntoResponse> {
    let spot = run(&state, move |s| service::spot::create(s, &token, req)).await?;
    Ok((StatusCode::CREATED, Json(spot)))
}

pub async fn get_spot(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<String>, Error>,
    _: NoBody,
) -> Result<Json<Spot>> {
    let spot = run(&state, move |s| service::spot::get(s, &id)).await?;
    Ok(Json(spot))
}

pub async fn update_spot(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<String>, Error>,
    BearerToken(token): BearerToken,
    ValidJson(patch): ValidJson<SpotPatch>,
) -> Result<Json<Spot>> {
    let spot = run(&state, move |s| service::spot::update(s, &id, &token, patch)).await?;
    Ok(Json(spot))
}

pub async fn delete_spot(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<String>, Error>,
    BearerToken(token): BearerToken,
    _: NoBody,
) -> Result<StatusCode> {
    run(&state, move |s| service::spot::delete(s, &id, &token)).await?;
    Ok(StatusCode::NO_CONTENT)
}
