use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use spots_types::api::{NewReview, ReviewPatch, ReviewQuery};
use spots_types::models::Review;

use crate::auth::AppState;
use crate::error::{Error, Result};
use crate::middleware::{BearerToken, NoBody, ValidJson};
use crate::service::{self, run};

pub async fn list_reviews(
    State(state): State<AppState>,
    WithRejection(Path(spot_id), _): WithRejection<Path<String>, Error>,
    WithRejection(Query(params), _): WithRejection<Query<ReviewQuery>, Error>,
    _: NoBody,
) -> Result<Json<Vec<Review>>> {
    let reviews = run(&state, move |s| service::review::list(s, &spot_id, &params)).await?;
    Ok(Json(reviews))
}

pub async fn create_review(
    State(state): State<AppState>,
    WithRejection(Path(spot_id), _): WithRejection<Path<String>, Error>,
    BearerToken(token): BearerToken,
    ValidJson(req): ValidJson<NewReview>,
) -> Result<impl IntoResponse> {
    let review = run(&state, move |s| service::review::create(s, &token, &spot_id, req)).await?;
    Ok((StatusCode::CREATED, Json(review)))
}

pub async fn delete_reviews(
    State(state): State<AppState>,
    WithRejection(Path(spot_id), _): WithRejection<Path<String>, Error>,
    BearerToken(token): BearerToken,
    _: NoBody,
) -> Result<StatusCode> {
    run(&state, move |s| service::review::delete_all(s, &spot_id, &token)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_review(
    State(state): State<AppState>,
    WithRejection(Path((spot_id, review_id)), _): WithRejection<Path<(String, String)>, Error>,
    _: NoBody,
) -> Result<Json<Review>> {
    let review = run(&state, move |s| service::review::get(s, &spot_id, &review_id)).await?;
    Ok(Json(review))
}

pub async fn update_review(
    State(state): State<AppState>,
    WithRejection(Path((spot_id, review_id)), _): WithRejection<Path<(String, String)>, Error>,
    BearerToken(token): BearerToken,
    ValidJson(patch): ValidJson<ReviewPatch>,
) -> Result<Json<Review>> {
    let review = run(&state, move |s| {
        service::review::update(s, &spot_id, &review_id, &token, patch)
    })
    .await?;
    Ok(Json(review))
}

pub async fn delete_review(
    State(state): State<AppState>,
    WithRejection(Path((spot_id, review_id)), _): WithRejection<Path<(String, String)>, Error>,
    BearerToken(token): BearerToken,
    _: NoBody,
) -> Result<StatusCode> {
    run(&state, move |s| {
        service::review::delete(s, &spot_id, &review_id, &token)
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}
