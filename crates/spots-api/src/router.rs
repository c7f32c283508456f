use axum::{
    Router,
    routing::{delete, get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::{self, AppState};
use crate::{health, reviews, spots};

/// All routes with CORS and request tracing applied.
pub fn build(state: AppState) -> Router {
    let spot_routes = Router::new()
        .route("/spot", get(spots::search_spots).post(spots::create_spot))
        .route(
            "/spot/{id}",
            get(spots::get_spot)
                .patch(spots::update_spot)
                .delete(spots::delete_spot),
        )
        .route(
            "/spot/{id}/review",
            get(reviews::list_reviews)
                .post(reviews::create_review)
                .delete(reviews::delete_reviews),
        )
        .route(
            "/spot/{id}/review/{review_id}",
            get(reviews::get_review)
                .patch(reviews::update_review)
                .delete(reviews::delete_review),
        );

    let user_routes = Router::new()
        .route("/user/register", post(auth::register))
        .route("/user/login", post(auth::login))
        .route("/user/{id}", delete(auth::delete_user));

    let status_routes = Router::new()
        .route("/ping", get(health::ping))
        .route("/health", get(health::health));

    Router::new()
        .merge(spot_routes)
        .merge(user_routes)
        .merge(status_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
