use chrono::Utc;
use spots_db::proximity::present;
use spots_db::repository;
use spots_db::store::Query;
use spots_types::api::{NewReview, ReviewPatch, ReviewQuery};
use spots_types::models::{Review, Spot};
use tracing::info;

use crate::auth::AppStateInner;
use crate::error::{Error, Result};

/// Reviews of one spot, oldest first. The spot itself must exist.
pub fn list(state: &AppStateInner, spot_id: &str, params: &ReviewQuery) -> Result<Vec<Review>> {
    repository::find_by_id::<Spot>(state.store(), spot_id)?;

    let mut query = Query::new().eq("spotId", spot_id);
    if let Some(author) = present(&params.added_by) {
        query = query.eq("addedBy", author);
    }
    if let Some(limit) = present(&params.limit) {
        let limit = limit
            .parse::<u32>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| Error::InvalidQueryParameters("invalid limit parameter".into()))?;
        query = query.limit(limit);
    }
    Ok(repository::find_all(state.store(), &query)?)
}

/// A review addressed through a spot it does not belong to is not found.
pub fn get(state: &AppStateInner, spot_id: &str, review_id: &str) -> Result<Review> {
    let review: Review = repository::find_by_id(state.store(), review_id)?;
    if review.spot_id != spot_id {
        return Err(Error::NotFound(format!(
            "review {review_id} does not belong to spot {spot_id}"
        )));
    }
    Ok(review)
}

pub fn create(
    state: &AppStateInner,
    token: &str,
    spot_id: &str,
    info: NewReview,
) -> Result<Review> {
    let claims = state.authorizer.authenticate(token)?;
    repository::find_by_id::<Spot>(state.store(), spot_id)?;

    let review = Review {
        id: String::new(),
        spot_id: spot_id.to_string(),
        rating: info.rating,
        content: info.content,
        added_by: claims.name()?.to_string(),
        created_at: Utc::now(),
    };
    let review = repository::add(state.store(), review)?;
    info!("Review {} on spot {} by {}", review.id, spot_id, review.added_by);
    Ok(review)
}

pub fn update(
    state: &AppStateInner,
    spot_id: &str,
    review_id: &str,
    token: &str,
    patch: ReviewPatch,
) -> Result<Review> {
    let claims = state.authorizer.authenticate(token)?;
    let mut review = get(state, spot_id, review_id)?;
    claims.authorize_owner_or_admin(&review.added_by)?;

    repository::update_fields::<Review>(state.store(), review_id, &patch)?;
    if let Some(rating) = patch.rating {
        review.rating = rating;
    }
    if let Some(content) = patch.content {
        review.content = content;
    }
    Ok(review)
}

pub fn delete(state: &AppStateInner, spot_id: &str, review_id: &str, token: &str) -> Result<()> {
    let claims = state.authorizer.authenticate(token)?;
    let review = get(state, spot_id, review_id)?;
    claims.authorize_owner_or_admin(&review.added_by)?;

    repository::delete_by_id::<Review>(state.store(), review_id)?;
    info!("Review {} deleted", review_id);
    Ok(())
}

/// Remove every review of a spot. No user owns the empty name, so the owner
/// rule reduces to admins only.
pub fn delete_all(state: &AppStateInner, spot_id: &str, token: &str) -> Result<usize> {
    let claims = state.authorizer.authenticate(token)?;
    claims.authorize_owner_or_admin("")?;
    repository::find_by_id::<Spot>(state.store(), spot_id)?;

    let removed =
        repository::delete_all::<Review>(state.store(), &Query::new().eq("spotId", spot_id))?;
    info!("Removed {} reviews from spot {}", removed, spot_id);
    Ok(removed)
}
