use chrono::Utc;
use spots_db::proximity::ProximityIndex;
use spots_db::repository;
use spots_db::store::Query;
use spots_types::api::{NewSpot, SpotPatch, SpotQuery};
use spots_types::models::{Review, Spot};
use tracing::{info, warn};

use crate::auth::AppStateInner;
use crate::error::{Error, Result};

const TOO_CLOSE: &str = "a spot already exists within 100 m of this location";

pub fn search(state: &AppStateInner, params: &SpotQuery) -> Result<Vec<Spot>> {
    Ok(ProximityIndex::new(state.store()).search(params)?)
}

pub fn get(state: &AppStateInner, id: &str) -> Result<Spot> {
    Ok(repository::find_by_id(state.store(), id)?)
}

/// Create a spot owned by the caller. Refused when another spot already sits
/// within the duplicate radius.
pub fn create(state: &AppStateInner, token: &str, info: NewSpot) -> Result<Spot> {
    let claims = state.authorizer.authenticate(token)?;
    let author = claims.name()?.to_string();

    let index = ProximityIndex::new(state.store());
    if index.has_nearby_spot(info.latitude, info.longitude)? {
        warn!(
            "Refusing spot '{}' by {}: too close to an existing spot",
            info.name, author
        );
        return Err(Error::Conflict(TOO_CLOSE.into()));
    }

    let spot = Spot {
        id: String::new(),
        name: info.name,
        description: info.description,
        latitude: info.latitude,
        longitude: info.longitude,
        category: info.category.to_lowercase(),
        photos: Vec::new(),
        added_by: author,
        created_at: Utc::now(),
    };
    let spot = repository::add(state.store(), spot)?;
    info!("Spot {} created by {}", spot.id, spot.added_by);
    Ok(spot)
}

/// Apply a partial update. Only the creator or an admin may do this, and a
/// move must not land within the duplicate radius of any other spot.
pub fn update(state: &AppStateInner, id: &str, token: &str, patch: SpotPatch) -> Result<Spot> {
    let claims = state.authorizer.authenticate(token)?;
    let mut spot: Spot = repository::find_by_id(state.store(), id)?;
    claims.authorize_owner_or_admin(&spot.added_by)?;

    let lat = patch.latitude.unwrap_or(spot.latitude);
    let lon = patch.longitude.unwrap_or(spot.longitude);
    let moved = lat != spot.latitude || lon != spot.longitude;
    if moved && ProximityIndex::new(state.store()).has_nearby_spot_except(lat, lon, id)? {
        warn!("Refusing move of spot {}: too close to another spot", id);
        return Err(Error::Conflict(TOO_CLOSE.into()));
    }

    let patch = SpotPatch {
        category: patch.category.map(|c| c.to_lowercase()),
        ..patch
    };
    repository::update_fields::<Spot>(state.store(), id, &patch)?;

    if let Some(name) = patch.name {
        spot.name = name;
    }
    if let Some(description) = patch.description {
        spot.description = description;
    }
    if let Some(category) = patch.category {
        spot.category = category;
    }
    spot.latitude = lat;
    spot.longitude = lon;
    Ok(spot)
}

/// Delete a spot and every review attached to it. Reviews go first; if one of
/// them cannot be removed the spot is kept and the error is returned.
pub fn delete(state: &AppStateInner, id: &str, token: &str) -> Result<()> {
    let claims = state.authorizer.authenticate(token)?;
    let spot: Spot = repository::find_by_id(state.store(), id)?;
    claims.authorize_owner_or_admin(&spot.added_by)?;

    let removed = repository::delete_all::<Review>(state.store(), &Query::new().eq("spotId", id))?;
    repository::delete_by_id::<Spot>(state.store(), id)?;
    info!("Spot {} deleted along with {} reviews", id, removed);
    Ok(())
}
