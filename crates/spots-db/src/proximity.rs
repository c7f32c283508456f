//! Bounding-box proximity lookups over the spot collection.

use spots_types::api::SpotQuery;
use spots_types::geo::GeoBounds;
use spots_types::models::Spot;
use thiserror::Error;

use crate::repository;
use crate::store::{DocumentStore, Query};

/// Two spots whose boxes overlap within this radius are duplicates.
pub const DUPLICATE_RADIUS_KM: f64 = 0.1;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid query parameters: {0}")]
    InvalidQueryParameters(String),
    #[error(transparent)]
    Repository(#[from] repository::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

pub struct ProximityIndex<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> ProximityIndex<'a> {
    pub fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }

    /// Whether any stored spot lies inside the duplicate box around the point.
    pub fn has_nearby_spot(&self, lat: f64, lon: f64) -> Result<bool> {
        Ok(!self.nearby_spots(lat, lon)?.is_empty())
    }

    /// Like [`Self::has_nearby_spot`], ignoring the spot with id `own_id`, so a
    /// spot never collides with itself when it moves.
    pub fn has_nearby_spot_except(&self, lat: f64, lon: f64, own_id: &str) -> Result<bool> {
        Ok(self
            .nearby_spots(lat, lon)?
            .iter()
            .any(|spot| spot.id != own_id))
    }

    fn nearby_spots(&self, lat: f64, lon: f64) -> Result<Vec<Spot>> {
        let bounds = GeoBounds::around(lat, lon, DUPLICATE_RADIUS_KM)
            .map_err(|e| Error::InvalidQueryParameters(e.to_string()))?;
        let query = within(Query::new(), &bounds);
        Ok(repository::find_all(self.store, &query)?)
    }

    /// Public spot search: optional name, category and creator equality,
    /// combined with an optional radius box.
    pub fn search(&self, params: &SpotQuery) -> Result<Vec<Spot>> {
        let query = build_search_query(params)?;
        Ok(repository::find_all(self.store, &query)?)
    }
}

/// Translate raw search parameters into a store query.
///
/// Latitude, longitude and radius are all-or-nothing: a partial geo filter is
/// rejected rather than ignored. Empty values count as absent.
pub fn build_search_query(params: &SpotQuery) -> Result<Query> {
    let mut query = Query::new();

    if let Some(name) = present(&params.name) {
        query = query.eq_ignore_case("name", name);
    }

    let geo = (
        present(&params.latitude),
        present(&params.longitude),
        present(&params.radius),
    );
    match geo {
        (None, None, None) => {}
        (Some(lat), Some(lon), Some(radius)) => {
            let bounds = GeoBounds::parse(lat, lon, radius)
                .map_err(|e| Error::InvalidQueryParameters(e.to_string()))?;
            query = within(query, &bounds);
        }
        _ => {
            return Err(Error::InvalidQueryParameters(
                "latitude, longitude and radius must all be provided together".into(),
            ));
        }
    }

    if let Some(category) = present(&params.category) {
        query = query.eq_ignore_case("category", category);
    }
    if let Some(added_by) = present(&params.added_by) {
        query = query.eq("addedBy", added_by);
    }

    Ok(query)
}

fn within(query: Query, bounds: &GeoBounds) -> Query {
    query
        .between("latitude", bounds.min_lat, bounds.max_lat)
        .between("longitude", bounds.min_lon, bounds.max_lon)
}

/// Query-string values that are empty or only whitespace count as absent.
pub fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
