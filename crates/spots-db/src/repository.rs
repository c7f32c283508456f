//! Typed CRUD over any [`Identifiable`] record.
//!
//! There is no caching: every call round-trips to the store.

use serde::Serialize;
use serde_json::{Map, Value};
use spots_types::models::Identifiable;
use thiserror::Error;
use tracing::warn;

use crate::deadline::DeadlineExceeded;
use crate::store::{DocumentStore, Query};

#[derive(Debug, Error)]
pub enum Error {
    #[error("{collection} document {id} does not exist")]
    NotFound { collection: &'static str, id: String },
    #[error("malformed document: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("request deadline exceeded")]
    DeadlineExceeded,
    #[error(transparent)]
    Store(anyhow::Error),
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        if err.downcast_ref::<DeadlineExceeded>().is_some() || is_interrupted(&err) {
            Self::DeadlineExceeded
        } else {
            Self::Store(err)
        }
    }
}

fn is_interrupted(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<rusqlite::Error>(),
        Some(rusqlite::Error::SqliteFailure(e, _))
            if e.code == rusqlite::ErrorCode::OperationInterrupted
    )
}

pub type Result<T> = std::result::Result<T, Error>;

pub fn find_by_id<T: Identifiable>(store: &dyn DocumentStore, id: &str) -> Result<T> {
    let body = store
        .get(T::COLLECTION, id)?
        .ok_or_else(|| not_found::<T>(id))?;
    decode(id.to_string(), body)
}

pub fn find_all<T: Identifiable>(store: &dyn DocumentStore, query: &Query) -> Result<Vec<T>> {
    store
        .query(T::COLLECTION, query)?
        .into_iter()
        .map(|doc| decode(doc.id, doc.body))
        .collect()
}

/// Store a new record. Whatever id the caller set is discarded and replaced
/// by the one the store assigns.
pub fn add<T: Identifiable>(store: &dyn DocumentStore, mut record: T) -> Result<T> {
    let body = encode(&record)?;
    let id = store.create(T::COLLECTION, &Value::Object(body))?;
    record.set_id(id);
    Ok(record)
}

/// Store a record under its own id, replacing any existing document.
pub fn put<T: Identifiable>(store: &dyn DocumentStore, record: &T) -> Result<()> {
    let body = encode(record)?;
    store.put(T::COLLECTION, record.id(), &Value::Object(body))?;
    Ok(())
}

/// Merge the serialized fields of `patch` into an existing record.
pub fn update_fields<T: Identifiable>(
    store: &dyn DocumentStore,
    id: &str,
    patch: &impl Serialize,
) -> Result<()> {
    let fields = encode(patch)?;
    if !store.update(T::COLLECTION, id, &fields)? {
        return Err(not_found::<T>(id));
    }
    Ok(())
}

pub fn delete_by_id<T: Identifiable>(store: &dyn DocumentStore, id: &str) -> Result<()> {
    if !store.delete(T::COLLECTION, id)? {
        return Err(not_found::<T>(id));
    }
    Ok(())
}

/// Delete every record matching `query` and return how many were removed.
///
/// Not atomic. Each match is deleted on its own; when some deletions fail the
/// others still happen and stay done, and the first failure is returned once
/// the sweep is over.
pub fn delete_all<T: Identifiable>(store: &dyn DocumentStore, query: &Query) -> Result<usize> {
    let docs = store.query(T::COLLECTION, query)?;
    let total = docs.len();

    let mut deleted = 0;
    let mut first_err = None;
    for doc in docs {
        match store.delete(T::COLLECTION, &doc.id) {
            Ok(true) => deleted += 1,
            // Removed concurrently by someone else.
            Ok(false) => {}
            Err(e) => {
                warn!("Failed to delete {} {}: {}", T::COLLECTION, doc.id, e);
                if first_err.is_none() {
                    first_err = Some(e);
                }
            }
        }
    }

    match first_err {
        Some(e) => Err(Error::from(e.context(format!(
            "deleted {deleted} of {total} {} documents",
            T::COLLECTION
        )))),
        None => Ok(deleted),
    }
}

fn not_found<T: Identifiable>(id: &str) -> Error {
    Error::NotFound {
        collection: T::COLLECTION,
        id: id.to_string(),
    }
}

fn decode<T: Identifiable>(id: String, body: Value) -> Result<T> {
    let mut record: T = serde_json::from_value(body)?;
    record.set_id(id);
    Ok(record)
}

fn encode(value: &impl Serialize) -> Result<Map<String, Value>> {
    match serde_json::to_value(value)? {
        Value::Object(mut map) => {
            map.remove("id");
            Ok(map)
        }
        other => Err(Error::Store(anyhow::anyhow!(
            "record must serialize to an object, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;
    use crate::store::Document;
    use chrono::{TimeZone, Utc};
    use spots_types::models::{Review, Spot};

    fn spot(lat: f64, lon: f64) -> Spot {
        Spot {
            id: String::new(),
            name: "Waterfall".into(),
            description: "Behind the mill".into(),
            latitude: lat,
            longitude: lon,
            category: "nature".into(),
            photos: vec!["a.jpg".into(), "b.jpg".into()],
            added_by: "alice".into(),
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        }
    }

    fn review(spot_id: &str, author: &str) -> Review {
        Review {
            id: String::new(),
            spot_id: spot_id.into(),
            rating: 4.5,
            content: "Worth the hike".into(),
            added_by: author.into(),
            created_at: Utc.with_ymd_and_hms(2024, 5, 2, 8, 30, 0).unwrap(),
        }
    }

    #[test]
    fn add_then_find_round_trips() {
        let db = Database::open_in_memory().unwrap();
        let input = spot(10.0, 10.0);

        let added = add(&db, input.clone()).unwrap();
        assert!(!added.id.is_empty());

        let found: Spot = find_by_id(&db, &added.id).unwrap();
        assert_eq!(found, Spot { id: added.id.clone(), ..input });
    }

    #[test]
    fn caller_supplied_id_is_discarded() {
        let db = Database::open_in_memory().unwrap();
        let mut input = spot(1.0, 1.0);
        input.id = "chosen-by-client".into();

        let added = add(&db, input).unwrap();
        assert_ne!(added.id, "chosen-by-client");
        assert!(matches!(
            find_by_id::<Spot>(&db, "chosen-by-client"),
            Err(Error::NotFound { .. })
        ));

        // The id never lands in the stored body.
        let body = db.get(Spot::COLLECTION, &added.id).unwrap().unwrap();
        assert!(body.get("id").is_none());
    }

    #[test]
    fn missing_records_are_not_found() {
        let db = Database::open_in_memory().unwrap();
        assert!(matches!(
            find_by_id::<Review>(&db, "nope"),
            Err(Error::NotFound { collection: "reviews", .. })
        ));
        assert!(matches!(
            delete_by_id::<Review>(&db, "nope"),
            Err(Error::NotFound { .. })
        ));
        assert!(matches!(
            update_fields::<Review>(&db, "nope", &serde_json::json!({ "rating": 1.0 })),
            Err(Error::NotFound { .. })
        ));
    }

    #[test]
    fn records_stay_in_their_collection() {
        let db = Database::open_in_memory().unwrap();
        let s = add(&db, spot(0.0, 0.0)).unwrap();
        assert!(matches!(
            find_by_id::<Review>(&db, &s.id),
            Err(Error::NotFound { .. })
        ));
    }

    #[test]
    fn find_all_with_empty_result() {
        let db = Database::open_in_memory().unwrap();
        let found: Vec<Review> = find_all(&db, &Query::new().eq("spotId", "x")).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn update_fields_keeps_untouched_fields() {
        let db = Database::open_in_memory().unwrap();
        let s = add(&db, spot(5.0, 5.0)).unwrap();

        update_fields::<Spot>(&db, &s.id, &serde_json::json!({ "name": "Upper falls" })).unwrap();

        let found: Spot = find_by_id(&db, &s.id).unwrap();
        assert_eq!(found.name, "Upper falls");
        assert_eq!(found.photos, s.photos);
        assert_eq!(found.added_by, "alice");
        assert_eq!(found.created_at, s.created_at);
    }

    #[test]
    fn delete_all_removes_only_matches() {
        let db = Database::open_in_memory().unwrap();
        for _ in 0..3 {
            add(&db, review("spot-a", "bob")).unwrap();
        }
        let keep = add(&db, review("spot-b", "bob")).unwrap();

        let deleted = delete_all::<Review>(&db, &Query::new().eq("spotId", "spot-a")).unwrap();
        assert_eq!(deleted, 3);

        let left: Vec<Review> = find_all(&db, &Query::new()).unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].id, keep.id);
    }

    #[test]
    fn put_keeps_given_id() {
        let db = Database::open_in_memory().unwrap();
        let mut s = spot(3.0, 3.0);
        s.id = "seeded-1".into();
        put(&db, &s).unwrap();

        let found: Spot = find_by_id(&db, "seeded-1").unwrap();
        assert_eq!(found, s);
    }

    /// Store whose deletes fail for one id.
    struct FlakyDeletes {
        inner: Database,
        poisoned: std::sync::Mutex<Option<String>>,
    }

    impl DocumentStore for FlakyDeletes {
        fn create(&self, c: &str, body: &Value) -> anyhow::Result<String> {
            self.inner.create(c, body)
        }
        fn put(&self, c: &str, id: &str, body: &Value) -> anyhow::Result<()> {
            self.inner.put(c, id, body)
        }
        fn get(&self, c: &str, id: &str) -> anyhow::Result<Option<Value>> {
            self.inner.get(c, id)
        }
        fn update(&self, c: &str, id: &str, f: &Map<String, Value>) -> anyhow::Result<bool> {
            self.inner.update(c, id, f)
        }
        fn delete(&self, c: &str, id: &str) -> anyhow::Result<bool> {
            if self.poisoned.lock().unwrap().as_deref() == Some(id) {
                anyhow::bail!("disk on fire");
            }
            self.inner.delete(c, id)
        }
        fn query(&self, c: &str, q: &Query) -> anyhow::Result<Vec<Document>> {
            self.inner.query(c, q)
        }
    }

    #[test]
    fn delete_all_is_best_effort() {
        let store = FlakyDeletes {
            inner: Database::open_in_memory().unwrap(),
            poisoned: std::sync::Mutex::new(None),
        };
        let first = add(&store, review("s", "bob")).unwrap();
        let stuck = add(&store, review("s", "bob")).unwrap();
        let last = add(&store, review("s", "bob")).unwrap();
        *store.poisoned.lock().unwrap() = Some(stuck.id.clone());

        let res = delete_all::<Review>(&store, &Query::new().eq("spotId", "s"));
        assert!(matches!(res, Err(Error::Store(_))));

        // Deletions around the failure were not rolled back.
        assert!(find_by_id::<Review>(&store, &first.id).is_err());
        assert!(find_by_id::<Review>(&store, &last.id).is_err());
        assert!(find_by_id::<Review>(&store, &stuck.id).is_ok());
    }
}
