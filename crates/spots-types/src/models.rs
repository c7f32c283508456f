use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

pub const SPOT_COLLECTION: &str = "spots";
pub const REVIEW_COLLECTION: &str = "reviews";
pub const USER_COLLECTION: &str = "user_auth";

pub const ROLE_USER: &str = "user";
pub const ROLE_ADMIN: &str = "admin";

/// A record whose identifier is assigned by the document store.
///
/// The id is never part of the stored document body: the repository strips it
/// on write and re-attaches it with [`Identifiable::set_id`] on every read.
pub trait Identifiable: Serialize + DeserializeOwned {
    /// Collection the record type lives in.
    const COLLECTION: &'static str;

    fn id(&self) -> &str;
    fn set_id(&mut self, id: String);
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Spot {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub latitude: f64,
    pub longitude: f64,
    pub category: String,
    #[serde(default)]
    pub photos: Vec<String>,
    pub added_by: String,
    pub created_at: DateTime<Utc>,
}

impl Identifiable for Spot {
    const COLLECTION: &'static str = SPOT_COLLECTION;

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    #[serde(default)]
    pub id: String,
    pub spot_id: String,
    pub rating: f32,
    #[serde(default)]
    pub content: String,
    pub added_by: String,
    pub created_at: DateTime<Utc>,
}

impl Identifiable for Review {
    const COLLECTION: &'static str = REVIEW_COLLECTION;

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}

/// Stored account. `password` always holds a PHC hash string, never plaintext,
/// so this type must not be returned from any endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: String,
}

impl Identifiable for User {
    const COLLECTION: &'static str = USER_COLLECTION;

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}
