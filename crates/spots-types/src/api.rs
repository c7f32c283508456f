use serde::{Deserialize, Serialize};

// -- Limits --

pub const MAX_SPOT_NAME_LEN: usize = 32;
pub const MAX_CATEGORY_LEN: usize = 32;
pub const MAX_TEXT_LEN: usize = 300;
pub const MIN_USER_NAME_LEN: usize = 3;
pub const MAX_USER_NAME_LEN: usize = 20;
pub const MIN_PASSWORD_LEN: usize = 6;
pub const MAX_RATING: f32 = 5.0;

/// Field-level validation of a decoded request body.
pub trait Validate {
    fn validate(&self) -> Result<(), String>;
}

// -- JWT Claims --

/// Wire form of the token payload. Short claim names are what existing
/// clients already carry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "lid")]
    pub sub: String,
    #[serde(rename = "usr")]
    pub username: String,
    #[serde(rename = "rol")]
    pub role: String,
    pub exp: u64,
}

// -- Spots --

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewSpot {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub latitude: f64,
    pub longitude: f64,
    pub category: String,
}

impl Validate for NewSpot {
    fn validate(&self) -> Result<(), String> {
        check_spot_name(&self.name)?;
        check_text("description", &self.description)?;
        check_latitude(self.latitude)?;
        check_longitude(self.longitude)?;
        check_category(&self.category)
    }
}

/// Partial update of a spot. Creator, photos and timestamps are not patchable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpotPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl Validate for SpotPatch {
    fn validate(&self) -> Result<(), String> {
        if self.name.is_none()
            && self.description.is_none()
            && self.latitude.is_none()
            && self.longitude.is_none()
            && self.category.is_none()
        {
            return Err("patch contains no fields".into());
        }
        if let Some(name) = &self.name {
            check_spot_name(name)?;
        }
        if let Some(description) = &self.description {
            check_text("description", description)?;
        }
        if let Some(lat) = self.latitude {
            check_latitude(lat)?;
        }
        if let Some(lon) = self.longitude {
            check_longitude(lon)?;
        }
        if let Some(category) = &self.category {
            check_category(category)?;
        }
        Ok(())
    }
}

/// Raw `GET /spot` query parameters. Numeric values stay strings until the
/// search layer parses them, so malformed input can be reported precisely.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpotQuery {
    pub name: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub radius: Option<String>,
    pub category: Option<String>,
    #[serde(rename = "addedBy")]
    pub added_by: Option<String>,
}

// -- Reviews --

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewReview {
    pub rating: f32,
    #[serde(default)]
    pub content: String,
}

impl Validate for NewReview {
    fn validate(&self) -> Result<(), String> {
        check_rating(self.rating)?;
        check_text("content", &self.content)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReviewPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl Validate for ReviewPatch {
    fn validate(&self) -> Result<(), String> {
        if self.rating.is_none() && self.content.is_none() {
            return Err("patch contains no fields".into());
        }
        if let Some(rating) = self.rating {
            check_rating(rating)?;
        }
        if let Some(content) = &self.content {
            check_text("content", content)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewQuery {
    pub limit: Option<String>,
    #[serde(rename = "addedBy")]
    pub added_by: Option<String>,
}

// -- Users --

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl Validate for RegisterRequest {
    fn validate(&self) -> Result<(), String> {
        let len = self.name.chars().count();
        if !(MIN_USER_NAME_LEN..=MAX_USER_NAME_LEN).contains(&len) {
            return Err(format!(
                "name must be {MIN_USER_NAME_LEN}-{MAX_USER_NAME_LEN} characters"
            ));
        }
        check_email(&self.email)?;
        check_password(&self.password)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl Validate for LoginRequest {
    fn validate(&self) -> Result<(), String> {
        check_email(&self.email)?;
        check_password(&self.password)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub token: String,
    pub local_id: String,
}

// -- Misc --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub uptime_secs: u64,
}

fn check_spot_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("name is required".into());
    }
    if name.chars().count() > MAX_SPOT_NAME_LEN {
        return Err(format!("name must be at most {MAX_SPOT_NAME_LEN} characters"));
    }
    Ok(())
}

fn check_category(category: &str) -> Result<(), String> {
    if category.trim().is_empty() {
        return Err("category is required".into());
    }
    if category.chars().count() > MAX_CATEGORY_LEN {
        return Err(format!("category must be at most {MAX_CATEGORY_LEN} characters"));
    }
    Ok(())
}

fn check_text(field: &str, text: &str) -> Result<(), String> {
    if text.chars().count() > MAX_TEXT_LEN {
        return Err(format!("{field} must be at most {MAX_TEXT_LEN} characters"));
    }
    Ok(())
}

fn check_latitude(lat: f64) -> Result<(), String> {
    if !(-90.0..=90.0).contains(&lat) {
        return Err("latitude must be within [-90, 90]".into());
    }
    Ok(())
}

fn check_longitude(lon: f64) -> Result<(), String> {
    if !(-180.0..=180.0).contains(&lon) {
        return Err("longitude must be within [-180, 180]".into());
    }
    Ok(())
}

fn check_rating(rating: f32) -> Result<(), String> {
    if !(0.0..=MAX_RATING).contains(&rating) {
        return Err(format!("rating must be within [0, {MAX_RATING}]"));
    }
    Ok(())
}

fn check_email(email: &str) -> Result<(), String> {
    if !fast_chemail::is_valid_email(email) {
        return Err("email is not valid".into());
    }
    Ok(())
}

fn check_password(password: &str) -> Result<(), String> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        ));
    }
    Ok(())
}
