//! Bearer token issuing, verification and claim-based permission checks.
//!
//! Tokens are HS256 JWTs whose payload carries the short claim names `lid`
//! (user id), `usr` (display name) and `rol` (role). Permission checks read
//! claims straight from the payload segment; they are only ever handed
//! tokens that [`Authorizer::authenticate`] has already accepted.

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde_json::{Map, Value};
use spots_types::api::Claims;
use spots_types::models::{ROLE_ADMIN, User};
use thiserror::Error;

pub const CLAIM_SUBJECT: &str = "lid";
pub const CLAIM_NAME: &str = "usr";
pub const CLAIM_ROLE: &str = "rol";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("malformed token: {0}")]
    MalformedToken(&'static str),
    #[error("token claim {0} is missing or not a string")]
    ClaimMissing(String),
    #[error("invalid token: {0}")]
    Unauthenticated(String),
    #[error("only the owner or an admin may do this")]
    Forbidden,
}

/// Claims of a token payload, read without checking the signature.
#[derive(Debug, Clone)]
pub struct TokenClaims {
    fields: Map<String, Value>,
}

impl TokenClaims {
    pub fn decode(token: &str) -> Result<Self, AuthError> {
        let mut segments = token.split('.');
        let (Some(_), Some(payload), Some(_), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(AuthError::MalformedToken("expected three segments"));
        };

        let bytes = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .map_err(|_| AuthError::MalformedToken("payload is not base64url"))?;
        match serde_json::from_slice(&bytes) {
            Ok(Value::Object(fields)) => Ok(Self { fields }),
            _ => Err(AuthError::MalformedToken("payload is not a JSON object")),
        }
    }

    pub fn claim(&self, name: &str) -> Result<&str, AuthError> {
        self.fields
            .get(name)
            .and_then(Value::as_str)
            .ok_or_else(|| AuthError::ClaimMissing(name.to_string()))
    }

    pub fn subject_id(&self) -> Result<&str, AuthError> {
        self.claim(CLAIM_SUBJECT)
    }

    pub fn name(&self) -> Result<&str, AuthError> {
        self.claim(CLAIM_NAME)
    }

    pub fn role(&self) -> Result<&str, AuthError> {
        self.claim(CLAIM_ROLE)
    }

    /// Passes when the caller's display name equals `owner_name` or the
    /// caller is an admin.
    pub fn authorize_owner_or_admin(&self, owner_name: &str) -> Result<(), AuthError> {
        if self.name()? == owner_name || self.role()? == ROLE_ADMIN {
            Ok(())
        } else {
            Err(AuthError::Forbidden)
        }
    }

    /// Same rule for accounts, keyed on the stable user id instead of the
    /// display name.
    pub fn authorize_self_or_admin(&self, user_id: &str) -> Result<(), AuthError> {
        if self.subject_id()? == user_id || self.role()? == ROLE_ADMIN {
            Ok(())
        } else {
            Err(AuthError::Forbidden)
        }
    }
}

/// Read one string claim from a token.
pub fn extract_claim(token: &str, name: &str) -> Result<String, AuthError> {
    TokenClaims::decode(token)?.claim(name).map(str::to_string)
}

/// Owner-or-admin check straight from a token.
pub fn authorize_owner_or_admin(token: &str, owner_name: &str) -> Result<(), AuthError> {
    TokenClaims::decode(token)?.authorize_owner_or_admin(owner_name)
}

pub struct Authorizer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    token_ttl: Duration,
}

impl Authorizer {
    pub fn new(secret: &str, token_ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp"]);
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            token_ttl,
        }
    }

    /// Verify signature and expiry.
    pub fn authenticate(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let data = decode::<Map<String, Value>>(token, &self.decoding, &self.validation)
            .map_err(|e| AuthError::Unauthenticated(e.to_string()))?;
        Ok(TokenClaims { fields: data.claims })
    }

    pub fn issue_token(&self, user: &User) -> anyhow::Result<String> {
        let exp = chrono::Utc::now().timestamp().max(0) as u64 + self.token_ttl.as_secs();
        let claims = Claims {
            sub: user.id.clone(),
            username: user.name.clone(),
            role: user.role.clone(),
            exp,
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        Ok(token)
    }
}
