//! Request extractors shared by all handlers. Each one rejects with an
//! [`Error`] so failures render in the common `{code, message}` shape.

use axum::{
    Json,
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Request},
    http::request::Parts,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use serde::de::DeserializeOwned;
use spots_types::api::Validate;

use crate::auth::AppState;
use crate::error::Error;

/// A verified bearer token from the `Authorization` header.
pub struct BearerToken(pub String);

impl FromRequestParts<AppState> for BearerToken {
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| Error::Unauthenticated("missing bearer token".into()))?;

        state.authorizer.authenticate(bearer.token())?;
        Ok(Self(bearer.token().to_string()))
    }
}

/// JSON body that must decode into `T` and pass its field validation.
pub struct ValidJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate + Send,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| Error::InvalidBody(e.body_text()))?;
        value.validate().map_err(Error::InvalidBody)?;
        Ok(Self(value))
    }
}

/// Asserts the request carries no body. Used on reads and deletes.
pub struct NoBody;

impl<S> FromRequest<S> for NoBody
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let method = req.method().clone();
        let body = Bytes::from_request(req, state)
            .await
            .map_err(|e| Error::InvalidBody(e.body_text()))?;
        if !body.is_empty() {
            return Err(Error::InvalidBody(format!(
                "{method} requests must not carry a body"
            )));
        }
        Ok(Self)
    }
}
