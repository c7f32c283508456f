use axum::{
    Json,
    extract::rejection::{PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use spots_db::{proximity, repository};
use spots_types::api::ErrorBody;
use thiserror::Error;
use tracing::error;

use crate::authorizer::AuthError;

/// Every failure a request can end in. Each variant maps to one status code
/// and one stable machine-readable code in the response body.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    InvalidQueryParameters(String),
    #[error("{0}")]
    InvalidBody(String),
    #[error("{0}")]
    Unauthenticated(String),
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("{0}")]
    Forbidden(String),
    #[error("store error: {0}")]
    Store(String),
    #[error("internal error: {0}")]
    Internal(String),
    #[error("request deadline exceeded")]
    Timeout,
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::InvalidQueryParameters(_) | Self::InvalidBody(_) => StatusCode::BAD_REQUEST,
            Self::Unauthenticated(_) | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Store(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Timeout => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::InvalidQueryParameters(_) => "INVALID_QUERY_PARAMETERS",
            Self::InvalidBody(_) => "INVALID_BODY",
            Self::Unauthenticated(_) => "UNAUTHENTICATED",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::Store(_) => "STORE_ERROR",
            Self::Internal(_) => "INTERNAL",
            Self::Timeout => "TIMEOUT",
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Store details stay in the log; clients get a generic message.
        let message = match &self {
            Self::Store(detail) | Self::Internal(detail) => {
                error!("{}: {}", self.code(), detail);
                "internal server error".to_string()
            }
            other => other.to_string(),
        };
        let body = ErrorBody {
            code: self.code().to_string(),
            message,
        };
        (self.status(), Json(body)).into_response()
    }
}

impl From<repository::Error> for Error {
    fn from(err: repository::Error) -> Self {
        match err {
            repository::Error::NotFound { .. } => Self::NotFound(err.to_string()),
            repository::Error::DeadlineExceeded => Self::Timeout,
            repository::Error::Decode(_) | repository::Error::Store(_) => {
                Self::Store(format!("{err:#}"))
            }
        }
    }
}

impl From<proximity::Error> for Error {
    fn from(err: proximity::Error) -> Self {
        match err {
            proximity::Error::InvalidQueryParameters(msg) => Self::InvalidQueryParameters(msg),
            proximity::Error::Repository(e) => e.into(),
        }
    }
}

impl From<QueryRejection> for Error {
    fn from(rejection: QueryRejection) -> Self {
        Self::InvalidQueryParameters(rejection.body_text())
    }
}

impl From<PathRejection> for Error {
    fn from(rejection: PathRejection) -> Self {
        Self::InvalidQueryParameters(rejection.body_text())
    }
}

impl From<AuthError> for Error {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Forbidden => Self::Forbidden(err.to_string()),
            AuthError::MalformedToken(_)
            | AuthError::ClaimMissing(_)
            | AuthError::Unauthenticated(_) => Self::Unauthenticated(err.to_string()),
        }
    }
}
