pub mod auth;
pub mod authorizer;
pub mod error;
pub mod health;
pub mod middleware;
pub mod passwords;
pub mod reviews;
pub mod router;
pub mod service;
pub mod spots;

pub use auth::{AppState, AppStateInner};
