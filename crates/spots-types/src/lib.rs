pub mod api;
pub mod geo;
pub mod models;
