// API routes and handlers

pub mod analysis;
pub mod capture;
pub mod errors;
pub mod health;
pub mod routes;
pub mod sessions;

pub use errors::ApiError;
pub use routes::{create_routes, AppState};
