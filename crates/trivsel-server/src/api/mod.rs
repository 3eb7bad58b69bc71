//! API routes for the Trivsel gateway.

pub mod error;
pub mod rate_limit;
pub mod request_id;
mod routes;

use crate::config::Config;
use axum::Router;

pub use error::ApiError;
pub use routes::source_catalog;

pub fn routes(config: &Config) -> Router<std::sync::Arc<crate::state::AppState>> {
    routes::create_router(config)
}

#[cfg(test)]
mod tests;
