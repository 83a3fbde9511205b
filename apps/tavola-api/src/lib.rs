//! # Tavola API
//!
//! HTTP front end for the discount engine. Handlers are thin: they parse
//! JSON, call [`tavola_db::DiscountService`] and map errors through
//! [`error::ApiError`].

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use axum::Router;
use tower_http::trace::TraceLayer;

pub use config::{ApiConfig, ConfigError};
pub use error::{ApiError, ErrorCode};
pub use state::AppState;

/// Builds the full application router with request tracing.
pub fn router(state: AppState) -> Router {
    routes::routes()
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
