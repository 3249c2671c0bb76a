//! HTTP surface for the interview practice backend.

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use services::AppServices;

pub mod caller;
pub mod dto;
pub mod error;
pub mod routes;

pub use caller::{CALLER_HEADER, Caller};
pub use error::ApiError;

/// Application state shared across HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub services: AppServices,
}

impl AppState {
    pub fn new(services: AppServices) -> Self {
        Self { services }
    }
}

/// Build the application router.
///
/// `/health` is public; every other route needs the `x-user-id` header.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(routes::user_routes())
        .merge(routes::interview_routes())
        .merge(routes::response_routes())
        .merge(routes::stats_routes())
        .merge(routes::subscription_routes())
        .merge(routes::evaluation_routes())
        .merge(routes::health_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
