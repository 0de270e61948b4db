//! Axum router construction for the scan API.
//!
//! Both methods share the single path `/`. CORS is open so browser map
//! clients on other origins can call the service.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use spawnscan_core::ScanClient;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the complete Axum router for the scan service.
///
/// The router includes:
/// - `GET /` -- scan around a position
/// - `POST /` -- acknowledge and request a restart
pub fn build_router<C>(state: Arc<AppState<C>>) -> Router
where
    C: ScanClient + 'static,
{
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::scan::<C>).post(handlers::restart::<C>))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
