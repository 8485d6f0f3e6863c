//! SensorThings API Service Library
//!
//! HTTP layer over the entity services: resource-path routing, query-option
//! parsing, entity representation and error-kind to status mapping.

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod query;
pub mod representation;
pub mod resource;
pub mod state;

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;

/// Build the application router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Service root
        .route("/v1.1", get(handlers::landing::landing_handler))
        .route("/v1.1/", get(handlers::landing::landing_handler))
        // Entity sets, entities and navigation paths
        .route(
            "/v1.1/*path",
            get(handlers::entities::get_handler)
                .post(handlers::entities::post_handler)
                .patch(handlers::entities::patch_handler)
                .put(handlers::entities::put_handler)
                .delete(handlers::entities::delete_handler),
        )
        // Health and metrics
        .route("/health", get(handlers::health::health_handler))
        .route("/ready", get(handlers::health::ready_handler))
        .route("/metrics", get(handlers::health::metrics_handler))
        // Middleware
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
}
