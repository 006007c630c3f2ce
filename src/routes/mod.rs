use axum::{
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    middleware::request_id::{
        make_span_with_request_id, propagate_request_id_layer, set_request_id_layer,
    },
    services::RecommendationGateway,
};

pub mod recommendations;

/// Shared application state
pub struct AppState {
    pub gateway: Arc<RecommendationGateway>,
    /// Role header value granting access to admin endpoints
    pub admin_role: String,
}

/// Creates the application router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_routes())
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(set_request_id_layer())
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
                .layer(propagate_request_id_layer())
                .layer(CorsLayer::permissive()),
        )
}

/// API routes under /api
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/recommendations/product/:product_id",
            get(recommendations::for_product),
        )
        .route(
            "/recommendations/user/:user_id",
            get(recommendations::for_user),
        )
        .route(
            "/recommendations/user/:user_id/profile",
            get(recommendations::for_user_profile),
        )
        .route("/recommendations/popular", get(recommendations::popular))
        .route(
            "/recommendations/cache-stats",
            get(recommendations::cache_stats),
        )
        .route("/recommendations/cache", delete(recommendations::clear_cache))
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
