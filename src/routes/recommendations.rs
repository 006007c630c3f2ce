use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::{
    error::AppResult,
    middleware::auth::{AdminUser, AuthUser},
    models::{CacheStats, Product, ProductId, RecommendationResult, Subject, UserId},
    routes::AppState,
    services::content::DEFAULT_LIMIT,
};

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

/// Handler for similar-product recommendations
pub async fn for_product(
    State(state): State<Arc<AppState>>,
    Path(product_id): Path<String>,
) -> AppResult<Json<RecommendationResult>> {
    let product_id: ProductId = product_id.parse()?;
    let result = state
        .gateway
        .get_recommendations(Subject::Product(product_id))
        .await?;
    Ok(Json(result))
}

/// Handler for a user's recommendations
pub async fn for_user(
    State(state): State<Arc<AppState>>,
    AuthUser(caller): AuthUser,
    Path(user_id): Path<String>,
) -> AppResult<Json<RecommendationResult>> {
    let user_id: UserId = user_id.parse()?;
    tracing::debug!(caller = %caller, user_id = %user_id, "User recommendations requested");

    let result = state
        .gateway
        .get_recommendations(Subject::User(user_id))
        .await?;
    Ok(Json(result))
}

/// Handler for preference-profile recommendations; computed on every call
pub async fn for_user_profile(
    State(state): State<Arc<AppState>>,
    AuthUser(_caller): AuthUser,
    Path(user_id): Path<String>,
    Query(params): Query<LimitQuery>,
) -> AppResult<Json<Vec<Product>>> {
    let user_id: UserId = user_id.parse()?;
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT);
    let products = state.gateway.recommend_by_profile(user_id, limit).await?;
    Ok(Json(products))
}

/// Handler for top-rated products
pub async fn popular(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LimitQuery>,
) -> AppResult<Json<Vec<Product>>> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT);
    let products = state.gateway.popular_products(limit).await?;
    Ok(Json(products))
}

/// Handler for cache counters (admin only)
pub async fn cache_stats(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
) -> Json<CacheStats> {
    Json(state.gateway.cache_stats().await)
}

/// Handler for emptying the recommendation cache (admin only)
pub async fn clear_cache(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
) -> AppResult<Json<Value>> {
    let removed = state.gateway.clear_cache().await?;
    tracing::info!(admin = %admin, removed, "Cache cleared by admin");

    Ok(Json(json!({
        "message": format!("Cache cleared. {} entries removed.", removed)
    })))
}
