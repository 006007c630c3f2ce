use std::sync::Arc;

use crate::{
    db::{Catalog, OrderHistory},
    error::AppResult,
    models::{
        CacheStats, Product, ProductId, ProductRecommendations, RecommendationKind,
        RecommendationResult, Subject, UserId, UserRecommendations,
    },
    services::{
        cache::{CacheKey, RecommendationCache},
        collaborative::CollaborativeRecommender,
        content::{ContentRecommender, DEFAULT_LIMIT},
    },
};

/// Entry point for recommendation requests
///
/// Serves cached results while they are fresh and otherwise routes the
/// request: products go to the content-based recommender, users with paid
/// orders to the collaborative one, and users without any to popular products.
pub struct RecommendationGateway {
    catalog: Arc<dyn Catalog>,
    orders: Arc<dyn OrderHistory>,
    content: ContentRecommender,
    collaborative: CollaborativeRecommender,
    cache: Arc<RecommendationCache>,
}

impl RecommendationGateway {
    /// Wires both recommenders to the same collaborators and cache
    pub fn new(
        catalog: Arc<dyn Catalog>,
        orders: Arc<dyn OrderHistory>,
        cache: Arc<RecommendationCache>,
    ) -> Self {
        Self {
            content: ContentRecommender::new(catalog.clone(), orders.clone()),
            collaborative: CollaborativeRecommender::new(catalog.clone(), orders.clone()),
            catalog,
            orders,
            cache,
        }
    }

    /// Recommendations for `subject`, from cache when fresh
    ///
    /// Each call counts exactly one hit or one miss. Failed computations are
    /// returned to the caller and nothing is stored for them.
    pub async fn get_recommendations(&self, subject: Subject) -> AppResult<RecommendationResult> {
        let key = CacheKey::from(subject);
        let result = crate::cached!(self.cache, key, self.compute(subject));
        Ok(result)
    }

    async fn compute(&self, subject: Subject) -> AppResult<RecommendationResult> {
        match subject {
            Subject::Product(product_id) => {
                let product = self.catalog.get_product(product_id).await?;
                let recommendations = self.content.similar_to(&product, DEFAULT_LIMIT).await?;

                tracing::info!(
                    product_id = %product_id,
                    count = recommendations.len(),
                    "Computed similar-product recommendations"
                );

                Ok(RecommendationResult::Product(ProductRecommendations {
                    product: (&product).into(),
                    recommendations,
                }))
            }
            Subject::User(user) => {
                // Fetched once and reused by the collaborative ranking
                let paid_orders = self.orders.get_paid_orders_for_user(user).await?;

                let (kind, recommendations) = if paid_orders.is_empty() {
                    let popular = self.collaborative.popular_products(DEFAULT_LIMIT).await?;
                    (RecommendationKind::Popular, popular)
                } else {
                    let personalized = self
                        .collaborative
                        .recommend_from_orders(user, &paid_orders, DEFAULT_LIMIT)
                        .await?;
                    (RecommendationKind::Personalized, personalized)
                };

                tracing::info!(
                    user_id = %user,
                    kind = ?kind,
                    count = recommendations.len(),
                    "Computed user recommendations"
                );

                Ok(RecommendationResult::User(UserRecommendations {
                    user,
                    kind,
                    recommendations,
                }))
            }
        }
    }

    /// Products similar to `product_id`
    pub async fn recommend_for(&self, product_id: ProductId) -> AppResult<Vec<Product>> {
        let result = self.get_recommendations(Subject::Product(product_id)).await?;
        Ok(result.recommendations().to_vec())
    }

    /// Products suggested to `user`
    pub async fn recommend_for_user(&self, user: UserId) -> AppResult<Vec<Product>> {
        let result = self.get_recommendations(Subject::User(user)).await?;
        Ok(result.recommendations().to_vec())
    }

    /// Profile-scored suggestions for `user`, bypassing the cache
    pub async fn recommend_by_profile(&self, user: UserId, limit: usize) -> AppResult<Vec<Product>> {
        self.content.recommend_for_user_profile(user, limit).await
    }

    /// Top-rated products; not cached
    pub async fn popular_products(&self, limit: usize) -> AppResult<Vec<Product>> {
        self.collaborative.popular_products(limit).await
    }

    /// Hit and miss counters with the current number of live entries
    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.stats().await
    }

    /// Empties the cache and resets its counters, returning the entries removed
    pub async fn clear_cache(&self) -> AppResult<usize> {
        self.cache.clear().await
    }
}
